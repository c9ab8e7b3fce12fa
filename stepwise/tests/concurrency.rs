use std::time::Duration;

use stepwise::{ConcurrencyControl, Player, PlayerConfig, Registry, Timeline};
use stepwise_core::concurrency::TxStepKind;

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

fn config() -> PlayerConfig {
    PlayerConfig::new(ms(1000), ms(200), ms(2000))
}

#[tokio::test(start_paused = true)]
async fn playback_walks_to_the_diverged_final_state() -> anyhow::Result<()> {
    let registry = Registry::with_defaults()?;
    let engine = ConcurrencyControl::new(&registry, "write-conflict")?;
    let player = Player::with_config(engine.clone(), config());

    player.start();
    tokio::time::sleep(ms(5500)).await;

    let frame = engine.frame();
    assert_eq!(frame.step_index, 5);
    assert_eq!(frame.db_state.twopl, 200);
    assert_eq!(frame.db_state.ssi, 150);
    assert!(!player.is_playing());

    let ssi_t2 = frame.ssi.iter().find(|tx| tx.id == 2).unwrap();
    assert_eq!(ssi_t2.steps.last().unwrap().kind, TxStepKind::Abort);

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn step_back_republishes_the_previous_snapshot() -> anyhow::Result<()> {
    let registry = Registry::with_defaults()?;
    let engine = ConcurrencyControl::new(&registry, "write-conflict")?;
    let player = Player::with_config(engine.clone(), config());
    let mut frames = player.subscribe();

    player.advance();
    player.advance();
    player.step_back();

    // The watch channel holds the latest navigation result.
    assert!(frames.has_changed()?);
    assert_eq!(frames.borrow_and_update().step_index, 1);
    assert_eq!(engine.frame().step_index, 1);

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn frames_serialize_as_plain_data() -> anyhow::Result<()> {
    let registry = Registry::with_defaults()?;
    let engine = ConcurrencyControl::new(&registry, "write-conflict")?;
    let player = Player::with_config(engine.clone(), config());

    player.advance();
    let json = serde_json::to_value(engine.frame())?;

    assert_eq!(json["step_index"], 1);
    assert_eq!(json["db_state"]["twopl"], 100);
    assert_eq!(json["twopl"][0]["steps"][0]["kind"], "read");
    assert_eq!(json["twopl"][0]["steps"][0]["locked"], true);

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn commentary_follows_the_cursor() -> anyhow::Result<()> {
    let registry = Registry::with_defaults()?;
    let engine = ConcurrencyControl::new(&registry, "write-conflict")?;
    let player = Player::with_config(engine.clone(), config());

    assert!(engine.frame().commentary.starts_with("Initial state"));

    player.advance();
    assert!(engine.frame().commentary.starts_with("T1 starts"));

    player.step_back();
    assert!(engine.frame().commentary.starts_with("Initial state"));

    Ok(())
}
