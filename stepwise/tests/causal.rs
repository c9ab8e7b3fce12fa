use std::time::Duration;

use stepwise::{CausalOrder, Player, PlayerConfig, Registry, Timeline};
use stepwise_core::causal::NodeId;

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

fn config() -> PlayerConfig {
    PlayerConfig::new(ms(2000), ms(500), ms(4000))
}

#[tokio::test(start_paused = true)]
async fn playback_publishes_every_step_then_auto_pauses() -> anyhow::Result<()> {
    let registry = Registry::with_defaults()?;
    let engine = CausalOrder::new(&registry, "normal")?;
    let player = Player::with_config(engine.clone(), config());
    let mut frames = player.subscribe();

    player.start();

    let mut seen = Vec::new();
    while frames.changed().await.is_ok() {
        let frame = frames.borrow_and_update().clone();
        let last = frame.step_index == 8;
        seen.push(frame);
        if last {
            break;
        }
    }

    assert_eq!(seen.len(), 9);
    assert!(seen
        .iter()
        .enumerate()
        .all(|(at, frame)| frame.step_index == at as i64));

    // Let the loop observe completion.
    tokio::time::sleep(ms(4000)).await;
    assert!(!player.is_playing());

    let frame = engine.frame();
    assert!(frame.nodes[&NodeId::A].iter().all(|event| event.active));
    assert!(frame.nodes[&NodeId::C].iter().all(|event| event.active));

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn frames_carry_message_and_explanation() -> anyhow::Result<()> {
    let registry = Registry::with_defaults()?;
    let engine = CausalOrder::new(&registry, "normal")?;
    let player = Player::with_config(engine.clone(), config());

    assert_eq!(engine.frame().step_index, -1);
    assert_eq!(engine.frame().explanation, None);

    player.advance();
    let frame = engine.frame();
    assert_eq!(frame.step_index, 0);
    assert_eq!(
        frame.active_message.map(|m| (m.from, m.to)),
        Some((NodeId::A, NodeId::B))
    );
    assert!(frame.explanation.is_some());

    player.advance();
    assert_eq!(engine.frame().active_message, None);

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn switching_scenarios_restarts_from_the_sentinel() -> anyhow::Result<()> {
    let registry = Registry::with_defaults()?;
    let engine = CausalOrder::new(&registry, "normal")?;
    let player = Player::with_config(engine.clone(), config());

    for _ in 0..4 {
        player.advance();
    }

    engine.select_scenario(&registry, "delay")?;
    let frame = engine.frame();
    assert_eq!(frame.step_index, -1);
    assert_eq!(engine.scenario().name, "delay");

    // Replaying the delay scenario flags its two scripted anomalies.
    for _ in 0..9 {
        player.advance();
    }
    let frame = engine.frame();
    let flagged: Vec<&str> = frame
        .nodes
        .values()
        .flatten()
        .filter(|event| event.out_of_order)
        .map(|event| event.id.as_str())
        .collect();
    assert_eq!(flagged, vec!["A2", "B3"]);
    assert!(!player.is_playing());

    assert!(engine.select_scenario(&registry, "nope").is_err());

    Ok(())
}
