use std::sync::Arc;
use std::time::Duration;

use stepwise::{Linearizability, Player, Policy, Registry, SeededRandom, Timeline};
use stepwise_core::rng::SequenceRandom;

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

fn engine(registry: &Registry) -> anyhow::Result<Linearizability> {
    Ok(
        Linearizability::with_random(registry, "single-register", Arc::new(SeededRandom::new(42)))?
            .max_propagation_delay(ms(1000)),
    )
}

#[tokio::test]
async fn linearizable_run_replays_the_script() -> anyhow::Result<()> {
    let registry = Registry::with_defaults()?;
    let engine = engine(&registry)?;
    let player = Player::new(engine.clone());

    for _ in 0..16 {
        player.advance();
    }

    let frame = engine.frame();
    assert_eq!(frame.current_time, 16);
    assert_eq!(frame.policy, Policy::Linearizable);
    assert_eq!(frame.operations.len(), 2);
    // The write took effect synchronously and the read observes it.
    assert_eq!(frame.current_value, 1);
    assert_eq!(frame.operations[1].observed, Some(1));

    for _ in 0..20 {
        player.advance();
    }

    let frame = engine.frame();
    assert_eq!(frame.operations.len(), 4);
    assert_eq!(frame.current_value, 2);
    assert_eq!(frame.operations[3].observed, Some(2));

    Ok(())
}

#[tokio::test]
async fn wrapping_starts_a_fresh_cycle() -> anyhow::Result<()> {
    let registry = Registry::with_defaults()?;
    let engine = engine(&registry)?;
    let player = Player::new(engine.clone());

    for _ in 0..100 {
        player.advance();
    }

    let frame = engine.frame();
    assert_eq!(frame.current_time, 0);
    assert!(frame.operations.is_empty());

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn nonlinearizable_write_propagates_after_a_delay() -> anyhow::Result<()> {
    let registry = Registry::with_defaults()?;
    let engine = engine(&registry)?;
    let player = Player::new(engine.clone());

    engine.set_policy(Policy::NonLinearizable);

    for _ in 0..5 {
        player.advance();
    }

    // The write is on the timeline but the register lags behind.
    let frame = engine.frame();
    assert_eq!(frame.operations.len(), 1);
    assert_eq!(frame.current_value, 0);

    // The delay is drawn below the configured cap.
    tokio::time::sleep(ms(1100)).await;
    assert_eq!(engine.frame().current_value, 1);

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn reset_cancels_in_flight_propagation() -> anyhow::Result<()> {
    let registry = Registry::with_defaults()?;
    let engine = engine(&registry)?;
    let player = Player::new(engine.clone());

    engine.set_policy(Policy::NonLinearizable);
    for _ in 0..5 {
        player.advance();
    }

    player.reset();
    tokio::time::sleep(ms(2000)).await;

    // The stale update must not leak into the fresh run.
    let frame = engine.frame();
    assert_eq!(frame.current_value, 0);
    assert!(frame.operations.is_empty());

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn pause_cancels_in_flight_propagation() -> anyhow::Result<()> {
    let registry = Registry::with_defaults()?;
    let engine = engine(&registry)?;
    let player = Player::new(engine.clone());

    engine.set_policy(Policy::NonLinearizable);
    for _ in 0..5 {
        player.advance();
    }

    player.pause();
    tokio::time::sleep(ms(2000)).await;

    assert_eq!(engine.frame().current_value, 0);

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn policy_switch_cancels_in_flight_propagation_and_restarts() -> anyhow::Result<()> {
    let registry = Registry::with_defaults()?;
    let engine = engine(&registry)?;
    let player = Player::new(engine.clone());

    engine.set_policy(Policy::NonLinearizable);
    for _ in 0..5 {
        player.advance();
    }

    engine.set_policy(Policy::Linearizable);
    tokio::time::sleep(ms(2000)).await;

    let frame = engine.frame();
    assert_eq!(frame.policy, Policy::Linearizable);
    assert_eq!(frame.current_time, 0);
    assert_eq!(frame.current_value, 0);
    assert!(frame.operations.is_empty());

    Ok(())
}

#[tokio::test]
async fn nonlinearizable_reads_resolve_within_the_eligible_set() -> anyhow::Result<()> {
    let registry = Registry::with_defaults()?;

    // A source pinned to the low end always observes the oldest eligible
    // write; pinned to the high end, the newest.
    for (fraction, expected) in [(0.0, 1), (0.99, 2)] {
        let engine = Linearizability::with_random(
            &registry,
            "single-register",
            Arc::new(SequenceRandom::new(vec![fraction])),
        )?;
        engine.set_policy(Policy::NonLinearizable);

        let player = Player::new(engine.clone());
        for _ in 0..36 {
            player.advance();
        }

        let frame = engine.frame();
        assert_eq!(frame.operations[3].observed, Some(expected));
    }

    Ok(())
}

#[tokio::test]
async fn selecting_an_unknown_scenario_fails_fast() -> anyhow::Result<()> {
    let registry = Registry::with_defaults()?;
    let engine = engine(&registry)?;

    let err = engine.select_scenario(&registry, "nope").unwrap_err();
    assert!(err.to_string().contains("unknown register scenario"));

    assert!(Linearizability::new(&registry, "nope").is_err());

    Ok(())
}
