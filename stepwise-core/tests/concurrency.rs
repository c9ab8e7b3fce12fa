use stepwise_core::concurrency::{Stepper, TxStepKind};
use stepwise_core::Registry;

fn stepper() -> anyhow::Result<Stepper> {
    let registry = Registry::with_defaults()?;
    Ok(Stepper::new(registry.concurrency("write-conflict")?))
}

#[test]
fn initial_snapshot_shows_an_untouched_database() -> anyhow::Result<()> {
    let stepper = stepper()?;

    assert_eq!(stepper.step_index(), 0);
    assert_eq!(stepper.scenario().max_steps(), 5);

    let snapshot = stepper.snapshot();
    assert!(snapshot.twopl.is_empty());
    assert!(snapshot.ssi.is_empty());
    assert_eq!(snapshot.db_state.twopl, 100);
    assert_eq!(snapshot.db_state.ssi, 100);

    Ok(())
}

#[test]
fn final_snapshot_diverges_between_the_tracks() -> anyhow::Result<()> {
    let mut stepper = stepper()?;
    while stepper.advance() {}

    assert_eq!(stepper.step_index(), 5);
    assert!(stepper.is_complete());

    // 2PL serialized both writes; SSI aborted the conflicting one. The
    // divergence is the point of the comparison.
    let snapshot = stepper.snapshot();
    assert_eq!(snapshot.db_state.twopl, 200);
    assert_eq!(snapshot.db_state.ssi, 150);

    Ok(())
}

#[test]
fn ssi_aborts_the_conflicting_transaction_and_twopl_does_not() -> anyhow::Result<()> {
    let mut stepper = stepper()?;
    while stepper.advance() {}

    let snapshot = stepper.snapshot();

    let ssi_t2 = snapshot.ssi.iter().find(|tx| tx.id == 2).unwrap();
    assert_eq!(ssi_t2.steps.last().unwrap().kind, TxStepKind::Abort);

    let twopl_t2 = snapshot.twopl.iter().find(|tx| tx.id == 2).unwrap();
    assert!(twopl_t2
        .steps
        .iter()
        .all(|step| step.kind != TxStepKind::Abort));

    Ok(())
}

#[test]
fn ssi_rows_are_never_locked() -> anyhow::Result<()> {
    let registry = Registry::with_defaults()?;
    let scenario = registry.concurrency("write-conflict")?;

    for snapshot in &scenario.snapshots {
        for tx in &snapshot.ssi {
            assert!(tx.steps.iter().all(|step| !step.locked));
        }
    }

    Ok(())
}

#[test]
fn navigation_clamps_at_both_ends() -> anyhow::Result<()> {
    let mut stepper = stepper()?;

    assert!(!stepper.step_back());
    assert_eq!(stepper.step_index(), 0);

    while stepper.advance() {}
    assert!(!stepper.advance());
    assert_eq!(stepper.step_index(), 5);

    assert!(stepper.step_back());
    assert_eq!(stepper.step_index(), 4);

    Ok(())
}

#[test]
fn reset_is_idempotent() -> anyhow::Result<()> {
    let initial = stepper()?;
    let mut stepper = initial.clone();

    stepper.advance();
    stepper.advance();
    stepper.reset();
    assert_eq!(stepper, initial);

    stepper.reset();
    assert_eq!(stepper, initial);

    Ok(())
}

#[test]
fn frames_expose_the_snapshot_verbatim() -> anyhow::Result<()> {
    let mut stepper = stepper()?;
    stepper.advance();
    stepper.advance();

    let frame = stepper.frame();
    assert_eq!(frame.step_index, 2);
    assert_eq!(frame.twopl.len(), 2);
    assert_eq!(frame.ssi.len(), 2);

    // T2 is blocked behind T1's lock on the 2PL track only.
    assert_eq!(frame.twopl[1].steps[0].value, "Waiting for lock...");
    assert!(frame.twopl[0].steps[0].locked);
    assert!(!frame.ssi[1].steps[0].locked);

    Ok(())
}
