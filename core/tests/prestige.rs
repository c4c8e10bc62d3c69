//! Prestige tests.
//!
//! Tests cover: guard conditions (stability, shard threshold), the reset /
//! preserve split, multiplier recomputation, and cycle acceleration.

use timelab_core::{
    catalog::{AnomalyDef, ArtifactDef, LabCatalog, UpgradeDef},
    clock::ManualClock,
    config::LabConfig,
    engine::LabEngine,
    event::LabEvent,
    snapshot,
    state::LabState,
};

fn catalog() -> LabCatalog {
    LabCatalog::new(
        vec![
            ArtifactDef { id: "relic".into(), name: "Relic".into(), base_production: 1.0 },
            ArtifactDef { id: "lens".into(), name: "Lens".into(), base_production: 4.0 },
            ArtifactDef { id: "orb".into(), name: "Orb".into(), base_production: 9.0 },
        ],
        vec![UpgradeDef {
            id: "relic_polish".into(),
            name: "Polish".into(),
            artifact_id: "relic".into(),
            cost_base: 50.0,
            cost_multiplier: 1.5,
            production_bonus: 0.5,
            max_level: 5,
        }],
        vec![
            AnomalyDef { id: "crack".into(), name: "Crack".into(), cost: 500.0, stability_gain: 40.0 },
            AnomalyDef { id: "loop".into(), name: "Loop".into(), cost: 700.0, stability_gain: 40.0 },
            AnomalyDef { id: "fold".into(), name: "Fold".into(), cost: 800.0, stability_gain: 40.0 },
        ],
    )
    .expect("valid catalog")
}

fn build(state: LabState) -> (LabEngine, ManualClock) {
    let clock = ManualClock::at_epoch();
    let engine = LabEngine::with_state(
        state,
        catalog(),
        LabConfig::default_test(),
        Box::new(clock.clone()),
    );
    (engine, clock)
}

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

fn ready_state() -> LabState {
    let mut state = LabState::default();
    state.temporal_energy = 321.0;
    state.total_energy_produced = 4_000.0;
    state.timeline_stability = 100.0;
    state.repaired_anomalies.insert("crack".into());
    state.repaired_anomalies.insert("loop".into());
    state.artifact_levels.insert("relic".into(), 7);
    state.artifact_levels.insert("lens".into(), 1);
    state.artifact_levels.insert("orb".into(), 0);
    state.upgrade_levels.insert("relic_polish".into(), 4);
    state
}

#[test]
fn prestige_converts_lifetime_energy_into_shards() {
    let (mut engine, clock) = build(ready_state());
    clock.advance_secs(30.0);

    assert!(engine.prestige());

    let state = engine.state();
    assert_eq!(state.temporal_shards, 2);
    assert_eq!(state.prestige_count, 1);
    assert!(approx(state.permanent_multiplier, 1.2));

    assert_eq!(state.temporal_energy, 0.0);
    assert_eq!(state.total_energy_produced, 0.0);
    assert_eq!(state.timeline_stability, 0.0);
    assert!(state.repaired_anomalies.is_empty());
    assert!(state.upgrade_levels.is_empty());

    assert_eq!(state.artifact_level("relic"), 1);
    assert_eq!(state.artifact_level("lens"), 1);
    assert_eq!(state.artifact_level("orb"), 0);
    assert_eq!(state.last_update, engine.now());
}

#[test]
fn prestige_records_event() {
    let (mut engine, _clock) = build(ready_state());
    assert!(engine.prestige());
    let events = engine.drain_events();
    assert!(matches!(
        events.as_slice(),
        [LabEvent::Prestiged { shards_earned: 2, prestige_count: 1, .. }]
    ));
}

#[test]
fn prestige_below_max_stability_is_a_no_op() {
    let mut state = ready_state();
    state.timeline_stability = 99.9;
    let (mut engine, clock) = build(state);
    clock.advance_secs(5.0);
    let before = snapshot::serialize(engine.state()).unwrap();

    assert!(!engine.prestige());

    assert_eq!(snapshot::serialize(engine.state()).unwrap(), before);
    assert!(engine.drain_events().is_empty());
}

#[test]
fn prestige_without_a_full_shard_is_a_no_op() {
    let mut state = ready_state();
    state.total_energy_produced = 999.999;
    let (mut engine, clock) = build(state);
    clock.advance_secs(5.0);
    let before = snapshot::serialize(engine.state()).unwrap();

    assert!(!engine.can_prestige());
    assert!(!engine.prestige());

    assert_eq!(snapshot::serialize(engine.state()).unwrap(), before);
}

#[test]
fn multiplier_is_recomputed_from_cumulative_shards() {
    let mut state = ready_state();
    state.temporal_shards = 3;
    state.permanent_multiplier = 1.3;
    state.total_energy_produced = 9_000.0; // 3 more shards
    let (mut engine, _clock) = build(state);

    let preview = engine.prestige_preview();
    assert!(preview.available);
    assert_eq!(preview.shards_earned, 3);
    assert!(approx(preview.permanent_multiplier, 1.6));

    assert!(engine.prestige());
    assert_eq!(engine.state().temporal_shards, 6);
    assert!(approx(engine.state().permanent_multiplier, 1.6));
}

#[test]
fn spent_shards_never_lower_the_multiplier() {
    let mut state = ready_state();
    state.temporal_shards = 10;
    state.permanent_multiplier = 2.0;
    state.total_energy_produced = 1_000.0; // 1 shard
    let (mut engine, _clock) = build(state);

    assert!(engine.spend_shards(9));
    assert!(engine.prestige());

    // Recomputed value would be 1 + (1 + 1) × 0.1 = 1.2.
    assert_eq!(engine.state().temporal_shards, 2);
    assert!(approx(engine.state().permanent_multiplier, 2.0));
}

#[test]
fn second_prestige_accumulates() {
    let (mut engine, _clock) = build(ready_state());
    assert!(engine.prestige());

    // Second life: rebuild the conditions by hand.
    let mut state = engine.state().clone();
    state.total_energy_produced = 1_000.0;
    state.timeline_stability = 100.0;
    let (mut engine, _clock) = build(state);
    assert!(engine.prestige());

    assert_eq!(engine.state().prestige_count, 2);
    assert_eq!(engine.state().temporal_shards, 3);
    assert!(approx(engine.state().permanent_multiplier, 1.3));
}

#[test]
fn each_cycle_reaches_prestige_faster() {
    let clock = ManualClock::at_epoch();
    let mut engine = LabEngine::new(catalog(), LabConfig::default_test(), Box::new(clock.clone()));
    engine.unlock_artifact("relic");

    let mut cycle_seconds = Vec::new();
    for _ in 0..3 {
        let mut seconds = 0u32;
        loop {
            clock.advance_secs(1.0);
            engine.tick();
            seconds += 1;
            for id in ["crack", "loop", "fold"] {
                engine.repair_anomaly(id);
            }
            if engine.prestige() {
                break;
            }
            assert!(seconds < 100_000, "cycle never finished");
        }
        cycle_seconds.push(seconds);
    }

    assert!(
        cycle_seconds.windows(2).all(|w| w[1] < w[0]),
        "cycles did not accelerate: {cycle_seconds:?}"
    );
    assert_eq!(engine.state().prestige_count, 3);
}
