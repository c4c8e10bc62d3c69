//! Property tests over random action sequences.
//!
//! Whatever the player does, and however the clock moves:
//!   - energy stays finite and non-negative,
//!   - stability stays inside 0..=max,
//!   - the permanent multiplier never goes down,
//!   - the price of an upgrade depends only on its own level.

use proptest::prelude::*;
use timelab_core::{
    catalog::{AnomalyDef, ArtifactDef, LabCatalog, UpgradeDef},
    clock::ManualClock,
    config::LabConfig,
    engine::LabEngine,
};

const ARTIFACTS: [&str; 2] = ["relic", "lens"];
const UPGRADES: [&str; 3] = ["relic_polish", "relic_oil", "lens_grind"];
const ANOMALIES: [&str; 3] = ["rift", "echo", "knot"];

fn catalog() -> LabCatalog {
    let upgrade = |id: &str, artifact: &str, cost_base: f64, cost_multiplier: f64| UpgradeDef {
        id: id.into(),
        name: id.into(),
        artifact_id: artifact.into(),
        cost_base,
        cost_multiplier,
        production_bonus: 0.5,
        max_level: 8,
    };
    LabCatalog::new(
        vec![
            ArtifactDef { id: "relic".into(), name: "Relic".into(), base_production: 3.0 },
            ArtifactDef { id: "lens".into(), name: "Lens".into(), base_production: 11.0 },
        ],
        vec![
            upgrade("relic_polish", "relic", 50.0, 1.5),
            upgrade("relic_oil", "relic", 15.0, 1.15),
            upgrade("lens_grind", "lens", 120.0, 2.0),
        ],
        vec![
            AnomalyDef { id: "rift".into(), name: "Rift".into(), cost: 100.0, stability_gain: 45.0 },
            AnomalyDef { id: "echo".into(), name: "Echo".into(), cost: 400.0, stability_gain: 35.0 },
            AnomalyDef { id: "knot".into(), name: "Knot".into(), cost: 900.0, stability_gain: 40.0 },
        ],
    )
    .expect("valid catalog")
}

#[derive(Debug, Clone)]
enum Op {
    Advance(i64),
    Rewind(i64),
    Tick,
    Collect,
    Unlock(usize),
    Buy(usize),
    Repair(usize),
    Prestige,
    Spend(u64),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0i64..600_000).prop_map(Op::Advance),
        1 => (0i64..60_000).prop_map(Op::Rewind),
        4 => Just(Op::Tick),
        1 => Just(Op::Collect),
        2 => (0..ARTIFACTS.len()).prop_map(Op::Unlock),
        3 => (0..UPGRADES.len()).prop_map(Op::Buy),
        2 => (0..ANOMALIES.len()).prop_map(Op::Repair),
        1 => Just(Op::Prestige),
        1 => (0u64..4).prop_map(Op::Spend),
    ]
}

fn apply(engine: &mut LabEngine, clock: &ManualClock, op: &Op) {
    match op {
        Op::Advance(ms) => clock.advance_millis(*ms),
        Op::Rewind(ms) => clock.advance_millis(-*ms),
        Op::Tick => engine.tick(),
        Op::Collect => {
            engine.collect_offline_progress();
        }
        Op::Unlock(i) => {
            engine.unlock_artifact(ARTIFACTS[*i]);
        }
        Op::Buy(i) => {
            engine.buy_upgrade(UPGRADES[*i]);
        }
        Op::Repair(i) => {
            engine.repair_anomaly(ANOMALIES[*i]);
        }
        Op::Prestige => {
            engine.prestige();
        }
        Op::Spend(n) => {
            engine.spend_shards(*n);
        }
    }
}

fn fresh() -> (LabEngine, ManualClock) {
    let clock = ManualClock::at_epoch();
    let mut engine = LabEngine::new(catalog(), LabConfig::default_test(), Box::new(clock.clone()));
    engine.unlock_artifact("relic");
    (engine, clock)
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 128, .. ProptestConfig::default() })]

    #[test]
    fn invariants_hold_under_any_sequence(ops in prop::collection::vec(op(), 1..200)) {
        let (mut engine, clock) = fresh();
        let mut multiplier = engine.state().permanent_multiplier;

        for op in &ops {
            apply(&mut engine, &clock, op);
            let state = engine.state();

            prop_assert!(state.temporal_energy.is_finite());
            prop_assert!(state.temporal_energy >= 0.0, "energy went negative after {:?}", op);
            prop_assert!(state.total_energy_produced >= 0.0);
            prop_assert!(state.timeline_stability >= 0.0);
            prop_assert!(state.timeline_stability <= engine.config().max_stability);
            prop_assert!(state.permanent_multiplier >= 1.0);
            prop_assert!(state.permanent_multiplier >= multiplier, "multiplier fell after {:?}", op);
            multiplier = state.permanent_multiplier;
        }
    }

    #[test]
    fn upgrade_price_depends_only_on_its_level(ops in prop::collection::vec(op(), 1..200)) {
        let (mut engine, clock) = fresh();
        let catalog = catalog();

        for op in &ops {
            apply(&mut engine, &clock, op);
            for id in UPGRADES {
                let def = catalog.upgrade(id).unwrap();
                let level = engine.state().upgrade_level(id);
                let expected = (def.cost_base * def.cost_multiplier.powi(level as i32)).floor();
                prop_assert_eq!(engine.upgrade_cost(id), Some(expected));
            }
        }
    }

    #[test]
    fn queries_are_idempotent(ops in prop::collection::vec(op(), 0..100), wait in 0i64..100_000_000) {
        let (mut engine, clock) = fresh();
        for op in &ops {
            apply(&mut engine, &clock, op);
        }
        clock.advance_millis(wait);
        let before = engine.state().clone();

        prop_assert_eq!(engine.total_production().to_bits(), engine.total_production().to_bits());
        prop_assert_eq!(engine.calculate_offline_progress(), engine.calculate_offline_progress());
        prop_assert_eq!(engine.prestige_preview(), engine.prestige_preview());
        let progress = engine.calculate_offline_progress();
        prop_assert!(progress.credited_seconds <= engine.config().offline_cap_seconds);
        prop_assert_eq!(engine.state(), &before);
    }

    #[test]
    fn split_ticks_sum_to_one_tick(
        level in 1u32..20,
        pieces in prop::collection::vec(1i64..50_000, 1..40),
    ) {
        let clock_a = ManualClock::at_epoch();
        let clock_b = ManualClock::at_epoch();
        let mut split = LabEngine::new(catalog(), LabConfig::default_test(), Box::new(clock_a.clone()));
        let mut single = LabEngine::new(catalog(), LabConfig::default_test(), Box::new(clock_b.clone()));
        for _ in 0..level {
            split.unlock_artifact("relic");
            single.unlock_artifact("relic");
        }

        for ms in &pieces {
            clock_a.advance_millis(*ms);
            split.tick();
        }
        clock_b.advance_millis(pieces.iter().sum());
        single.tick();

        let a = split.state().temporal_energy;
        let b = single.state().temporal_energy;
        prop_assert!((a - b).abs() <= 1e-9 * b.max(1.0), "split {} vs single {}", a, b);
    }
}
