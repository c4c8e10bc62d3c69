//! Autoplay balance tests.
//!
//! The economy is balanced when every prestige cycle finishes faster than
//! the one before it.

use timelab_core::{
    catalog::{AnomalyDef, ArtifactDef, LabCatalog},
    config::LabConfig,
    error::LabError,
    simulator::{run_autoplay, AutoplayConfig},
};

fn anomaly(id: &str, cost: f64, stability_gain: f64) -> AnomalyDef {
    AnomalyDef { id: id.into(), name: id.into(), cost, stability_gain }
}

fn single_artifact_catalog() -> LabCatalog {
    LabCatalog::new(
        vec![ArtifactDef { id: "relic".into(), name: "Relic".into(), base_production: 1.0 }],
        vec![],
        vec![
            anomaly("rift", 100.0, 40.0),
            anomaly("echo", 400.0, 40.0),
            anomaly("knot", 1_500.0, 40.0),
        ],
    )
    .expect("valid catalog")
}

fn quiet() -> AutoplayConfig {
    AutoplayConfig {
        story_chance_per_step: 0.0,
        buy_upgrades: false,
        cycles: 3,
        ..AutoplayConfig::default()
    }
}

#[test]
fn cycles_accelerate_with_the_multiplier() {
    let report = run_autoplay(&single_artifact_catalog(), &LabConfig::default_test(), &quiet()).unwrap();

    assert!(report.completed);
    assert_eq!(report.cycles.len(), 3);
    assert!(report.is_accelerating(), "{:?}", report.cycles);

    // 2000 lifetime energy per cycle, one shard each time.
    assert_eq!(report.cycles[0].seconds, 2_000.0);
    assert!(report.cycles.iter().all(|c| c.shards_earned == 1));
    assert_eq!(report.cycles[0].anomalies_repaired, 3);
    assert!((report.cycles[2].permanent_multiplier - 1.3).abs() < 1e-9);
}

#[test]
fn same_seed_same_report() {
    let autoplay = AutoplayConfig {
        story_chance_per_step: 0.01,
        cycles: 2,
        ..AutoplayConfig::default()
    };
    let catalog = single_artifact_catalog();
    let config = LabConfig::default_test();

    let a = run_autoplay(&catalog, &config, &autoplay).unwrap();
    let b = run_autoplay(&catalog, &config, &autoplay).unwrap();
    assert_eq!(
        serde_json::to_string(&a).unwrap(),
        serde_json::to_string(&b).unwrap()
    );
    assert!(a.cycles.iter().map(|c| c.story_events).sum::<u32>() > 0);
}

#[test]
fn builtin_catalog_reaches_prestige() {
    let catalog = LabCatalog::builtin().unwrap();
    let autoplay = AutoplayConfig {
        step_seconds: 10.0,
        cycles: 2,
        ..AutoplayConfig::default()
    };
    let report = run_autoplay(&catalog, &LabConfig::default_test(), &autoplay).unwrap();

    assert!(report.completed);
    assert_eq!(report.cycles.len(), 2);
    assert!(report.cycles[0].upgrades_bought > 0);
    assert!(report.cycles[1].permanent_multiplier > 1.0);
}

#[test]
fn seeded_upgrade_choices_replay_exactly() {
    let catalog = LabCatalog::builtin().unwrap();
    let autoplay = AutoplayConfig {
        seed: 9,
        step_seconds: 10.0,
        story_chance_per_step: 0.0,
        cycles: 1,
        ..AutoplayConfig::default()
    };
    let config = LabConfig::default_test();

    let a = run_autoplay(&catalog, &config, &autoplay).unwrap();
    let b = run_autoplay(&catalog, &config, &autoplay).unwrap();
    assert!(a.completed);
    assert!(a.cycles[0].upgrades_bought > 0);
    assert_eq!(
        serde_json::to_string(&a).unwrap(),
        serde_json::to_string(&b).unwrap()
    );
}

#[test]
fn step_budget_exhaustion_is_reported() {
    let autoplay = AutoplayConfig {
        max_steps_per_cycle: 50,
        ..quiet()
    };
    let report = run_autoplay(&single_artifact_catalog(), &LabConfig::default_test(), &autoplay).unwrap();
    assert!(!report.completed);
    assert!(report.cycles.is_empty());
}

#[test]
fn bad_inputs_are_rejected_up_front() {
    let config = LabConfig::default_test();

    let zero_step = AutoplayConfig { step_seconds: 0.0, ..quiet() };
    assert!(matches!(
        run_autoplay(&single_artifact_catalog(), &config, &zero_step),
        Err(LabError::InvalidConfig { .. })
    ));

    let short = LabCatalog::new(
        vec![ArtifactDef { id: "relic".into(), name: "Relic".into(), base_production: 1.0 }],
        vec![],
        vec![anomaly("rift", 100.0, 40.0)],
    )
    .unwrap();
    assert!(matches!(
        run_autoplay(&short, &config, &quiet()),
        Err(LabError::InvalidCatalog { .. })
    ));
}
