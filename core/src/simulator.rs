//! Autoplay — a deterministic simulated player.
//!
//! Drives a real `LabEngine` on a `ManualClock` in fixed steps:
//!   1. advance the clock one step and tick,
//!   2. let the story flow fire (first step of a run always unlocks the
//!      first artifact; afterwards a seeded roll may unlock or level one),
//!   3. spend greedily: cheapest anomaly first, then an affordable upgrade
//!      picked by the seeded player stream,
//!   4. prestige as soon as it is allowed.
//!
//! Each prestige closes a cycle. The report answers the one balance
//! question that matters: does every cycle reach max stability faster than
//! the one before?

use crate::{
    catalog::LabCatalog,
    clock::ManualClock,
    config::LabConfig,
    engine::LabEngine,
    error::{LabError, LabResult},
    rng::{LabRng, RngStream},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutoplayConfig {
    pub seed: u64,
    /// Simulated seconds per step.
    pub step_seconds: f64,
    /// Probability per step that a story chapter completes.
    pub story_chance_per_step: f64,
    pub buy_upgrades: bool,
    /// Prestige cycles to play.
    pub cycles: u32,
    /// Give up on a cycle after this many steps.
    pub max_steps_per_cycle: u64,
}

impl Default for AutoplayConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            step_seconds: 1.0,
            story_chance_per_step: 0.002,
            buy_upgrades: true,
            cycles: 3,
            max_steps_per_cycle: 2_000_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleReport {
    pub cycle: u32,
    /// Simulated seconds from cycle start to prestige.
    pub seconds: f64,
    pub shards_earned: u64,
    pub permanent_multiplier: f64,
    pub upgrades_bought: u32,
    pub anomalies_repaired: u32,
    pub story_events: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutoplayReport {
    pub cycles: Vec<CycleReport>,
    /// False when a cycle hit `max_steps_per_cycle`.
    pub completed: bool,
}

impl AutoplayReport {
    /// Every cycle strictly faster than the previous one.
    pub fn is_accelerating(&self) -> bool {
        self.cycles
            .windows(2)
            .all(|pair| pair[1].seconds < pair[0].seconds)
    }
}

pub fn run_autoplay(
    catalog: &LabCatalog,
    config: &LabConfig,
    autoplay: &AutoplayConfig,
) -> LabResult<AutoplayReport> {
    if !autoplay.step_seconds.is_finite() || autoplay.step_seconds <= 0.0 {
        return Err(LabError::InvalidConfig {
            reason: format!("step_seconds must be > 0, got {}", autoplay.step_seconds),
        });
    }
    if catalog.artifacts().is_empty() {
        return Err(LabError::InvalidCatalog {
            reason: "autoplay needs at least one artifact".into(),
        });
    }
    if catalog.total_stability_available() < config.max_stability {
        return Err(LabError::InvalidCatalog {
            reason: format!(
                "anomalies grant {} stability, prestige needs {}",
                catalog.total_stability_available(),
                config.max_stability
            ),
        });
    }

    let clock = ManualClock::at_epoch();
    let mut engine = LabEngine::new(catalog.clone(), config.clone(), Box::new(clock.clone()));
    let mut story = LabRng::new(autoplay.seed, RngStream::Story);
    let mut player = LabRng::new(autoplay.seed, RngStream::Player);
    let mut report = AutoplayReport {
        cycles: Vec::new(),
        completed: true,
    };

    // Story prologue.
    if let Some(first) = catalog.artifacts().first() {
        engine.unlock_artifact(&first.id);
    }

    for cycle in 1..=autoplay.cycles {
        let mut steps = 0u64;
        let mut upgrades_bought = 0u32;
        let mut anomalies_repaired = 0u32;
        let mut story_events = 0u32;

        let prestiged = loop {
            if steps >= autoplay.max_steps_per_cycle {
                break false;
            }
            steps += 1;
            clock.advance_secs(autoplay.step_seconds);
            engine.tick();

            if story.chance(autoplay.story_chance_per_step) {
                let pick = story.next_index(catalog.artifacts().len());
                if let Some(artifact) = catalog.artifacts().get(pick) {
                    engine.unlock_artifact(&artifact.id);
                    story_events += 1;
                }
            }

            let (repaired, bought) = spend_greedily(&mut engine, &mut player, autoplay.buy_upgrades);
            anomalies_repaired += repaired;
            upgrades_bought += bought;

            if engine.can_prestige() {
                let shards_before = engine.state().temporal_shards;
                if engine.prestige() {
                    report.cycles.push(CycleReport {
                        cycle,
                        seconds: steps as f64 * autoplay.step_seconds,
                        shards_earned: engine.state().temporal_shards - shards_before,
                        permanent_multiplier: engine.state().permanent_multiplier,
                        upgrades_bought,
                        anomalies_repaired,
                        story_events,
                    });
                    break true;
                }
            }
        };

        // Nobody is listening to the event stream here.
        engine.drain_events();

        if !prestiged {
            log::warn!(
                "autoplay cycle {cycle} did not reach prestige within {} steps",
                autoplay.max_steps_per_cycle
            );
            report.completed = false;
            break;
        }
        log::debug!("autoplay cycle {cycle} finished in {steps} steps");
    }

    Ok(report)
}

/// Repair the cheapest affordable anomaly, else buy a randomly picked
/// affordable upgrade, until nothing is affordable. Returns (repairs, purchases).
fn spend_greedily(engine: &mut LabEngine, player: &mut LabRng, buy_upgrades: bool) -> (u32, u32) {
    let mut repaired = 0;
    let mut bought = 0;
    loop {
        let cheapest_anomaly = engine
            .affordable_anomalies()
            .into_iter()
            .min_by(|a, b| a.cost.total_cmp(&b.cost))
            .map(|a| a.id.clone());
        if let Some(id) = cheapest_anomaly {
            if engine.repair_anomaly(&id) {
                repaired += 1;
                continue;
            }
        }

        if !buy_upgrades {
            break;
        }
        let affordable: Vec<String> = engine
            .affordable_upgrades()
            .into_iter()
            .map(|u| u.id.clone())
            .collect();
        if affordable.is_empty() {
            break;
        }
        let id = &affordable[player.next_index(affordable.len())];
        if !engine.buy_upgrade(id) {
            break;
        }
        bought += 1;
    }
    (repaired, bought)
}
