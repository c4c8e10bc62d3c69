//! Pure economy queries.
//!
//! Free functions over an immutable state snapshot and the catalog. Nothing
//! here mutates; the engine and any display code call the same formulas.

use crate::{
    catalog::{ArtifactDef, LabCatalog},
    config::LabConfig,
    state::LabState,
    types::{elapsed_seconds, Timestamp},
};
use serde::{Deserialize, Serialize};

/// Energy/sec of one artifact definition.
///
/// level × base, then each owned upgrade compounds as (1 + bonus × level),
/// then the global prestige multiplier. Locked artifacts produce 0.
pub fn artifact_rate(state: &LabState, catalog: &LabCatalog, artifact: &ArtifactDef) -> f64 {
    let level = state.artifact_level(&artifact.id);
    if level == 0 {
        return 0.0;
    }

    let mut rate = artifact.base_production * f64::from(level);
    for upgrade in catalog.upgrades_for(&artifact.id) {
        let upgrade_level = state.upgrade_level(&upgrade.id);
        rate *= 1.0 + upgrade.production_bonus * f64::from(upgrade_level);
    }
    rate * state.permanent_multiplier
}

/// Energy/sec of one artifact by id. Unknown ids produce 0.
pub fn artifact_production(state: &LabState, catalog: &LabCatalog, artifact_id: &str) -> f64 {
    catalog
        .artifact(artifact_id)
        .map(|artifact| artifact_rate(state, catalog, artifact))
        .unwrap_or(0.0)
}

/// Energy/sec of the whole lab.
pub fn total_production(state: &LabState, catalog: &LabCatalog) -> f64 {
    catalog
        .artifacts()
        .iter()
        .map(|artifact| artifact_rate(state, catalog, artifact))
        .sum()
}

/// Price of the next level of an upgrade, recomputed from its current level.
/// `None` for unknown ids. Still priced when the upgrade is maxed.
pub fn upgrade_cost(state: &LabState, catalog: &LabCatalog, upgrade_id: &str) -> Option<f64> {
    catalog
        .upgrade(upgrade_id)
        .map(|upgrade| upgrade.cost_at(state.upgrade_level(&upgrade.id)))
}

/// Energy gained over `seconds` at the current production rate.
pub fn accumulated_energy(state: &LabState, catalog: &LabCatalog, seconds: f64) -> f64 {
    total_production(state, catalog) * seconds.max(0.0)
}

/// What an absence since `last_update` is worth.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OfflineProgress {
    /// Real time since the last accumulation (clamped to >= 0).
    pub elapsed_seconds: f64,
    /// Elapsed time after applying the offline cap.
    pub credited_seconds: f64,
    pub production_per_second: f64,
    pub energy: f64,
}

impl OfflineProgress {
    pub fn was_capped(&self) -> bool {
        self.credited_seconds < self.elapsed_seconds
    }

    pub fn is_empty(&self) -> bool {
        self.energy <= 0.0
    }

    /// Fold a later absence into one still unclaimed.
    ///
    /// Both windows share a single cap: the later one only credits the
    /// seconds the earlier one left unused, at its own rate.
    pub fn merged(&self, later: &OfflineProgress, cap_seconds: f64) -> OfflineProgress {
        let room = (cap_seconds - self.credited_seconds).max(0.0);
        let added = later.credited_seconds.min(room);
        OfflineProgress {
            elapsed_seconds: self.elapsed_seconds + later.elapsed_seconds,
            credited_seconds: self.credited_seconds + added,
            production_per_second: later.production_per_second,
            energy: self.energy + later.production_per_second * added,
        }
    }
}

/// Offline catch-up: production × min(elapsed, cap).
pub fn offline_progress(
    state: &LabState,
    catalog: &LabCatalog,
    config: &LabConfig,
    now: Timestamp,
) -> OfflineProgress {
    let elapsed = elapsed_seconds(state.last_update, now);
    let credited = elapsed.min(config.offline_cap_seconds);
    let rate = total_production(state, catalog);
    OfflineProgress {
        elapsed_seconds: elapsed,
        credited_seconds: credited,
        production_per_second: rate,
        energy: rate * credited,
    }
}

/// Shards a life with this much lifetime production is worth:
/// floor(sqrt(total / divisor)).
pub fn shards_for(total_energy_produced: f64, config: &LabConfig) -> u64 {
    let ratio = (total_energy_produced / config.shard_energy_divisor).max(0.0);
    ratio.sqrt().floor() as u64
}

/// Multiplier earned by a cumulative shard count: 1 + shards × bonus.
pub fn multiplier_for(total_shards: u64, config: &LabConfig) -> f64 {
    1.0 + total_shards as f64 * config.shard_multiplier_bonus
}

/// What prestiging right now would yield.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PrestigePreview {
    pub shards_earned: u64,
    pub permanent_multiplier: f64,
    /// Stability is at the cap and at least one shard would be earned.
    pub available: bool,
}

pub fn prestige_preview(state: &LabState, config: &LabConfig) -> PrestigePreview {
    let shards_earned = shards_for(state.total_energy_produced, config);
    let recomputed = multiplier_for(state.temporal_shards.saturating_add(shards_earned), config);
    PrestigePreview {
        shards_earned,
        permanent_multiplier: recomputed.max(state.permanent_multiplier),
        available: state.timeline_stability >= config.max_stability && shards_earned >= 1,
    }
}
