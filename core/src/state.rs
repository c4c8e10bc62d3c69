//! The mutable lab state — one instance per player profile.
//!
//! Plain data. All rules live in `production` (pure queries) and `engine`
//! (validate-then-mutate actions). Maps are ordered so that a serialized
//! snapshot of an unchanged state is byte-for-byte identical.

use crate::{
    catalog::LabCatalog,
    production::OfflineProgress,
    types::{AnomalyId, ArtifactId, Timestamp, UpgradeId},
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabState {
    /// Spendable energy. Never negative.
    pub temporal_energy: f64,
    /// Energy produced this life. Feeds the shard formula; reset on prestige.
    pub total_energy_produced: f64,
    /// Prestige currency. Never reset.
    pub temporal_shards: u64,
    /// 0..=max_stability. Raised only by repairing anomalies.
    pub timeline_stability: f64,
    /// Anomalies repaired this life.
    pub repaired_anomalies: BTreeSet<AnomalyId>,
    /// 0 or absent = locked.
    pub artifact_levels: BTreeMap<ArtifactId, u32>,
    pub upgrade_levels: BTreeMap<UpgradeId, u32>,
    pub prestige_count: u32,
    /// >= 1, never lowered.
    pub permanent_multiplier: f64,
    /// Instant of the last accumulation.
    pub last_update: Timestamp,
    /// Offline progress held back for the player to claim. Survives saves
    /// and prestige until claimed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending_offline: Option<OfflineProgress>,
}

impl Default for LabState {
    fn default() -> Self {
        Self {
            temporal_energy: 0.0,
            total_energy_produced: 0.0,
            temporal_shards: 0,
            timeline_stability: 0.0,
            repaired_anomalies: BTreeSet::new(),
            artifact_levels: BTreeMap::new(),
            upgrade_levels: BTreeMap::new(),
            prestige_count: 0,
            permanent_multiplier: 1.0,
            last_update: Timestamp::default(),
            pending_offline: None,
        }
    }
}

impl LabState {
    /// First-launch state, accumulating from `now`.
    pub fn fresh(now: Timestamp) -> Self {
        Self {
            last_update: now,
            ..Self::default()
        }
    }

    pub fn artifact_level(&self, artifact_id: &str) -> u32 {
        self.artifact_levels.get(artifact_id).copied().unwrap_or(0)
    }

    pub fn is_unlocked(&self, artifact_id: &str) -> bool {
        self.artifact_level(artifact_id) > 0
    }

    pub fn upgrade_level(&self, upgrade_id: &str) -> u32 {
        self.upgrade_levels.get(upgrade_id).copied().unwrap_or(0)
    }

    pub fn is_repaired(&self, anomaly_id: &str) -> bool {
        self.repaired_anomalies.contains(anomaly_id)
    }

    /// Force loaded values back inside their invariants.
    ///
    /// Applied to every deserialized snapshot: a hand-edited or corrupted
    /// save must not smuggle negative energy or over-cap stability in.
    pub fn sanitize(&mut self, max_stability: f64) {
        self.temporal_energy = finite_non_negative(self.temporal_energy);
        self.total_energy_produced = finite_non_negative(self.total_energy_produced);
        self.timeline_stability =
            finite_non_negative(self.timeline_stability).min(max_stability);
        if !self.permanent_multiplier.is_finite() || self.permanent_multiplier < 1.0 {
            self.permanent_multiplier = 1.0;
        }
        if let Some(pending) = self.pending_offline.as_mut() {
            pending.energy = finite_non_negative(pending.energy);
            pending.elapsed_seconds = finite_non_negative(pending.elapsed_seconds);
            pending.credited_seconds = finite_non_negative(pending.credited_seconds);
            pending.production_per_second = finite_non_negative(pending.production_per_second);
        }
        if self.pending_offline.is_some_and(|p| p.is_empty()) {
            self.pending_offline = None;
        }
    }

    /// Drop ids the catalog no longer knows and clamp upgrade levels to
    /// their `max_level`. Returns how many entries were changed.
    pub fn conform_to(&mut self, catalog: &LabCatalog) -> usize {
        let mut changed = 0;

        let before = self.artifact_levels.len();
        self.artifact_levels
            .retain(|id, _| catalog.artifact(id).is_some());
        changed += before - self.artifact_levels.len();

        let before = self.repaired_anomalies.len();
        self.repaired_anomalies
            .retain(|id| catalog.anomaly(id).is_some());
        changed += before - self.repaired_anomalies.len();

        let before = self.upgrade_levels.len();
        self.upgrade_levels.retain(|id, level| match catalog.upgrade(id) {
            Some(upgrade) => {
                if *level > upgrade.max_level {
                    *level = upgrade.max_level;
                    changed += 1;
                }
                true
            }
            None => false,
        });
        changed += before - self.upgrade_levels.len();

        changed
    }
}

fn finite_non_negative(value: f64) -> f64 {
    if value.is_finite() {
        value.max(0.0)
    } else {
        0.0
    }
}
