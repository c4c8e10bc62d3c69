//! Domain events — what collaborators observe.
//!
//! RULE: the engine records an event for every accepted action and never
//! for a rejected one. Achievement tracking, UI toasts and the persisted
//! event log all read from this one stream.

use crate::types::{AnomalyId, ArtifactId, ProfileId, Timestamp, UpgradeId};
use serde::{Deserialize, Serialize};

/// Variants are appended, never removed or reordered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LabEvent {
    ArtifactUnlocked {
        at: Timestamp,
        artifact_id: ArtifactId,
        level: u32,
    },
    UpgradePurchased {
        at: Timestamp,
        upgrade_id: UpgradeId,
        level: u32,
        cost: f64,
    },
    AnomalyRepaired {
        at: Timestamp,
        anomaly_id: AnomalyId,
        cost: f64,
        stability: f64,
    },
    StabilityMaxed {
        at: Timestamp,
    },
    Prestiged {
        at: Timestamp,
        shards_earned: u64,
        prestige_count: u32,
        permanent_multiplier: f64,
    },
    ShardsSpent {
        at: Timestamp,
        amount: u64,
        remaining: u64,
    },
    OfflineProgressCredited {
        at: Timestamp,
        elapsed_seconds: f64,
        credited_seconds: f64,
        energy: f64,
    },
}

impl LabEvent {
    /// Stable name for the `event_type` column.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::ArtifactUnlocked { .. } => "artifact_unlocked",
            Self::UpgradePurchased { .. } => "upgrade_purchased",
            Self::AnomalyRepaired { .. } => "anomaly_repaired",
            Self::StabilityMaxed { .. } => "stability_maxed",
            Self::Prestiged { .. } => "prestiged",
            Self::ShardsSpent { .. } => "shards_spent",
            Self::OfflineProgressCredited { .. } => "offline_progress_credited",
        }
    }

    pub fn at(&self) -> Timestamp {
        match self {
            Self::ArtifactUnlocked { at, .. }
            | Self::UpgradePurchased { at, .. }
            | Self::AnomalyRepaired { at, .. }
            | Self::StabilityMaxed { at }
            | Self::Prestiged { at, .. }
            | Self::ShardsSpent { at, .. }
            | Self::OfflineProgressCredited { at, .. } => *at,
        }
    }
}

/// The event log entry as persisted to SQLite.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventLogEntry {
    pub id: Option<i64>,
    pub profile_id: ProfileId,
    pub event_type: String,
    pub payload: String, // JSON-serialized LabEvent
    pub recorded_at: Timestamp,
}
