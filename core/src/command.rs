use crate::types::{AnomalyId, ArtifactId, UpgradeId};
use serde::{Deserialize, Serialize};

/// Every player- or collaborator-issued action, in wire form.
/// Variants are appended, never removed or reordered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum LabCommand {
    Tick,
    /// Raised by the story flow when a chapter completes.
    UnlockArtifact { artifact_id: ArtifactId },
    BuyUpgrade { upgrade_id: UpgradeId },
    RepairAnomaly { anomaly_id: AnomalyId },
    Prestige,
    SpendShards { amount: u64 },
    /// Credit offline progress held back at session open.
    ClaimOffline,
}

impl LabCommand {
    /// Whether an accepted command should trigger an action save.
    /// Ticks follow the autosave cadence instead.
    pub fn is_action(&self) -> bool {
        !matches!(self, Self::Tick)
    }
}
