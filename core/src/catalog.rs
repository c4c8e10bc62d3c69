//! Static lab content: artifacts, upgrades, anomalies.
//!
//! Pure lookup tables. An unknown id is an ordinary `None`; callers turn
//! that into a rejected action, never a crash.

use crate::error::{LabError, LabResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Embedded copy of `data/catalog.json`.
const BUILTIN_CATALOG: &str = include_str!("../../data/catalog.json");

/// A production source. Contributes `base_production` energy/sec per level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactDef {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub base_production: f64,
}

/// A per-artifact multiplier bought with energy, level by level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpgradeDef {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub artifact_id: String,
    pub cost_base: f64,
    pub cost_multiplier: f64,
    pub production_bonus: f64,
    pub max_level: u32,
}

impl UpgradeDef {
    /// Price of the next level when the upgrade sits at `level`:
    /// floor(cost_base × cost_multiplier^level).
    pub fn cost_at(&self, level: u32) -> f64 {
        let exponent = i32::try_from(level).unwrap_or(i32::MAX);
        (self.cost_base * self.cost_multiplier.powi(exponent)).floor()
    }
}

/// A one-time stability repair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyDef {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub cost: f64,
    pub stability_gain: f64,
}

#[derive(Debug, Clone, Deserialize)]
struct CatalogFile {
    artifacts: Vec<ArtifactDef>,
    #[serde(default)]
    upgrades: Vec<UpgradeDef>,
    #[serde(default)]
    anomalies: Vec<AnomalyDef>,
}

/// The immutable catalog. Order is display order.
#[derive(Debug, Clone, PartialEq)]
pub struct LabCatalog {
    artifacts: Vec<ArtifactDef>,
    upgrades: Vec<UpgradeDef>,
    anomalies: Vec<AnomalyDef>,
}

impl LabCatalog {
    /// Build and validate a catalog.
    pub fn new(
        artifacts: Vec<ArtifactDef>,
        upgrades: Vec<UpgradeDef>,
        anomalies: Vec<AnomalyDef>,
    ) -> LabResult<Self> {
        let catalog = Self {
            artifacts,
            upgrades,
            anomalies,
        };
        catalog.validate()?;
        Ok(catalog)
    }

    /// The content shipped with the game.
    pub fn builtin() -> LabResult<Self> {
        Self::from_json(BUILTIN_CATALOG)
    }

    pub fn from_json(json: &str) -> LabResult<Self> {
        let file: CatalogFile = serde_json::from_str(json)?;
        Self::new(file.artifacts, file.upgrades, file.anomalies)
    }

    /// Load from a JSON file on disk.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        Ok(Self::from_json(&content)?)
    }

    pub fn artifacts(&self) -> &[ArtifactDef] {
        &self.artifacts
    }

    pub fn upgrades(&self) -> &[UpgradeDef] {
        &self.upgrades
    }

    pub fn anomalies(&self) -> &[AnomalyDef] {
        &self.anomalies
    }

    pub fn artifact(&self, id: &str) -> Option<&ArtifactDef> {
        self.artifacts.iter().find(|a| a.id == id)
    }

    pub fn upgrade(&self, id: &str) -> Option<&UpgradeDef> {
        self.upgrades.iter().find(|u| u.id == id)
    }

    pub fn anomaly(&self, id: &str) -> Option<&AnomalyDef> {
        self.anomalies.iter().find(|a| a.id == id)
    }

    /// Upgrades owned by one artifact, in catalog order.
    pub fn upgrades_for<'a>(
        &'a self,
        artifact_id: &'a str,
    ) -> impl Iterator<Item = &'a UpgradeDef> + 'a {
        self.upgrades
            .iter()
            .filter(move |u| u.artifact_id == artifact_id)
    }

    /// Sum of every anomaly's nominal stability gain.
    pub fn total_stability_available(&self) -> f64 {
        self.anomalies.iter().map(|a| a.stability_gain).sum()
    }

    fn validate(&self) -> LabResult<()> {
        let invalid = |reason: String| Err(LabError::InvalidCatalog { reason });

        let mut seen = HashSet::new();
        for artifact in &self.artifacts {
            if !seen.insert(("artifact", artifact.id.as_str())) {
                return invalid(format!("duplicate artifact id '{}'", artifact.id));
            }
            if !artifact.base_production.is_finite() || artifact.base_production < 0.0 {
                return invalid(format!(
                    "artifact '{}' has invalid base_production {}",
                    artifact.id, artifact.base_production
                ));
            }
        }

        for upgrade in &self.upgrades {
            if !seen.insert(("upgrade", upgrade.id.as_str())) {
                return invalid(format!("duplicate upgrade id '{}'", upgrade.id));
            }
            if self.artifact(&upgrade.artifact_id).is_none() {
                return invalid(format!(
                    "upgrade '{}' targets unknown artifact '{}'",
                    upgrade.id, upgrade.artifact_id
                ));
            }
            if !upgrade.cost_base.is_finite() || upgrade.cost_base <= 0.0 {
                return invalid(format!(
                    "upgrade '{}' has invalid cost_base {}",
                    upgrade.id, upgrade.cost_base
                ));
            }
            if !upgrade.cost_multiplier.is_finite() || upgrade.cost_multiplier <= 1.0 {
                return invalid(format!(
                    "upgrade '{}' cost_multiplier must be > 1, got {}",
                    upgrade.id, upgrade.cost_multiplier
                ));
            }
            if !upgrade.production_bonus.is_finite() || upgrade.production_bonus < 0.0 {
                return invalid(format!(
                    "upgrade '{}' has invalid production_bonus {}",
                    upgrade.id, upgrade.production_bonus
                ));
            }
            if upgrade.max_level == 0 {
                return invalid(format!("upgrade '{}' has max_level 0", upgrade.id));
            }
        }

        for anomaly in &self.anomalies {
            if !seen.insert(("anomaly", anomaly.id.as_str())) {
                return invalid(format!("duplicate anomaly id '{}'", anomaly.id));
            }
            if !anomaly.cost.is_finite() || anomaly.cost < 0.0 {
                return invalid(format!(
                    "anomaly '{}' has invalid cost {}",
                    anomaly.id, anomaly.cost
                ));
            }
            if !anomaly.stability_gain.is_finite() || anomaly.stability_gain < 0.0 {
                return invalid(format!(
                    "anomaly '{}' has invalid stability_gain {}",
                    anomaly.id, anomaly.stability_gain
                ));
            }
        }

        Ok(())
    }
}
