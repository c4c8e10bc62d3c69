use crate::error::{LabError, LabResult};
use serde::{Deserialize, Serialize};

/// Every tunable constant of the lab economy.
///
/// Missing keys in a config file fall back to the reference values, so a
/// file only needs to name what it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabConfig {
    /// Longest absence credited by offline catch-up (8 hours).
    pub offline_cap_seconds: f64,
    /// Lifetime energy per squared shard: shards = floor(sqrt(total / divisor)).
    pub shard_energy_divisor: f64,
    /// Permanent multiplier added per cumulative shard.
    pub shard_multiplier_bonus: f64,
    /// Stability ceiling; reaching it unlocks prestige.
    pub max_stability: f64,
    /// Reference tick cadence for drivers. The engine itself has no timer.
    pub tick_interval_ms: u64,
    /// Credit offline progress automatically when a session opens.
    pub auto_credit_offline: bool,
    pub save_policy: SavePolicy,
}

/// When a session writes its snapshot back to the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SavePolicy {
    /// Save after every accepted action (purchase, repair, unlock, ...).
    pub save_on_action: bool,
    /// Save after this many ticks. 0 disables tick-driven saves.
    /// 10 ticks/sec × 30 sec = 300.
    pub autosave_every_ticks: u32,
}

impl Default for SavePolicy {
    fn default() -> Self {
        Self {
            save_on_action: true,
            autosave_every_ticks: 300,
        }
    }
}

impl Default for LabConfig {
    fn default() -> Self {
        Self {
            offline_cap_seconds: 8.0 * 60.0 * 60.0,
            shard_energy_divisor: 1_000.0,
            shard_multiplier_bonus: 0.1,
            max_stability: 100.0,
            tick_interval_ms: 100,
            auto_credit_offline: true,
            save_policy: SavePolicy::default(),
        }
    }
}

impl LabConfig {
    /// Load from a JSON file and validate.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: LabConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Config for tests: reference constants, but nothing saved on its own.
    pub fn default_test() -> Self {
        Self {
            save_policy: SavePolicy {
                save_on_action: false,
                autosave_every_ticks: 0,
            },
            ..Self::default()
        }
    }

    pub fn validate(&self) -> LabResult<()> {
        let invalid = |reason: String| Err(LabError::InvalidConfig { reason });

        if !self.offline_cap_seconds.is_finite() || self.offline_cap_seconds < 0.0 {
            return invalid(format!(
                "offline_cap_seconds must be finite and >= 0, got {}",
                self.offline_cap_seconds
            ));
        }
        if !self.shard_energy_divisor.is_finite() || self.shard_energy_divisor <= 0.0 {
            return invalid(format!(
                "shard_energy_divisor must be finite and > 0, got {}",
                self.shard_energy_divisor
            ));
        }
        if !self.shard_multiplier_bonus.is_finite() || self.shard_multiplier_bonus < 0.0 {
            return invalid(format!(
                "shard_multiplier_bonus must be finite and >= 0, got {}",
                self.shard_multiplier_bonus
            ));
        }
        if !self.max_stability.is_finite() || self.max_stability <= 0.0 {
            return invalid(format!(
                "max_stability must be finite and > 0, got {}",
                self.max_stability
            ));
        }
        if self.tick_interval_ms == 0 {
            return invalid("tick_interval_ms must be > 0".into());
        }
        Ok(())
    }
}
