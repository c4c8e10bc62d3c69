//! The lab engine — owns one lab state and applies every rule to it.
//!
//! RULES:
//!   - Every action validates fully, then mutates fully, or does neither.
//!   - Ordinary rejections (unknown id, can't afford, precondition unmet)
//!     return `false`. Nothing here panics or returns an error.
//!   - No I/O. Persistence is the session's concern.
//!   - No timer. Callers drive `tick()`; the clock only answers "now".
//!   - Accepted actions record a `LabEvent`; rejected ones record nothing.

use crate::{
    catalog::{AnomalyDef, LabCatalog, UpgradeDef},
    clock::LabClock,
    config::LabConfig,
    event::LabEvent,
    production::{self, OfflineProgress, PrestigePreview},
    state::LabState,
    types::{elapsed_seconds, Timestamp},
};

pub struct LabEngine {
    state: LabState,
    catalog: LabCatalog,
    config: LabConfig,
    clock: Box<dyn LabClock>,
    events: Vec<LabEvent>,
}

impl LabEngine {
    /// A first-launch engine accumulating from the clock's current time.
    pub fn new(catalog: LabCatalog, config: LabConfig, clock: Box<dyn LabClock>) -> Self {
        let state = LabState::fresh(clock.now());
        Self::with_state(state, catalog, config, clock)
    }

    /// Resume from a loaded state, conformed to the catalog.
    pub fn with_state(
        mut state: LabState,
        catalog: LabCatalog,
        config: LabConfig,
        clock: Box<dyn LabClock>,
    ) -> Self {
        let changed = state.conform_to(&catalog);
        if changed > 0 {
            log::warn!("loaded state had {changed} entries outside the catalog; adjusted");
        }
        Self {
            state,
            catalog,
            config,
            clock,
            events: Vec::new(),
        }
    }

    pub fn state(&self) -> &LabState {
        &self.state
    }

    pub fn catalog(&self) -> &LabCatalog {
        &self.catalog
    }

    pub fn config(&self) -> &LabConfig {
        &self.config
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    /// Hand over every event recorded since the last drain.
    pub fn drain_events(&mut self) -> Vec<LabEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn pending_events(&self) -> &[LabEvent] {
        &self.events
    }

    // ── Queries ────────────────────────────────────────────────

    pub fn total_production(&self) -> f64 {
        production::total_production(&self.state, &self.catalog)
    }

    pub fn artifact_production(&self, artifact_id: &str) -> f64 {
        production::artifact_production(&self.state, &self.catalog, artifact_id)
    }

    pub fn upgrade_cost(&self, upgrade_id: &str) -> Option<f64> {
        production::upgrade_cost(&self.state, &self.catalog, upgrade_id)
    }

    /// What the time since `last_update` is worth, capped. Never credits.
    pub fn calculate_offline_progress(&self) -> OfflineProgress {
        production::offline_progress(&self.state, &self.catalog, &self.config, self.clock.now())
    }

    pub fn prestige_preview(&self) -> PrestigePreview {
        production::prestige_preview(&self.state, &self.config)
    }

    pub fn can_prestige(&self) -> bool {
        self.prestige_preview().available
    }

    /// Upgrades `buy_upgrade` would accept right now, in catalog order.
    pub fn affordable_upgrades(&self) -> Vec<&UpgradeDef> {
        self.catalog
            .upgrades()
            .iter()
            .filter(|upgrade| self.upgrade_rejection(upgrade).is_none())
            .collect()
    }

    /// Anomalies `repair_anomaly` would accept right now, in catalog order.
    pub fn affordable_anomalies(&self) -> Vec<&AnomalyDef> {
        self.catalog
            .anomalies()
            .iter()
            .filter(|anomaly| self.anomaly_rejection(anomaly).is_none())
            .collect()
    }

    // ── Accumulation ───────────────────────────────────────────

    /// Credit production for the time since `last_update`.
    pub fn tick(&mut self) {
        let now = self.clock.now();
        let elapsed = elapsed_seconds(self.state.last_update, now);
        let gained = production::accumulated_energy(&self.state, &self.catalog, elapsed);
        self.state.temporal_energy += gained;
        self.state.total_energy_produced += gained;
        self.state.last_update = now;
    }

    /// Close the offline window without crediting it.
    ///
    /// Returns the capped amount so the caller can offer it later via
    /// `credit_offline`. After this, `tick()` starts counting from now.
    pub fn defer_offline_progress(&mut self) -> OfflineProgress {
        let progress = self.calculate_offline_progress();
        self.state.last_update = self.clock.now();
        progress
    }

    /// Credit a previously computed offline amount.
    pub fn credit_offline(&mut self, progress: &OfflineProgress) {
        let energy = progress.energy.max(0.0);
        if !energy.is_finite() || energy == 0.0 {
            return;
        }
        self.state.temporal_energy += energy;
        self.state.total_energy_produced += energy;
        log::info!(
            "offline progress credited: {energy:.2} energy for {:.0}s (absent {:.0}s)",
            progress.credited_seconds,
            progress.elapsed_seconds
        );
        self.events.push(LabEvent::OfflineProgressCredited {
            at: self.clock.now(),
            elapsed_seconds: progress.elapsed_seconds,
            credited_seconds: progress.credited_seconds,
            energy,
        });
    }

    /// Close the offline window and add it to the unclaimed amount kept in
    /// the state. Returns the combined unclaimed amount.
    pub fn hold_offline_progress(&mut self) -> OfflineProgress {
        let progress = self.defer_offline_progress();
        let combined = match self.state.pending_offline {
            Some(pending) => pending.merged(&progress, self.config.offline_cap_seconds),
            None => progress,
        };
        if !combined.is_empty() {
            self.state.pending_offline = Some(combined);
        }
        combined
    }

    pub fn pending_offline(&self) -> Option<&OfflineProgress> {
        self.state.pending_offline.as_ref()
    }

    /// Credit the unclaimed amount, if any.
    pub fn claim_offline(&mut self) -> Option<OfflineProgress> {
        let progress = self.state.pending_offline.take()?;
        self.credit_offline(&progress);
        Some(progress)
    }

    /// Compute, close and credit the offline window in one step.
    pub fn collect_offline_progress(&mut self) -> OfflineProgress {
        let progress = self.defer_offline_progress();
        self.credit_offline(&progress);
        progress
    }

    // ── Actions ────────────────────────────────────────────────

    /// First call unlocks at level 1; every later call adds one level.
    /// Returns false only for an unknown artifact.
    pub fn unlock_artifact(&mut self, artifact_id: &str) -> bool {
        if self.catalog.artifact(artifact_id).is_none() {
            log::trace!("unlock rejected: unknown artifact '{artifact_id}'");
            return false;
        }

        let level = self
            .state
            .artifact_levels
            .entry(artifact_id.to_string())
            .or_insert(0);
        *level = level.saturating_add(1);
        let level = *level;

        log::debug!("artifact '{artifact_id}' now at level {level}");
        self.events.push(LabEvent::ArtifactUnlocked {
            at: self.clock.now(),
            artifact_id: artifact_id.to_string(),
            level,
        });
        true
    }

    /// Buy one level of an upgrade.
    pub fn buy_upgrade(&mut self, upgrade_id: &str) -> bool {
        let Some(upgrade) = self.catalog.upgrade(upgrade_id) else {
            log::trace!("upgrade rejected: unknown upgrade '{upgrade_id}'");
            return false;
        };
        if let Some(reason) = self.upgrade_rejection(upgrade) {
            log::trace!("upgrade '{upgrade_id}' rejected: {reason}");
            return false;
        }

        let level = self.state.upgrade_level(upgrade_id);
        let cost = upgrade.cost_at(level);
        let new_level = level + 1;

        self.state.temporal_energy -= cost;
        self.state
            .upgrade_levels
            .insert(upgrade_id.to_string(), new_level);

        log::debug!("upgrade '{upgrade_id}' bought to level {new_level} for {cost}");
        self.events.push(LabEvent::UpgradePurchased {
            at: self.clock.now(),
            upgrade_id: upgrade_id.to_string(),
            level: new_level,
            cost,
        });
        true
    }

    /// Repair an anomaly once per life. Stability is clamped at the cap but
    /// the full cost is always charged.
    pub fn repair_anomaly(&mut self, anomaly_id: &str) -> bool {
        let Some(anomaly) = self.catalog.anomaly(anomaly_id) else {
            log::trace!("repair rejected: unknown anomaly '{anomaly_id}'");
            return false;
        };
        if let Some(reason) = self.anomaly_rejection(anomaly) {
            log::trace!("repair of '{anomaly_id}' rejected: {reason}");
            return false;
        }

        let cost = anomaly.cost;
        let max = self.config.max_stability;
        let was_maxed = self.state.timeline_stability >= max;
        let stability = (self.state.timeline_stability + anomaly.stability_gain).min(max);

        self.state.temporal_energy -= cost;
        self.state.timeline_stability = stability;
        self.state
            .repaired_anomalies
            .insert(anomaly_id.to_string());

        let now = self.clock.now();
        log::debug!("anomaly '{anomaly_id}' repaired for {cost}; stability {stability}");
        self.events.push(LabEvent::AnomalyRepaired {
            at: now,
            anomaly_id: anomaly_id.to_string(),
            cost,
            stability,
        });
        if !was_maxed && stability >= max {
            self.events.push(LabEvent::StabilityMaxed { at: now });
        }
        true
    }

    /// Soft reset: trade this life's production for shards and a permanent
    /// multiplier. A no-op below max stability or when no shard is earned.
    pub fn prestige(&mut self) -> bool {
        let preview = self.prestige_preview();
        if self.state.timeline_stability < self.config.max_stability {
            log::trace!(
                "prestige rejected: stability {} < {}",
                self.state.timeline_stability,
                self.config.max_stability
            );
            return false;
        }
        if preview.shards_earned < 1 {
            log::trace!(
                "prestige rejected: {} lifetime energy earns no shard",
                self.state.total_energy_produced
            );
            return false;
        }

        let state = &mut self.state;
        state.temporal_energy = 0.0;
        state.total_energy_produced = 0.0;
        state.timeline_stability = 0.0;
        state.repaired_anomalies.clear();
        state.upgrade_levels.clear();
        for level in state.artifact_levels.values_mut() {
            if *level > 0 {
                *level = 1;
            }
        }
        state.temporal_shards = state.temporal_shards.saturating_add(preview.shards_earned);
        state.prestige_count = state.prestige_count.saturating_add(1);
        state.permanent_multiplier = preview.permanent_multiplier;
        state.last_update = self.clock.now();

        log::info!(
            "prestige #{}: +{} shards (total {}), multiplier {:.2}",
            state.prestige_count,
            preview.shards_earned,
            state.temporal_shards,
            state.permanent_multiplier
        );
        self.events.push(LabEvent::Prestiged {
            at: state.last_update,
            shards_earned: preview.shards_earned,
            prestige_count: state.prestige_count,
            permanent_multiplier: state.permanent_multiplier,
        });
        true
    }

    /// Deduct shards for a permanent purchase. Zero or unaffordable amounts
    /// are rejected.
    pub fn spend_shards(&mut self, amount: u64) -> bool {
        if amount == 0 || amount > self.state.temporal_shards {
            log::trace!(
                "shard spend of {amount} rejected: balance {}",
                self.state.temporal_shards
            );
            return false;
        }
        self.state.temporal_shards -= amount;
        log::debug!(
            "spent {amount} shards; {} remaining",
            self.state.temporal_shards
        );
        self.events.push(LabEvent::ShardsSpent {
            at: self.clock.now(),
            amount,
            remaining: self.state.temporal_shards,
        });
        true
    }

    // ── Validation ─────────────────────────────────────────────

    /// Why `buy_upgrade` would refuse, checked in contract order.
    fn upgrade_rejection(&self, upgrade: &UpgradeDef) -> Option<&'static str> {
        let level = self.state.upgrade_level(&upgrade.id);
        if level >= upgrade.max_level {
            return Some("already at max level");
        }
        if !self.state.is_unlocked(&upgrade.artifact_id) {
            return Some("artifact locked");
        }
        if upgrade.cost_at(level) > self.state.temporal_energy {
            return Some("insufficient energy");
        }
        None
    }

    fn anomaly_rejection(&self, anomaly: &AnomalyDef) -> Option<&'static str> {
        if self.state.is_repaired(&anomaly.id) {
            return Some("already repaired");
        }
        if anomaly.cost > self.state.temporal_energy {
            return Some("insufficient energy");
        }
        None
    }
}
