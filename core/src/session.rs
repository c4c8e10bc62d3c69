//! A player session — engine + store + save policy for one profile.
//!
//! RULES:
//!   - The engine decides what happens; the session decides when it is
//!     written down.
//!   - Saves are fire-and-forget. A failed write is logged and the game
//!     carries on; the in-memory state is authoritative.
//!   - The offline window is always settled at open: credited right away
//!     or held for `claim_offline`, never left for `tick()` to credit
//!     uncapped.

use crate::{
    catalog::LabCatalog,
    clock::LabClock,
    command::LabCommand,
    config::LabConfig,
    engine::LabEngine,
    error::LabResult,
    event::EventLogEntry,
    production::OfflineProgress,
    state::LabState,
    store::LabStore,
    types::ProfileId,
};

pub struct LabSession {
    profile_id: ProfileId,
    engine: LabEngine,
    store: LabStore,
    ticks_since_save: u32,
    last_offline: Option<OfflineProgress>,
}

impl LabSession {
    /// Load (or create) a profile and settle its offline window.
    pub fn open(
        store: LabStore,
        profile_id: ProfileId,
        catalog: LabCatalog,
        config: LabConfig,
        clock: Box<dyn LabClock>,
    ) -> LabResult<Self> {
        config.validate()?;
        store.migrate()?;
        let loaded = store.load_snapshot(&profile_id, config.max_stability)?;
        let is_new = loaded.is_none();
        let engine = match loaded {
            Some(state) => LabEngine::with_state(state, catalog, config, clock),
            None => LabEngine::new(catalog, config, clock),
        };

        let mut session = Self {
            profile_id,
            engine,
            store,
            ticks_since_save: 0,
            last_offline: None,
        };

        if is_new {
            log::info!("profile '{}' created", session.profile_id);
            session.persist();
            return Ok(session);
        }

        let progress = if session.engine.config().auto_credit_offline {
            // Held back under an earlier config; nothing is left unclaimed now.
            session.engine.claim_offline();
            session.engine.collect_offline_progress()
        } else {
            session.engine.hold_offline_progress()
        };
        log::info!(
            "profile '{}' resumed after {:.0}s away ({:.2} energy {})",
            session.profile_id,
            progress.elapsed_seconds,
            progress.energy,
            if session.engine.pending_offline().is_some() { "pending" } else { "credited" }
        );
        session.last_offline = Some(progress);
        session.persist();
        Ok(session)
    }

    pub fn profile_id(&self) -> &str {
        &self.profile_id
    }

    pub fn engine(&self) -> &LabEngine {
        &self.engine
    }

    pub fn state(&self) -> &LabState {
        self.engine.state()
    }

    pub fn store(&self) -> &LabStore {
        &self.store
    }

    /// Offline progress computed at open, credited or not.
    pub fn last_offline(&self) -> Option<&OfflineProgress> {
        self.last_offline.as_ref()
    }

    /// Offline progress held back for the player to claim, including any
    /// left unclaimed by earlier sessions.
    pub fn pending_offline(&self) -> Option<&OfflineProgress> {
        self.engine.pending_offline()
    }

    /// Credit held-back offline progress.
    pub fn claim_offline(&mut self) -> Option<OfflineProgress> {
        let progress = self.engine.claim_offline()?;
        self.after_action();
        Some(progress)
    }

    pub fn tick(&mut self) {
        self.engine.tick();
        self.ticks_since_save = self.ticks_since_save.saturating_add(1);
        let every = self.engine.config().save_policy.autosave_every_ticks;
        if every > 0 && self.ticks_since_save >= every {
            self.persist();
        }
    }

    /// Apply one command. Returns whether the engine accepted it.
    pub fn apply(&mut self, command: &LabCommand) -> bool {
        let accepted = match command {
            LabCommand::Tick => {
                self.tick();
                return true;
            }
            LabCommand::UnlockArtifact { artifact_id } => self.engine.unlock_artifact(artifact_id),
            LabCommand::BuyUpgrade { upgrade_id } => self.engine.buy_upgrade(upgrade_id),
            LabCommand::RepairAnomaly { anomaly_id } => self.engine.repair_anomaly(anomaly_id),
            LabCommand::Prestige => self.engine.prestige(),
            LabCommand::SpendShards { amount } => self.engine.spend_shards(*amount),
            LabCommand::ClaimOffline => return self.claim_offline().is_some(),
        };
        if accepted && command.is_action() {
            self.after_action();
        }
        accepted
    }

    /// Write the snapshot and flush events now, reporting failure.
    ///
    /// Events leave the engine only once they are in the log; a failed
    /// append keeps them for the next save.
    pub fn save(&mut self) -> LabResult<()> {
        let now = self.engine.now();
        self.store
            .save_snapshot(&self.profile_id, self.engine.state(), now)?;
        self.store
            .append_events(&self.profile_id, self.engine.pending_events())?;
        self.engine.drain_events();
        self.ticks_since_save = 0;
        Ok(())
    }

    /// The profile's persisted event log.
    pub fn event_log(&self) -> LabResult<Vec<EventLogEntry>> {
        self.store.events_for_profile(&self.profile_id)
    }

    /// Save and hand the store back.
    pub fn close(mut self) -> LabStore {
        self.persist();
        self.store
    }

    fn after_action(&mut self) {
        if self.engine.config().save_policy.save_on_action {
            self.persist();
        }
    }

    fn persist(&mut self) {
        if let Err(e) = self.save() {
            log::warn!("save for profile '{}' failed: {e}", self.profile_id);
        }
    }
}
