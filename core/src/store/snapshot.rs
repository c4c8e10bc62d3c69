//! Store methods for lab snapshots.

use crate::{
    error::LabResult,
    snapshot::{self, STORAGE_NAMESPACE},
    state::LabState,
    types::Timestamp,
};

use super::LabStore;

impl LabStore {
    /// Write a profile's full state, replacing any previous snapshot.
    pub fn save_snapshot(
        &self,
        profile_id: &str,
        state: &LabState,
        saved_at: Timestamp,
    ) -> LabResult<()> {
        let json = snapshot::serialize(state)?;
        self.set(STORAGE_NAMESPACE, profile_id, &json, saved_at)
    }

    /// Read a profile's state, or `None` for a profile never saved.
    pub fn load_snapshot(
        &self,
        profile_id: &str,
        max_stability: f64,
    ) -> LabResult<Option<LabState>> {
        self.get(STORAGE_NAMESPACE, profile_id)?
            .map(|json| snapshot::deserialize_with_cap(&json, max_stability))
            .transpose()
    }

    pub fn delete_snapshot(&self, profile_id: &str) -> LabResult<bool> {
        self.remove(STORAGE_NAMESPACE, profile_id)
    }

    /// Every profile with a saved snapshot.
    pub fn profiles(&self) -> LabResult<Vec<String>> {
        self.keys(STORAGE_NAMESPACE)
    }
}
