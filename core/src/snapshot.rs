//! Snapshot serialization — the full lab state to/from JSON.
//!
//! ## Versioning
//!
//! - `SAVE_VERSION`: current format. Bump when fields are added.
//! - `MIN_COMPATIBLE_VERSION`: oldest format still readable. Bump only when
//!   an existing field changes meaning or is removed.
//!
//! Older saves at or above `MIN_COMPATIBLE_VERSION` load with missing
//! fields defaulted. Loaded values are sanitized before use.

use crate::{
    error::{LabError, LabResult},
    state::LabState,
};
use serde::{Deserialize, Serialize};

pub const SAVE_VERSION: u32 = 1;
pub const MIN_COMPATIBLE_VERSION: u32 = 1;

/// Fixed storage namespace every lab snapshot is written under.
pub const STORAGE_NAMESPACE: &str = "temporal-lab";

/// Stability cap applied when sanitizing a loaded state.
const LOAD_STABILITY_CAP: f64 = 100.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabSnapshot {
    pub version: u32,
    pub state: LabState,
}

/// Encode a state as a versioned JSON blob.
pub fn serialize(state: &LabState) -> LabResult<String> {
    let snapshot = LabSnapshot {
        version: SAVE_VERSION,
        state: state.clone(),
    };
    Ok(serde_json::to_string(&snapshot)?)
}

/// Decode a versioned JSON blob, sanitized with the default stability cap.
pub fn deserialize(json: &str) -> LabResult<LabState> {
    deserialize_with_cap(json, LOAD_STABILITY_CAP)
}

/// Decode a versioned JSON blob, sanitizing against `max_stability`.
pub fn deserialize_with_cap(json: &str, max_stability: f64) -> LabResult<LabState> {
    let snapshot: LabSnapshot = serde_json::from_str(json)?;
    if snapshot.version < MIN_COMPATIBLE_VERSION {
        return Err(LabError::IncompatibleSave {
            found: snapshot.version,
            min_supported: MIN_COMPATIBLE_VERSION,
        });
    }
    if snapshot.version > SAVE_VERSION {
        return Err(LabError::UnsupportedSaveVersion {
            found: snapshot.version,
            current: SAVE_VERSION,
        });
    }
    let mut state = snapshot.state;
    state.sanitize(max_stability);
    Ok(state)
}
