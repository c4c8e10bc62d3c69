//! Shared primitive types used across the entire lab.

use chrono::{DateTime, Utc};

/// Catalog key of a production artifact.
pub type ArtifactId = String;

/// Catalog key of a per-artifact upgrade.
pub type UpgradeId = String;

/// Catalog key of a one-time stability repair.
pub type AnomalyId = String;

/// The save profile a lab state belongs to.
pub type ProfileId = String;

/// Wall-clock instant. All engine time is UTC.
pub type Timestamp = DateTime<Utc>;

/// Generate a fresh, globally unique profile identifier.
pub fn new_profile_id() -> ProfileId {
    uuid::Uuid::new_v4().to_string()
}

/// Seconds elapsed from `from` to `to`, clamped to zero.
///
/// Nanosecond resolution so that sub-millisecond ticks still yield a
/// non-zero interval. A clock that moved backwards yields 0.0.
pub fn elapsed_seconds(from: Timestamp, to: Timestamp) -> f64 {
    let delta = to.signed_duration_since(from);
    let seconds = match delta.num_nanoseconds() {
        Some(ns) => ns as f64 / 1_000_000_000.0,
        // Over ~292 years; millisecond precision is plenty there.
        None => delta.num_milliseconds() as f64 / 1_000.0,
    };
    seconds.max(0.0)
}
