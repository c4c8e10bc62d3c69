use thiserror::Error;

/// Infrastructure failures: storage, codec, data loading.
///
/// Game-rule rejections (unknown ids, insufficient energy, unmet
/// preconditions) are never errors; actions report them as `false`.
#[derive(Error, Debug)]
pub enum LabError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Save version {found} is older than the minimum supported version {min_supported}")]
    IncompatibleSave { found: u32, min_supported: u32 },

    #[error("Save version {found} was written by a newer build (current version {current})")]
    UnsupportedSaveVersion { found: u32, current: u32 },

    #[error("Invalid catalog: {reason}")]
    InvalidCatalog { reason: String },

    #[error("Invalid config: {reason}")]
    InvalidConfig { reason: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type LabResult<T> = Result<T, LabError>;
