use std::io;
use std::path::PathBuf;

// ---------- TIME PARSING ----------

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimeFormatError {
    #[error("Invalid time format: {0:?}, expected HH:MM[:SS[.mmm]]")]
    InvalidTimeFormat(String),
}

// ---------- DATA PROVIDER ----------

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("Request to astronomy provider failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Astronomy provider answered with status {0}")]
    Status(u16),

    #[error("Astronomy provider returned no data")]
    Empty,

    #[error("Astronomy provider failed: {0}")]
    Other(String),
}

// ---------- CACHE ----------

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Failed to write cache file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to serialize cache entry: {0}")]
    Serialize(#[from] serde_json::Error),
}

// ---------- DATA SERVICE ----------

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("No astronomical data for {key}: {source}")]
    Provider {
        key: String,
        #[source]
        source: ProviderError,
    },

    #[error("Provider returned an unusable date {0:?}")]
    InvalidDate(String),
}

// ---------- DRAWING ----------

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DrawError {
    #[error("No {0:?} font loaded")]
    FontUnavailable(crate::render::FontWeight),

    #[error("Transform stack underflow: restore without matching save")]
    UnbalancedRestore,

    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("Cannot allocate a {width}x{height} canvas")]
    Canvas { width: u32, height: u32 },
}

// ---------- OUTPUT ----------

#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    #[error("Failed to encode JPEG: {0}")]
    Encode(#[from] image::ImageError),

    #[error("Failed to write image {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

// ---------- IMAGE GENERATION ----------

#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error(transparent)]
    Draw(#[from] DrawError),

    #[error(transparent)]
    Output(#[from] OutputError),
}
