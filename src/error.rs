use thiserror::Error;

/// Enum with all errors in this crate, matching the error taxonomy a
/// gridding job can fail with. Every variant is fatal to the whole job;
/// there is no silent fallback.
#[derive(Error, Debug)]
pub enum GridError {
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("I/O failure on {path}: {source}")]
    IoFailure {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid dtype name: {0}")]
    InvalidDType(String),

    #[error(
        "reduction functions require matching style (numeric/coded) on input and output dtypes, got {input} and {output}"
    )]
    StyleMismatch { input: String, output: String },

    #[error("Unknown reduction function: {0}")]
    UnknownReduction(String),

    #[error("Invalid projection definition: {0}")]
    InvalidProjection(String),

    #[error("Corrupt index: {0}")]
    CorruptIndex(String),

    #[error("Non-finite coordinate at record {index}: lat={lat}, lon={lon}, t={t}")]
    NonFiniteCoordinate {
        index: u64,
        lat: f32,
        lon: f32,
        t: f32,
    },

    #[error("Allocation failure: {0}")]
    AllocationFailure(String),
}

pub type Result<T> = std::result::Result<T, GridError>;
