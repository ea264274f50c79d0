use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors produced by the vault importers.
///
/// Recoverable conditions (a record nobody understands, a span without a
/// usable basal profile) are not errors; importers report them as warnings
/// alongside their result.
#[derive(Error, Debug)]
pub enum VaultError {
    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The input bytes are not valid JSON.
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// The input is valid JSON but not in a shape any importer understands,
    /// e.g. an object where an array is expected or a string where a number
    /// is expected.
    #[error("Malformed source: {0}")]
    MalformedSource(String),

    /// Classification finished without a single entry, so no time range can
    /// be bounded.
    #[error("Source contains no importable entries")]
    NoEntries,

    /// A basal profile was requested from zero rate samples.
    #[error("Cannot complete a basal profile from an empty sample list")]
    EmptyInput,

    /// The profile store holds no document with at least one profile.
    #[error("No basal profile available for {0}")]
    NoProfileAvailable(String),

    /// A timestamp string did not match any recognised format.
    #[error("Invalid timestamp format: {0}")]
    TimestampParse(String),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Convenience alias used throughout the vault crates.
pub type Result<T> = std::result::Result<T, VaultError>;
