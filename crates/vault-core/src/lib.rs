//! Shared building blocks for the vault importers: the measurement entry
//! model, the error type, timestamp handling and configuration.

pub mod data_processors;
pub mod error;
pub mod models;
pub mod settings;
pub mod time_utils;

pub use error::{Result, VaultError};
pub use models::{EntryKind, MeasurementEntry, ValueExtension};
