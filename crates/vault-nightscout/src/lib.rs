//! Nightscout import for the vault.
//!
//! Reads Nightscout profile exports into a [`ProfileStore`], classifies
//! entry/treatment exports into measurement entries and fills gap-free spans
//! with hourly basal entries derived from the profile in effect.

pub mod classifier;
pub mod gaps;
pub mod importer;
pub mod profile;
pub mod profile_reader;
pub mod store;
pub mod synthesizer;
pub mod warning;

pub use vault_core as core;

pub use importer::{ImportOutcome, ImportStage, NightscoutImporter};
pub use profile::{BasalProfile, RateSample};
pub use profile_reader::ProfileReader;
pub use store::{MostRefinedSelection, ProfileStore, SelectionStrategy};
pub use warning::ImportWarning;
