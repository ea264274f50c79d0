//! Profile documents keyed by the date they take effect, and the heuristic
//! that picks one profile out of a document.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use tracing::debug;
use vault_core::error::{Result, VaultError};

use crate::profile::BasalProfile;

// ── SelectionStrategy ─────────────────────────────────────────────────────────

/// Picks the profile believed to be active out of one document's candidates.
///
/// Nightscout does not record which stored profile the pump actually ran, so
/// any choice is a guess. Implementations must be deterministic.
pub trait SelectionStrategy {
    /// Return one of `candidates`, or `None` when the slice is empty.
    fn choose<'a>(&self, candidates: &'a [BasalProfile]) -> Option<&'a BasalProfile>;
}

/// Prefers the profile with the most rate changes (a hand-tuned profile
/// looks more refined than a flat default), then the lowest positive daily
/// amount (fewer unannounced snacks baked in).
///
/// When no candidate changes rate at all, the first candidate wins.
#[derive(Debug, Clone, Copy, Default)]
pub struct MostRefinedSelection;

impl SelectionStrategy for MostRefinedSelection {
    fn choose<'a>(&self, candidates: &'a [BasalProfile]) -> Option<&'a BasalProfile> {
        let mut best: Option<&BasalProfile> = None;
        let mut best_changes = 0;
        let mut best_amount = 0.0;

        for candidate in candidates {
            let changes = candidate.change_count();
            let amount = candidate.daily_amount();
            if changes > best_changes {
                best_changes = changes;
                best_amount = amount;
                best = Some(candidate);
            } else if changes == best_changes
                && amount > 0.0
                && (best_amount <= 0.0 || amount < best_amount)
            {
                best_amount = amount;
                best = Some(candidate);
            }
        }

        best.or_else(|| candidates.first())
    }
}

// ── ProfileStore ──────────────────────────────────────────────────────────────

/// All imported profile documents, ordered by effective-start timestamp.
///
/// Filled once while reading a profile export, then only read. Selection
/// takes `&self`, so a finished store can be shared between imports.
#[derive(Debug, Clone, Default)]
pub struct ProfileStore {
    documents: BTreeMap<DateTime<Utc>, Vec<BasalProfile>>,
}

impl ProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the candidates of one document. Empty lists are ignored; a
    /// document with an already-known start replaces the earlier one.
    pub fn add_document(&mut self, effective_start: DateTime<Utc>, profiles: Vec<BasalProfile>) {
        if profiles.is_empty() {
            debug!(%effective_start, "ignoring profile document without profiles");
            return;
        }
        if self.documents.insert(effective_start, profiles).is_some() {
            debug!(%effective_start, "replaced profile document with identical start");
        }
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Number of stored documents.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Iterate documents in effective-start order.
    pub fn documents(&self) -> impl Iterator<Item = (&DateTime<Utc>, &[BasalProfile])> {
        self.documents.iter().map(|(k, v)| (k, v.as_slice()))
    }

    /// The document in effect at `target`: the latest one starting at or
    /// before `target`, or the earliest one when every document starts later.
    pub fn document_for(&self, target: DateTime<Utc>) -> Option<(DateTime<Utc>, &[BasalProfile])> {
        // Documents are never stored empty, but stay robust if that changes.
        let mut non_empty = self.documents.iter().filter(|(_, p)| !p.is_empty());
        let anchor = non_empty.next()?;
        let best = self
            .documents
            .range(..=target)
            .rev()
            .find(|(date, p)| !p.is_empty() && *date > anchor.0)
            .unwrap_or(anchor);
        Some((*best.0, best.1.as_slice()))
    }

    /// Select the best profile for `target` with `strategy`.
    ///
    /// Fails with [`VaultError::NoProfileAvailable`] when no document with
    /// a profile exists.
    pub fn select_best_profile<S: SelectionStrategy + ?Sized>(
        &self,
        target: DateTime<Utc>,
        strategy: &S,
    ) -> Result<&BasalProfile> {
        self.document_for(target)
            .and_then(|(_, candidates)| strategy.choose(candidates))
            .ok_or_else(|| VaultError::NoProfileAvailable(target.to_rfc3339()))
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
