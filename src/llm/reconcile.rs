//! Reply reconciliation — re-identifying raw model output against the batch
//! that produced it.
//!
//! The prompt tells the model to reply with a JSON array of exactly
//! `batch.len()` objects in input order.  [`reconcile`] enforces that
//! contract: the reply is decoded into typed entries, the length is checked,
//! and entry *i* is paired with batch record *i* by position — never by
//! matching content or identifier.  Positional pairing keeps the prompt and
//! the reply small, at the cost of being fragile to the model dropping or
//! reordering entries; that fragility is contained to whole-batch failure.
//!
//! On any decode or length failure the whole batch degrades to stub entries
//! (identifier plus the original title, everything else empty) and the raw
//! reply is logged for post-mortem inspection.  A failed batch never fails
//! the run.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::source::TitleRecord;

// ---------------------------------------------------------------------------
// LinguisticAnalysis / AnalysisEntry
// ---------------------------------------------------------------------------

/// The three-part linguistic breakdown returned per title.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LinguisticAnalysis {
    /// Syntactic structure: noun phrases, verb phrases, their relationships.
    #[serde(default)]
    pub syntax: String,
    /// Key lexical components and technical vocabulary.
    #[serde(default)]
    pub lexical: String,
    /// Grammatical particles and their function.
    #[serde(default)]
    pub particles: String,
}

impl LinguisticAnalysis {
    /// Returns `true` when no analysis field carries any text.
    pub fn is_empty(&self) -> bool {
        self.syntax.is_empty() && self.lexical.is_empty() && self.particles.is_empty()
    }
}

/// The reconciled result for one [`TitleRecord`].
///
/// Created exactly once per record, either from a well-formed reply entry or
/// as a stub via [`AnalysisEntry::stub`], and never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisEntry {
    /// Identifier of the record this entry belongs to.
    pub book_id: String,
    /// The title text as echoed by the model, or the catalog title for stubs.
    pub original: String,
    /// Corrected spelling; may be empty or equal to `original`.
    pub corrected: String,
    /// Linguistic breakdown; all fields empty for stubs.
    pub analysis: LinguisticAnalysis,
    /// English translation; empty for stubs.
    pub translation: String,
}

impl AnalysisEntry {
    /// Build a stub entry for `record`.
    ///
    /// The original title is kept so a stubbed row is distinguishable from
    /// "translated to empty string" and the affected titles can be collected
    /// into a new, smaller input without cross-referencing the log.
    pub fn stub(record: &TitleRecord) -> Self {
        Self {
            book_id: record.book_id.clone(),
            original: record.title.clone(),
            corrected: String::new(),
            analysis: LinguisticAnalysis::default(),
            translation: String::new(),
        }
    }

    /// Returns `true` when this entry carries no model output at all.
    pub fn is_stub(&self) -> bool {
        self.corrected.is_empty() && self.translation.is_empty() && self.analysis.is_empty()
    }
}

// ---------------------------------------------------------------------------
// ReplyEntry  (wire shape)
// ---------------------------------------------------------------------------

/// One object of the model's reply array.  Every field defaults to empty so
/// a reply that drops a field still decodes — a typed decode, not
/// optional-field probing of a loose value.
#[derive(Debug, Deserialize)]
struct ReplyEntry {
    #[serde(default)]
    original: String,
    #[serde(default)]
    corrected: String,
    #[serde(default)]
    analysis: LinguisticAnalysis,
    #[serde(default)]
    translation: String,
}

// ---------------------------------------------------------------------------
// ReconcileError
// ---------------------------------------------------------------------------

/// Why a reply could not be reconciled with its batch.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// The reply is not a valid JSON array of entry objects.
    #[error("model reply is not a valid JSON entry array: {0}")]
    InvalidJson(String),

    /// The reply parsed but its length does not allow one-to-one pairing.
    #[error("model reply has {got} entries but the batch has {expected}")]
    LengthMismatch { got: usize, expected: usize },
}

// ---------------------------------------------------------------------------
// reconcile
// ---------------------------------------------------------------------------

/// Reconcile `raw` against `batch`, always returning exactly
/// `batch.len()` entries.
///
/// On success, entry *i* takes the identifier of batch record *i*.  On any
/// failure the whole batch becomes stubs and the raw reply is logged at
/// `error` level.  This function never fails the run.
pub fn reconcile(raw: &str, batch: &[TitleRecord]) -> Vec<AnalysisEntry> {
    match try_reconcile(raw, batch) {
        Ok(entries) => entries,
        Err(e) => {
            log::error!(
                "reconciliation failed ({e}); stubbing {} records. raw reply: {raw}",
                batch.len()
            );
            batch.iter().map(AnalysisEntry::stub).collect()
        }
    }
}

/// The fallible half of [`reconcile`], exposed so callers can distinguish a
/// degraded batch from a healthy one.
pub fn try_reconcile(
    raw: &str,
    batch: &[TitleRecord],
) -> Result<Vec<AnalysisEntry>, ReconcileError> {
    let parsed = decode_entries(raw)?;

    if parsed.len() != batch.len() {
        return Err(ReconcileError::LengthMismatch {
            got: parsed.len(),
            expected: batch.len(),
        });
    }

    Ok(parsed
        .into_iter()
        .zip(batch)
        .map(|(reply, record)| AnalysisEntry {
            book_id: record.book_id.clone(),
            original: reply.original,
            corrected: reply.corrected,
            analysis: reply.analysis,
            translation: reply.translation,
        })
        .collect())
}

/// Decode the reply, retrying on the outermost `[...]` slice when the model
/// wrapped the array in prose or a code fence.
fn decode_entries(raw: &str) -> Result<Vec<ReplyEntry>, ReconcileError> {
    match serde_json::from_str(raw) {
        Ok(entries) => Ok(entries),
        Err(first_err) => {
            if let Some(slice) = outermost_array(raw) {
                if let Ok(entries) = serde_json::from_str(slice) {
                    return Ok(entries);
                }
            }
            Err(ReconcileError::InvalidJson(first_err.to_string()))
        }
    }
}

/// The substring from the first `[` to the last `]`, if both exist in order.
fn outermost_array(raw: &str) -> Option<&str> {
    let start = raw.find('[')?;
    let end = raw.rfind(']')?;
    (end > start).then(|| &raw[start..=end])
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
