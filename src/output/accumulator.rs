//! Result accumulation and checkpointed CSV output.
//!
//! [`ResultAccumulator`] owns the run's growing entry list and projects it
//! into three CSV views:
//!
//! | Projection   | Columns                                                        | Rows |
//! |--------------|----------------------------------------------------------------|------|
//! | translations | `Book_ID, Original, Translation`                               | all entries, stubs included |
//! | corrections  | `Book_ID, Original, Corrected`                                 | only entries where `corrected` is non-empty and differs from `original` |
//! | analysis     | `Book_ID, Original, Syntactic_Analysis, Lexical_Analysis, Particle_Analysis` | all entries, stubs included |
//!
//! Every write is a complete rewrite of the destination file, never an
//! append, so a checkpoint is always internally consistent.  Intermediate
//! checkpoints carry a `_partial_{n}` marker; the final save uses the
//! unmarked name and overwrites whatever the last checkpoint left there.
//! When no entry qualifies for the corrections projection, that file is not
//! written at all.

use serde::Serialize;
use thiserror::Error;

use crate::llm::AnalysisEntry;

// ---------------------------------------------------------------------------
// CheckpointError
// ---------------------------------------------------------------------------

/// A projection file could not be written.  Fatal to the run — there is no
/// point continuing a multi-hour run if results cannot be persisted.
#[derive(Debug, Error)]
#[error("cannot write {path}: {source}")]
pub struct CheckpointError {
    pub path: String,
    #[source]
    pub source: csv::Error,
}

// ---------------------------------------------------------------------------
// Row shapes
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct TranslationRow<'a> {
    #[serde(rename = "Book_ID")]
    book_id: &'a str,
    #[serde(rename = "Original")]
    original: &'a str,
    #[serde(rename = "Translation")]
    translation: &'a str,
}

#[derive(Serialize)]
struct CorrectionRow<'a> {
    #[serde(rename = "Book_ID")]
    book_id: &'a str,
    #[serde(rename = "Original")]
    original: &'a str,
    #[serde(rename = "Corrected")]
    corrected: &'a str,
}

#[derive(Serialize)]
struct AnalysisRow<'a> {
    #[serde(rename = "Book_ID")]
    book_id: &'a str,
    #[serde(rename = "Original")]
    original: &'a str,
    #[serde(rename = "Syntactic_Analysis")]
    syntax: &'a str,
    #[serde(rename = "Lexical_Analysis")]
    lexical: &'a str,
    #[serde(rename = "Particle_Analysis")]
    particles: &'a str,
}

// ---------------------------------------------------------------------------
// ResultAccumulator
// ---------------------------------------------------------------------------

/// Append-only collection of [`AnalysisEntry`] values for one run.
///
/// Exclusively owned by the pipeline driver; entries are appended in batch
/// order and never reordered or deduplicated.
#[derive(Debug, Default)]
pub struct ResultAccumulator {
    entries: Vec<AnalysisEntry>,
}

impl ResultAccumulator {
    /// Create an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one batch's entries, preserving their order.
    pub fn accumulate(&mut self, entries: Vec<AnalysisEntry>) {
        self.entries.extend(entries);
    }

    /// All accumulated entries, in processing order.
    pub fn entries(&self) -> &[AnalysisEntry] {
        &self.entries
    }

    /// Number of accumulated entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when nothing has been accumulated yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of stub entries (degraded batches) accumulated so far.
    pub fn stub_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_stub()).count()
    }

    // -----------------------------------------------------------------------
    // Checkpoint / finalize
    // -----------------------------------------------------------------------

    /// Write an intermediate checkpoint after `processed` records.
    ///
    /// Files are named `{base}_{projection}_partial_{processed}.csv`.
    pub fn checkpoint(&self, output_base: &str, processed: usize) -> Result<(), CheckpointError> {
        self.write_projections(output_base, &format!("_partial_{processed}"))
    }

    /// Write the final, unmarked projection files.
    ///
    /// Runs after the last batch (and on cancellation), so a canonical
    /// unmarked output exists after every run regardless of where the last
    /// checkpoint fell.
    pub fn finalize(&self, output_base: &str) -> Result<(), CheckpointError> {
        self.write_projections(output_base, "")
    }

    fn write_projections(&self, base: &str, suffix: &str) -> Result<(), CheckpointError> {
        let translations = format!("{base}_translations{suffix}.csv");
        write_rows(
            &translations,
            self.entries.iter().map(|e| TranslationRow {
                book_id: &e.book_id,
                original: &e.original,
                translation: &e.translation,
            }),
        )?;

        // Corrections only carry rows with a real change; when there are
        // none the file is skipped entirely.
        let corrections: Vec<CorrectionRow<'_>> = self
            .entries
            .iter()
            .filter(|e| !e.corrected.is_empty() && e.corrected != e.original)
            .map(|e| CorrectionRow {
                book_id: &e.book_id,
                original: &e.original,
                corrected: &e.corrected,
            })
            .collect();
        if !corrections.is_empty() {
            let path = format!("{base}_corrections{suffix}.csv");
            write_rows(&path, corrections.into_iter())?;
        }

        let analysis = format!("{base}_analysis{suffix}.csv");
        write_rows(
            &analysis,
            self.entries.iter().map(|e| AnalysisRow {
                book_id: &e.book_id,
                original: &e.original,
                syntax: &e.analysis.syntax,
                lexical: &e.analysis.lexical,
                particles: &e.analysis.particles,
            }),
        )?;

        log::debug!(
            "wrote {} entries to {base}_*{suffix}.csv",
            self.entries.len()
        );

        Ok(())
    }
}

/// Serialize `rows` to `path`, replacing any existing file.
fn write_rows<R: Serialize>(
    path: &str,
    rows: impl Iterator<Item = R>,
) -> Result<(), CheckpointError> {
    let wrap = |source: csv::Error| CheckpointError {
        path: path.to_string(),
        source,
    };

    let mut writer = csv::Writer::from_path(path).map_err(wrap)?;
    for row in rows {
        writer.serialize(row).map_err(wrap)?;
    }
    writer.flush().map_err(|e| wrap(csv::Error::from(e)))?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::LinguisticAnalysis;
    use crate::source::TitleRecord;
    use tempfile::tempdir;

    fn entry(id: &str, original: &str, corrected: &str, translation: &str) -> AnalysisEntry {
        AnalysisEntry {
            book_id: id.into(),
            original: original.into(),
            corrected: corrected.into(),
            analysis: LinguisticAnalysis {
                syntax: format!("syntax of {id}"),
                lexical: String::new(),
                particles: String::new(),
            },
            translation: translation.into(),
        }
    }

    fn stub(id: &str, title: &str) -> AnalysisEntry {
        AnalysisEntry::stub(&TitleRecord {
            book_id: id.into(),
            title: title.into(),
        })
    }

    fn read_rows(path: &str) -> Vec<csv::StringRecord> {
        let mut reader = csv::Reader::from_path(path).expect("open output");
        reader.records().map(|r| r.expect("row")).collect()
    }

    fn headers(path: &str) -> csv::StringRecord {
        let mut reader = csv::Reader::from_path(path).expect("open output");
        reader.headers().expect("headers").clone()
    }

    // -----------------------------------------------------------------------
    // Accumulation
    // -----------------------------------------------------------------------

    #[test]
    fn accumulate_preserves_batch_order() {
        let mut acc = ResultAccumulator::new();
        acc.accumulate(vec![entry("W1", "a", "", "t1"), entry("W2", "b", "", "t2")]);
        acc.accumulate(vec![entry("W3", "c", "", "t3")]);

        let ids: Vec<&str> = acc.entries().iter().map(|e| e.book_id.as_str()).collect();
        assert_eq!(ids, vec!["W1", "W2", "W3"]);
        assert_eq!(acc.len(), 3);
    }

    #[test]
    fn stub_count_counts_only_stubs() {
        let mut acc = ResultAccumulator::new();
        acc.accumulate(vec![entry("W1", "a", "", "t1"), stub("W2", "b")]);

        assert_eq!(acc.stub_count(), 1);
    }

    // -----------------------------------------------------------------------
    // Projections
    // -----------------------------------------------------------------------

    #[test]
    fn translations_include_every_entry_including_stubs() {
        let dir = tempdir().expect("temp dir");
        let base = dir.path().join("out").display().to_string();

        let mut acc = ResultAccumulator::new();
        acc.accumulate(vec![entry("W1", "a", "", "History"), stub("W2", "b")]);
        acc.finalize(&base).expect("finalize");

        let rows = read_rows(&format!("{base}_translations.csv"));
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[0][0], "W1");
        assert_eq!(&rows[0][2], "History");
        // Stub row: identifier and original present, translation empty.
        assert_eq!(&rows[1][0], "W2");
        assert_eq!(&rows[1][1], "b");
        assert_eq!(&rows[1][2], "");
    }

    #[test]
    fn translations_headers_match_convention() {
        let dir = tempdir().expect("temp dir");
        let base = dir.path().join("out").display().to_string();

        let mut acc = ResultAccumulator::new();
        acc.accumulate(vec![entry("W1", "a", "", "t")]);
        acc.finalize(&base).expect("finalize");

        let h = headers(&format!("{base}_translations.csv"));
        assert_eq!(h, csv::StringRecord::from(vec!["Book_ID", "Original", "Translation"]));
    }

    #[test]
    fn analysis_headers_match_convention() {
        let dir = tempdir().expect("temp dir");
        let base = dir.path().join("out").display().to_string();

        let mut acc = ResultAccumulator::new();
        acc.accumulate(vec![entry("W1", "a", "", "t")]);
        acc.finalize(&base).expect("finalize");

        let h = headers(&format!("{base}_analysis.csv"));
        assert_eq!(
            h,
            csv::StringRecord::from(vec![
                "Book_ID",
                "Original",
                "Syntactic_Analysis",
                "Lexical_Analysis",
                "Particle_Analysis"
            ])
        );
    }

    /// Corrections contain a row for X iff X has a non-empty correction that
    /// differs from the original.
    #[test]
    fn corrections_filter() {
        let dir = tempdir().expect("temp dir");
        let base = dir.path().join("out").display().to_string();

        let mut acc = ResultAccumulator::new();
        acc.accumulate(vec![
            entry("W1", "bod yig", "bod yig", "t1"), // unchanged — excluded
            entry("W2", "sgra sgyur", "sgra bsgyur", "t2"), // changed — included
            entry("W3", "dpal ldan", "", "t3"),      // empty — excluded
        ]);
        acc.finalize(&base).expect("finalize");

        let rows = read_rows(&format!("{base}_corrections.csv"));
        assert_eq!(rows.len(), 1);
        assert_eq!(&rows[0][0], "W2");
        assert_eq!(&rows[0][2], "sgra bsgyur");
    }

    /// When no entry qualifies, the corrections file is not written at all.
    #[test]
    fn corrections_file_absent_when_nothing_changed() {
        let dir = tempdir().expect("temp dir");
        let base = dir.path().join("out").display().to_string();

        let mut acc = ResultAccumulator::new();
        acc.accumulate(vec![entry("W1", "a", "a", "t1"), entry("W2", "b", "", "t2")]);
        acc.finalize(&base).expect("finalize");

        assert!(std::path::Path::new(&format!("{base}_translations.csv")).exists());
        assert!(!std::path::Path::new(&format!("{base}_corrections.csv")).exists());
    }

    // -----------------------------------------------------------------------
    // Checkpoint naming and overwrite
    // -----------------------------------------------------------------------

    #[test]
    fn checkpoint_files_carry_partial_marker() {
        let dir = tempdir().expect("temp dir");
        let base = dir.path().join("out").display().to_string();

        let mut acc = ResultAccumulator::new();
        acc.accumulate(vec![entry("W1", "a", "", "t")]);
        acc.checkpoint(&base, 10).expect("checkpoint");

        assert!(std::path::Path::new(&format!("{base}_translations_partial_10.csv")).exists());
        assert!(std::path::Path::new(&format!("{base}_analysis_partial_10.csv")).exists());
        // No unmarked files yet.
        assert!(!std::path::Path::new(&format!("{base}_translations.csv")).exists());
    }

    /// A checkpoint followed by a final write leaves exactly one unmarked
    /// file set reflecting the full accumulated results.
    #[test]
    fn final_write_reflects_full_result_set() {
        let dir = tempdir().expect("temp dir");
        let base = dir.path().join("out").display().to_string();

        let mut acc = ResultAccumulator::new();
        acc.accumulate(vec![entry("W1", "a", "", "t1")]);
        acc.checkpoint(&base, 1).expect("checkpoint");

        acc.accumulate(vec![entry("W2", "b", "", "t2")]);
        acc.finalize(&base).expect("finalize");

        let partial = read_rows(&format!("{base}_translations_partial_1.csv"));
        assert_eq!(partial.len(), 1);

        let final_rows = read_rows(&format!("{base}_translations.csv"));
        assert_eq!(final_rows.len(), 2);
        assert_eq!(&final_rows[1][0], "W2");
    }

    /// Each write is a total rewrite, not an append.
    #[test]
    fn rewrite_replaces_previous_content() {
        let dir = tempdir().expect("temp dir");
        let base = dir.path().join("out").display().to_string();

        let mut acc = ResultAccumulator::new();
        acc.accumulate(vec![entry("W1", "a", "", "t1")]);
        acc.finalize(&base).expect("first write");

        acc.accumulate(vec![entry("W2", "b", "", "t2")]);
        acc.finalize(&base).expect("second write");

        let rows = read_rows(&format!("{base}_translations.csv"));
        assert_eq!(rows.len(), 2, "second write must replace, not append to, the first");
    }

    #[test]
    fn empty_accumulator_still_writes_projection_files() {
        let dir = tempdir().expect("temp dir");
        let base = dir.path().join("out").display().to_string();

        ResultAccumulator::new().finalize(&base).expect("finalize");

        assert!(std::path::Path::new(&format!("{base}_translations.csv")).exists());
        let rows = read_rows(&format!("{base}_translations.csv"));
        assert!(rows.is_empty());
    }

    #[test]
    fn unwritable_destination_is_an_error() {
        let mut acc = ResultAccumulator::new();
        acc.accumulate(vec![entry("W1", "a", "", "t")]);

        let err = acc
            .finalize("/nonexistent-dir/deep/out")
            .expect_err("must fail");
        assert!(err.to_string().contains("_translations"));
    }
}
