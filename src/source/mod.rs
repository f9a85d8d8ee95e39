//! Title catalog loading.
//!
//! [`load_titles`] reads an ordered sequence of [`TitleRecord`]s from a CSV
//! catalog.  The two columns it needs — a stable record identifier and the
//! Tibetan title text — are named in [`SourceConfig`], so catalogs with
//! different header conventions work without preprocessing.
//!
//! Catalog order is significant: it is preserved through batching and into
//! the output files, so a curator can line results up against the source.

use std::path::Path;

use thiserror::Error;

use crate::config::SourceConfig;

// ---------------------------------------------------------------------------
// TitleRecord
// ---------------------------------------------------------------------------

/// One catalog row: a stable book identifier plus the title text.
///
/// Immutable once read.  The title passes through the pipeline unchanged —
/// any transliteration happens outside this tool, before the catalog is
/// written.
#[derive(Debug, Clone, PartialEq)]
pub struct TitleRecord {
    /// Opaque stable key.  Uniqueness is assumed but not enforced.
    pub book_id: String,
    /// Tibetan title text (Wylie or native script).
    pub title: String,
}

// ---------------------------------------------------------------------------
// SourceError
// ---------------------------------------------------------------------------

/// Errors that can occur while reading the title catalog.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The catalog file could not be opened.
    #[error("cannot open title catalog {path}: {source}")]
    Unavailable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The catalog header lacks a required column.
    #[error("required column '{0}' not found in catalog header")]
    MissingColumn(String),

    /// A data row could not be parsed.
    #[error("malformed catalog row {row}: {source}")]
    Malformed {
        row: usize,
        #[source]
        source: csv::Error,
    },
}

// ---------------------------------------------------------------------------
// load_titles
// ---------------------------------------------------------------------------

/// Read at most `limit` [`TitleRecord`]s from the CSV catalog at `path`.
///
/// Rows are returned in file order.  Rows beyond `limit` are not read at
/// all, so a small trial run over a large catalog stays cheap.
///
/// # Errors
///
/// - [`SourceError::Unavailable`]   — the file cannot be opened.
/// - [`SourceError::MissingColumn`] — a configured column is absent.
/// - [`SourceError::Malformed`]     — a data row fails to parse.
pub fn load_titles(
    path: &Path,
    config: &SourceConfig,
    limit: usize,
) -> Result<Vec<TitleRecord>, SourceError> {
    let file = std::fs::File::open(path).map_err(|source| SourceError::Unavailable {
        path: path.display().to_string(),
        source,
    })?;

    let mut reader = csv::Reader::from_reader(file);

    let headers = reader
        .headers()
        .map_err(|source| SourceError::Malformed { row: 0, source })?;

    let id_idx = column_index(headers, &config.id_column)
        .ok_or_else(|| SourceError::MissingColumn(config.id_column.clone()))?;
    let title_idx = column_index(headers, &config.title_column)
        .ok_or_else(|| SourceError::MissingColumn(config.title_column.clone()))?;

    let mut records = Vec::new();
    for (row, result) in reader.records().enumerate() {
        if records.len() >= limit {
            break;
        }
        let record = result.map_err(|source| SourceError::Malformed { row: row + 1, source })?;
        records.push(TitleRecord {
            book_id: record.get(id_idx).unwrap_or_default().to_string(),
            title: record.get(title_idx).unwrap_or_default().to_string(),
        });
    }

    log::debug!(
        "loaded {} title records from {} (limit {limit})",
        records.len(),
        path.display()
    );

    Ok(records)
}

fn column_index(headers: &csv::StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|h| h == name)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write_catalog(content: &str) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("titles.csv");
        std::fs::write(&path, content).unwrap();
        (dir, path)
    }

    #[test]
    fn loads_records_in_catalog_order() {
        let (_dir, path) = write_catalog(
            "book_id,tibetan_title\n\
             W100,bod kyi lo rgyus\n\
             W101,sgra sgyur gyi rnam bshad\n\
             W102,chos 'byung me tog snying po\n",
        );

        let records = load_titles(&path, &SourceConfig::default(), 100).expect("load");

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].book_id, "W100");
        assert_eq!(records[0].title, "bod kyi lo rgyus");
        assert_eq!(records[1].book_id, "W101");
        assert_eq!(records[2].book_id, "W102");
    }

    #[test]
    fn limit_truncates_to_first_rows() {
        let (_dir, path) = write_catalog(
            "book_id,tibetan_title\n\
             W100,a\n\
             W101,b\n\
             W102,c\n",
        );

        let records = load_titles(&path, &SourceConfig::default(), 2).expect("load");

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].book_id, "W100");
        assert_eq!(records[1].book_id, "W101");
    }

    #[test]
    fn custom_column_names() {
        let (_dir, path) = write_catalog(
            "W_number,title_wylie,shelf\n\
             W9,dpal ldan,3a\n",
        );

        let config = SourceConfig {
            id_column: "W_number".into(),
            title_column: "title_wylie".into(),
        };
        let records = load_titles(&path, &config, 10).expect("load");

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].book_id, "W9");
        assert_eq!(records[0].title, "dpal ldan");
    }

    #[test]
    fn native_script_titles_pass_through_unchanged() {
        let (_dir, path) = write_catalog(
            "book_id,tibetan_title\n\
             W1,བོད་ཀྱི་ལོ་རྒྱུས\n",
        );

        let records = load_titles(&path, &SourceConfig::default(), 10).expect("load");
        assert_eq!(records[0].title, "བོད་ཀྱི་ལོ་རྒྱུས");
    }

    #[test]
    fn missing_id_column_is_an_error() {
        let (_dir, path) = write_catalog("identifier,tibetan_title\nW1,a\n");

        let err = load_titles(&path, &SourceConfig::default(), 10).expect_err("must fail");
        assert!(matches!(err, SourceError::MissingColumn(c) if c == "book_id"));
    }

    #[test]
    fn missing_title_column_is_an_error() {
        let (_dir, path) = write_catalog("book_id,title\nW1,a\n");

        let err = load_titles(&path, &SourceConfig::default(), 10).expect_err("must fail");
        assert!(matches!(err, SourceError::MissingColumn(c) if c == "tibetan_title"));
    }

    #[test]
    fn missing_file_is_unavailable() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("nonexistent.csv");

        let err = load_titles(&path, &SourceConfig::default(), 10).expect_err("must fail");
        assert!(matches!(err, SourceError::Unavailable { .. }));
    }

    #[test]
    fn empty_catalog_yields_no_records() {
        let (_dir, path) = write_catalog("book_id,tibetan_title\n");

        let records = load_titles(&path, &SourceConfig::default(), 10).expect("load");
        assert!(records.is_empty());
    }
}
