// ABOUTME: Stateless pipeline over `<base64 payload>,<label>` records, optionally gzip-compressed.
// ABOUTME: Each record decodes to a document and yields a labeled feature row; nothing is accumulated.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use flate2::read::MultiGzDecoder;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::criteria::CriteriaSet;
use crate::document::ParsedDocument;
use crate::error::ExtractError;
use crate::evaluate::extract_features;
use crate::row::FeatureRow;

/// Errors for a single pipeline record or input.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("line {line}: record has no ',' separating payload and label")]
    MissingLabel { line: usize },

    #[error("line {line}: payload is not valid base64: {source}")]
    Base64 {
        line: usize,
        #[source]
        source: base64::DecodeError,
    },

    #[error("line {line} ({label}): {source}")]
    Extract {
        line: usize,
        label: String,
        #[source]
        source: ExtractError,
    },

    #[error("failed to read input: {0}")]
    Io(#[from] io::Error),
}

/// A decoded record: document bytes plus an opaque label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedRecord {
    pub line: usize,
    pub payload: Vec<u8>,
    pub label: String,
}

/// A feature row paired with the label of the record it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabeledRow {
    pub label: String,
    pub features: FeatureRow,
}

/// Splits `text` at the first comma and decodes the payload.
///
/// `line` is the 1-based line number used in error messages.
pub fn decode_record(line: usize, text: &str) -> Result<EncodedRecord, PipelineError> {
    let (payload, label) = text
        .split_once(',')
        .ok_or(PipelineError::MissingLabel { line })?;
    let payload = STANDARD
        .decode(payload.trim())
        .map_err(|source| PipelineError::Base64 { line, source })?;
    Ok(EncodedRecord {
        line,
        payload,
        label: label.trim_end_matches(['\r', '\n']).to_string(),
    })
}

/// Extracts features from one decoded record.
pub fn extract_record(criteria: &CriteriaSet, record: EncodedRecord) -> Result<LabeledRow, PipelineError> {
    let wrap = |source| PipelineError::Extract {
        line: record.line,
        label: record.label.clone(),
        source,
    };
    let doc = ParsedDocument::parse_bytes(&record.payload).map_err(wrap)?;
    let features = extract_features(criteria, &doc).map_err(wrap)?;
    debug!(line = record.line, label = %record.label, "extracted record");
    Ok(LabeledRow {
        label: record.label,
        features,
    })
}

/// Opens an input file, gunzipping it when the name ends in `.gz`.
pub fn open_input(path: impl AsRef<Path>) -> io::Result<Box<dyn BufRead>> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let gz = path.extension().is_some_and(|ext| ext == "gz");
    let reader: Box<dyn Read> = if gz {
        Box::new(MultiGzDecoder::new(file))
    } else {
        Box::new(file)
    };
    Ok(Box::new(BufReader::new(reader)))
}

/// Lazily decodes and extracts every non-blank line of `input`.
pub fn run_lines<'c, R: BufRead + 'c>(
    criteria: &'c CriteriaSet,
    input: R,
) -> impl Iterator<Item = Result<LabeledRow, PipelineError>> + 'c {
    input
        .lines()
        .enumerate()
        .filter(|(_, line)| line.as_ref().map_or(true, |l| !l.trim().is_empty()))
        .map(move |(index, line)| {
            let line_text = line?;
            let record = decode_record(index + 1, &line_text)?;
            extract_record(criteria, record)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::criteria::loader::load_criteria_str;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    fn criteria() -> CriteriaSet {
        load_criteria_str(
            r#"{
                "features_to_count": [{"name": "num_forms", "xpath": "//form"}],
                "text_to_extract": [{"name": "title_text", "xpath": "//title"}]
            }"#,
        )
        .unwrap()
    }

    fn encode(html: &str, label: &str) -> String {
        format!("{},{}", STANDARD.encode(html), label)
    }

    #[test]
    fn decodes_payload_and_label() {
        let record = decode_record(1, &encode("<p>x</p>", "10.0.0.1:80")).unwrap();
        assert_eq!(record.payload, b"<p>x</p>");
        assert_eq!(record.label, "10.0.0.1:80");
    }

    #[test]
    fn label_may_contain_commas() {
        let record = decode_record(1, &encode("<p>x</p>", "a,b")).unwrap();
        assert_eq!(record.label, "a,b");
    }

    #[test]
    fn rejects_missing_label_and_bad_base64() {
        assert!(matches!(
            decode_record(3, "PGgxPg=="),
            Err(PipelineError::MissingLabel { line: 3 })
        ));
        assert!(matches!(
            decode_record(4, "not base64!,x"),
            Err(PipelineError::Base64 { line: 4, .. })
        ));
    }

    #[test]
    fn run_lines_yields_labeled_rows_and_errors() {
        let input = [
            encode("<title>Hello</title><form></form><form></form>", "host-a"),
            String::new(),
            "garbage".to_string(),
            encode("<title>Other</title>", "host-b"),
        ]
        .join("\n");

        let criteria = criteria();
        let results: Vec<_> = run_lines(&criteria, input.as_bytes()).collect();
        assert_eq!(results.len(), 3);

        let first = results[0].as_ref().unwrap();
        assert_eq!(first.label, "host-a");
        assert_eq!(first.features.count("num_forms"), Some(2));
        assert_eq!(first.features.text("title_text"), Some("Hello"));
        assert_eq!(first.features.len(), 2);

        assert!(matches!(results[1], Err(PipelineError::MissingLabel { line: 3 })));
        assert_eq!(results[2].as_ref().unwrap().label, "host-b");
    }

    #[test]
    fn empty_payload_is_an_extract_error() {
        let criteria = criteria();
        let line = format!(",{}", "host-c");
        let err = run_lines(&criteria, line.as_bytes()).next().unwrap().unwrap_err();
        match err {
            PipelineError::Extract { label, source, .. } => {
                assert_eq!(label, "host-c");
                assert!(source.is_empty());
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn reads_gzip_input() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("part-0000.gz");
        let mut gz = GzEncoder::new(File::create(&path).unwrap(), Compression::default());
        writeln!(gz, "{}", encode("<form></form>", "gz-host")).unwrap();
        gz.finish().unwrap();

        let criteria = criteria();
        let rows: Vec<LabeledRow> = run_lines(&criteria, open_input(&path).unwrap())
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].label, "gz-host");
        assert_eq!(rows[0].features.count("num_forms"), Some(1));
    }
}
