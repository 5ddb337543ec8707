// ABOUTME: CSV serialization of feature rows with a header taken from feature_names().
// ABOUTME: Every row must carry exactly the declared names; missing or extra features are errors.

use std::io::Write;

use thiserror::Error;

use crate::row::FeatureRow;

/// Errors raised while writing rows.
#[derive(Debug, Error)]
pub enum OutputError {
    /// A row lacks a feature named in the header.
    #[error("row {row} is missing feature '{name}'")]
    MissingFeature { row: usize, name: String },

    /// A row carries a feature not named in the header.
    #[error("row {row} has undeclared feature '{name}'")]
    UndeclaredFeature { row: usize, name: String },

    /// A leading-column row was written with the wrong number of leading cells.
    #[error("row {row} has {got} leading cells, expected {expected}")]
    LeadingCells { row: usize, got: usize, expected: usize },

    #[error("csv write failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("csv flush failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Streams feature rows to CSV.
///
/// The header is written on construction. Optional leading columns (such as a
/// record label) come before the feature columns and are supplied per row.
pub struct CsvSink<W: Write> {
    writer: csv::Writer<W>,
    leading: usize,
    names: Vec<String>,
    written: usize,
}

impl<W: Write> CsvSink<W> {
    /// Creates a sink whose columns are exactly `names`.
    pub fn new(writer: W, names: &[String]) -> Result<Self, OutputError> {
        Self::with_leading_columns(writer, &[], names)
    }

    /// Creates a sink with `leading` columns before the feature columns.
    pub fn with_leading_columns(
        writer: W,
        leading: &[&str],
        names: &[String],
    ) -> Result<Self, OutputError> {
        let mut writer = csv::Writer::from_writer(writer);
        let header: Vec<&str> = leading
            .iter()
            .copied()
            .chain(names.iter().map(String::as_str))
            .collect();
        writer.write_record(&header)?;
        Ok(Self {
            writer,
            leading: leading.len(),
            names: names.to_vec(),
            written: 0,
        })
    }

    /// Writes one row with no leading cells.
    pub fn write_row(&mut self, row: &FeatureRow) -> Result<(), OutputError> {
        self.write_row_with(&[], row)
    }

    /// Writes one row preceded by `leading` cells.
    pub fn write_row_with(&mut self, leading: &[&str], row: &FeatureRow) -> Result<(), OutputError> {
        let index = self.written;
        if leading.len() != self.leading {
            return Err(OutputError::LeadingCells {
                row: index,
                got: leading.len(),
                expected: self.leading,
            });
        }
        if let Some(extra) = row.names().find(|n| !self.names.iter().any(|d| d == n)) {
            return Err(OutputError::UndeclaredFeature {
                row: index,
                name: extra.to_string(),
            });
        }

        let mut record: Vec<String> = leading.iter().map(|s| s.to_string()).collect();
        for name in &self.names {
            let value = row.get(name).ok_or_else(|| OutputError::MissingFeature {
                row: index,
                name: name.clone(),
            })?;
            record.push(value.to_string());
        }
        self.writer.write_record(&record)?;
        self.written += 1;
        Ok(())
    }

    /// Number of data rows written so far.
    pub fn rows_written(&self) -> usize {
        self.written
    }

    /// Flushes and returns the underlying writer.
    pub fn finish(self) -> Result<W, OutputError> {
        self.writer
            .into_inner()
            .map_err(|e| OutputError::Io(e.into_error()))
    }
}

/// Writes `rows` as CSV with header `names`, returning the number of rows written.
pub fn write_csv<W: Write>(writer: W, names: &[String], rows: &[FeatureRow]) -> Result<usize, OutputError> {
    let mut sink = CsvSink::new(writer, names)?;
    for row in rows {
        sink.write_row(row)?;
    }
    let written = sink.rows_written();
    sink.finish()?;
    Ok(written)
}
