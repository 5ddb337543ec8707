// ABOUTME: FeatureExtractor: owns a CriteriaSet, declared meta feature names, and the accumulated rows.
// ABOUTME: Provides registration, feature_names(), pure extract(), and accumulate() over text/bytes/readers/files.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use tracing::debug;

use crate::criteria::loader::merge_criteria_file;
use crate::criteria::CriteriaSet;
use crate::document::{DocumentSource, ParsedDocument};
use crate::error::{ConfigError, ExtractError};
use crate::evaluate::extract_features;
use crate::row::{FeatureRow, FeatureValue};

/// Meta values supplied alongside a document, in the order given.
pub type MetaValues<'a> = &'a [(&'a str, &'a str)];

/// Applies a criteria set to documents and accumulates one row per document.
///
/// The row list is owned by the extractor; sharing one across threads needs
/// external synchronization. Use [`FeatureExtractor::extract`] or
/// [`crate::evaluate::extract_features`] where no accumulation is wanted.
#[derive(Debug, Default)]
pub struct FeatureExtractor {
    criteria: CriteriaSet,
    meta_features: Vec<String>,
    rows: Vec<FeatureRow>,
}

impl FeatureExtractor {
    /// Creates an extractor with no criteria and no meta features.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an extractor declaring the given meta feature names.
    pub fn with_meta_features<I, S>(names: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut extractor = Self::new();
        for name in names {
            extractor.add_meta_feature(name.as_ref())?;
        }
        Ok(extractor)
    }

    /// Creates an extractor from an existing criteria set.
    pub fn from_criteria(criteria: CriteriaSet) -> Self {
        Self {
            criteria,
            ..Self::default()
        }
    }

    /// Loads criteria from `path` and declares `meta_features`.
    pub fn from_config_file<I, S>(path: impl AsRef<Path>, meta_features: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut extractor = Self::new();
        extractor.load_criteria_file(path)?;
        for name in meta_features {
            extractor.add_meta_feature(name.as_ref())?;
        }
        Ok(extractor)
    }

    /// Merges the criteria from the configuration file at `path`.
    pub fn load_criteria_file(&mut self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        merge_criteria_file(&mut self.criteria, path)?;
        self.ensure_meta_disjoint()
    }

    /// Declares a meta feature name. Re-declaring an existing meta name is a no-op.
    pub fn add_meta_feature(&mut self, name: &str) -> Result<(), ConfigError> {
        if self.criteria.contains(name) {
            return Err(ConfigError::DuplicateName(name.to_string()));
        }
        if !self.meta_features.iter().any(|m| m == name) {
            self.meta_features.push(name.to_string());
        }
        Ok(())
    }

    /// Registers a count criterion; `mode` and `pattern` go together.
    pub fn register_count_criterion(
        &mut self,
        name: &str,
        xpath: &str,
        mode: Option<&str>,
        pattern: Option<&str>,
    ) -> Result<(), ConfigError> {
        self.ensure_not_meta(name)?;
        self.criteria.add_count(name, Some(xpath), mode, pattern)
    }

    /// Registers a content criterion.
    pub fn register_content_criterion(&mut self, name: &str, xpath: &str) -> Result<(), ConfigError> {
        self.ensure_not_meta(name)?;
        self.criteria.add_content(name, Some(xpath))
    }

    fn ensure_not_meta(&self, name: &str) -> Result<(), ConfigError> {
        if self.meta_features.iter().any(|m| m == name) {
            return Err(ConfigError::DuplicateName(name.to_string()));
        }
        Ok(())
    }

    fn ensure_meta_disjoint(&self) -> Result<(), ConfigError> {
        match self.meta_features.iter().find(|m| self.criteria.contains(m)) {
            Some(name) => Err(ConfigError::DuplicateName(name.clone())),
            None => Ok(()),
        }
    }

    pub fn criteria(&self) -> &CriteriaSet {
        &self.criteria
    }

    pub fn meta_features(&self) -> &[String] {
        &self.meta_features
    }

    /// Meta feature names, then count criterion names, then content criterion names.
    pub fn feature_names(&self) -> Vec<String> {
        self.meta_features
            .iter()
            .map(String::as_str)
            .chain(self.criteria.names())
            .map(str::to_string)
            .collect()
    }

    /// Extracts one row from a parsed document without accumulating it.
    pub fn extract(&self, doc: &ParsedDocument) -> Result<FeatureRow, ExtractError> {
        extract_features(&self.criteria, doc)
    }

    /// Normalizes `source`, extracts a row, merges `meta`, and appends the row.
    pub fn accumulate<'s>(
        &mut self,
        source: impl Into<DocumentSource<'s>>,
        meta: MetaValues<'_>,
    ) -> Result<&FeatureRow, ExtractError> {
        let doc = source.into().parse()?;
        let extracted = self.extract(&doc)?;
        let mut row = FeatureRow::new();
        for (name, value) in meta {
            if self.criteria.contains(name) {
                return Err(ExtractError::meta("accumulate", *name));
            }
            row.insert(*name, FeatureValue::from(*value));
        }
        row.extend(extracted);
        debug!(features = row.len(), rows = self.rows.len() + 1, "accumulated row");
        self.rows.push(row);
        Ok(&self.rows[self.rows.len() - 1])
    }

    pub fn accumulate_str(&mut self, html: &str, meta: MetaValues<'_>) -> Result<&FeatureRow, ExtractError> {
        self.accumulate(DocumentSource::Text(html), meta)
    }

    pub fn accumulate_bytes(&mut self, bytes: &[u8], meta: MetaValues<'_>) -> Result<&FeatureRow, ExtractError> {
        self.accumulate(DocumentSource::Bytes(bytes), meta)
    }

    pub fn accumulate_reader(
        &mut self,
        reader: impl Read,
        meta: MetaValues<'_>,
    ) -> Result<&FeatureRow, ExtractError> {
        self.accumulate(DocumentSource::reader(reader), meta)
    }

    /// Opens the file at `path` and accumulates it.
    pub fn accumulate_file(
        &mut self,
        path: impl AsRef<Path>,
        meta: MetaValues<'_>,
    ) -> Result<&FeatureRow, ExtractError> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|e| ExtractError::read("open", path.display().to_string(), e))?;
        self.accumulate_reader(BufReader::new(file), meta)
    }

    /// Rows accumulated so far, in insertion order.
    pub fn rows(&self) -> &[FeatureRow] {
        &self.rows
    }

    /// Drains the accumulated rows.
    pub fn take_rows(&mut self) -> Vec<FeatureRow> {
        std::mem::take(&mut self.rows)
    }
}
