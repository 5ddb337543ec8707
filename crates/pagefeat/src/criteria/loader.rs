// ABOUTME: Loader for criteria configuration documents in JSON form.
// ABOUTME: Provides load_criteria_file / load_criteria_str and merging into an existing CriteriaSet.

//! Criteria configuration loader.
//!
//! The configuration document has two lists:
//!
//! ```json
//! {
//!   "features_to_count": [
//!     {"name": "num_forms", "xpath": "//form"},
//!     {"name": "login_links", "xpath": "//a", "text_re_mode": "search", "text_re_pattern": "(?i)log ?in"}
//!   ],
//!   "text_to_extract": [
//!     {"name": "title_text", "xpath": "//title"}
//!   ]
//! }
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::criteria::CriteriaSet;
use crate::error::ConfigError;

/// One entry of `features_to_count`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CountCriterionDef {
    pub name: String,
    #[serde(default)]
    pub xpath: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_re_mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_re_pattern: Option<String>,
}

/// One entry of `text_to_extract`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ContentCriterionDef {
    pub name: String,
    #[serde(default)]
    pub xpath: Option<String>,
}

/// The full configuration document.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CriteriaConfig {
    #[serde(default)]
    pub features_to_count: Vec<CountCriterionDef>,
    #[serde(default)]
    pub text_to_extract: Vec<ContentCriterionDef>,
}

impl CriteriaConfig {
    /// Registers every definition into `set`, stopping at the first invalid one.
    pub fn apply(&self, set: &mut CriteriaSet) -> Result<(), ConfigError> {
        for def in &self.features_to_count {
            set.add_count(
                &def.name,
                def.xpath.as_deref(),
                def.text_re_mode.as_deref(),
                def.text_re_pattern.as_deref(),
            )?;
        }
        for def in &self.text_to_extract {
            set.add_content(&def.name, def.xpath.as_deref())?;
        }
        Ok(())
    }
}

/// Parses a configuration document and merges it into `set`.
pub fn merge_criteria_str(set: &mut CriteriaSet, json: &str) -> Result<(), ConfigError> {
    let config: CriteriaConfig = serde_json::from_str(json)?;
    config.apply(set)?;
    debug!(
        count = config.features_to_count.len(),
        content = config.text_to_extract.len(),
        "loaded criteria"
    );
    Ok(())
}

/// Reads the configuration file at `path` and merges it into `set`.
pub fn merge_criteria_file(set: &mut CriteriaSet, path: impl AsRef<Path>) -> Result<(), ConfigError> {
    let path = path.as_ref();
    let json = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    merge_criteria_str(set, &json)
}

/// Builds a new criteria set from a configuration document.
pub fn load_criteria_str(json: &str) -> Result<CriteriaSet, ConfigError> {
    let mut set = CriteriaSet::new();
    merge_criteria_str(&mut set, json)?;
    Ok(set)
}

/// Builds a new criteria set from the configuration file at `path`.
pub fn load_criteria_file(path: impl AsRef<Path>) -> Result<CriteriaSet, ConfigError> {
    let mut set = CriteriaSet::new();
    merge_criteria_file(&mut set, path)?;
    Ok(set)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const CONFIG: &str = r#"{
        "features_to_count": [
            {"name": "num_forms", "xpath": "//form"},
            {"name": "login_links", "xpath": "//a", "text_re_mode": "search", "text_re_pattern": "(?i)log ?in"}
        ],
        "text_to_extract": [
            {"name": "title_text", "xpath": "//title"}
        ]
    }"#;

    #[test]
    fn loads_both_partitions() {
        let set = load_criteria_str(CONFIG).unwrap();
        let names: Vec<&str> = set.names().collect();
        assert_eq!(names, vec!["num_forms", "login_links", "title_text"]);

        let login = &set.count_criteria()[1];
        let filter = login.filter.as_ref().unwrap();
        assert_eq!(filter.mode().as_str(), "search");
        assert_eq!(filter.pattern(), "(?i)log ?in");
        assert!(set.count_criteria()[0].filter.is_none());
    }

    #[test]
    fn duplicate_count_names_fail() {
        let json = r#"{
            "features_to_count": [
                {"name": "num_forms", "xpath": "//form"},
                {"name": "num_forms", "xpath": "//form[@method='post']"}
            ],
            "text_to_extract": []
        }"#;
        let err = load_criteria_str(json).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateName(ref n) if n == "num_forms"));
    }

    #[test]
    fn missing_xpath_fails() {
        let json = r#"{"features_to_count": [{"name": "x"}]}"#;
        let err = load_criteria_str(json).unwrap_err();
        assert!(matches!(err, ConfigError::MissingXpath(_)));
    }

    #[test]
    fn missing_lists_default_to_empty() {
        let set = load_criteria_str(r#"{"text_to_extract": [{"name": "t", "xpath": "//title"}]}"#).unwrap();
        assert_eq!(set.len(), 1);
        let set = load_criteria_str("{}").unwrap();
        assert!(set.is_empty());
    }

    #[test]
    fn malformed_json_fails() {
        let err = load_criteria_str("{ not json").unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = load_criteria_file("/nonexistent/features.json").unwrap_err();
        match err {
            ConfigError::Io { path, .. } => assert_eq!(path, "/nonexistent/features.json"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn merge_collides_with_existing_names() {
        let mut set = load_criteria_str(CONFIG).unwrap();
        let err = merge_criteria_str(
            &mut set,
            r#"{"text_to_extract": [{"name": "num_forms", "xpath": "//form"}]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateName(_)));
    }
}
