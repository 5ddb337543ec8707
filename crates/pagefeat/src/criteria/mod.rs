// ABOUTME: Criteria model: count and content criteria, text filters, and the ordered CriteriaSet.
// ABOUTME: Registration validates names and compiles expressions so extraction never sees bad config.

//! Criteria definitions.
//!
//! A [`CriteriaSet`] holds two ordered partitions: count criteria, which
//! produce an integer per document, and content criteria, which produce the
//! concatenated text of the matched nodes. Names are unique across both.
//!
//! Submodules:
//! - `compiled`: XPath and pattern compilation.
//! - `loader`: JSON configuration loading.

pub mod compiled;
pub mod loader;

use std::fmt;

use regex::Regex;

use crate::criteria::compiled::{compile_pattern, CompiledXPath};
use crate::error::ConfigError;

/// How a text filter pattern is applied to a node's text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    /// The pattern must match at the start of the text.
    Match,
    /// The pattern may match anywhere in the text.
    Search,
}

impl MatchMode {
    /// Parses the configuration spelling of a mode.
    pub fn parse(name: &str, mode: &str) -> Result<Self, ConfigError> {
        match mode {
            "match" => Ok(MatchMode::Match),
            "search" => Ok(MatchMode::Search),
            other => Err(ConfigError::InvalidMatchMode {
                name: name.to_string(),
                mode: other.to_string(),
            }),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MatchMode::Match => "match",
            MatchMode::Search => "search",
        }
    }
}

impl fmt::Display for MatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A regular expression applied to the text of each matched node.
#[derive(Debug, Clone)]
pub struct TextFilter {
    mode: MatchMode,
    pattern: String,
    regex: Regex,
}

impl TextFilter {
    /// Builds a filter for criterion `name`.
    pub fn new(name: &str, mode: MatchMode, pattern: &str) -> Result<Self, ConfigError> {
        let regex = compile_pattern(name, pattern, mode == MatchMode::Match)?;
        Ok(Self {
            mode,
            pattern: pattern.to_string(),
            regex,
        })
    }

    pub fn mode(&self) -> MatchMode {
        self.mode
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Returns true if `text` satisfies the pattern under this filter's mode.
    pub fn accepts(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

/// A named rule that counts the nodes matched by an XPath expression.
#[derive(Debug)]
pub struct CountCriterion {
    pub name: String,
    pub xpath: CompiledXPath,
    pub filter: Option<TextFilter>,
}

/// A named rule that concatenates the text of the nodes matched by an XPath expression.
#[derive(Debug)]
pub struct ContentCriterion {
    pub name: String,
    pub xpath: CompiledXPath,
}

/// Ordered collection of count and content criteria with unique names.
#[derive(Debug, Default)]
pub struct CriteriaSet {
    count: Vec<CountCriterion>,
    content: Vec<ContentCriterion>,
}

impl CriteriaSet {
    /// Creates an empty criteria set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if a criterion with this exact name exists in either partition.
    pub fn contains(&self, name: &str) -> bool {
        self.count.iter().any(|c| c.name == name) || self.content.iter().any(|c| c.name == name)
    }

    /// Adds a count criterion.
    ///
    /// `mode` and `pattern` must be given together. A mode other than
    /// `match` or `search` is rejected.
    pub fn add_count(
        &mut self,
        name: &str,
        xpath: Option<&str>,
        mode: Option<&str>,
        pattern: Option<&str>,
    ) -> Result<(), ConfigError> {
        self.ensure_unused(name)?;
        let xpath = xpath.ok_or_else(|| ConfigError::MissingXpath(name.to_string()))?;

        let filter = match (mode, pattern) {
            (None, None) => None,
            (Some(mode), Some(pattern)) => {
                let mode = MatchMode::parse(name, mode)?;
                Some(TextFilter::new(name, mode, pattern)?)
            }
            _ => return Err(ConfigError::IncompleteTextFilter(name.to_string())),
        };

        let xpath = CompiledXPath::compile(name, xpath)?;
        self.count.push(CountCriterion {
            name: name.to_string(),
            xpath,
            filter,
        });
        Ok(())
    }

    /// Adds a content criterion.
    pub fn add_content(&mut self, name: &str, xpath: Option<&str>) -> Result<(), ConfigError> {
        self.ensure_unused(name)?;
        let xpath = xpath.ok_or_else(|| ConfigError::MissingXpath(name.to_string()))?;
        let xpath = CompiledXPath::compile(name, xpath)?;
        self.content.push(ContentCriterion {
            name: name.to_string(),
            xpath,
        });
        Ok(())
    }

    fn ensure_unused(&self, name: &str) -> Result<(), ConfigError> {
        if self.contains(name) {
            return Err(ConfigError::DuplicateName(name.to_string()));
        }
        Ok(())
    }

    pub fn count_criteria(&self) -> &[CountCriterion] {
        &self.count
    }

    pub fn content_criteria(&self) -> &[ContentCriterion] {
        &self.content
    }

    /// Count criterion names followed by content criterion names, in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.count
            .iter()
            .map(|c| c.name.as_str())
            .chain(self.content.iter().map(|c| c.name.as_str()))
    }

    /// Total number of criteria across both partitions.
    pub fn len(&self) -> usize {
        self.count.len() + self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.count.is_empty() && self.content.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn names_are_count_then_content_in_insertion_order() {
        let mut set = CriteriaSet::new();
        set.add_content("title_text", Some("//title")).unwrap();
        set.add_count("num_forms", Some("//form"), None, None).unwrap();
        set.add_count("num_links", Some("//a"), None, None).unwrap();

        let names: Vec<&str> = set.names().collect();
        assert_eq!(names, vec!["num_forms", "num_links", "title_text"]);
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn duplicate_name_in_same_partition_is_rejected() {
        let mut set = CriteriaSet::new();
        set.add_count("num_forms", Some("//form"), None, None).unwrap();
        let err = set.add_count("num_forms", Some("//form"), None, None).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateName(ref n) if n == "num_forms"));
    }

    #[test]
    fn duplicate_name_across_partitions_is_rejected() {
        let mut set = CriteriaSet::new();
        set.add_content("title", Some("//title")).unwrap();
        let err = set.add_count("title", Some("//title"), None, None).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateName(_)));
    }

    #[test]
    fn non_empty_content_partition_does_not_block_new_names() {
        let mut set = CriteriaSet::new();
        set.add_content("title_text", Some("//title")).unwrap();
        set.add_count("num_forms", Some("//form"), None, None).unwrap();
        set.add_content("heading_text", Some("//h1")).unwrap();
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn missing_xpath_is_rejected() {
        let mut set = CriteriaSet::new();
        let err = set.add_count("no_xpath", None, None, None).unwrap_err();
        assert!(matches!(err, ConfigError::MissingXpath(_)));
        let err = set.add_content("no_xpath", None).unwrap_err();
        assert!(matches!(err, ConfigError::MissingXpath(_)));
    }

    #[test]
    fn half_defined_text_filter_is_rejected() {
        let mut set = CriteriaSet::new();
        let err = set
            .add_count("logins", Some("//a"), Some("search"), None)
            .unwrap_err();
        assert!(matches!(err, ConfigError::IncompleteTextFilter(_)));

        let err = set
            .add_count("logins", Some("//a"), None, Some("login"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::IncompleteTextFilter(_)));
        assert!(set.is_empty());
    }

    #[test]
    fn unknown_match_mode_is_rejected() {
        let mut set = CriteriaSet::new();
        let err = set
            .add_count("logins", Some("//a"), Some("fullmatch"), Some("login"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidMatchMode { ref mode, .. } if mode == "fullmatch"));
    }

    #[test]
    fn text_filter_modes() {
        let search = TextFilter::new("f", MatchMode::Search, "in").unwrap();
        assert!(search.accepts("Sign in"));
        assert!(!search.accepts("Sign up"));

        let anchored = TextFilter::new("f", MatchMode::Match, "Sign").unwrap();
        assert!(anchored.accepts("Sign in"));
        assert!(!anchored.accepts("Please Sign in"));
        assert_eq!(anchored.mode().to_string(), "match");
        assert_eq!(anchored.pattern(), "Sign");
    }
}
