// ABOUTME: Compilation of XPath expressions and text-filter patterns at registration time.
// ABOUTME: Invalid expressions surface as ConfigError before any document is processed.

use regex::Regex;
use sxd_xpath::{Factory, XPath};

use crate::error::ConfigError;

/// A compiled XPath expression together with its source text.
pub struct CompiledXPath {
    source: String,
    xpath: XPath,
}

impl CompiledXPath {
    /// Compiles `expr` for the criterion `name`.
    pub fn compile(name: &str, expr: &str) -> Result<Self, ConfigError> {
        if expr.trim().is_empty() {
            return Err(ConfigError::MissingXpath(name.to_string()));
        }

        let factory = Factory::new();
        let xpath = factory
            .build(expr)
            .map_err(|e| ConfigError::InvalidXpath {
                name: name.to_string(),
                xpath: expr.to_string(),
                reason: e.to_string(),
            })?
            .ok_or_else(|| ConfigError::MissingXpath(name.to_string()))?;

        Ok(Self {
            source: expr.to_string(),
            xpath,
        })
    }

    /// The expression as written in the configuration.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub(crate) fn xpath(&self) -> &XPath {
        &self.xpath
    }
}

impl std::fmt::Debug for CompiledXPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("CompiledXPath").field(&self.source).finish()
    }
}

/// Compiles a text filter pattern. `match` mode gets a start-anchored variant.
pub(crate) fn compile_pattern(name: &str, pattern: &str, anchored: bool) -> Result<Regex, ConfigError> {
    let plain = Regex::new(pattern).map_err(|source| ConfigError::InvalidPattern {
        name: name.to_string(),
        source,
    })?;
    if !anchored {
        return Ok(plain);
    }

    Regex::new(&format!(r"\A(?:{})", pattern)).map_err(|source| ConfigError::InvalidPattern {
        name: name.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compiles_valid_xpath() {
        let compiled = CompiledXPath::compile("num_forms", "//form").unwrap();
        assert_eq!(compiled.as_str(), "//form");
    }

    #[test]
    fn rejects_invalid_xpath() {
        let err = CompiledXPath::compile("broken", "//form[").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidXpath { ref name, .. } if name == "broken"));
    }

    #[test]
    fn rejects_blank_xpath() {
        let err = CompiledXPath::compile("blank", "   ").unwrap_err();
        assert!(matches!(err, ConfigError::MissingXpath(ref name) if name == "blank"));
    }

    #[test]
    fn anchored_pattern_only_matches_at_start() {
        let re = compile_pattern("p", "log ?in", true).unwrap();
        assert!(re.is_match("Log in".to_lowercase().as_str()));
        assert!(!re.is_match("please log in"));

        let re = compile_pattern("p", "log ?in", false).unwrap();
        assert!(re.is_match("please log in"));
    }

    #[test]
    fn anchoring_respects_alternation() {
        let re = compile_pattern("p", "foo|bar", true).unwrap();
        assert!(re.is_match("bar baz"));
        assert!(!re.is_match("baz bar"));
    }

    #[test]
    fn rejects_invalid_pattern() {
        let err = compile_pattern("p", "(unclosed", false).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPattern { .. }));
    }
}
