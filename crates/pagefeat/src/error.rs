// ABOUTME: Error types for criteria configuration and per-document extraction.
// ABOUTME: ConfigError is fatal at setup; ExtractError carries an ErrorCode and is recoverable per document.

use std::fmt;
use std::io;

use thiserror::Error;

/// Errors raised while building a criteria set. These are fatal at setup time.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read criteria config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    /// The configuration document is not valid JSON for the expected shape.
    #[error("invalid criteria config: {0}")]
    Json(#[from] serde_json::Error),

    /// A criterion or meta feature with this name already exists.
    #[error("there is already a feature named '{0}'")]
    DuplicateName(String),

    /// The criterion has no XPath expression.
    #[error("an XPath expression is required for criterion '{0}'")]
    MissingXpath(String),

    /// The XPath expression failed to compile.
    #[error("invalid XPath for criterion '{name}' ({xpath}): {reason}")]
    InvalidXpath {
        name: String,
        xpath: String,
        reason: String,
    },

    /// Only one of text_re_mode / text_re_pattern was given.
    #[error("text_re_mode and text_re_pattern must both be defined or both omitted for '{0}'")]
    IncompleteTextFilter(String),

    /// text_re_mode is not one of the recognized values.
    #[error("text_re_mode for '{name}' should be 'match' or 'search', got '{mode}'")]
    InvalidMatchMode { name: String, mode: String },

    /// text_re_pattern is not a valid regular expression.
    #[error("invalid text_re_pattern for '{name}': {source}")]
    InvalidPattern {
        name: String,
        #[source]
        source: regex::Error,
    },
}

/// Error codes for document-level extraction failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    Read,
    Empty,
    Evaluate,
    Meta,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::Read => "read error",
            ErrorCode::Empty => "empty document",
            ErrorCode::Evaluate => "evaluation error",
            ErrorCode::Meta => "meta feature conflict",
        };
        write!(f, "{}", s)
    }
}

/// A failure to turn one document into a feature row.
///
/// Callers processing batches are expected to log these, count them and move on.
#[derive(Debug, Error)]
pub struct ExtractError {
    pub code: ErrorCode,
    pub op: String,
    pub detail: String,
    #[source]
    pub source: Option<anyhow::Error>,
}

impl fmt::Display for ExtractError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pagefeat: {}: {}", self.op, self.code)?;
        if !self.detail.is_empty() {
            write!(f, " ({})", self.detail)?;
        }
        if let Some(ref src) = self.source {
            write!(f, ": {}", src)?;
        }
        Ok(())
    }
}

impl ExtractError {
    fn new(
        code: ErrorCode,
        op: impl Into<String>,
        detail: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self {
            code,
            op: op.into(),
            detail: detail.into(),
            source,
        }
    }

    /// Create a Read error.
    pub fn read(op: impl Into<String>, detail: impl Into<String>, source: io::Error) -> Self {
        Self::new(ErrorCode::Read, op, detail, Some(source.into()))
    }

    /// Create an Empty error.
    pub fn empty(op: impl Into<String>) -> Self {
        Self::new(ErrorCode::Empty, op, "", None)
    }

    /// Create an Evaluate error for the named criterion.
    pub fn evaluate(
        op: impl Into<String>,
        criterion: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self::new(ErrorCode::Evaluate, op, criterion, source)
    }

    /// Create a Meta error for a meta value that shadows a criterion.
    pub fn meta(op: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::Meta,
            op,
            name,
            Some(anyhow::anyhow!("meta value would overwrite an extracted feature")),
        )
    }

    /// Returns true if the document could not be read.
    pub fn is_read(&self) -> bool {
        self.code == ErrorCode::Read
    }

    /// Returns true if the document had no content to parse.
    pub fn is_empty(&self) -> bool {
        self.code == ErrorCode::Empty
    }

    /// Returns true if an XPath evaluation failed.
    pub fn is_evaluate(&self) -> bool {
        self.code == ErrorCode::Evaluate
    }

    /// Returns true if a meta value collided with a criterion name.
    pub fn is_meta(&self) -> bool {
        self.code == ErrorCode::Meta
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_op_code_and_detail() {
        let err = ExtractError::evaluate(
            "extract",
            "num_links",
            Some(anyhow::anyhow!("expected a node-set")),
        );
        assert_eq!(
            err.to_string(),
            "pagefeat: extract: evaluation error (num_links): expected a node-set"
        );
        assert!(err.is_evaluate());
        assert!(!err.is_read());
    }

    #[test]
    fn empty_error_has_no_detail() {
        let err = ExtractError::empty("parse");
        assert_eq!(err.to_string(), "pagefeat: parse: empty document");
        assert!(err.is_empty());
    }

    #[test]
    fn config_error_messages() {
        let err = ConfigError::DuplicateName("num_forms".to_string());
        assert_eq!(err.to_string(), "there is already a feature named 'num_forms'");

        let err = ConfigError::InvalidMatchMode {
            name: "x".to_string(),
            mode: "fullmatch".to_string(),
        };
        assert!(err.to_string().contains("'fullmatch'"));
    }
}
