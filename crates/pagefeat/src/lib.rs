// ABOUTME: Library entry point for pagefeat, criteria-driven feature extraction from HTML.
// ABOUTME: Re-exports the extractor, criteria loader, row types, CSV output and batch drivers.

//! pagefeat extracts counted and textual features from HTML documents.
//!
//! A set of named XPath criteria is loaded from a JSON configuration. Each
//! document yields one [`FeatureRow`]: count criteria produce the number of
//! matched nodes (optionally filtered by a regular expression on their text),
//! content criteria produce the concatenated text of the matched nodes.
//!
//! # Example
//!
//! ```
//! use pagefeat::FeatureExtractor;
//!
//! let mut extractor = FeatureExtractor::new();
//! extractor.register_count_criterion("num_forms", "//form", None, None).unwrap();
//! extractor.register_content_criterion("title_text", "//title").unwrap();
//!
//! let html = "<html><head><title>Hello</title></head><body><form></form><form></form></body></html>";
//! let row = extractor.accumulate_str(html, &[]).unwrap();
//! assert_eq!(row.count("num_forms"), Some(2));
//! assert_eq!(row.text("title_text"), Some("Hello"));
//! ```

pub mod batch;
pub mod criteria;
pub mod document;
pub mod error;
pub mod evaluate;
pub mod extractor;
pub mod options;
pub mod output;
pub mod row;

pub use crate::batch::BatchSummary;
pub use crate::criteria::loader::{load_criteria_file, load_criteria_str, CriteriaConfig};
pub use crate::criteria::{CriteriaSet, MatchMode, TextFilter};
pub use crate::document::{DocumentSource, ParsedDocument};
pub use crate::error::{ConfigError, ErrorCode, ExtractError};
pub use crate::evaluate::extract_features;
pub use crate::extractor::FeatureExtractor;
pub use crate::options::WalkOptions;
pub use crate::output::{write_csv, CsvSink, OutputError};
pub use crate::row::{FeatureRow, FeatureValue};
