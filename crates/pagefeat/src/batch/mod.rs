// ABOUTME: Batch drivers that feed many documents through the extractor.
// ABOUTME: walk handles crawl directories with sidecar metadata; pipeline handles base64 record streams.

//! Batch processing.
//!
//! Submodules:
//! - `walk`: recursive crawl-directory extraction into an accumulating extractor.
//! - `pipeline`: stateless extraction over `<base64>,<label>` records.

pub mod pipeline;
pub mod walk;

/// Outcome counts for a batch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub total: usize,
    pub extracted: usize,
    pub skipped: usize,
}

impl BatchSummary {
    pub(crate) fn record_ok(&mut self) {
        self.total += 1;
        self.extracted += 1;
    }

    pub(crate) fn record_skip(&mut self) {
        self.total += 1;
        self.skipped += 1;
    }
}
