// ABOUTME: Crawl-directory driver: finds HTML pages, reads request/response sidecars, accumulates rows.
// ABOUTME: Pages whose sidecars or documents fail are logged, skipped, and counted; the run continues.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::batch::BatchSummary;
use crate::criteria::CriteriaSet;
use crate::document::ParsedDocument;
use crate::error::ExtractError;
use crate::evaluate::extract_features;
use crate::extractor::FeatureExtractor;
use crate::options::WalkOptions;
use crate::row::FeatureRow;

/// Errors raised while walking a directory tree.
#[derive(Debug, Error)]
pub enum WalkError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid sidecar {path}: {source}")]
    Sidecar {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to extract {path}: {source}")]
    Extract {
        path: PathBuf,
        #[source]
        source: ExtractError,
    },
}

#[derive(Debug, Deserialize)]
struct RequestMeta {
    http: RequestHttp,
}

#[derive(Debug, Deserialize)]
struct RequestHttp {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ResponseMeta {
    http: ResponseHttp,
}

#[derive(Debug, Deserialize)]
struct ResponseHttp {
    response_url: String,
}

/// One HTML page found in a crawl directory with its sidecar URLs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRecord {
    pub file_path: PathBuf,
    pub requested_url: String,
    pub response_url: String,
}

/// The result of walking a tree: pages ready to extract, plus pages whose sidecars failed.
#[derive(Debug, Default)]
pub struct PageWalk {
    pub pages: Vec<PageRecord>,
    pub failures: Vec<WalkError>,
}

/// Recursively finds HTML pages under `root`.
///
/// Directory entries are visited in file-name order. A directory that cannot be listed aborts the walk; a page whose
/// sidecars are missing or malformed is recorded in `failures`.
pub fn collect_pages(root: impl AsRef<Path>, opts: &WalkOptions) -> Result<PageWalk, WalkError> {
    let mut walk = PageWalk::default();
    visit(root.as_ref(), opts, &mut walk)?;
    debug!(
        pages = walk.pages.len(),
        failures = walk.failures.len(),
        "collected pages"
    );
    Ok(walk)
}

fn visit(dir: &Path, opts: &WalkOptions, walk: &mut PageWalk) -> Result<(), WalkError> {
    for path in sorted_entries(dir)? {
        if path.is_dir() {
            visit(&path, opts, walk)?;
            continue;
        }

        let is_doc = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| opts.is_document(n));
        if !is_doc {
            continue;
        }

        match read_sidecars(dir, opts) {
            Ok((requested_url, response_url)) => walk.pages.push(PageRecord {
                file_path: path,
                requested_url,
                response_url,
            }),
            Err(e) => walk.failures.push(e),
        }
    }
    Ok(())
}

fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>, WalkError> {
    let io_err = |source| WalkError::Io {
        path: dir.to_path_buf(),
        source,
    };
    let mut entries = fs::read_dir(dir)
        .map_err(io_err)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<Vec<_>, _>>()
        .map_err(io_err)?;
    entries.sort();
    Ok(entries)
}

fn read_sidecars(dir: &Path, opts: &WalkOptions) -> Result<(String, String), WalkError> {
    let request: RequestMeta = read_json(&dir.join(&opts.request_meta_file))?;
    let response: ResponseMeta = read_json(&dir.join(&opts.response_meta_file))?;
    Ok((request.http.url, response.http.response_url))
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T, WalkError> {
    let text = fs::read_to_string(path).map_err(|source| WalkError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| WalkError::Sidecar {
        path: path.to_path_buf(),
        source,
    })
}

/// Walks `root` and accumulates one row per page into `extractor`.
///
/// Each row carries the requested and response URLs under the meta names from
/// `opts`. Failed pages are skipped and counted in the summary.
pub fn run_directory(
    extractor: &mut FeatureExtractor,
    root: impl AsRef<Path>,
    opts: &WalkOptions,
) -> Result<BatchSummary, WalkError> {
    let walk = collect_pages(root, opts)?;
    let mut summary = BatchSummary::default();

    for failure in &walk.failures {
        warn!(error = %failure, "skipping page with unreadable metadata");
        summary.record_skip();
    }

    for page in &walk.pages {
        let meta = [
            (opts.requested_url_feature.as_str(), page.requested_url.as_str()),
            (opts.response_url_feature.as_str(), page.response_url.as_str()),
        ];
        match extractor.accumulate_file(&page.file_path, &meta) {
            Ok(_) => summary.record_ok(),
            Err(e) => {
                warn!(url = %page.requested_url, error = %e, "cannot extract page, skipping");
                summary.record_skip();
            }
        }
    }

    info!(
        total = summary.total,
        skipped = summary.skipped,
        "directory run finished"
    );
    Ok(summary)
}

/// Extracts every HTML file directly inside `dir` (no recursion).
///
/// Each row is tagged with meta features `path` (the directory) and `file`
/// (the file name). The first failing file aborts the call.
pub fn extract_directory(
    criteria: &CriteriaSet,
    dir: impl AsRef<Path>,
    opts: &WalkOptions,
) -> Result<Vec<FeatureRow>, WalkError> {
    let dir = dir.as_ref();
    let mut rows = Vec::new();

    for path in sorted_entries(dir)? {
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !opts.is_document(file_name) || path.is_dir() {
            continue;
        }

        let extract_err = |source| WalkError::Extract {
            path: path.clone(),
            source,
        };
        let bytes = fs::read(&path).map_err(|source| WalkError::Io {
            path: path.clone(),
            source,
        })?;
        let doc = ParsedDocument::parse_bytes(&bytes).map_err(extract_err)?;
        let mut row = extract_features(criteria, &doc).map_err(extract_err)?;

        for (name, value) in [("path", dir.display().to_string()), ("file", file_name.to_string())] {
            if criteria.contains(name) {
                return Err(extract_err(ExtractError::meta("extract_directory", name)));
            }
            row.insert(name, value);
        }
        rows.push(row);
    }
    Ok(rows)
}
