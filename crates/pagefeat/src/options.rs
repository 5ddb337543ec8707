// ABOUTME: Options for the directory batch driver: file extension, sidecar file names, meta feature names.
// ABOUTME: Defaults match the crawler layout of one HTML file plus request/response metadata per directory.

/// Meta feature name carrying the URL that was requested.
pub const REQUESTED_URL: &str = "requested_url";

/// Meta feature name carrying the URL that finally responded.
pub const RESPONSE_URL: &str = "response_url";

/// Configuration for walking a crawl directory.
#[derive(Debug, Clone)]
pub struct WalkOptions {
    /// File extension (without the dot) identifying HTML documents.
    pub extension: String,
    /// Sidecar holding `http.url`.
    pub request_meta_file: String,
    /// Sidecar holding `http.response_url`.
    pub response_meta_file: String,
    /// Meta feature name for the requested URL.
    pub requested_url_feature: String,
    /// Meta feature name for the response URL.
    pub response_url_feature: String,
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self {
            extension: "html".to_string(),
            request_meta_file: "request_meta.json".to_string(),
            response_meta_file: "response_meta.json".to_string(),
            requested_url_feature: REQUESTED_URL.to_string(),
            response_url_feature: RESPONSE_URL.to_string(),
        }
    }
}

impl WalkOptions {
    /// The meta feature names a directory run attaches to each row.
    pub fn meta_feature_names(&self) -> [&str; 2] {
        [
            self.requested_url_feature.as_str(),
            self.response_url_feature.as_str(),
        ]
    }

    pub(crate) fn is_document(&self, file_name: &str) -> bool {
        file_name
            .rsplit_once('.')
            .is_some_and(|(stem, ext)| !stem.is_empty() && ext == self.extension)
    }
}
