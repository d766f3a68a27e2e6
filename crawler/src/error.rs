use thiserror::Error;

/// Failures the crawl can run into.
///
/// Per-URL variants (`PolicyDenied`, `InvalidUrl`, `Fetch`, `BodyTooLarge`,
/// `HttpStatus`) are logged and recorded as skips; only seed and budget
/// problems stop a crawl before it starts.
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("crawling disallowed by robots.txt for {origin}")]
    PolicyDenied { origin: String },

    #[error("not an absolute http(s) url: {url}")]
    InvalidUrl { url: String },

    #[error("fetch failed: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("{url} body is {bytes} bytes, over the {limit} byte limit")]
    BodyTooLarge { url: String, bytes: usize, limit: usize },

    #[error("{url} answered HTTP {status}")]
    HttpStatus { url: String, status: u16 },

    #[error("seed must be an absolute http(s) url, got {0:?}")]
    InvalidSeed(String),

    #[error("requested page count must be at least 1")]
    ZeroBudget,
}
