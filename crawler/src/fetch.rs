use crate::error::CrawlError;
use crate::extract::HtmlExtractor;
use catalog::ProductRecord;
use reqwest::{header, Client, Url};
use std::time::Duration;

/// What one fetched page yields: at most one product and its outbound links.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub record: Option<ProductRecord>,
    /// `href` values in document order, `None` for anchors without one.
    pub links: Vec<Option<String>>,
}

/// Fetch + extract for one URL.
#[allow(async_fn_in_trait)]
pub trait PageSource {
    async fn fetch_page(&self, url: &Url) -> Result<Page, CrawlError>;
}

/// Pages larger than this are skipped rather than parsed.
pub const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Shared client for pages and robots.txt. The timeout bounds every request.
pub fn build_client(user_agent: &str, timeout: Duration) -> Result<Client, CrawlError> {
    Ok(Client::builder()
        .user_agent(user_agent)
        .redirect(reqwest::redirect::Policy::limited(5))
        .timeout(timeout)
        .build()?)
}

pub struct HttpPageSource {
    client: Client,
    extractor: HtmlExtractor,
}

impl HttpPageSource {
    pub fn new(client: Client) -> Self {
        Self { client, extractor: HtmlExtractor::new() }
    }
}

impl PageSource for HttpPageSource {
    async fn fetch_page(&self, url: &Url) -> Result<Page, CrawlError> {
        let resp = self.client.get(url.clone()).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(CrawlError::HttpStatus { url: url.to_string(), status: status.as_u16() });
        }
        if let Some(ct) = resp.headers().get(header::CONTENT_TYPE).and_then(|v| v.to_str().ok()) {
            if !ct.starts_with("text/html") {
                tracing::debug!(url = %url, content_type = ct, "non-html response, no product");
                return Ok(Page::default());
            }
        }
        let declared = resp.content_length().unwrap_or(0) as usize;
        if declared > MAX_BODY_BYTES {
            return Err(CrawlError::BodyTooLarge { url: url.to_string(), bytes: declared, limit: MAX_BODY_BYTES });
        }
        let bytes = resp.bytes().await?;
        if bytes.len() > MAX_BODY_BYTES {
            return Err(CrawlError::BodyTooLarge { url: url.to_string(), bytes: bytes.len(), limit: MAX_BODY_BYTES });
        }
        let body = String::from_utf8_lossy(&bytes);
        Ok(self.extractor.extract(url.as_str(), &body))
    }
}
