//! Crawl frontier and the sequential fetch loop that drives it.
//!
//! Only product-shaped links (`/product/...`) are ever scheduled. Everything
//! else is recorded for bookkeeping and never fetched, so a seed page without
//! product links ends the crawl after one page.

use crate::error::CrawlError;
use crate::fetch::PageSource;
use crate::robots::ExclusionPolicy;
use catalog::ProductRecord;
use reqwest::Url;
use std::collections::{HashSet, VecDeque};

/// Hard cap on pages fetched per crawl, whatever the caller asks for.
pub const MAX_PAGES: usize = 50;

#[derive(Debug, Clone)]
pub struct CrawlConfig {
    /// Path prefix that marks a product page.
    pub product_prefix: String,
    pub max_pages: usize,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self { product_prefix: "/product/".to_string(), max_pages: MAX_PAGES }
    }
}

/// The requested page count was above the hard cap and was lowered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BudgetClamp {
    pub requested: usize,
    pub applied: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkClass {
    /// Product page, key is the resolved url without fragment.
    Product(String),
    Other(String),
    /// href that cannot be resolved against the page url.
    Unresolvable(String),
}

#[derive(Debug)]
pub struct SkippedUrl {
    pub url: String,
    pub reason: CrawlError,
}

#[derive(Debug, Default)]
pub struct CrawlReport {
    /// Products in crawl order.
    pub records: Vec<ProductRecord>,
    pub pages_crawled: usize,
    pub page_budget: usize,
    pub clamped: Option<BudgetClamp>,
    /// Non-product links seen during the crawl, first-seen order, never fetched.
    pub other_links: Vec<String>,
    pub skipped: Vec<SkippedUrl>,
}

/// FIFO queue of product urls plus the visited set and page budget.
///
/// A url is marked visited when it is enqueued, so several pages linking to
/// the same product schedule it once.
#[derive(Debug)]
pub struct Frontier {
    queue: VecDeque<String>,
    visited: HashSet<String>,
    other_links: Vec<String>,
    others_seen: HashSet<String>,
    pages_crawled: usize,
    page_budget: usize,
    product_prefix: String,
}

fn norm(u: &Url) -> String { let mut s = u.clone(); s.set_fragment(None); s.to_string() }

/// Absolute http(s) url or `InvalidUrl`.
pub fn parse_http_url(raw: &str) -> Result<Url, CrawlError> {
    match Url::parse(raw) {
        Ok(u) if matches!(u.scheme(), "http" | "https") && u.has_host() => Ok(u),
        _ => Err(CrawlError::InvalidUrl { url: raw.to_string() }),
    }
}

impl Frontier {
    pub fn new(seed: String, page_budget: usize, product_prefix: impl Into<String>) -> Self {
        let mut visited = HashSet::new();
        visited.insert(seed.clone());
        Self {
            queue: VecDeque::from([seed]),
            visited,
            other_links: Vec::new(),
            others_seen: HashSet::new(),
            pages_crawled: 0,
            page_budget,
            product_prefix: product_prefix.into(),
        }
    }

    pub fn budget_exhausted(&self) -> bool {
        self.pages_crawled >= self.page_budget
    }

    /// Next url to process, or `None` once the budget is spent or the queue is empty.
    pub fn next_url(&mut self) -> Option<String> {
        if self.budget_exhausted() {
            return None;
        }
        self.queue.pop_front()
    }

    pub fn classify(&self, base: &Url, href: &str) -> LinkClass {
        match base.join(href) {
            Ok(u) if u.path().starts_with(&self.product_prefix) => LinkClass::Product(norm(&u)),
            Ok(u) => LinkClass::Other(norm(&u)),
            Err(_) => LinkClass::Unresolvable(href.to_string()),
        }
    }

    /// Classify a page's outbound links; unseen products join the back of the
    /// queue. Returns how many were enqueued.
    pub fn discover(&mut self, base: &Url, links: &[Option<String>]) -> usize {
        let mut enqueued = 0;
        for href in links.iter().flatten() {
            match self.classify(base, href) {
                LinkClass::Product(url) => {
                    if self.visited.insert(url.clone()) {
                        self.queue.push_back(url);
                        enqueued += 1;
                    }
                }
                LinkClass::Other(url) => {
                    if self.others_seen.insert(url.clone()) {
                        self.other_links.push(url);
                    }
                }
                LinkClass::Unresolvable(href) => {
                    tracing::debug!(href = %href, "unresolvable link ignored");
                }
            }
        }
        enqueued
    }

    pub fn record_fetch(&mut self) {
        self.pages_crawled += 1;
    }

    pub fn queued(&self) -> impl Iterator<Item = &str> {
        self.queue.iter().map(String::as_str)
    }

    pub fn is_visited(&self, url: &str) -> bool { self.visited.contains(url) }

    pub fn other_links(&self) -> &[String] { &self.other_links }

    pub fn pages_crawled(&self) -> usize { self.pages_crawled }

    pub fn page_budget(&self) -> usize { self.page_budget }
}

/// Crawl from `seed`, fetching at most `requested_pages` pages (clamped to
/// `config.max_pages`).
///
/// Per-url problems are logged and recorded in [`CrawlReport::skipped`]; only
/// a bad seed or a zero page count fail the call.
pub async fn crawl<S, P>(
    source: &S,
    policy: &P,
    config: &CrawlConfig,
    seed: &str,
    requested_pages: usize,
) -> Result<CrawlReport, CrawlError>
where
    S: PageSource,
    P: ExclusionPolicy,
{
    if requested_pages == 0 {
        return Err(CrawlError::ZeroBudget);
    }
    let seed_url = parse_http_url(seed).map_err(|_| CrawlError::InvalidSeed(seed.to_string()))?;

    let mut report = CrawlReport::default();
    let budget = requested_pages.min(config.max_pages);
    if requested_pages > config.max_pages {
        tracing::warn!(requested = requested_pages, applied = budget, "requested pages above hard cap, clamping");
        report.clamped = Some(BudgetClamp { requested: requested_pages, applied: budget });
    }

    let mut frontier = Frontier::new(norm(&seed_url), budget, config.product_prefix.clone());
    while let Some(raw) = frontier.next_url() {
        tracing::info!(url = %raw, "crawling");
        let url = match parse_http_url(&raw) {
            Ok(u) => u,
            Err(reason) => {
                tracing::warn!(url = %raw, "skipping invalid url");
                report.skipped.push(SkippedUrl { url: raw, reason });
                continue;
            }
        };

        let origin = url.origin().ascii_serialization();
        if !policy.is_allowed(&origin).await {
            tracing::warn!(url = %raw, origin = %origin, "crawling not allowed by robots.txt");
            report.skipped.push(SkippedUrl { url: raw, reason: CrawlError::PolicyDenied { origin } });
            continue;
        }

        match source.fetch_page(&url).await {
            Ok(page) => {
                let enqueued = frontier.discover(&url, &page.links);
                report.records.extend(page.record);
                frontier.record_fetch();
                tracing::debug!(
                    url = %raw,
                    enqueued,
                    pages_crawled = frontier.pages_crawled(),
                    queued = frontier.queued().count(),
                    "page done"
                );
            }
            Err(reason) => {
                tracing::warn!(url = %raw, error = %reason, "fetch failed, continuing");
                report.skipped.push(SkippedUrl { url: raw, reason });
            }
        }
    }

    if frontier.budget_exhausted() {
        tracing::info!(page_budget = budget, "page budget reached");
    }
    tracing::info!(
        pages_crawled = frontier.pages_crawled(),
        records = report.records.len(),
        skipped = report.skipped.len(),
        other_links = frontier.other_links().len(),
        "crawl finished"
    );

    report.pages_crawled = frontier.pages_crawled();
    report.page_budget = budget;
    report.other_links = frontier.other_links;
    Ok(report)
}
