pub mod error;
pub mod extract;
pub mod fetch;
pub mod frontier;
pub mod robots;

pub use error::CrawlError;
pub use extract::HtmlExtractor;
pub use fetch::{HttpPageSource, Page, PageSource};
pub use frontier::{crawl, BudgetClamp, CrawlConfig, CrawlReport, Frontier, LinkClass};
pub use robots::{ExclusionPolicy, RobotsGate};
