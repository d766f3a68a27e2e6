use anyhow::Result;
use catalog::persist::write_corpus;
use clap::Parser;
use crawler::fetch::{build_client, DEFAULT_USER_AGENT};
use crawler::{crawl, CrawlConfig, HttpPageSource, RobotsGate};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "crawler")]
#[command(about = "Crawl product pages to JSONL, respecting robots.txt")]
struct Cli {
    /// Seed URL (absolute http/https)
    #[arg(long, default_value = "https://web-scraping.dev/products")]
    seed: String,
    /// Maximum number of pages to fetch (capped at 50)
    #[arg(long, default_value_t = 50, value_parser = clap::value_parser!(u32).range(1..))]
    max_pages: u32,
    /// Output JSONL file path, replaced on each run
    #[arg(long, default_value = "./output/products.jsonl")]
    output: PathBuf,
    /// Request timeout seconds
    #[arg(long, default_value_t = 12)]
    timeout_secs: u64,
    /// User-Agent string for robots.txt and page requests
    #[arg(long, default_value = DEFAULT_USER_AGENT)]
    user_agent: String,
    /// Path prefix that marks a product page
    #[arg(long, default_value = "/product/")]
    product_prefix: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Cli::parse();

    let client = build_client(&args.user_agent, Duration::from_secs(args.timeout_secs))?;
    let source = HttpPageSource::new(client.clone());
    let gate = RobotsGate::new(client);
    let config = CrawlConfig { product_prefix: args.product_prefix.clone(), ..CrawlConfig::default() };

    tracing::info!(seed = %args.seed, max_pages = args.max_pages, output = %args.output.display(), "crawler starting");
    let report = crawl(&source, &gate, &config, &args.seed, args.max_pages as usize).await?;
    if let Some(clamp) = report.clamped {
        eprintln!(
            "crawler: requested {} pages, above the limit of {}; crawling at most {}",
            clamp.requested, config.max_pages, clamp.applied
        );
    }

    write_corpus(&args.output, &report.records)?;
    eprintln!(
        "done: records={} pages_crawled={} skipped={} other_links={} -> {}",
        report.records.len(),
        report.pages_crawled,
        report.skipped.len(),
        report.other_links.len(),
        args.output.display()
    );
    Ok(())
}
