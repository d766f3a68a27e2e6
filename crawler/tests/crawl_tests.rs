//! End-to-end crawls against a wiremock server.

use catalog::persist::{read_corpus, write_corpus};
use crawler::fetch::{build_client, DEFAULT_USER_AGENT, MAX_BODY_BYTES};
use crawler::{crawl, CrawlConfig, CrawlError, ExclusionPolicy, HttpPageSource, RobotsGate};
use std::time::Duration;
use tempfile::tempdir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.to_string(), "text/html")
}

async fn mount_robots(server: &MockServer, body: &str) {
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body.to_string()))
        .mount(server)
        .await;
}

fn client() -> reqwest::Client {
    build_client(DEFAULT_USER_AGENT, Duration::from_secs(5)).expect("client")
}

const LISTING: &str = r#"<html><head><title>Products</title></head><body>
  <a href="/product/1">one</a>
  <a href="/about">about</a>
  <a href="/product/2">two</a>
  <a href="/product/1#reviews">one again</a>
</body></html>"#;

const PRODUCT_ONE: &str = r#"<html><head><title>web-scraping.dev</title></head><body>
  <h3 class="card-title product-title mb-3">Dark Red Energy Potion</h3>
  <p class="product-description">Unleash the power within.</p>
  <table><tr class="feature"><td class="feature-label">brand</td><td class="feature-value">GameFuel</td></tr></table>
  <a href="/product/2">two</a>
  <div class="mt-4 review review-dark-red-potion-1"><svg></svg><svg></svg><svg></svg><p>Good</p></div>
</body></html>"#;

#[tokio::test]
async fn crawls_product_pages_and_survives_a_failing_one() {
    let server = MockServer::start().await;
    mount_robots(&server, "User-agent: *\nAllow: /\n").await;
    Mock::given(method("GET")).and(path("/products")).respond_with(html(LISTING)).mount(&server).await;
    Mock::given(method("GET")).and(path("/product/1")).respond_with(html(PRODUCT_ONE)).mount(&server).await;
    Mock::given(method("GET")).and(path("/product/2")).respond_with(ResponseTemplate::new(500)).mount(&server).await;

    let client = client();
    let source = HttpPageSource::new(client.clone());
    let gate = RobotsGate::new(client);
    let seed = format!("{}/products", server.uri());
    let report = crawl(&source, &gate, &CrawlConfig::default(), &seed, 10).await.unwrap();

    let urls: Vec<String> = report.records.iter().map(|r| r.url.clone()).collect();
    assert_eq!(urls, vec![seed.clone(), format!("{}/product/1", server.uri())]);
    let potion = &report.records[1];
    assert_eq!(potion.title, "Dark Red Energy Potion");
    assert_eq!(potion.feature("brand"), Some("GameFuel"));
    assert_eq!(potion.reviews[0].rating, 3);

    assert_eq!(report.pages_crawled, 2);
    assert_eq!(report.skipped.len(), 1);
    assert!(matches!(report.skipped[0].reason, CrawlError::HttpStatus { status: 500, .. }));
    assert_eq!(report.other_links, vec![format!("{}/about", server.uri())]);

    let requests = server.received_requests().await.unwrap();
    assert!(requests.iter().all(|r| r.url.path() != "/about"));
    let product_one_hits = requests.iter().filter(|r| r.url.path() == "/product/1").count();
    assert_eq!(product_one_hits, 1);

    let dir = tempdir().unwrap();
    let out = dir.path().join("products.jsonl");
    write_corpus(&out, &report.records).unwrap();
    assert_eq!(read_corpus(&out).unwrap(), report.records);
}

#[tokio::test]
async fn oversized_page_is_skipped_and_crawl_continues() {
    let server = MockServer::start().await;
    mount_robots(&server, "User-agent: *\nAllow: /\n").await;
    Mock::given(method("GET")).and(path("/products")).respond_with(html(LISTING)).mount(&server).await;
    let huge = format!("<html><head><title>Huge</title></head><body>{}</body></html>", "x".repeat(MAX_BODY_BYTES));
    Mock::given(method("GET")).and(path("/product/1")).respond_with(html(&huge)).mount(&server).await;
    Mock::given(method("GET")).and(path("/product/2")).respond_with(html(PRODUCT_ONE)).mount(&server).await;

    let client = client();
    let report = crawl(
        &HttpPageSource::new(client.clone()),
        &RobotsGate::new(client),
        &CrawlConfig::default(),
        &format!("{}/products", server.uri()),
        10,
    )
    .await
    .unwrap();

    let urls: Vec<String> = report.records.iter().map(|r| r.url.clone()).collect();
    assert_eq!(urls, vec![format!("{}/products", server.uri()), format!("{}/product/2", server.uri())]);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].url, format!("{}/product/1", server.uri()));
    assert!(matches!(
        report.skipped[0].reason,
        CrawlError::BodyTooLarge { limit, bytes, .. } if limit == MAX_BODY_BYTES && bytes > MAX_BODY_BYTES
    ));
}

#[tokio::test]
async fn catch_all_disallow_blocks_the_origin() {
    let server = MockServer::start().await;
    mount_robots(&server, "User-agent: *\nDisallow: /\n").await;
    Mock::given(method("GET")).and(path("/products")).respond_with(html(LISTING)).expect(0).mount(&server).await;

    let client = client();
    let report = crawl(
        &HttpPageSource::new(client.clone()),
        &RobotsGate::new(client),
        &CrawlConfig::default(),
        &format!("{}/products", server.uri()),
        5,
    )
    .await
    .unwrap();
    assert!(report.records.is_empty());
    assert_eq!(report.pages_crawled, 0);
    assert!(matches!(report.skipped[0].reason, CrawlError::PolicyDenied { .. }));
}

#[tokio::test]
async fn missing_robots_txt_is_permissive_and_cached() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let gate = RobotsGate::new(client());
    let origin = server.uri();
    assert!(gate.is_allowed(&origin).await);
    assert!(gate.is_allowed(&origin).await);
}

#[tokio::test]
async fn unreachable_robots_txt_fails_open() {
    // nothing listens on the discard port
    let gate = RobotsGate::new(build_client(DEFAULT_USER_AGENT, Duration::from_secs(1)).unwrap());
    assert!(gate.is_allowed("http://127.0.0.1:9").await);
}
