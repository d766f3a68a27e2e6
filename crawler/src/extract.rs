use crate::fetch::Page;
use catalog::{ProductRecord, Review};
use scraper::{ElementRef, Html, Selector};
use std::collections::HashMap;

/// Product page template reader (web-scraping.dev markup).
pub struct HtmlExtractor {
    product_title: Selector,
    page_title: Selector,
    description: Selector,
    feature_row: Selector,
    feature_label: Selector,
    feature_value: Selector,
    anchor: Selector,
    review: Selector,
    star: Selector,
    paragraph: Selector,
}

fn sel(css: &str) -> Selector {
    Selector::parse(css).expect("valid selector")
}

fn text_of(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

impl HtmlExtractor {
    pub fn new() -> Self {
        Self {
            product_title: sel("h3.product-title"),
            page_title: sel("title"),
            description: sel("p.product-description"),
            feature_row: sel("tr.feature"),
            feature_label: sel("td.feature-label"),
            feature_value: sel("td.feature-value"),
            anchor: sel("a"),
            review: sel("div.mt-4"),
            star: sel("svg"),
            paragraph: sel("p"),
        }
    }

    /// Links are always returned; a record only when the page has a product
    /// heading or a `<title>` to name it by.
    pub fn extract(&self, url: &str, html: &str) -> Page {
        let doc = Html::parse_document(html);
        let links: Vec<Option<String>> = doc
            .select(&self.anchor)
            .map(|a| a.value().attr("href").map(str::to_string))
            .collect();

        let title = doc
            .select(&self.product_title)
            .next()
            .or_else(|| doc.select(&self.page_title).next())
            .map(text_of);
        let Some(title) = title else {
            tracing::debug!(url, "page has no title, no product extracted");
            return Page { record: None, links };
        };

        let description = doc.select(&self.description).next().map(text_of).unwrap_or_default();

        let mut features = HashMap::new();
        for row in doc.select(&self.feature_row) {
            let label = row.select(&self.feature_label).next().map(text_of);
            let value = row.select(&self.feature_value).next().map(text_of);
            if let (Some(label), Some(value)) = (label, value) {
                features.insert(label, value);
            }
        }

        let reviews = doc.select(&self.review).map(|r| self.review_of(r)).collect();

        let record = ProductRecord {
            url: url.to_string(),
            title,
            description,
            features,
            links: links.clone(),
            reviews,
        };
        Page { record: Some(record), links }
    }

    fn review_of(&self, el: ElementRef<'_>) -> Review {
        let id = el
            .value()
            .classes()
            .filter(|c| *c != "review")
            .find_map(|c| c.strip_prefix("review-"))
            .map(str::to_string);
        let rating = el.select(&self.star).count() as u32;
        let content = el.select(&self.paragraph).next().map(text_of);
        Review { id, rating, content }
    }
}

impl Default for HtmlExtractor {
    fn default() -> Self { Self::new() }
}
