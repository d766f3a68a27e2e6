use crate::model::ProductRecord;
use crate::tokenizer::Tokenizer;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Positional inverted index: token -> url -> ascending token positions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InvertedIndex {
    postings: BTreeMap<String, BTreeMap<String, Vec<usize>>>,
}

/// Per-product review aggregates, keyed by url.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReviewIndex {
    stats: BTreeMap<String, ReviewStats>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewStats {
    pub total_reviews: usize,
    /// Arithmetic mean of the ratings; exactly 0 when there are no reviews.
    pub mean_mark: f64,
    pub last_rating: Option<u32>,
}

/// Token -> urls of the products whose feature value contains it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureIndex {
    postings: BTreeMap<String, BTreeSet<String>>,
}

/// Every zero-based position of each distinct token.
pub fn word_positions(tokens: &[String]) -> HashMap<&str, Vec<usize>> {
    let mut positions: HashMap<&str, Vec<usize>> = HashMap::new();
    for (pos, token) in tokens.iter().enumerate() {
        positions.entry(token.as_str()).or_default().push(pos);
    }
    positions
}

impl InvertedIndex {
    pub fn new() -> Self { Self::default() }

    /// Index one free-text field (`"title"` or `"description"`) of every record.
    pub fn build(corpus: &[ProductRecord], field: &str, tokenizer: &Tokenizer) -> Self {
        let mut index = Self::new();
        for record in corpus {
            let tokens = tokenizer.tokenize(record.text_field(field));
            for (token, positions) in word_positions(&tokens) {
                index
                    .postings
                    .entry(token.to_string())
                    .or_default()
                    .insert(record.url.clone(), positions);
            }
        }
        tracing::info!(field, terms = index.len(), "text index built");
        index
    }

    pub fn positions(&self, token: &str, url: &str) -> Option<&[usize]> {
        self.postings.get(token)?.get(url).map(Vec::as_slice)
    }

    pub fn documents(&self, token: &str) -> impl Iterator<Item = &str> {
        self.postings.get(token).into_iter().flat_map(|docs| docs.keys().map(String::as_str))
    }

    pub fn terms(&self) -> impl Iterator<Item = &str> {
        self.postings.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize { self.postings.len() }

    pub fn is_empty(&self) -> bool { self.postings.is_empty() }
}

impl ReviewStats {
    pub fn from_reviews(reviews: &[crate::model::Review]) -> Self {
        let total_reviews = reviews.len();
        let mean_mark = if total_reviews > 0 {
            reviews.iter().map(|r| r.rating as f64).sum::<f64>() / total_reviews as f64
        } else {
            0.0
        };
        Self { total_reviews, mean_mark, last_rating: reviews.last().map(|r| r.rating) }
    }
}

impl ReviewIndex {
    pub fn build(corpus: &[ProductRecord]) -> Self {
        let stats: BTreeMap<String, ReviewStats> = corpus
            .iter()
            .map(|record| (record.url.clone(), ReviewStats::from_reviews(&record.reviews)))
            .collect();
        tracing::info!(products = stats.len(), "review index built");
        Self { stats }
    }

    pub fn get(&self, url: &str) -> Option<&ReviewStats> { self.stats.get(url) }

    pub fn len(&self) -> usize { self.stats.len() }

    pub fn is_empty(&self) -> bool { self.stats.is_empty() }
}

impl FeatureIndex {
    pub fn new() -> Self { Self::default() }

    /// Index the value of `features[feature]`; records without it contribute nothing.
    pub fn build(corpus: &[ProductRecord], feature: &str, tokenizer: &Tokenizer) -> Self {
        let mut index = Self::new();
        for record in corpus {
            let Some(value) = record.feature(feature) else { continue };
            for token in tokenizer.tokenize(value) {
                index.postings.entry(token).or_default().insert(record.url.clone());
            }
        }
        tracing::info!(feature, terms = index.len(), "feature index built");
        index
    }

    pub fn urls(&self, token: &str) -> Option<&BTreeSet<String>> { self.postings.get(token) }

    pub fn terms(&self) -> impl Iterator<Item = &str> {
        self.postings.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize { self.postings.len() }

    pub fn is_empty(&self) -> bool { self.postings.is_empty() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Review;

    fn product(url: &str, title: &str, description: &str) -> ProductRecord {
        ProductRecord {
            url: url.to_string(),
            title: title.to_string(),
            description: description.to_string(),
            ..Default::default()
        }
    }

    fn rated(ratings: &[u32]) -> Vec<Review> {
        ratings
            .iter()
            .enumerate()
            .map(|(i, r)| Review { id: Some(format!("r{i}")), rating: *r, content: None })
            .collect()
    }

    #[test]
    fn positions_cover_every_occurrence_in_order() {
        let tokenizer = Tokenizer::default();
        let corpus = vec![
            product("https://x.dev/product/1", "Box of Chocolate Candy, chocolate bar", ""),
            product("https://x.dev/product/2", "Dark Red Potion", ""),
        ];
        let index = InvertedIndex::build(&corpus, "title", &tokenizer);

        for record in &corpus {
            let tokens = tokenizer.tokenize(&record.title);
            for term in index.terms() {
                let Some(positions) = index.positions(term, &record.url) else { continue };
                let expected: Vec<usize> = tokens
                    .iter()
                    .enumerate()
                    .filter(|(_, t)| t.as_str() == term)
                    .map(|(p, _)| p)
                    .collect();
                assert_eq!(positions, expected.as_slice());
            }
        }
        assert_eq!(index.positions("chocolate", "https://x.dev/product/1"), Some(&[1, 3][..]));
        assert_eq!(index.documents("potion").collect::<Vec<_>>(), vec!["https://x.dev/product/2"]);
    }

    #[test]
    fn empty_fields_still_build() {
        let tokenizer = Tokenizer::default();
        let corpus = vec![product("https://x.dev/product/1", "", "")];
        assert!(InvertedIndex::build(&corpus, "description", &tokenizer).is_empty());
        assert!(InvertedIndex::build(&corpus, "no-such-field", &tokenizer).is_empty());
        assert_eq!(ReviewIndex::build(&corpus).len(), 1);
    }

    #[test]
    fn no_reviews_yields_zero_mean_and_no_last_rating() {
        let corpus = vec![product("https://x.dev/product/1", "Potion", "")];
        let stats = ReviewIndex::build(&corpus);
        let s = stats.get("https://x.dev/product/1").unwrap();
        assert_eq!(s.total_reviews, 0);
        assert_eq!(s.mean_mark, 0.0);
        assert_eq!(s.last_rating, None);
    }

    #[test]
    fn review_stats_use_extraction_order() {
        let mut record = product("https://x.dev/product/1", "Potion", "");
        record.reviews = rated(&[3, 5, 1]);
        let index = ReviewIndex::build(&[record]);
        let s = index.get("https://x.dev/product/1").unwrap();
        assert_eq!(s.total_reviews, 3);
        assert_eq!(s.mean_mark, 3.0);
        assert_eq!(s.last_rating, Some(1));
    }

    #[test]
    fn review_index_serializes_null_last_rating() {
        let corpus = vec![product("https://x.dev/product/1", "Potion", "")];
        let json = serde_json::to_value(ReviewIndex::build(&corpus)).unwrap();
        assert_eq!(json["https://x.dev/product/1"]["total_reviews"], 0);
        assert!(json["https://x.dev/product/1"]["last_rating"].is_null());
    }

    #[test]
    fn feature_index_groups_products_by_token() {
        let tokenizer = Tokenizer::default();
        let mut a = product("https://x.dev/product/1", "", "");
        a.features.insert("brand".into(), "Acme Corp".into());
        let mut b = product("https://x.dev/product/2", "", "");
        b.features.insert("brand".into(), "Acme Corp".into());
        let c = product("https://x.dev/product/3", "", "");

        let index = FeatureIndex::build(&[a, b, c], "brand", &tokenizer);
        let acme = index.urls("acme").unwrap();
        assert_eq!(acme.len(), 2);
        assert!(acme.contains("https://x.dev/product/1"));
        assert!(acme.contains("https://x.dev/product/2"));
        assert_eq!(index.urls("corp").map(|s| s.len()), Some(2));
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn inverted_index_serializes_as_plain_mapping() {
        let tokenizer = Tokenizer::default();
        let corpus = vec![product("https://x.dev/product/1", "Red potion", "")];
        let json = serde_json::to_value(InvertedIndex::build(&corpus, "title", &tokenizer)).unwrap();
        assert_eq!(json["red"]["https://x.dev/product/1"], serde_json::json!([0]));
        assert_eq!(json["potion"]["https://x.dev/product/1"], serde_json::json!([1]));
    }
}
