use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use url::Url;

/// One extracted product page, as written to the corpus NDJSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub url: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub features: HashMap<String, String>,
    /// Raw `href` values in document order; `None` for anchors without one.
    #[serde(default, deserialize_with = "null_as_default")]
    pub links: Vec<Option<String>>,
    /// Extraction order is kept, `last_rating` depends on it.
    #[serde(default, deserialize_with = "null_as_default")]
    pub reviews: Vec<Review>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub id: Option<String>,
    #[serde(default)]
    pub rating: u32,
    pub content: Option<String>,
}

impl ProductRecord {
    /// Text of a free-text field by name. Unknown names read as empty.
    pub fn text_field(&self, field: &str) -> &str {
        match field {
            "title" => &self.title,
            "description" => &self.description,
            _ => "",
        }
    }

    pub fn feature(&self, name: &str) -> Option<&str> {
        self.features.get(name).map(String::as_str)
    }
}

/// Product id and variant carried by a product URL,
/// e.g. `https://web-scraping.dev/product/1?variant=orange-small`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRef {
    pub url: String,
    pub product_id: Option<String>,
    pub variant: Option<String>,
}

impl ProductRef {
    pub fn from_url(raw: &str) -> Self {
        let (product_id, variant) = match Url::parse(raw) {
            Ok(u) => {
                let product_id = u
                    .path_segments()
                    .and_then(|mut segs| segs.nth(1))
                    .filter(|s| !s.is_empty())
                    .map(str::to_string);
                let variant = u
                    .query_pairs()
                    .find(|(k, _)| k == "variant")
                    .map(|(_, v)| v.into_owned());
                (product_id, variant)
            }
            Err(_) => (None, None),
        };
        Self { url: raw.to_string(), product_id, variant }
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
