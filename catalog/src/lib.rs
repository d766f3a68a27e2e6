pub mod index;
pub mod model;
pub mod persist;
pub mod tokenizer;

pub use index::{FeatureIndex, InvertedIndex, ReviewIndex, ReviewStats};
pub use model::{ProductRecord, ProductRef, Review};
pub use tokenizer::{Tokenizer, TokenizerConfig};
