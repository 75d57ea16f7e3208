pub mod category;
pub mod error;
pub mod frequency;
pub mod model;
pub mod result;
pub mod snapshot;
pub mod tokenizer;

pub use error::{ClassifierError, ClassifierResult, ParseError};
pub use frequency::{CategoryCounts, FrequencyStore};
pub use model::{Model, ModelOptions, ModelStats};
pub use result::ClassificationResult;
pub use tokenizer::tokenize;
