pub mod clean;
pub mod date;
pub mod evaluate;
pub mod extract;

pub use clean::{clean, TextCleaner, DEFAULT_SUBSTITUTIONS};
pub use date::ExpiryDate;
pub use evaluate::{ExpiryEvaluator, ExpiryVerdict};
pub use extract::{normalize, DateExtractor, DateFormat, DateMatch, ExtractionMiss, DATE_FORMATS};
