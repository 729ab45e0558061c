pub mod pipeline;
pub mod preprocess;
pub mod recognizer;
pub mod types;

pub use pipeline::{PipelineError, ScanPipeline};
pub use preprocess::{decode_payload, prepare_for_ocr_from_bytes, PreprocessError};
pub use recognizer::{MockRecognizer, OcrBackend, OcrError, UnavailableRecognizer};
pub use types::ScanOutcome;

#[cfg(feature = "tesseract")]
pub use recognizer::tesseract_backend::TesseractRecognizer;
