pub mod config;
pub mod error;
pub mod logging;
pub mod routes;

pub use config::{ConfigError, LogFormat, OcrConfig, ServerConfig};
pub use error::ApiError;
pub use routes::{router, AppState};

use shelfcheck_ocr::OcrBackend;

/// The OCR engine compiled into this build.
#[cfg(feature = "tesseract")]
pub fn ocr_backend(config: &OcrConfig) -> Box<dyn OcrBackend> {
    tracing::info!(lang = %config.lang, psm = config.page_seg_mode, "using Tesseract OCR backend");
    Box::new(
        shelfcheck_ocr::TesseractRecognizer::new(config.data_path.clone(), &config.lang)
            .with_page_seg_mode(config.page_seg_mode),
    )
}

/// The OCR engine compiled into this build.
#[cfg(not(feature = "tesseract"))]
pub fn ocr_backend(_config: &OcrConfig) -> Box<dyn OcrBackend> {
    tracing::warn!("built without the `tesseract` feature; every scan will fail");
    Box::new(shelfcheck_ocr::UnavailableRecognizer)
}
