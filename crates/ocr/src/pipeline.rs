use std::path::Path;
use thiserror::Error;

use shelfcheck_core::{DateExtractor, TextCleaner};

use crate::preprocess;
use crate::recognizer::{OcrBackend, OcrError};
use crate::types::ScanOutcome;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Preprocess(#[from] crate::preprocess::PreprocessError),
    #[error("OCR recognition failed: {0}")]
    Ocr(#[from] OcrError),
}

/// Orchestrates: decode → binarize → OCR → clean → extract.
pub struct ScanPipeline<R: OcrBackend> {
    recognizer: R,
    cleaner: TextCleaner,
}

impl<R: OcrBackend> ScanPipeline<R> {
    pub fn new(recognizer: R) -> Self {
        Self { recognizer, cleaner: TextCleaner::default() }
    }

    pub fn with_cleaner(mut self, cleaner: TextCleaner) -> Self {
        self.cleaner = cleaner;
        self
    }

    /// Process a base64 payload as posted by the capture page.
    pub fn scan_payload(&self, payload: &str) -> Result<ScanOutcome, PipelineError> {
        let bytes = preprocess::decode_payload(payload)?;
        self.scan_bytes(&bytes)
    }

    /// Process a file on disk.
    pub fn scan_file(&self, path: &Path) -> Result<ScanOutcome, PipelineError> {
        let bytes = std::fs::read(path)?;
        self.scan_bytes(&bytes)
    }

    /// Process raw encoded image bytes.
    pub fn scan_bytes(&self, data: &[u8]) -> Result<ScanOutcome, PipelineError> {
        let image_bytes = preprocess::prepare_for_ocr_from_bytes(data)?;
        self.scan_prepared(&image_bytes)
    }

    /// Run OCR and extraction on an image that is already binarized.
    pub fn scan_prepared(&self, image_bytes: &[u8]) -> Result<ScanOutcome, PipelineError> {
        let ocr_text = self.recognizer.recognize(image_bytes)?;
        tracing::debug!(text = %ocr_text, "raw OCR output");

        let cleaned_text = self.cleaner.clean(&ocr_text);
        let extraction = DateExtractor::try_extract(&cleaned_text);

        Ok(ScanOutcome { ocr_text, cleaned_text, extraction })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recognizer::{MockRecognizer, UnavailableRecognizer};
    use base64::{engine::general_purpose::STANDARD, Engine};
    use image::{DynamicImage, GrayImage, ImageBuffer, Luma};
    use shelfcheck_core::{DateFormat, ExpiryDate, ExtractionMiss};
    use std::io::Cursor;

    fn tiny_png() -> Vec<u8> {
        let img: GrayImage = ImageBuffer::from_fn(4, 4, |_, _| Luma([200u8]));
        let mut buf = Vec::new();
        DynamicImage::ImageLuma8(img)
            .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        buf
    }

    #[test]
    fn scan_bytes_extracts_month_name_date() {
        let pipeline = ScanPipeline::new(MockRecognizer::new("BEST BEFORE\nDEC 2024\n"));
        let outcome = pipeline.scan_bytes(&tiny_png()).unwrap();

        assert_eq!(outcome.cleaned_text, "BEST BEF0RE\nDEC 2024");
        let m = outcome.extraction.unwrap();
        assert_eq!(m.date, ExpiryDate::new(2024, 12, 31).unwrap());
        assert_eq!(m.format, DateFormat::MonthNameYear);
    }

    #[test]
    fn scan_bytes_repairs_ocr_misreads() {
        let pipeline = ScanPipeline::new(MockRecognizer::new("EXP l5/O6/2O25"));
        let outcome = pipeline.scan_bytes(&tiny_png()).unwrap();
        assert_eq!(outcome.expiry_date(), ExpiryDate::new(2025, 6, 15));
    }

    #[test]
    fn scan_payload_accepts_data_url() {
        let pipeline = ScanPipeline::new(MockRecognizer::new("12-2024"));
        let payload = format!("data:image/png;base64,{}", STANDARD.encode(tiny_png()));
        let outcome = pipeline.scan_payload(&payload).unwrap();
        assert_eq!(outcome.expiry_date(), ExpiryDate::new(2024, 12, 31));
        assert_eq!(outcome.is_expired(), Some(true));
    }

    #[test]
    fn no_date_is_an_outcome_not_an_error() {
        let pipeline = ScanPipeline::new(MockRecognizer::new("NET WT 250G"));
        let outcome = pipeline.scan_bytes(&tiny_png()).unwrap();
        assert_eq!(outcome.extraction, Err(ExtractionMiss::NoPatternMatch));
        assert_eq!(outcome.is_expired(), None);
    }

    #[test]
    fn blank_ocr_text_is_no_text() {
        let pipeline = ScanPipeline::new(MockRecognizer::new("  \n "));
        let outcome = pipeline.scan_bytes(&tiny_png()).unwrap();
        assert_eq!(outcome.extraction, Err(ExtractionMiss::NoTextDetected));
    }

    #[test]
    fn undecodable_image_is_preprocess_error() {
        let pipeline = ScanPipeline::new(MockRecognizer::new("12/2024"));
        assert!(matches!(pipeline.scan_bytes(b"nope"), Err(PipelineError::Preprocess(_))));
        assert!(matches!(pipeline.scan_payload("***"), Err(PipelineError::Preprocess(_))));
    }

    #[test]
    fn engine_failure_is_ocr_error() {
        let pipeline = ScanPipeline::new(UnavailableRecognizer);
        assert!(matches!(
            pipeline.scan_bytes(&tiny_png()),
            Err(PipelineError::Ocr(OcrError::NotAvailable))
        ));
    }

    #[test]
    fn custom_cleaner_is_used() {
        const NONE: &[(char, char)] = &[];
        let pipeline = ScanPipeline::new(MockRecognizer::new("O1/2O24"))
            .with_cleaner(TextCleaner::new(NONE));
        let outcome = pipeline.scan_bytes(&tiny_png()).unwrap();
        assert_eq!(outcome.extraction, Err(ExtractionMiss::NoPatternMatch));
    }

    #[test]
    fn scan_file_reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("label.png");
        std::fs::write(&path, tiny_png()).unwrap();

        let pipeline = ScanPipeline::new(MockRecognizer::new("31/01/2030"));
        let outcome = pipeline.scan_file(&path).unwrap();
        assert_eq!(outcome.expiry_date(), ExpiryDate::new(2030, 1, 31));
    }

    #[test]
    fn scan_file_missing_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = ScanPipeline::new(MockRecognizer::new("12/2024"));
        assert!(matches!(pipeline.scan_file(&dir.path().join("absent.png")), Err(PipelineError::Io(_))));
    }
}
