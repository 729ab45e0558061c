use base64::{engine::general_purpose::STANDARD, Engine};
use image::{DynamicImage, GrayImage, ImageBuffer, Luma};
use std::io::Cursor;
use thiserror::Error;

/// Tesseract works best at 300 DPI / ~2000 px.
const MAX_DIMENSION: u32 = 2800;
/// Roughly a 5×5 Gaussian kernel.
const BLUR_SIGMA: f32 = 1.1;
/// Half-width of the 11×11 neighbourhood used for the local threshold.
const BLOCK_RADIUS: u32 = 5;
const THRESHOLD_OFFSET: u64 = 2;

#[derive(Debug, Error)]
pub enum PreprocessError {
    #[error("Image decoding failed. Ensure the image data is properly formatted: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("Image decoding failed. Ensure the image data is properly formatted: {0}")]
    Load(#[from] image::ImageError),
    #[error("Failed to encode processed image: {0}")]
    Encode(String),
}

/// Decode a base64 image payload, with or without a `data:<mime>;base64,` prefix.
pub fn decode_payload(payload: &str) -> Result<Vec<u8>, PreprocessError> {
    let data = payload.split_once(',').map_or(payload, |(_, rest)| rest);
    let data: String = data.chars().filter(|c| !c.is_whitespace()).collect();
    Ok(STANDARD.decode(data)?)
}

/// Process raw image bytes (JPEG / PNG / WEBP / …) and return binarized PNG bytes.
pub fn prepare_for_ocr_from_bytes(data: &[u8]) -> Result<Vec<u8>, PreprocessError> {
    let img = image::load_from_memory(data)?;
    encode_as_png(binarize(img))
}

/// Grayscale + blur + adaptive threshold. Output pixels are either 0 or 255.
fn binarize(img: DynamicImage) -> DynamicImage {
    let gray = downscale(img).to_luma8();
    let blurred = image::imageops::blur(&gray, BLUR_SIGMA);
    DynamicImage::ImageLuma8(adaptive_threshold(&blurred))
}

fn downscale(img: DynamicImage) -> DynamicImage {
    if img.width() > MAX_DIMENSION || img.height() > MAX_DIMENSION {
        img.resize(MAX_DIMENSION, MAX_DIMENSION, image::imageops::FilterType::Lanczos3)
    } else {
        img
    }
}

/// White where a pixel is brighter than its neighbourhood mean minus the offset.
fn adaptive_threshold(gray: &GrayImage) -> GrayImage {
    let (w, h) = gray.dimensions();
    let stride = w as usize + 1;

    // Summed-area table with a zero row and column in front.
    let mut integral = vec![0u64; stride * (h as usize + 1)];
    for y in 0..h as usize {
        let mut row_sum = 0u64;
        for x in 0..w as usize {
            row_sum += gray.get_pixel(x as u32, y as u32)[0] as u64;
            integral[(y + 1) * stride + x + 1] = integral[y * stride + x + 1] + row_sum;
        }
    }
    let at = |x: u32, y: u32| integral[y as usize * stride + x as usize];

    ImageBuffer::from_fn(w, h, |x, y| {
        let (x0, y0) = (x.saturating_sub(BLOCK_RADIUS), y.saturating_sub(BLOCK_RADIUS));
        let (x1, y1) = ((x + BLOCK_RADIUS + 1).min(w), (y + BLOCK_RADIUS + 1).min(h));
        let sum = at(x1, y1) + at(x0, y0) - at(x0, y1) - at(x1, y0);
        let area = ((x1 - x0) * (y1 - y0)) as u64;
        let p = gray.get_pixel(x, y)[0] as u64;
        // p > sum / area - offset, kept in integers.
        if (p + THRESHOLD_OFFSET) * area > sum {
            Luma([255u8])
        } else {
            Luma([0u8])
        }
    })
}

fn encode_as_png(img: DynamicImage) -> Result<Vec<u8>, PreprocessError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .map_err(|e| PreprocessError::Encode(e.to_string()))?;
    Ok(buf)
}
