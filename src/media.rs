//! Media helpers: inline images for vision requests and PDF text excerpts.

use base64::Engine;
use tracing::{debug, info};

use crate::errors::{BotError, Result};

/// Maximum number of characters of a PDF handed to the model
pub const PDF_EXCERPT_CHARS: usize = 4000;

/// Caption used when a photo arrives without one
pub const DEFAULT_IMAGE_PROMPT: &str = "What is in this image?";

/// MIME type of an image, sniffed from its first bytes. Telegram photos are
/// JPEG, so that is the fallback.
pub fn detect_image_mime(bytes: &[u8]) -> &'static str {
    match image::guess_format(bytes) {
        Ok(image::ImageFormat::Png) => "image/png",
        Ok(image::ImageFormat::Gif) => "image/gif",
        Ok(image::ImageFormat::WebP) => "image/webp",
        Ok(image::ImageFormat::Bmp) => "image/bmp",
        Ok(image::ImageFormat::Tiff) => "image/tiff",
        Ok(format) => {
            debug!(format = ?format, "Unusual image format, labelling as JPEG");
            "image/jpeg"
        }
        Err(_) => "image/jpeg",
    }
}

/// `data:` URL embedding the image as base64
pub fn image_data_url(bytes: &[u8]) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
    format!("data:{};base64,{}", detect_image_mime(bytes), encoded)
}

/// Concatenated text of every page of a PDF
pub fn extract_pdf_text(bytes: &[u8]) -> Result<String> {
    let text = pdf_extract::extract_text_from_mem(bytes)
        .map_err(|e| BotError::Media(format!("failed to read PDF: {e}")))?;
    info!(chars = text.chars().count(), "PDF text extracted");
    Ok(text)
}

/// At most `max_chars` characters of `text`, cut on a char boundary
pub fn excerpt(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// User turn asking the model to summarize a document
pub fn summary_request(text: &str) -> String {
    format!("Summarize this PDF:\n\n{}", excerpt(text, PDF_EXCERPT_CHARS))
}
