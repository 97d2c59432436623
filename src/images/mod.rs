//! Photo encoding for task attachments.
//!
//! Selected photos are downscaled and re-encoded before they are stored as
//! data URIs inside the persisted document, keeping the store's capacity
//! budget in check. A batch of photos is processed one at a time through an
//! explicit queue; an image that cannot be decoded falls back to its
//! original bytes rather than failing the batch.

use std::io::Cursor;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use image::{DynamicImage, ImageFormat, ImageOutputFormat};

use crate::Result;

/// Longest edge, in pixels, an encoded photo may have.
pub const MAX_EDGE: u32 = 1024;

/// JPEG quality for re-encoded photos.
pub const JPEG_QUALITY: u8 = 70;

/// Encodes raw image bytes into the string representation stored on a task.
pub trait ImageEncoder {
    /// Encode raw image bytes. Errors are recoverable: the caller falls
    /// back to the unprocessed original.
    fn encode(&self, raw: &[u8]) -> Result<String>;
}

/// Downscales to fit `MAX_EDGE` and re-encodes as JPEG at `JPEG_QUALITY`,
/// emitting a `data:image/jpeg;base64,...` URI.
pub struct JpegEncoder {
    max_edge: u32,
    quality: u8,
}

impl JpegEncoder {
    pub fn new() -> Self {
        Self {
            max_edge: MAX_EDGE,
            quality: JPEG_QUALITY,
        }
    }
}

impl Default for JpegEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageEncoder for JpegEncoder {
    fn encode(&self, raw: &[u8]) -> Result<String> {
        let img = image::load_from_memory(raw)?;

        let img = if img.width() > self.max_edge || img.height() > self.max_edge {
            img.thumbnail(self.max_edge, self.max_edge)
        } else {
            img
        };

        // JPEG has no alpha channel; flatten before encoding.
        let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
        let mut buf = Vec::new();
        rgb.write_to(
            &mut Cursor::new(&mut buf),
            ImageOutputFormat::Jpeg(self.quality),
        )?;

        Ok(format!("data:image/jpeg;base64,{}", BASE64.encode(&buf)))
    }
}

/// Wrap raw bytes in a data URI without re-encoding, sniffing the format
/// for the MIME type. Used as the per-image fallback.
pub fn fallback_data_uri(raw: &[u8]) -> String {
    let mime = image::guess_format(raw)
        .map(mime_for)
        .unwrap_or("application/octet-stream");
    format!("data:{};base64,{}", mime, BASE64.encode(raw))
}

fn mime_for(format: ImageFormat) -> &'static str {
    match format {
        ImageFormat::Png => "image/png",
        ImageFormat::Jpeg => "image/jpeg",
        ImageFormat::Gif => "image/gif",
        ImageFormat::WebP => "image/webp",
        ImageFormat::Bmp => "image/bmp",
        ImageFormat::Tiff => "image/tiff",
        _ => "application/octet-stream",
    }
}

/// One processed photo.
#[derive(Debug, Clone)]
pub struct EncodedImage {
    /// The stored representation (a data URI).
    pub data_uri: String,
    /// True when the image could not be re-encoded and the original bytes
    /// were kept instead.
    pub fallback: bool,
}

/// A queue of pending photos, processed strictly one at a time.
///
/// Mirrors the upload flow: photos accumulate as they are selected, a
/// pending one can be removed before submission, and `process_all` drains
/// the queue sequentially under a single batch-wide processing flag.
#[derive(Default)]
pub struct EncodeQueue {
    pending: Vec<Vec<u8>>,
    processing: bool,
}

impl EncodeQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add raw image bytes to the end of the queue.
    pub fn push(&mut self, raw: Vec<u8>) {
        self.pending.push(raw);
    }

    /// Remove the pending image at `index`. Returns false when out of
    /// range.
    pub fn remove(&mut self, index: usize) -> bool {
        if index < self.pending.len() {
            self.pending.remove(index);
            true
        } else {
            false
        }
    }

    /// Number of pending images.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Whether a batch is currently being processed. One flag spans the
    /// whole batch; there is no per-image progress.
    pub fn is_processing(&self) -> bool {
        self.processing
    }

    /// Drain the queue, encoding each image in order, one at a time.
    ///
    /// An image the encoder rejects falls back to its original bytes, so
    /// the batch as a whole still succeeds. Output order matches insertion
    /// order.
    pub fn process_all(&mut self, encoder: &dyn ImageEncoder) -> Vec<EncodedImage> {
        self.processing = true;
        let pending = std::mem::take(&mut self.pending);

        let mut results = Vec::with_capacity(pending.len());
        for raw in pending {
            let encoded = match encoder.encode(&raw) {
                Ok(data_uri) => EncodedImage {
                    data_uri,
                    fallback: false,
                },
                Err(_) => EncodedImage {
                    data_uri: fallback_data_uri(&raw),
                    fallback: true,
                },
            };
            results.push(encoded);
        }

        self.processing = false;
        results
    }
}
