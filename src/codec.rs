use std::error::Error;
use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use tracing::warn;

pub const DEFAULT_MAX_EDGE_PX: u32 = 1024;
pub const DEFAULT_JPEG_QUALITY: u8 = 70;

const JPEG_DATA_URL_PREFIX: &str = "data:image/jpeg;base64,";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub data_url: String,
    pub width: u32,
    pub height: u32,
}

pub trait ImageCodec {
    fn encode(&self, raw: &[u8]) -> Result<EncodedImage, CodecError>;
}

#[derive(Debug)]
pub enum CodecError {
    Decode(image::ImageError),
    Encode(image::ImageError),
    InvalidDataUrl,
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecError::Decode(err) => write!(f, "could not decode image: {}", err),
            CodecError::Encode(err) => write!(f, "could not encode image: {}", err),
            CodecError::InvalidDataUrl => write!(f, "image data URL is not base64 encoded"),
        }
    }
}

impl Error for CodecError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            CodecError::Decode(err) => Some(err),
            CodecError::Encode(err) => Some(err),
            CodecError::InvalidDataUrl => None,
        }
    }
}

/// Re-encodes stills as JPEG data URLs with the longer edge capped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JpegCodec {
    max_edge: u32,
    quality: u8,
}

impl Default for JpegCodec {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_EDGE_PX, DEFAULT_JPEG_QUALITY)
    }
}

impl JpegCodec {
    pub fn new(max_edge: u32, quality: u8) -> Self {
        Self {
            max_edge: max_edge.max(1),
            quality: quality.clamp(1, 100),
        }
    }
}

impl ImageCodec for JpegCodec {
    fn encode(&self, raw: &[u8]) -> Result<EncodedImage, CodecError> {
        let decoded = image::load_from_memory(raw).map_err(CodecError::Decode)?;
        let (width, height) = bounded_dimensions(decoded.width(), decoded.height(), self.max_edge);
        let resized = if (width, height) == (decoded.width(), decoded.height()) {
            decoded
        } else {
            decoded.resize_exact(width, height, FilterType::Triangle)
        };

        let mut buf = Vec::new();
        JpegEncoder::new_with_quality(&mut buf, self.quality)
            .encode_image(&resized.to_rgb8())
            .map_err(CodecError::Encode)?;

        Ok(EncodedImage {
            data_url: format!("{JPEG_DATA_URL_PREFIX}{}", STANDARD.encode(&buf)),
            width,
            height,
        })
    }
}

/// Scales so the longer edge is at most `max_edge`, keeping the aspect ratio.
/// Square images are bounded on their height, which is the same thing.
pub fn bounded_dimensions(width: u32, height: u32, max_edge: u32) -> (u32, u32) {
    let scale = |short: u32, long: u32| -> u32 {
        let scaled = f64::from(short) * f64::from(max_edge) / f64::from(long);
        (scaled.round() as u32).max(1)
    };
    if width > height {
        if width > max_edge {
            return (max_edge, scale(height, width));
        }
    } else if height > max_edge {
        return (scale(width, height), max_edge);
    }
    (width, height)
}

/// Decodes the payload of a `data:<mime>;base64,<payload>` string.
pub fn decode_data_url(data_url: &str) -> Result<Vec<u8>, CodecError> {
    let (header, payload) = data_url
        .split_once(',')
        .ok_or(CodecError::InvalidDataUrl)?;
    if !header.starts_with("data:") || !header.ends_with(";base64") {
        return Err(CodecError::InvalidDataUrl);
    }
    STANDARD
        .decode(payload.trim())
        .map_err(|_| CodecError::InvalidDataUrl)
}

/// Encodes at most `limit` images; an image that fails to encode is dropped
/// and the rest of the batch continues.
pub fn encode_batch<C: ImageCodec + ?Sized>(
    codec: &C,
    raw_images: &[Vec<u8>],
    limit: usize,
) -> Vec<EncodedImage> {
    raw_images
        .iter()
        .take(limit)
        .enumerate()
        .filter_map(|(position, raw)| match codec.encode(raw) {
            Ok(encoded) => Some(encoded),
            Err(err) => {
                warn!(position, error = %err, "dropping image that failed to encode");
                None
            }
        })
        .collect()
}
