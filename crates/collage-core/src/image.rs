//! Image payloads carried as data URIs.

use base64::{Engine, engine::general_purpose::STANDARD};
use thiserror::Error;

/// Errors from decoding a data URI.
#[derive(Debug, Error)]
pub enum DataUriError {
    #[error("Not a data URI")]
    NotDataUri,
    #[error("Only base64 data URIs are supported")]
    NotBase64,
    #[error("Invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
}

/// Image format for stored image data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
    WebP,
    Gif,
}

impl ImageFormat {
    /// Get MIME type for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::WebP => "image/webp",
            ImageFormat::Gif => "image/gif",
        }
    }

    /// Detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "png" => Some(ImageFormat::Png),
            "jpg" | "jpeg" => Some(ImageFormat::Jpeg),
            "webp" => Some(ImageFormat::WebP),
            "gif" => Some(ImageFormat::Gif),
            _ => None,
        }
    }

    /// Detect format from magic bytes.
    pub fn from_magic_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < 4 {
            return None;
        }
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
            return Some(ImageFormat::Png);
        }
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(ImageFormat::Jpeg);
        }
        if data.starts_with(b"GIF8") {
            return Some(ImageFormat::Gif);
        }
        if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
            return Some(ImageFormat::WebP);
        }
        None
    }
}

/// Encode raw file bytes as a data URI.
///
/// The MIME type comes from the magic bytes; unknown content is labelled
/// `application/octet-stream` and left for the renderer to reject.
pub fn to_data_uri(data: &[u8]) -> String {
    let mime = ImageFormat::from_magic_bytes(data)
        .map(|f| f.mime_type())
        .unwrap_or("application/octet-stream");
    format!("data:{};base64,{}", mime, STANDARD.encode(data))
}

/// A decoded data URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUri {
    pub mime: String,
    pub data: Vec<u8>,
}

impl DataUri {
    /// Parse `data:<mime>;base64,<payload>`.
    pub fn parse(uri: &str) -> Result<Self, DataUriError> {
        let rest = uri.strip_prefix("data:").ok_or(DataUriError::NotDataUri)?;
        let (header, payload) = rest.split_once(',').ok_or(DataUriError::NotDataUri)?;
        let mime = header
            .strip_suffix(";base64")
            .ok_or(DataUriError::NotBase64)?;
        let data = STANDARD.decode(payload.trim())?;
        Ok(Self {
            mime: mime.to_string(),
            data,
        })
    }

    /// Format implied by the payload, falling back to the declared MIME type.
    pub fn format(&self) -> Option<ImageFormat> {
        ImageFormat::from_magic_bytes(&self.data).or_else(|| {
            self.mime
                .strip_prefix("image/")
                .and_then(ImageFormat::from_extension)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_MAGIC: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

    #[test]
    fn test_to_data_uri_detects_png() {
        let uri = to_data_uri(&PNG_MAGIC);
        assert!(uri.starts_with("data:image/png;base64,"));

        let parsed = DataUri::parse(&uri).unwrap();
        assert_eq!(parsed.mime, "image/png");
        assert_eq!(parsed.data, PNG_MAGIC);
        assert_eq!(parsed.format(), Some(ImageFormat::Png));
    }

    #[test]
    fn test_unknown_bytes_are_not_rejected() {
        let uri = to_data_uri(b"hello world");
        assert!(uri.starts_with("data:application/octet-stream;base64,"));
        assert_eq!(DataUri::parse(&uri).unwrap().format(), None);
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(DataUri::parse("http://x/y.png"), Err(DataUriError::NotDataUri)));
        assert!(matches!(DataUri::parse("data:text/plain,hi"), Err(DataUriError::NotBase64)));
        assert!(matches!(DataUri::parse("data:image/png;base64,@@@"), Err(DataUriError::Base64(_))));
    }
}
