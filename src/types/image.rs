//! Face image input.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use bytes::Bytes;

use crate::errors::{ReeveError, ReeveResult};
use crate::transport::MultipartPart;

const DEFAULT_FILENAME: &str = "face.jpg";

/// A face image supplied to an upload, recognition or comparison call.
#[derive(Debug, Clone, PartialEq)]
pub enum FaceImage {
    /// Raw image bytes.
    Binary {
        /// Image data.
        data: Bytes,
        /// File name reported in the multipart part.
        filename: String,
        /// MIME type of the image.
        content_type: mime::Mime,
    },
    /// A base64-encoded image.
    Base64(String),
}

impl FaceImage {
    /// Creates a JPEG image.
    pub fn jpeg(data: impl Into<Bytes>) -> Self {
        FaceImage::Binary {
            data: data.into(),
            filename: DEFAULT_FILENAME.to_string(),
            content_type: mime::IMAGE_JPEG,
        }
    }

    /// Creates a PNG image.
    pub fn png(data: impl Into<Bytes>) -> Self {
        FaceImage::Binary {
            data: data.into(),
            filename: "face.png".to_string(),
            content_type: mime::IMAGE_PNG,
        }
    }

    /// Creates an image with an explicit MIME type such as `image/webp`.
    pub fn new(data: impl Into<Bytes>, content_type: &str) -> ReeveResult<Self> {
        let content_type: mime::Mime = content_type
            .parse()
            .map_err(|e| ReeveError::validation(format!("Invalid image content type: {e}")))?;

        if content_type.type_() != mime::IMAGE {
            return Err(ReeveError::validation(format!(
                "Expected an image content type, got {content_type}"
            )));
        }

        let extension = content_type.subtype().as_str().to_string();
        Ok(FaceImage::Binary {
            data: data.into(),
            filename: format!("face.{extension}"),
            content_type,
        })
    }

    /// Wraps an already base64-encoded image.
    pub fn base64(encoded: impl Into<String>) -> Self {
        FaceImage::Base64(encoded.into())
    }

    /// Encodes raw bytes as a base64 image.
    pub fn encode_base64(data: &[u8]) -> Self {
        FaceImage::Base64(STANDARD.encode(data))
    }

    /// Overrides the file name of a binary image.
    pub fn with_filename(mut self, name: impl Into<String>) -> Self {
        if let FaceImage::Binary { filename, .. } = &mut self {
            *filename = name.into();
        }
        self
    }

    /// Returns true for base64 input.
    pub fn is_base64(&self) -> bool {
        matches!(self, FaceImage::Base64(_))
    }

    /// Rejects empty input before anything is sent.
    pub(crate) fn validate(&self) -> ReeveResult<()> {
        let empty = match self {
            FaceImage::Binary { data, .. } => data.is_empty(),
            FaceImage::Base64(encoded) => encoded.trim().is_empty(),
        };

        if empty {
            return Err(ReeveError::validation("Face image is empty"));
        }
        Ok(())
    }

    /// Builds a file part named `field`, decoding base64 input.
    ///
    /// `filename` replaces the image's own name when given.
    pub(crate) fn into_file_part(
        self,
        field: &str,
        filename: Option<&str>,
    ) -> ReeveResult<MultipartPart> {
        self.validate()?;

        let (data, own_name, content_type) = match self {
            FaceImage::Binary {
                data,
                filename,
                content_type,
            } => (data, filename, content_type.to_string()),
            FaceImage::Base64(encoded) => {
                let decoded = STANDARD
                    .decode(strip_data_url(&encoded))
                    .map_err(|e| ReeveError::validation(format!("Invalid base64 image: {e}")))?;
                (
                    Bytes::from(decoded),
                    DEFAULT_FILENAME.to_string(),
                    mime::IMAGE_JPEG.to_string(),
                )
            }
        };

        Ok(MultipartPart::File {
            name: field.to_string(),
            filename: filename.map_or(own_name, str::to_string),
            content_type,
            data,
        })
    }

    /// Builds a text part named `field` carrying the base64 encoding.
    pub(crate) fn into_text_part(self, field: &str) -> ReeveResult<MultipartPart> {
        self.validate()?;

        let encoded = match self {
            FaceImage::Base64(encoded) => strip_data_url(&encoded).to_string(),
            FaceImage::Binary { data, .. } => STANDARD.encode(&data),
        };
        Ok(MultipartPart::text(field, encoded))
    }
}

/// Drops a `data:image/...;base64,` prefix.
fn strip_data_url(encoded: &str) -> &str {
    let encoded = encoded.trim();
    match encoded.split_once(";base64,") {
        Some((prefix, rest)) if prefix.starts_with("data:") => rest,
        _ => encoded,
    }
}

impl From<Vec<u8>> for FaceImage {
    fn from(data: Vec<u8>) -> Self {
        FaceImage::jpeg(data)
    }
}

impl From<Bytes> for FaceImage {
    fn from(data: Bytes) -> Self {
        FaceImage::jpeg(data)
    }
}

impl From<&'static [u8]> for FaceImage {
    fn from(data: &'static [u8]) -> Self {
        FaceImage::jpeg(Bytes::from_static(data))
    }
}
