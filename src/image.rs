use base64::{Engine as _, engine::general_purpose};
use std::path::Path;

use crate::error::{DescribeError, Result};

/// A decoded, transport-ready image.
///
/// Built only through [`decode_data_url`] and the constructors below, so a
/// record always carries both a payload and a content type. Fields are
/// private: a new upload produces a new record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageRecord {
    payload: String,
    content_type: String,
    preview: String,
}

impl ImageRecord {
    /// Encodes raw image bytes the way a browser file reader would and
    /// decodes the resulting data URL.
    pub fn from_bytes(bytes: &[u8], content_type: &str) -> Result<Self> {
        decode_data_url(&encode_data_url(bytes, content_type))
    }

    /// Reads a whole image file and builds a record from it.
    ///
    /// The MIME type comes from the file's magic bytes, or from its
    /// extension when the bytes are not recognized.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .map_err(|e| DescribeError::decode(format!("{}: {e}", path.display())))?;

        let content_type = infer::get(&bytes)
            .map(|kind| kind.mime_type().to_string())
            .or_else(|| mime_guess::from_path(path).first().map(|m| m.to_string()))
            .ok_or_else(|| {
                DescribeError::decode(format!(
                    "{}: could not determine the image format",
                    path.display()
                ))
            })?;

        log::debug!(
            "Read {} bytes of {} from {}",
            bytes.len(),
            content_type,
            path.display()
        );

        Self::from_bytes(&bytes, &content_type)
    }

    /// Base64 image data, without any data URL prefix.
    pub fn payload(&self) -> &str {
        &self.payload
    }

    /// MIME type taken from the data URL header, e.g. `image/png`.
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// The original data URL, for on-screen preview only.
    pub fn preview(&self) -> &str {
        &self.preview
    }

    /// Size of the image once the payload is base64-decoded.
    pub fn decoded_len(&self) -> usize {
        let padding = self.payload.bytes().rev().take_while(|b| *b == b'=').count();
        (self.payload.len() / 4 * 3).saturating_sub(padding)
    }
}

/// Formats bytes as `data:<mime>;base64,<data>`.
pub fn encode_data_url(bytes: &[u8], content_type: &str) -> String {
    format!(
        "data:{};base64,{}",
        content_type,
        general_purpose::STANDARD.encode(bytes)
    )
}

/// Splits a data URL at its first comma and pulls the MIME type out of
/// the header's `:...;` envelope.
pub fn decode_data_url(url: &str) -> Result<ImageRecord> {
    let (header, payload) = url
        .split_once(',')
        .ok_or_else(|| DescribeError::decode("the data URL has no payload"))?;

    let content_type = header
        .split_once(':')
        .and_then(|(_, rest)| rest.split_once(';'))
        .map(|(mime, _)| mime.trim())
        .filter(|mime| !mime.is_empty())
        .ok_or_else(|| DescribeError::decode("could not determine the image MIME type"))?;

    Ok(ImageRecord {
        payload: payload.to_string(),
        content_type: content_type.to_string(),
        preview: url.to_string(),
    })
}
