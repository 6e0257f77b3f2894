use std::path::Path;

use crate::error::{ClientError, ClientResult};

/// An image ready to be posted to the image search endpoint.
///
/// Construction fails unless the MIME type is `image/*`, so holding an
/// `ImageUpload` means validation already happened.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    file_name: String,
    mime: String,
    bytes: Vec<u8>,
}

impl ImageUpload {
    pub fn new(
        file_name: impl Into<String>,
        mime: impl Into<String>,
        bytes: Vec<u8>,
    ) -> ClientResult<Self> {
        let mime = mime.into();
        validate_mime(&mime)?;
        Ok(Self {
            file_name: file_name.into(),
            mime,
            bytes,
        })
    }

    /// Load an image from disk. The MIME type is guessed from the extension
    /// and checked before the file is read.
    pub async fn from_path(path: impl AsRef<Path>) -> ClientResult<Self> {
        let path = path.as_ref();
        let mime = mime_guess::from_path(path)
            .first_raw()
            .unwrap_or("application/octet-stream");
        validate_mime(mime)?;

        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("image")
            .to_string();
        Self::new(file_name, mime, bytes)
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub(crate) fn into_part(self) -> ClientResult<reqwest::multipart::Part> {
        let part = reqwest::multipart::Part::bytes(self.bytes)
            .file_name(self.file_name)
            .mime_str(&self.mime)?;
        Ok(part)
    }
}

/// Exact, case-sensitive `image/` prefix, as browsers report it.
pub fn is_image_mime(mime: &str) -> bool {
    mime.starts_with("image/")
}

fn validate_mime(mime: &str) -> ClientResult<()> {
    if is_image_mime(mime) {
        Ok(())
    } else {
        Err(ClientError::InvalidImage {
            mime: mime.to_string(),
        })
    }
}
