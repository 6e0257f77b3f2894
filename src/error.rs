use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Server Error: {status}")]
    Status { status: reqwest::StatusCode },

    #[error("invalid url {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("invalid location: {0}")]
    InvalidLocation(String),

    /// The upload is not an image; nothing was sent.
    #[error("Please upload a valid image. (got {mime})")]
    InvalidImage { mime: String },

    #[error("No image selected. Please upload an image.")]
    MissingImage,

    #[error("fail to read image: {0}")]
    Io(#[from] std::io::Error),
}

impl ClientError {
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidImage { .. } | Self::MissingImage | Self::InvalidLocation(_)
        )
    }
}

pub type ClientResult<T> = Result<T, ClientError>;
