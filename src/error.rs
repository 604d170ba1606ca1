use axum::http::StatusCode;
use thiserror::Error;

/// Every way a resize request can fail. The `Display` text is the exact
/// plain-text body sent back to the client; sources are only logged.
#[derive(Debug, Error)]
pub enum ResizeError {
    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Failed to parse multipart form")]
    MalformedMultipart(String),

    #[error("Failed to retrieve file")]
    MissingFile,

    #[error("Invalid width value")]
    InvalidWidth,

    #[error("Invalid height value")]
    InvalidHeight,

    #[error("Invalid quality value")]
    InvalidQuality,

    #[error("Invalid format")]
    InvalidFormat,

    #[error("Requested dimensions too large")]
    TooManyPixels { width: u32, height: u32 },

    #[error("Failed to decode image")]
    Decode(#[source] image::ImageError),

    #[error("Failed to encode image")]
    Encode(#[source] image::ImageError),

    #[error("Internal server error")]
    Internal(String),
}

impl ResizeError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::MalformedMultipart(_)
            | Self::MissingFile
            | Self::InvalidWidth
            | Self::InvalidHeight
            | Self::InvalidQuality
            | Self::InvalidFormat
            | Self::TooManyPixels { .. } => StatusCode::BAD_REQUEST,
            // Undecodable uploads map to 500.
            Self::Decode(_) | Self::Encode(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}
