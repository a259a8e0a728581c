//! Everything that can go wrong while serving a detection request

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DetectError {
    /// The payload was not valid base64 or not a decodable image
    #[error("decode error: {0}")]
    Decode(String),

    /// The artifact could not be written
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The detector failed
    #[error("inference error: {0}")]
    Inference(String),
}

impl From<base64::DecodeError> for DetectError {
    fn from(err: base64::DecodeError) -> Self {
        DetectError::Decode(err.to_string())
    }
}

impl From<image::ImageError> for DetectError {
    fn from(err: image::ImageError) -> Self {
        DetectError::Decode(err.to_string())
    }
}

impl From<tch::TchError> for DetectError {
    fn from(err: tch::TchError) -> Self {
        DetectError::Inference(err.to_string())
    }
}
