use crate::rank::Detection;
use serde::{Deserialize, Serialize};

/// A base 64 encoded image to run detection on
#[derive(Deserialize, Serialize)]
pub struct DetectRequest {
    pub image_data: String,
}

impl std::fmt::Debug for DetectRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "DetectRequest {{ image_data: <{} chars> }}",
            self.image_data.len()
        )
    }
}

/// The best detections, highest confidence first
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct DetectResponse {
    pub top: Vec<Detection>,
}
