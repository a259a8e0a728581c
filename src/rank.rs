//! Ordering detections for the response

use crate::config::TOP_N;
use serde::{Deserialize, Serialize};

/// A labelled detection as the client sees it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub name: String,
    pub confidence: f32,
}

/// Sort by descending confidence and keep the best `TOP_N`. The sort is
/// stable, so equal confidences keep the detector's order
pub fn rank(mut detections: Vec<Detection>) -> Vec<Detection> {
    detections.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    detections.truncate(TOP_N);
    detections
}
