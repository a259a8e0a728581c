//! The request pipeline: decode, persist, detect, rank. Every step is
//! blocking; callers on an async runtime should move this onto a blocking
//! thread

use crate::config::CONFIDENCE_THRESHOLD;
use crate::decode;
use crate::detector::Detector;
use crate::error::DetectError;
use crate::rank::{self, Detection};
use crate::storage::ArtifactStore;
use tracing::{debug, info};

/// Run one detection request end to end.
///
/// The artifact is written as soon as the base 64 decodes, before the bytes
/// are checked to be an image, and it is not removed if a later step fails.
#[tracing::instrument(skip_all)]
pub fn run(
    detector: &dyn Detector,
    store: &ArtifactStore,
    image_data: &str,
) -> Result<Vec<Detection>, DetectError> {
    let bytes = decode::decode_base64(image_data)?;

    let path = store.persist(&bytes)?;
    info!("saved request image to {}", path.display());

    let image = decode::decode_image(&bytes)?;
    debug!("decoded {}x{} image", image.width(), image.height());

    let boxes = detector.detect(&image, CONFIDENCE_THRESHOLD)?;

    let names = detector.names();
    let detections = boxes
        .into_iter()
        .map(|b| {
            Ok(Detection {
                name: names.name(b.class_index)?.to_string(),
                confidence: b.confidence,
            })
        })
        .collect::<Result<Vec<_>, DetectError>>()?;

    debug!("detector returned {} boxes", detections.len());
    Ok(rank::rank(detections))
}
