//! The object detector seam. The service only needs "pixels in, labelled
//! scores out"; `torch::TorchDetector` is the production implementation

use crate::error::DetectError;
use image::RgbImage;
use std::fs;
use std::path::Path;

/// One box the detector found, in source-image pixels
#[derive(Debug, Clone, PartialEq)]
pub struct RawBox {
    pub class_index: usize,
    pub confidence: f32,

    /// `[x1, y1, x2, y2]`
    pub bbox: [f32; 4],
}

/// Anything that can find objects in an image. Implementations are shared
/// across request threads, so inference must be callable through `&self`
pub trait Detector: Send + Sync {
    /// Detect objects, dropping anything scoring below `confidence_threshold`
    fn detect(&self, image: &RgbImage, confidence_threshold: f32)
        -> Result<Vec<RawBox>, DetectError>;

    /// The table that class indices refer to
    fn names(&self) -> &ClassNames;
}

/// Class index to human readable label
#[derive(Debug, Clone, PartialEq)]
pub struct ClassNames(Vec<String>);

impl ClassNames {
    pub fn new(names: Vec<String>) -> Self {
        ClassNames(names)
    }

    /// The 80 COCO labels used by stock YOLO weights
    pub fn coco() -> Self {
        ClassNames(COCO_CLASSES.iter().map(|s| s.to_string()).collect())
    }

    /// Read one label per line, skipping blank lines
    pub fn from_file(path: &Path) -> std::io::Result<Self> {
        let text = fs::read_to_string(path)?;
        Ok(ClassNames(
            text.lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(String::from)
                .collect(),
        ))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn name(&self, class_index: usize) -> Result<&str, DetectError> {
        self.0
            .get(class_index)
            .map(String::as_str)
            .ok_or_else(|| {
                DetectError::Inference(format!(
                    "class index {class_index} is outside the {} known classes",
                    self.0.len()
                ))
            })
    }
}

pub const COCO_CLASSES: [&str; 80] = [
    "person",
    "bicycle",
    "car",
    "motorcycle",
    "airplane",
    "bus",
    "train",
    "truck",
    "boat",
    "traffic light",
    "fire hydrant",
    "stop sign",
    "parking meter",
    "bench",
    "bird",
    "cat",
    "dog",
    "horse",
    "sheep",
    "cow",
    "elephant",
    "bear",
    "zebra",
    "giraffe",
    "backpack",
    "umbrella",
    "handbag",
    "tie",
    "suitcase",
    "frisbee",
    "skis",
    "snowboard",
    "sports ball",
    "kite",
    "baseball bat",
    "baseball glove",
    "skateboard",
    "surfboard",
    "tennis racket",
    "bottle",
    "wine glass",
    "cup",
    "fork",
    "knife",
    "spoon",
    "bowl",
    "banana",
    "apple",
    "sandwich",
    "orange",
    "broccoli",
    "carrot",
    "hot dog",
    "pizza",
    "donut",
    "cake",
    "chair",
    "couch",
    "potted plant",
    "bed",
    "dining table",
    "toilet",
    "tv",
    "laptop",
    "mouse",
    "remote",
    "keyboard",
    "cell phone",
    "microwave",
    "oven",
    "toaster",
    "sink",
    "refrigerator",
    "book",
    "clock",
    "vase",
    "scissors",
    "teddy bear",
    "hair drier",
    "toothbrush",
];
