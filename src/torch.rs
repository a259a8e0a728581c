//! Running a TorchScript export of a YOLO detector (v8 style output head)

use crate::detector::{ClassNames, Detector, RawBox};
use crate::error::DetectError;
use anyhow::{Context, Result};
use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};
use std::path::Path;
use tch::{no_grad, CModule, Device, IValue, Kind, Tensor};
use tracing::{debug, info};

/// Padding colour used by the YOLO letterbox
const PAD: Rgb<u8> = Rgb([114, 114, 114]);

/// Load and run a TorchScript detector
#[derive(Debug)]
pub struct TorchDetector {
    /// The loaded torch model
    model: CModule,
    names: ClassNames,
    device: Device,

    /// Side of the square model input
    input_size: u32,
    iou_threshold: f32,
}

impl TorchDetector {
    pub fn new(
        model_file: &Path,
        names: ClassNames,
        input_size: u32,
        iou_threshold: f32,
    ) -> Result<Self> {
        let device = Device::cuda_if_available();
        let mut model = CModule::load_on_device(model_file, device)
            .with_context(|| format!("loading TorchScript model {}", model_file.display()))?;
        model.set_eval();

        info!(
            "loaded {} on {:?} ({} classes, input {}x{})",
            model_file.display(),
            device,
            names.len(),
            input_size,
            input_size
        );

        Ok(TorchDetector {
            model,
            names,
            device,
            input_size,
            iou_threshold,
        })
    }

    /// Run the forward pass and pull out the prediction tensor
    fn forward(&self, input: Tensor) -> Result<Tensor, DetectError> {
        let output = no_grad(|| self.model.forward_is(&[IValue::Tensor(input)]))?;
        match output {
            IValue::Tensor(t) => Ok(t),
            // some exports return (predictions, protos) or a list
            IValue::Tuple(values) | IValue::GenericList(values) => match values.into_iter().next()
            {
                Some(IValue::Tensor(t)) => Ok(t),
                _ => Err(DetectError::Inference(
                    "model output tuple does not start with a tensor".into(),
                )),
            },
            _ => Err(DetectError::Inference(
                "model forward step did not return a tensor".into(),
            )),
        }
    }
}

impl Detector for TorchDetector {
    #[tracing::instrument(skip_all, fields(w = image.width(), h = image.height()))]
    fn detect(
        &self,
        image: &RgbImage,
        confidence_threshold: f32,
    ) -> Result<Vec<RawBox>, DetectError> {
        let (input, letterbox) = letterbox(image, self.input_size);
        let input = to_tensor(&input).to_device(self.device);

        let predictions = self
            .forward(input)?
            .to_device(Device::Cpu)
            .to_kind(Kind::Float)
            .squeeze_dim(0);

        let (rows, anchors) = prediction_layout(&predictions.size())?;
        let data = Vec::<f32>::try_from(&predictions.contiguous().view([-1]))?;

        let candidates = decode_predictions(&data, rows, anchors, confidence_threshold, &letterbox);
        debug!("{} candidates above threshold", candidates.len());

        Ok(nms(candidates, self.iou_threshold))
    }

    fn names(&self) -> &ClassNames {
        &self.names
    }
}

/// How a source image was fitted into the square model input
#[derive(Debug, Clone, PartialEq)]
pub struct Letterbox {
    pub scale: f32,
    pub pad_x: f32,
    pub pad_y: f32,
    pub width: f32,
    pub height: f32,
}

impl Letterbox {
    /// Map a model-space xyxy box back onto the source image
    fn unmap(&self, [x1, y1, x2, y2]: [f32; 4]) -> [f32; 4] {
        let x = |v: f32| ((v - self.pad_x) / self.scale).clamp(0.0, self.width);
        let y = |v: f32| ((v - self.pad_y) / self.scale).clamp(0.0, self.height);
        [x(x1), y(y1), x(x2), y(y2)]
    }
}

/// Resize keeping aspect ratio and centre on a `size` x `size` canvas
pub fn letterbox(image: &RgbImage, size: u32) -> (RgbImage, Letterbox) {
    let (w, h) = image.dimensions();
    let scale = (size as f32 / w as f32).min(size as f32 / h as f32);
    let new_w = ((w as f32 * scale).round() as u32).clamp(1, size);
    let new_h = ((h as f32 * scale).round() as u32).clamp(1, size);

    let resized = imageops::resize(image, new_w, new_h, FilterType::Triangle);
    let mut canvas = RgbImage::from_pixel(size, size, PAD);
    let (pad_x, pad_y) = ((size - new_w) / 2, (size - new_h) / 2);
    imageops::replace(&mut canvas, &resized, pad_x as i64, pad_y as i64);

    (
        canvas,
        Letterbox {
            scale,
            pad_x: pad_x as f32,
            pad_y: pad_y as f32,
            width: w as f32,
            height: h as f32,
        },
    )
}

/// HWC u8 pixels to a 1xCxHxW float tensor in [0, 1]
fn to_tensor(image: &RgbImage) -> Tensor {
    let (w, h) = image.dimensions();
    let chw = Tensor::from_slice(image.as_raw().as_slice())
        .view([h as i64, w as i64, 3])
        .permute([2, 0, 1]);
    (chw.to_kind(Kind::Float) / 255.).unsqueeze(0)
}

/// Check a squeezed prediction shape is `[4 + classes, anchors]` and return
/// it. Anchor-major heads (`[anchors, 5 + classes]`, YOLOv5 style) are
/// rejected, rows are always far fewer than anchors in the expected layout
pub fn prediction_layout(size: &[i64]) -> Result<(usize, usize), DetectError> {
    match *size {
        [rows, anchors] if rows >= 5 && rows < anchors => Ok((rows as usize, anchors as usize)),
        _ => Err(DetectError::Inference(format!(
            "unexpected prediction shape {size:?}, expected [4 + classes, anchors]"
        ))),
    }
}

/// Read a row-major `[rows, anchors]` prediction matrix where rows are
/// cx, cy, w, h followed by one score per class. Keeps the best class of
/// every anchor scoring at least `threshold`
pub fn decode_predictions(
    data: &[f32],
    rows: usize,
    anchors: usize,
    threshold: f32,
    letterbox: &Letterbox,
) -> Vec<RawBox> {
    let at = |row: usize, anchor: usize| data[row * anchors + anchor];

    (0..anchors)
        .filter_map(|a| {
            let (class_index, confidence) = (4..rows)
                .map(|r| (r - 4, at(r, a)))
                .fold((0, f32::MIN), |best, cur| if cur.1 > best.1 { cur } else { best });
            if confidence < threshold {
                return None;
            }

            let (cx, cy, w, h) = (at(0, a), at(1, a), at(2, a), at(3, a));
            let bbox = letterbox.unmap([cx - w / 2., cy - h / 2., cx + w / 2., cy + h / 2.]);
            Some(RawBox {
                class_index,
                confidence,
                bbox,
            })
        })
        .collect()
}

/// Per-class non-maximum suppression. Output is ordered by confidence
pub fn nms(mut boxes: Vec<RawBox>, iou_threshold: f32) -> Vec<RawBox> {
    boxes.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    let mut kept: Vec<RawBox> = Vec::with_capacity(boxes.len());
    for candidate in boxes {
        let suppressed = kept.iter().any(|k| {
            k.class_index == candidate.class_index && iou(&k.bbox, &candidate.bbox) > iou_threshold
        });
        if !suppressed {
            kept.push(candidate);
        }
    }
    kept
}

fn iou(a: &[f32; 4], b: &[f32; 4]) -> f32 {
    let area = |r: &[f32; 4]| (r[2] - r[0]).max(0.0) * (r[3] - r[1]).max(0.0);
    let iw = (a[2].min(b[2]) - a[0].max(b[0])).max(0.0);
    let ih = (a[3].min(b[3]) - a[1].max(b[1])).max(0.0);
    let inter = iw * ih;
    let union = area(a) + area(b) - inter;
    if union > 0.0 {
        inter / union
    } else {
        0.0
    }
}
