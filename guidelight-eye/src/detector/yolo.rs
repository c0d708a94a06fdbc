//! YOLOv8 object detection via ONNX Runtime
//!
//! Targets the ultralytics ONNX export: input `images [1,3,640,640]`
//! (RGB, 0-1), output `output0 [1,84,N]` where the 84 rows are
//! `[cx, cy, w, h, class_0 … class_79]` in input-pixel space. Transposed
//! `[1,N,84]` exports are handled too.

use crate::detector::ObjectDetector;
use crate::error::VisionError;
use guidelight_core::types::{BoundingBox, Detection};
use ndarray::Array4;
use opencv::core::{Mat, Size};
use opencv::imgproc;
use opencv::prelude::*;
use ort::session::builder::{GraphOptimizationLevel, SessionBuilder};
use ort::session::Session;
use ort::value::Value;
use ort::ep;
use parking_lot::Mutex;
use std::path::Path;
use tracing::{debug, info};

/// COCO class names (80 classes)
pub const COCO_CLASSES: &[&str] = &[
    "person", "bicycle", "car", "motorcycle", "airplane", "bus", "train", "truck", "boat",
    "traffic light", "fire hydrant", "stop sign", "parking meter", "bench", "bird", "cat",
    "dog", "horse", "sheep", "cow", "elephant", "bear", "zebra", "giraffe", "backpack",
    "umbrella", "handbag", "tie", "suitcase", "frisbee", "skis", "snowboard", "sports ball",
    "kite", "baseball bat", "baseball glove", "skateboard", "surfboard", "tennis racket",
    "bottle", "wine glass", "cup", "fork", "knife", "spoon", "bowl", "banana", "apple",
    "sandwich", "orange", "broccoli", "carrot", "hot dog", "pizza", "donut", "cake", "chair",
    "couch", "potted plant", "bed", "dining table", "toilet", "tv", "laptop", "mouse",
    "remote", "keyboard", "cell phone", "microwave", "oven", "toaster", "sink", "refrigerator",
    "book", "clock", "vase", "scissors", "teddy bear", "hair drier", "toothbrush",
];

const ATTRS: usize = 4 + 80;

/// YOLOv8 detector over an ONNX Runtime session.
pub struct YoloDetector {
    // Session::run needs &mut; the detector itself is shared immutably.
    session: Mutex<Session>,
    input_size: (u32, u32),
    confidence_threshold: f32,
    nms_threshold: f32,
}

impl YoloDetector {
    pub fn new(
        model_path: &Path,
        confidence_threshold: f32,
        nms_threshold: f32,
    ) -> Result<Self, VisionError> {
        if !model_path.exists() {
            return Err(VisionError::Model(format!(
                "Model file not found: {}",
                model_path.display()
            )));
        }

        let session = SessionBuilder::new()
            .map_err(|e| VisionError::Ort(e.to_string()))?
            .with_optimization_level(GraphOptimizationLevel::All)
            .map_err(|e| VisionError::Ort(e.to_string()))?
            .with_execution_providers([ep::CPU::default().build()])
            .map_err(|e| VisionError::Ort(e.to_string()))?
            .commit_from_file(model_path)
            .map_err(|e| VisionError::Ort(e.to_string()))?;

        info!("YOLO model loaded from {}", model_path.display());

        Ok(Self {
            session: Mutex::new(session),
            input_size: (640, 640),
            confidence_threshold,
            nms_threshold,
        })
    }

    /// Resize to the model input, convert BGR→RGB and pack a normalized
    /// `[1,3,H,W]` tensor.
    fn preprocess(&self, frame: &Mat) -> Result<Array4<f32>, VisionError> {
        let (in_w, in_h) = (self.input_size.0 as i32, self.input_size.1 as i32);

        let mut resized = Mat::default();
        imgproc::resize(
            frame,
            &mut resized,
            Size::new(in_w, in_h),
            0.0,
            0.0,
            imgproc::INTER_LINEAR,
        )?;

        let mut rgb = Mat::default();
        imgproc::cvt_color(&resized, &mut rgb, imgproc::COLOR_BGR2RGB, 0)?;

        let data = rgb.data_bytes()?;
        let (w, h) = (in_w as usize, in_h as usize);
        if data.len() < w * h * 3 {
            return Err(VisionError::Detector(format!(
                "Unexpected frame buffer size: {} bytes for {}x{}",
                data.len(),
                w,
                h
            )));
        }

        let mut tensor = Array4::<f32>::zeros((1, 3, h, w));
        for y in 0..h {
            for x in 0..w {
                let idx = (y * w + x) * 3;
                for c in 0..3 {
                    tensor[[0, c, y, x]] = data[idx + c] as f32 / 255.0;
                }
            }
        }

        Ok(tensor)
    }
}

impl ObjectDetector for YoloDetector {
    fn detect(&self, frame: &Mat) -> Result<Vec<Detection>, VisionError> {
        let frame_width = frame.cols() as f32;
        let frame_height = frame.rows() as f32;
        if frame_width <= 0.0 || frame_height <= 0.0 {
            return Err(VisionError::Detector("Empty frame".to_string()));
        }

        let input = self.preprocess(frame)?;
        let value = Value::from_array(input).map_err(|e| VisionError::Ort(e.to_string()))?;

        let mut session = self.session.lock();
        let outputs = session
            .run(ort::inputs!["images" => value])
            .map_err(|e| VisionError::Ort(e.to_string()))?;

        let (shape, data) = outputs["output0"]
            .try_extract_tensor::<f32>()
            .map_err(|e| VisionError::Ort(e.to_string()))?;

        let shape = shape.to_vec();
        let decoded = decode_output(
            &shape,
            data,
            self.input_size,
            (frame_width, frame_height),
            self.confidence_threshold,
        )?;
        let detections = apply_nms(decoded, self.nms_threshold);
        debug!("YOLO detected {} objects", detections.len());
        Ok(detections)
    }

    fn name(&self) -> &str {
        "yolo"
    }
}

/// Decode a raw YOLOv8 output tensor into frame-space detections.
///
/// Accepts `[1,84,N]` (ultralytics default) and transposed `[1,N,84]`
/// layouts. Boxes come out in corner form scaled to the frame size; no
/// suppression is applied here.
fn decode_output(
    shape: &[i64],
    data: &[f32],
    input_size: (u32, u32),
    frame_size: (f32, f32),
    confidence_threshold: f32,
) -> Result<Vec<Detection>, VisionError> {
    if shape.len() != 3 {
        return Err(VisionError::Detector(format!(
            "Unexpected YOLO output rank: {:?}",
            shape
        )));
    }

    let (anchors, attr_major) = if shape[1] as usize == ATTRS {
        (shape[2] as usize, true)
    } else if shape[2] as usize == ATTRS {
        (shape[1] as usize, false)
    } else {
        return Err(VisionError::Detector(format!(
            "Unexpected YOLO output shape: {:?}",
            shape
        )));
    };

    if data.len() < anchors * ATTRS {
        return Err(VisionError::Detector(
            "YOLO output tensor shorter than its shape".to_string(),
        ));
    }

    let at = |attr: usize, anchor: usize| -> f32 {
        if attr_major {
            data[attr * anchors + anchor]
        } else {
            data[anchor * ATTRS + attr]
        }
    };

    let scale_x = frame_size.0 / input_size.0 as f32;
    let scale_y = frame_size.1 / input_size.1 as f32;

    let mut detections = Vec::new();
    for i in 0..anchors {
        let mut best_class = 0usize;
        let mut best_score = 0.0f32;
        for class_idx in 0..COCO_CLASSES.len() {
            let score = at(4 + class_idx, i);
            if score > best_score {
                best_score = score;
                best_class = class_idx;
            }
        }

        if best_score < confidence_threshold || !best_score.is_finite() {
            continue;
        }

        let cx = at(0, i);
        let cy = at(1, i);
        let w = at(2, i);
        let h = at(3, i);
        if !(cx.is_finite() && cy.is_finite() && w.is_finite() && h.is_finite()) {
            continue;
        }
        if w <= 0.0 || h <= 0.0 {
            continue;
        }

        let bbox = BoundingBox::new(
            (cx - w / 2.0) * scale_x,
            (cy - h / 2.0) * scale_y,
            (cx + w / 2.0) * scale_x,
            (cy + h / 2.0) * scale_y,
        );

        detections.push(Detection::new(
            best_class,
            COCO_CLASSES[best_class],
            best_score,
            bbox,
        ));
    }

    Ok(detections)
}

/// Non-maximum suppression across all classes, highest confidence first.
fn apply_nms(mut detections: Vec<Detection>, iou_threshold: f32) -> Vec<Detection> {
    if detections.is_empty() {
        return detections;
    }

    detections.retain(|d| d.confidence.is_finite());
    detections.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut keep: Vec<Detection> = Vec::new();
    let mut suppressed = vec![false; detections.len()];

    for i in 0..detections.len() {
        if suppressed[i] {
            continue;
        }
        for j in (i + 1)..detections.len() {
            if suppressed[j] {
                continue;
            }
            if detections[i].bbox.iou(&detections[j].bbox) > iou_threshold {
                suppressed[j] = true;
            }
        }
        keep.push(detections[i].clone());
    }

    keep
}

#[cfg(test)]
mod tests {
    use super::*;

    fn det(confidence: f32, x1: f32, x2: f32) -> Detection {
        Detection::new(0, "person", confidence, BoundingBox::new(x1, 0.0, x2, 100.0))
    }

    #[test]
    fn test_nms_keeps_disjoint_boxes() {
        let kept = apply_nms(vec![det(0.9, 0.0, 100.0), det(0.8, 300.0, 400.0)], 0.45);
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn test_nms_suppresses_heavy_overlap() {
        let kept = apply_nms(vec![det(0.9, 0.0, 100.0), det(0.8, 5.0, 105.0)], 0.45);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].confidence, 0.9);
    }

    #[test]
    fn test_nms_orders_by_confidence() {
        let kept = apply_nms(vec![det(0.6, 0.0, 100.0), det(0.9, 300.0, 400.0)], 0.45);
        assert_eq!(kept[0].confidence, 0.9);
    }

    #[test]
    fn test_nms_drops_nan_confidence() {
        let kept = apply_nms(vec![det(f32::NAN, 0.0, 100.0), det(0.7, 300.0, 400.0)], 0.45);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].confidence, 0.7);
    }

    /// Build an attr-major `[1,84,N]` tensor with the given anchors:
    /// (cx, cy, w, h, class_id, score).
    fn attr_major_tensor(anchors: &[(f32, f32, f32, f32, usize, f32)]) -> (Vec<i64>, Vec<f32>) {
        let n = anchors.len();
        let mut data = vec![0.0f32; ATTRS * n];
        for (i, (cx, cy, w, h, class_id, score)) in anchors.iter().enumerate() {
            data[i] = *cx;
            data[n + i] = *cy;
            data[2 * n + i] = *w;
            data[3 * n + i] = *h;
            data[(4 + class_id) * n + i] = *score;
        }
        (vec![1, ATTRS as i64, n as i64], data)
    }

    #[test]
    fn test_decode_scales_to_frame_space() {
        // One person centered at (320, 320) in the 640x640 input,
        // 100x200 large, mapped onto a 1280x480 frame.
        let (shape, data) = attr_major_tensor(&[(320.0, 320.0, 100.0, 200.0, 0, 0.9)]);
        let dets = decode_output(&shape, &data, (640, 640), (1280.0, 480.0), 0.5).unwrap();

        assert_eq!(dets.len(), 1);
        assert_eq!(dets[0].label, "person");
        let bbox = dets[0].bbox;
        assert!((bbox.x1 - 540.0).abs() < 1e-3);
        assert!((bbox.x2 - 740.0).abs() < 1e-3);
        assert!((bbox.y1 - 165.0).abs() < 1e-3);
        assert!((bbox.y2 - 315.0).abs() < 1e-3);
    }

    #[test]
    fn test_decode_filters_below_threshold() {
        let (shape, data) = attr_major_tensor(&[
            (100.0, 100.0, 50.0, 50.0, 2, 0.4),
            (400.0, 400.0, 50.0, 50.0, 16, 0.8),
        ]);
        let dets = decode_output(&shape, &data, (640, 640), (640.0, 640.0), 0.5).unwrap();

        assert_eq!(dets.len(), 1);
        assert_eq!(dets[0].label, "dog");
    }

    #[test]
    fn test_decode_picks_best_class() {
        let n = 1usize;
        let mut data = vec![0.0f32; ATTRS * n];
        data[0] = 320.0;
        data[n] = 320.0;
        data[2 * n] = 40.0;
        data[3 * n] = 40.0;
        data[(4 + 2) * n] = 0.6; // car
        data[(4 + 7) * n] = 0.9; // truck
        let shape = vec![1, ATTRS as i64, n as i64];

        let dets = decode_output(&shape, &data, (640, 640), (640.0, 640.0), 0.5).unwrap();
        assert_eq!(dets.len(), 1);
        assert_eq!(dets[0].label, "truck");
        assert!((dets[0].confidence - 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_decode_transposed_layout() {
        // One anchor in [1,N,84] layout.
        let mut row = vec![0.0f32; ATTRS];
        row[0] = 320.0;
        row[1] = 240.0;
        row[2] = 80.0;
        row[3] = 80.0;
        row[4] = 0.75; // person
        let shape = vec![1, 1, ATTRS as i64];

        let dets = decode_output(&shape, &row, (640, 640), (640.0, 640.0), 0.5).unwrap();
        assert_eq!(dets.len(), 1);
        assert_eq!(dets[0].label, "person");
    }

    #[test]
    fn test_decode_rejects_bad_shape() {
        assert!(decode_output(&[1, 85], &[], (640, 640), (640.0, 640.0), 0.5).is_err());
        assert!(decode_output(&[1, 85, 10], &[0.0; 850], (640, 640), (640.0, 640.0), 0.5).is_err());
    }

    #[test]
    fn test_decode_skips_degenerate_boxes() {
        let (shape, data) = attr_major_tensor(&[(320.0, 320.0, 0.0, 50.0, 0, 0.9)]);
        let dets = decode_output(&shape, &data, (640, 640), (640.0, 640.0), 0.5).unwrap();
        assert!(dets.is_empty());
    }

    #[test]
    fn test_missing_model_file_is_a_model_error() {
        let err = YoloDetector::new(Path::new("/nonexistent/yolov8n.onnx"), 0.5, 0.45)
            .err()
            .expect("expected missing model to fail");
        match err {
            VisionError::Model(msg) => assert!(msg.contains("not found")),
            other => panic!("Expected Model error, got {other:?}"),
        }
    }
}
