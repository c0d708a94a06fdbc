//! Frame annotation for the display sink

use crate::error::VisionError;
use guidelight_core::types::Detection;
use opencv::core::{Mat, Point, Rect, Scalar};
use opencv::imgproc;
use opencv::prelude::*;

/// Draws detection boxes, labels and the current advisory onto a copy of
/// the frame. The input frame is never mutated.
#[derive(Debug, Default)]
pub struct FrameAnnotator;

const BOX_COLOR: (f64, f64, f64) = (0.0, 255.0, 0.0);
const ADVISORY_ORIGIN: (i32, i32) = (20, 40);

impl FrameAnnotator {
    pub fn new() -> Self {
        Self
    }

    /// Render an annotated copy of `frame`.
    pub fn render(
        &self,
        frame: &Mat,
        detections: &[Detection],
        advisory: &str,
    ) -> Result<Mat, VisionError> {
        let mut annotated = frame.try_clone()?;
        let color = Scalar::new(BOX_COLOR.0, BOX_COLOR.1, BOX_COLOR.2, 0.0);

        for detection in detections {
            let bbox = detection.bbox;
            let x = bbox.x1.max(0.0) as i32;
            let y = bbox.y1.max(0.0) as i32;
            let w = (bbox.width().max(0.0)) as i32;
            let h = (bbox.height().max(0.0)) as i32;
            if w == 0 || h == 0 {
                continue;
            }

            imgproc::rectangle(
                &mut annotated,
                Rect::new(x, y, w, h),
                color,
                2,
                imgproc::LINE_8,
                0,
            )?;

            let caption = format!("{} {:.2}", detection.label, detection.confidence);
            imgproc::put_text(
                &mut annotated,
                &caption,
                Point::new(x, (y - 6).max(12)),
                imgproc::FONT_HERSHEY_SIMPLEX,
                0.5,
                color,
                1,
                imgproc::LINE_8,
                false,
            )?;
        }

        imgproc::put_text(
            &mut annotated,
            advisory,
            Point::new(ADVISORY_ORIGIN.0, ADVISORY_ORIGIN.1),
            imgproc::FONT_HERSHEY_SIMPLEX,
            1.0,
            color,
            2,
            imgproc::LINE_8,
            false,
        )?;

        Ok(annotated)
    }
}
