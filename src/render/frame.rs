//! Per-frame crop window geometry and resampling.

use image::{RgbImage, imageops::FilterType};

use crate::foundation::core::{Canvas, FrameIndex};
use crate::foundation::error::{KenBurnsError, KenBurnsResult};
use crate::motion::ease::ease;
use crate::motion::spec::{CameraState, MotionSpec};
use crate::render::source::SourceImage;

/// Source-space crop rectangle `[x, x + width) × [y, y + height)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CropWindow {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    /// The top-left corner had to be pulled back inside the image, so the window is not where
    /// the focal point asked for it.
    pub clamped: bool,
}

impl CropWindow {
    pub fn x2(&self) -> u32 {
        self.x + self.width
    }

    pub fn y2(&self) -> u32 {
        self.y + self.height
    }
}

/// Eased motion progress for `frame` out of `total_frames`.
///
/// A single-frame sequence uses the start state.
pub fn frame_progress(frame: FrameIndex, total_frames: u32) -> f64 {
    let denom = total_frames.saturating_sub(1).max(1);
    ease(f64::from(frame.0) / f64::from(denom))
}

/// Crop window for `state` on an image of size `canvas`.
///
/// Window sizes are floored and never drop below 1 px; the top-left corner is clamped so the
/// window always stays fully inside the image.
pub fn crop_window(canvas: Canvas, state: CameraState) -> CropWindow {
    let Canvas { width, height } = canvas;
    let crop_w = crop_extent(width, state.scale);
    let crop_h = crop_extent(height, state.scale);

    let (x, clamped_x) = crop_origin(width, crop_w, state.cx);
    let (y, clamped_y) = crop_origin(height, crop_h, state.cy);
    CropWindow {
        x,
        y,
        width: crop_w,
        height: crop_h,
        clamped: clamped_x || clamped_y,
    }
}

fn crop_extent(full: u32, scale: f64) -> u32 {
    let extent = (f64::from(full) / scale).floor();
    if extent.is_nan() {
        return full;
    }
    (extent as u32).clamp(1, full)
}

fn crop_origin(full: u32, extent: u32, center: f64) -> (u32, bool) {
    let slack = full - extent;
    let raw = (f64::from(slack) * center).floor();
    let origin = if raw.is_nan() {
        0.0
    } else {
        raw.clamp(0.0, f64::from(slack))
    };
    (origin as u32, origin != raw)
}

/// Render frame `frame` of a `total_frames` sequence following `motion`.
///
/// Validates `motion` against the source before rendering. The output always has the source
/// dimensions.
pub fn generate(
    source: &SourceImage,
    frame: FrameIndex,
    total_frames: u32,
    motion: &MotionSpec,
) -> KenBurnsResult<RgbImage> {
    if total_frames == 0 {
        return Err(KenBurnsError::invalid_input("total_frames must be >= 1"));
    }
    if frame.0 >= total_frames {
        return Err(KenBurnsError::invalid_input(format!(
            "frame {} is out of range for a {total_frames}-frame sequence",
            frame.0
        )));
    }
    motion.validate_for(source.canvas())?;
    Ok(render_frame(source, frame, total_frames, motion))
}

/// [`generate`] without argument validation, for callers that validated once up front.
pub(crate) fn render_frame(
    source: &SourceImage,
    frame: FrameIndex,
    total_frames: u32,
    motion: &MotionSpec,
) -> RgbImage {
    let state = motion.evaluate(frame_progress(frame, total_frames));
    let canvas = source.canvas();
    let window = crop_window(canvas, state);
    if window.clamped {
        tracing::debug!(
            frame = frame.0,
            cx = state.cx,
            cy = state.cy,
            "crop window clamped inside image bounds"
        );
    }

    let view =
        image::imageops::crop_imm(source.pixels(), window.x, window.y, window.width, window.height);
    image::imageops::resize(&*view, canvas.width, canvas.height, FilterType::Lanczos3)
}
