use image::{RgbImage, imageops::FilterType};

use crate::foundation::core::Canvas;
use crate::foundation::error::{KenBurnsError, KenBurnsResult};

/// Immutable RGB8 source image with even dimensions.
///
/// Odd widths/heights are resampled down to the nearest even size on construction so the same
/// frames can feed a yuv420p MP4 encoder.
#[derive(Clone, Debug)]
pub struct SourceImage {
    pixels: RgbImage,
}

impl SourceImage {
    /// Decode an encoded image (PNG, JPEG, ...) and normalize it.
    pub fn decode(bytes: &[u8]) -> KenBurnsResult<Self> {
        if bytes.is_empty() {
            return Err(KenBurnsError::invalid_input("no source image provided"));
        }
        let dyn_img = image::load_from_memory(bytes)
            .map_err(|e| KenBurnsError::invalid_input(format!("decode source image: {e}")))?;
        Self::from_rgb(dyn_img.to_rgb8())
    }

    /// Wrap an already-decoded RGB8 image, resampling to even dimensions when needed.
    pub fn from_rgb(img: RgbImage) -> KenBurnsResult<Self> {
        let (w, h) = img.dimensions();
        let (even_w, even_h) = (w / 2 * 2, h / 2 * 2);
        if even_w == 0 || even_h == 0 {
            return Err(KenBurnsError::invalid_input(format!(
                "source image must be at least 2x2, got {w}x{h}"
            )));
        }
        let pixels = if (even_w, even_h) == (w, h) {
            img
        } else {
            tracing::debug!(w, h, even_w, even_h, "resampling source to even dimensions");
            image::imageops::resize(&img, even_w, even_h, FilterType::Lanczos3)
        };
        Ok(Self { pixels })
    }

    pub fn canvas(&self) -> Canvas {
        Canvas {
            width: self.pixels.width(),
            height: self.pixels.height(),
        }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn pixels(&self) -> &RgbImage {
        &self.pixels
    }
}
