use gif::{Encoder, Frame, Repeat};
use image::RgbImage;

use crate::encode::sink::{ContainerFormat, Encoded, FrameSink, OrderGuard, SinkConfig};
use crate::foundation::core::FrameIndex;
use crate::foundation::error::{KenBurnsError, KenBurnsResult};

/// Options for [`GifSink`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct GifOpts {
    /// NeuQuant sampling speed, 1 (best palette) to 30 (fastest).
    pub quantize_speed: i32,
    /// Loop count; `None` loops forever.
    pub repeat: Option<u16>,
}

impl Default for GifOpts {
    fn default() -> Self {
        Self {
            quantize_speed: 10,
            repeat: None,
        }
    }
}

/// Animated GIF sink writing into memory.
///
/// Every frame gets its own quantized local palette.
pub struct GifSink {
    opts: GifOpts,
    encoder: Option<Encoder<Vec<u8>>>,
    cfg: Option<SinkConfig>,
    delay_cs: u16,
    order: OrderGuard,
    frames: u32,
}

impl GifSink {
    pub fn new(opts: GifOpts) -> Self {
        Self {
            opts,
            encoder: None,
            cfg: None,
            delay_cs: 0,
            order: OrderGuard::default(),
            frames: 0,
        }
    }
}

/// GIF frame delays are stored in centiseconds; round the millisecond delay and keep at least 1.
fn delay_centiseconds(delay_ms: u32) -> u16 {
    let cs = (f64::from(delay_ms) / 10.0).round() as u32;
    cs.clamp(1, u32::from(u16::MAX)) as u16
}

fn gif_err(what: &str, e: impl std::fmt::Display) -> KenBurnsError {
    KenBurnsError::synthesis(format!("gif {what}: {e}"))
}

impl FrameSink for GifSink {
    fn begin(&mut self, cfg: SinkConfig) -> KenBurnsResult<()> {
        if !(1..=30).contains(&self.opts.quantize_speed) {
            return Err(KenBurnsError::invalid_input(format!(
                "gif quantize_speed must be within [1, 30], got {}",
                self.opts.quantize_speed
            )));
        }
        let (Ok(width), Ok(height)) = (u16::try_from(cfg.width), u16::try_from(cfg.height)) else {
            return Err(KenBurnsError::invalid_input(format!(
                "gif frames are limited to 65535x65535, got {}x{}",
                cfg.width, cfg.height
            )));
        };

        let mut encoder =
            Encoder::new(Vec::new(), width, height, &[]).map_err(|e| gif_err("init", e))?;
        let repeat = match self.opts.repeat {
            None => Repeat::Infinite,
            Some(n) => Repeat::Finite(n),
        };
        encoder
            .set_repeat(repeat)
            .map_err(|e| gif_err("set repeat", e))?;

        self.delay_cs = delay_centiseconds(cfg.fps.frame_delay_ms());
        self.encoder = Some(encoder);
        self.cfg = Some(cfg);
        self.order = OrderGuard::default();
        self.frames = 0;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &RgbImage) -> KenBurnsResult<()> {
        let cfg = self
            .cfg
            .ok_or_else(|| KenBurnsError::synthesis("gif sink not started"))?;
        cfg.check_frame(frame)?;
        self.order.advance(idx)?;
        let encoder = self
            .encoder
            .as_mut()
            .ok_or_else(|| KenBurnsError::synthesis("gif sink is already finalized"))?;

        // Dimensions were range-checked against u16 in `begin`.
        let mut gif_frame = Frame::from_rgb_speed(
            cfg.width as u16,
            cfg.height as u16,
            frame.as_raw(),
            self.opts.quantize_speed,
        );
        gif_frame.delay = self.delay_cs;
        encoder
            .write_frame(&gif_frame)
            .map_err(|e| gif_err("write frame", e))?;
        self.frames += 1;
        Ok(())
    }

    fn end(&mut self) -> KenBurnsResult<Encoded> {
        let encoder = self
            .encoder
            .take()
            .ok_or_else(|| KenBurnsError::synthesis("gif sink not started"))?;
        if self.frames == 0 {
            return Err(KenBurnsError::synthesis("gif sink received no frames"));
        }
        let bytes = encoder.into_inner().map_err(|e| gif_err("finish", e))?;
        tracing::debug!(frames = self.frames, bytes = bytes.len(), "gif encoded");
        self.cfg = None;
        Ok(Encoded {
            format: ContainerFormat::Gif,
            bytes,
        })
    }
}
