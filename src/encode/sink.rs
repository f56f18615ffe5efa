use image::RgbImage;

use crate::foundation::core::{Fps, FrameIndex};
use crate::foundation::error::{KenBurnsError, KenBurnsResult};

/// Output container.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerFormat {
    #[default]
    Gif,
    Mp4,
}

impl ContainerFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Gif => "gif",
            Self::Mp4 => "mp4",
        }
    }

    pub fn extension(self) -> &'static str {
        self.as_str()
    }
}

impl std::fmt::Display for ContainerFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ContainerFormat {
    type Err = KenBurnsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gif" => Ok(Self::Gif),
            "mp4" => Ok(Self::Mp4),
            other => Err(KenBurnsError::invalid_input(format!(
                "unknown output format '{other}' (expected 'gif' or 'mp4')"
            ))),
        }
    }
}

/// Encoded byte stream tagged with the container actually produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Encoded {
    pub format: ContainerFormat,
    pub bytes: Vec<u8>,
}

/// Configuration provided to a [`FrameSink`] before any frame is pushed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SinkConfig {
    pub width: u32,
    pub height: u32,
    pub fps: Fps,
}

impl SinkConfig {
    pub(crate) fn check_frame(&self, frame: &RgbImage) -> KenBurnsResult<()> {
        if frame.dimensions() != (self.width, self.height) {
            return Err(KenBurnsError::invalid_input(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width(),
                frame.height(),
                self.width,
                self.height
            )));
        }
        Ok(())
    }
}

/// Consumer of generated frames.
///
/// Ordering contract: `push_frame` is called in strictly increasing [`FrameIndex`] order, and a
/// sink never mutates the frames it is given.
pub trait FrameSink: Send {
    /// Called once before any frames are pushed.
    fn begin(&mut self, cfg: SinkConfig) -> KenBurnsResult<()>;
    /// Push one frame in strictly increasing order.
    fn push_frame(&mut self, idx: FrameIndex, frame: &RgbImage) -> KenBurnsResult<()>;
    /// Called once after the last frame; returns the encoded stream.
    fn end(&mut self) -> KenBurnsResult<Encoded>;
}

/// Enforces the strictly-increasing push order shared by every sink.
#[derive(Debug, Default)]
pub(crate) struct OrderGuard(Option<FrameIndex>);

impl OrderGuard {
    pub(crate) fn advance(&mut self, idx: FrameIndex) -> KenBurnsResult<()> {
        if let Some(last) = self.0
            && idx <= last
        {
            return Err(KenBurnsError::synthesis(format!(
                "sink received out-of-order frame {} after {}",
                idx.0, last.0
            )));
        }
        self.0 = Some(idx);
        Ok(())
    }
}

/// In-memory sink for tests and debugging. `end` yields an empty GIF-tagged stream.
#[derive(Debug, Default)]
pub struct InMemorySink {
    cfg: Option<SinkConfig>,
    order: OrderGuard,
    frames: Vec<(FrameIndex, RgbImage)>,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(&self) -> Option<SinkConfig> {
        self.cfg
    }

    /// Captured frames in push order.
    pub fn frames(&self) -> &[(FrameIndex, RgbImage)] {
        &self.frames
    }
}

impl FrameSink for InMemorySink {
    fn begin(&mut self, cfg: SinkConfig) -> KenBurnsResult<()> {
        self.cfg = Some(cfg);
        self.order = OrderGuard::default();
        self.frames.clear();
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &RgbImage) -> KenBurnsResult<()> {
        let cfg = self
            .cfg
            .ok_or_else(|| KenBurnsError::synthesis("in-memory sink not started"))?;
        cfg.check_frame(frame)?;
        self.order.advance(idx)?;
        self.frames.push((idx, frame.clone()));
        Ok(())
    }

    fn end(&mut self) -> KenBurnsResult<Encoded> {
        Ok(Encoded {
            format: ContainerFormat::Gif,
            bytes: Vec::new(),
        })
    }
}
