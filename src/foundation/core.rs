use crate::foundation::error::{KenBurnsError, KenBurnsResult};

/// 0-based frame index within one synthesized sequence.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct FrameIndex(pub u32);

/// Half-open frame range `[start, end)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameRange {
    /// Inclusive range start.
    pub start: FrameIndex,
    /// Exclusive range end.
    pub end: FrameIndex,
}

impl FrameRange {
    /// Create a validated range with `start <= end`.
    pub fn new(start: FrameIndex, end: FrameIndex) -> KenBurnsResult<Self> {
        if start.0 > end.0 {
            return Err(KenBurnsError::invalid_input("FrameRange start must be <= end"));
        }
        Ok(Self { start, end })
    }

    pub fn len_frames(self) -> u32 {
        self.end.0.saturating_sub(self.start.0)
    }

    /// Split into consecutive sub-ranges of at most `chunk` frames.
    pub fn chunks(self, chunk: u32) -> impl Iterator<Item = FrameRange> {
        let chunk = chunk.max(1);
        let end = self.end.0;
        (self.start.0..end).step_by(chunk as usize).map(move |s| FrameRange {
            start: FrameIndex(s),
            end: FrameIndex(s.saturating_add(chunk).min(end)),
        })
    }
}

/// Integer frames-per-second.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(transparent)]
pub struct Fps(u32);

impl Fps {
    pub fn new(fps: u32) -> KenBurnsResult<Self> {
        if fps == 0 {
            return Err(KenBurnsError::invalid_input("fps must be > 0"));
        }
        Ok(Self(fps))
    }

    pub fn get(self) -> u32 {
        self.0
    }

    /// Per-frame display time in milliseconds, `round(1000 / fps)`.
    pub fn frame_delay_ms(self) -> u32 {
        (1000.0 / f64::from(self.0)).round() as u32
    }

    /// Number of frames covering `duration_secs`, `round(duration * fps)`.
    pub fn frames_for(self, duration_secs: f64) -> KenBurnsResult<u32> {
        if !duration_secs.is_finite() || duration_secs <= 0.0 {
            return Err(KenBurnsError::invalid_input(format!(
                "duration must be a positive number of seconds, got {duration_secs}"
            )));
        }
        let frames = (duration_secs * f64::from(self.0)).round();
        if frames < 1.0 {
            return Err(KenBurnsError::invalid_input(format!(
                "{duration_secs}s at {} fps yields no frames",
                self.0
            )));
        }
        if frames > f64::from(u32::MAX) {
            return Err(KenBurnsError::resource_exhausted(format!(
                "{duration_secs}s at {} fps yields too many frames",
                self.0
            )));
        }
        Ok(frames as u32)
    }
}

/// Pixel dimensions of a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
}

impl Canvas {
    /// Byte size of one RGB8 frame at this size.
    pub fn rgb8_bytes(self) -> u64 {
        u64::from(self.width) * u64::from(self.height) * 3
    }
}
