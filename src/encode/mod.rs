//! Frame sequence encoders (GIF in-process, MP4 via the system `ffmpeg`).

pub mod ffmpeg;
pub mod gif;
pub mod sink;

use image::RgbImage;

use crate::encode::ffmpeg::{Mp4Opts, Mp4Sink, is_ffmpeg_available};
use crate::encode::gif::{GifOpts, GifSink};
use crate::encode::sink::{ContainerFormat, Encoded, FrameSink, SinkConfig};
use crate::foundation::core::{Fps, FrameIndex};
use crate::foundation::error::{KenBurnsError, KenBurnsResult};

/// Encoder settings for both containers.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct EncodeOpts {
    pub gif: GifOpts,
    pub mp4: Mp4Opts,
}

/// Which containers this host can produce. Resolve once at startup with [`EncoderSupport::detect`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub struct EncoderSupport {
    pub mp4: bool,
}

impl EncoderSupport {
    /// Probe the configured `ffmpeg` for a build that can encode H.264 MP4.
    pub fn detect(opts: &EncodeOpts) -> Self {
        let mp4 = is_ffmpeg_available(&opts.mp4.ffmpeg);
        tracing::info!(mp4, ffmpeg = %opts.mp4.ffmpeg.display(), "encoder support detected");
        Self { mp4 }
    }

    /// Support for GIF output only.
    pub fn gif_only() -> Self {
        Self { mp4: false }
    }

    /// Container that will actually be produced for `requested`.
    pub fn resolve(self, requested: ContainerFormat) -> ContainerFormat {
        match requested {
            ContainerFormat::Mp4 if !self.mp4 => ContainerFormat::Gif,
            other => other,
        }
    }
}

/// Start a sink for `requested`, falling back to GIF when MP4 cannot be produced.
///
/// The fallback happens before any frame is pushed: either the host lacks MP4 support, or the
/// encoder binary disappeared between detection and this call.
pub fn begin_sink(
    requested: ContainerFormat,
    support: EncoderSupport,
    opts: &EncodeOpts,
    cfg: SinkConfig,
) -> KenBurnsResult<Box<dyn FrameSink>> {
    if support.resolve(requested) == ContainerFormat::Mp4 {
        let mut sink = Mp4Sink::new(opts.mp4.clone());
        match sink.begin(cfg) {
            Ok(()) => return Ok(Box::new(sink)),
            Err(KenBurnsError::EncoderUnavailable(reason)) => {
                tracing::warn!(%reason, "mp4 encoder unavailable, falling back to gif");
            }
            Err(e) => return Err(e),
        }
    } else if requested != ContainerFormat::Gif {
        tracing::warn!(%requested, "mp4 not supported on this host, encoding gif");
    }

    let mut sink = GifSink::new(opts.gif);
    sink.begin(cfg)?;
    Ok(Box::new(sink))
}

/// Encode an ordered frame list. All frames must share the first frame's dimensions.
pub fn encode(
    frames: &[RgbImage],
    fps: Fps,
    requested: ContainerFormat,
    support: EncoderSupport,
    opts: &EncodeOpts,
) -> KenBurnsResult<Encoded> {
    let first = frames
        .first()
        .ok_or_else(|| KenBurnsError::invalid_input("cannot encode an empty frame sequence"))?;
    let cfg = SinkConfig {
        width: first.width(),
        height: first.height(),
        fps,
    };
    let mut sink = begin_sink(requested, support, opts, cfg)?;
    for (i, frame) in frames.iter().enumerate() {
        let idx = u32::try_from(i)
            .map_err(|_| KenBurnsError::resource_exhausted("too many frames to encode"))?;
        sink.push_frame(FrameIndex(idx), frame)?;
    }
    sink.end()
}
