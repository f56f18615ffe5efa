use image::RgbImage;
use rayon::prelude::*;

use crate::encode::sink::FrameSink;
use crate::foundation::cancel::CancelToken;
use crate::foundation::core::{FrameIndex, FrameRange};
use crate::foundation::error::{KenBurnsError, KenBurnsResult};
use crate::motion::spec::MotionSpec;
use crate::render::frame::render_frame;
use crate::render::source::SourceImage;

/// Threading and chunking controls for multi-frame rendering.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RenderThreading {
    /// Render frames of a chunk on a worker pool when `true`.
    pub parallel: bool,
    /// Frames rendered per batch before they are handed on in order.
    pub chunk_size: usize,
    /// Optional explicit worker thread count.
    pub threads: Option<usize>,
}

impl Default for RenderThreading {
    fn default() -> Self {
        Self {
            parallel: true,
            chunk_size: 16,
            threads: None,
        }
    }
}

impl RenderThreading {
    /// Single-threaded rendering.
    pub fn sequential() -> Self {
        Self {
            parallel: false,
            ..Self::default()
        }
    }
}

/// Aggregated rendering counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub frames_rendered: u32,
    pub chunks: u32,
}

/// Render every frame of a `total_frames` sequence and push them into `sink` in index order.
///
/// `sink` must already be started; it is not finalized here.
#[tracing::instrument(skip(source, motion, sink, cancel), fields(w = source.width(), h = source.height()))]
pub fn render_to_sink(
    source: &SourceImage,
    motion: &MotionSpec,
    total_frames: u32,
    threading: &RenderThreading,
    cancel: &CancelToken,
    sink: &mut dyn FrameSink,
) -> KenBurnsResult<RenderStats> {
    render_chunks(source, motion, total_frames, threading, cancel, |idx, frame| {
        sink.push_frame(idx, &frame)
    })
}

/// Render a whole sequence into memory.
pub fn render_frames(
    source: &SourceImage,
    motion: &MotionSpec,
    total_frames: u32,
    threading: &RenderThreading,
    cancel: &CancelToken,
) -> KenBurnsResult<Vec<RgbImage>> {
    let mut out = Vec::with_capacity(total_frames.min(4096) as usize);
    render_chunks(source, motion, total_frames, threading, cancel, |_, frame| {
        out.push(frame);
        Ok(())
    })?;
    Ok(out)
}

fn render_chunks(
    source: &SourceImage,
    motion: &MotionSpec,
    total_frames: u32,
    threading: &RenderThreading,
    cancel: &CancelToken,
    mut emit: impl FnMut(FrameIndex, RgbImage) -> KenBurnsResult<()>,
) -> KenBurnsResult<RenderStats> {
    if total_frames == 0 {
        return Err(KenBurnsError::invalid_input("frame sequence must be non-empty"));
    }
    motion.validate_for(source.canvas())?;

    let range = FrameRange::new(FrameIndex(0), FrameIndex(total_frames))?;
    let chunk_size = u32::try_from(threading.chunk_size.max(1)).unwrap_or(u32::MAX);
    let pool = if threading.parallel {
        Some(build_thread_pool(threading.threads)?)
    } else {
        None
    };

    let mut stats = RenderStats::default();
    for chunk in range.chunks(chunk_size) {
        cancel.check()?;
        let frames = match pool.as_ref() {
            Some(pool) => pool.install(|| {
                (chunk.start.0..chunk.end.0)
                    .into_par_iter()
                    .map(|i| {
                        cancel.check()?;
                        Ok(render_frame(source, FrameIndex(i), total_frames, motion))
                    })
                    .collect::<KenBurnsResult<Vec<_>>>()
            })?,
            None => {
                let mut frames = Vec::with_capacity(chunk.len_frames() as usize);
                for i in chunk.start.0..chunk.end.0 {
                    cancel.check()?;
                    frames.push(render_frame(source, FrameIndex(i), total_frames, motion));
                }
                frames
            }
        };

        for (i, frame) in (chunk.start.0..chunk.end.0).zip(frames) {
            emit(FrameIndex(i), frame)?;
        }
        stats.frames_rendered += chunk.len_frames();
        stats.chunks += 1;
        tracing::debug!(start = chunk.start.0, end = chunk.end.0, "chunk rendered");
    }

    Ok(stats)
}

fn build_thread_pool(threads: Option<usize>) -> KenBurnsResult<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(KenBurnsError::invalid_input(
            "render threading 'threads' must be >= 1 when set",
        ));
    }

    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| KenBurnsError::synthesis(format!("failed to build rayon thread pool: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::sink::{InMemorySink, SinkConfig};
    use crate::foundation::core::Fps;
    use crate::motion::presets;

    fn gradient(w: u32, h: u32) -> SourceImage {
        SourceImage::from_rgb(RgbImage::from_fn(w, h, |x, y| {
            image::Rgb([(x * 255 / w) as u8, (y * 255 / h) as u8, 64])
        }))
        .unwrap()
    }

    #[test]
    fn parallel_matches_sequential() {
        let src = gradient(48, 32);
        let motion = presets::lookup("zoom_pan_br");
        let cancel = CancelToken::new();
        let par = RenderThreading {
            parallel: true,
            chunk_size: 3,
            threads: Some(2),
        };
        let a = render_frames(&src, &motion, 7, &par, &cancel).unwrap();
        let b = render_frames(&src, &motion, 7, &RenderThreading::sequential(), &cancel).unwrap();
        assert_eq!(a.len(), 7);
        assert_eq!(a, b);
    }

    #[test]
    fn sink_receives_frames_in_order() {
        let src = gradient(16, 16);
        let mut sink = InMemorySink::new();
        sink.begin(SinkConfig {
            width: 16,
            height: 16,
            fps: Fps::new(12).unwrap(),
        })
        .unwrap();
        let threading = RenderThreading {
            chunk_size: 4,
            ..RenderThreading::default()
        };
        let stats = render_to_sink(
            &src,
            &presets::lookup("pan_left"),
            10,
            &threading,
            &CancelToken::new(),
            &mut sink,
        )
        .unwrap();
        assert_eq!(stats.frames_rendered, 10);
        assert_eq!(stats.chunks, 3);
        let idx: Vec<u32> = sink.frames().iter().map(|(i, _)| i.0).collect();
        assert_eq!(idx, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn cancelled_token_aborts() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let err = render_frames(
            &gradient(8, 8),
            &presets::lookup("zoom_in"),
            4,
            &RenderThreading::default(),
            &cancel,
        )
        .unwrap_err();
        assert!(matches!(err, KenBurnsError::Cancelled(_)));
    }

    #[test]
    fn zero_threads_and_zero_frames_are_rejected() {
        let src = gradient(8, 8);
        let motion = presets::lookup("zoom_in");
        let cancel = CancelToken::new();
        let bad = RenderThreading {
            threads: Some(0),
            ..RenderThreading::default()
        };
        assert!(render_frames(&src, &motion, 2, &bad, &cancel).is_err());
        assert!(render_frames(&src, &motion, 0, &RenderThreading::default(), &cancel).is_err());
    }
}
