use std::time::{Duration, Instant};

use crate::encode::sink::{ContainerFormat, SinkConfig};
use crate::encode::{EncoderSupport, begin_sink};
use crate::foundation::cancel::CancelToken;
use crate::foundation::core::Canvas;
use crate::foundation::error::{KenBurnsError, KenBurnsResult};
use crate::render::pipeline::{RenderStats, render_to_sink};
use crate::render::source::SourceImage;
use crate::session::config::{SynthesisConfig, SynthesisLimits};
use crate::session::request::{RenderParams, SynthesisRequest};

/// Encoded video plus the parameters it was produced with.
///
/// `format` is the container actually produced, which is GIF whenever MP4 was requested but could
/// not be encoded.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct VideoOutput {
    #[serde(skip)]
    pub bytes: Vec<u8>,
    pub format: ContainerFormat,
    pub requested_format: ContainerFormat,
    pub duration: f64,
    pub fps: u32,
    #[serde(rename = "frames")]
    pub frame_count: u32,
    pub preset: String,
    pub width: u32,
    pub height: u32,
}

impl VideoOutput {
    /// `true` when the requested container was replaced by GIF.
    pub fn fell_back(&self) -> bool {
        self.format != self.requested_format
    }
}

/// Stateless-per-request synthesis engine.
///
/// Holds only immutable configuration and the encoder support probed at construction, so one
/// instance can serve concurrent requests.
#[derive(Clone, Debug)]
pub struct Synthesizer {
    config: SynthesisConfig,
    support: EncoderSupport,
}

impl Synthesizer {
    /// Create an engine, probing encoder support once.
    pub fn new(config: SynthesisConfig) -> Self {
        let support = EncoderSupport::detect(&config.encode);
        Self { config, support }
    }

    /// Create an engine with already-known encoder support.
    pub fn with_support(config: SynthesisConfig, support: EncoderSupport) -> Self {
        Self { config, support }
    }

    pub fn config(&self) -> &SynthesisConfig {
        &self.config
    }

    pub fn support(&self) -> EncoderSupport {
        self.support
    }

    /// Decode `image_bytes` and synthesize according to `request`.
    pub fn synthesize_bytes(
        &self,
        image_bytes: &[u8],
        request: &SynthesisRequest,
        cancel: &CancelToken,
    ) -> KenBurnsResult<VideoOutput> {
        let params = request.resolve()?;
        let source = SourceImage::decode(image_bytes)?;
        self.synthesize_with_params(&source, &params, cancel)
    }

    /// Synthesize from a request, clamping its timing into the supported ranges.
    pub fn synthesize(
        &self,
        source: &SourceImage,
        request: &SynthesisRequest,
        cancel: &CancelToken,
    ) -> KenBurnsResult<VideoOutput> {
        let params = request.resolve()?;
        self.synthesize_with_params(source, &params, cancel)
    }

    /// Synthesize from resolved parameters without clamping.
    #[tracing::instrument(
        skip(self, source, params, cancel),
        fields(preset = %params.preset, format = %params.format, fps = params.fps.get())
    )]
    pub fn synthesize_with_params(
        &self,
        source: &SourceImage,
        params: &RenderParams,
        cancel: &CancelToken,
    ) -> KenBurnsResult<VideoOutput> {
        let started = Instant::now();
        let canvas = source.canvas();
        params.motion.validate_for(canvas)?;
        let frame_count = params.frame_count()?;
        check_frame_budget(&self.config.limits, canvas, frame_count)?;

        let cancel = match self.config.limits.timeout_secs {
            Some(secs) => cancel.limited_to(Duration::from_secs(secs)),
            None => cancel.clone(),
        };
        cancel.check()?;

        let cfg = SinkConfig {
            width: canvas.width,
            height: canvas.height,
            fps: params.fps,
        };
        let mut sink = begin_sink(params.format, self.support, &self.config.encode, cfg)?;
        let stats: RenderStats = render_to_sink(
            source,
            &params.motion,
            frame_count,
            &self.config.threading,
            &cancel,
            sink.as_mut(),
        )?;
        cancel.check()?;
        let encoded = sink.end()?;

        tracing::info!(
            frames = stats.frames_rendered,
            format = %encoded.format,
            bytes = encoded.bytes.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "video synthesized"
        );

        Ok(VideoOutput {
            bytes: encoded.bytes,
            format: encoded.format,
            requested_format: params.format,
            duration: params.duration_secs,
            fps: params.fps.get(),
            frame_count,
            preset: params.preset.clone(),
            width: canvas.width,
            height: canvas.height,
        })
    }
}

/// Reject requests whose raw frames would exceed the configured ceiling.
pub fn check_frame_budget(
    limits: &SynthesisLimits,
    canvas: Canvas,
    frame_count: u32,
) -> KenBurnsResult<()> {
    let total = u64::from(frame_count).saturating_mul(canvas.rgb8_bytes());
    if total > limits.max_frame_bytes {
        return Err(KenBurnsError::resource_exhausted(format!(
            "{frame_count} frames of {}x{} need {total} bytes, limit is {}",
            canvas.width, canvas.height, limits.max_frame_bytes
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_budget_boundary() {
        let limits = SynthesisLimits {
            max_frame_bytes: 10 * 4 * 4 * 3,
            timeout_secs: None,
        };
        let canvas = Canvas {
            width: 4,
            height: 4,
        };
        check_frame_budget(&limits, canvas, 10).unwrap();
        assert!(matches!(
            check_frame_budget(&limits, canvas, 11),
            Err(KenBurnsError::ResourceExhausted(_))
        ));
    }

    #[test]
    fn summary_serializes_without_payload() {
        let out = VideoOutput {
            bytes: vec![1, 2, 3],
            format: ContainerFormat::Gif,
            requested_format: ContainerFormat::Mp4,
            duration: 2.0,
            fps: 12,
            frame_count: 24,
            preset: "zoom_in".to_string(),
            width: 8,
            height: 8,
        };
        assert!(out.fell_back());
        let json = serde_json::to_value(&out).unwrap();
        assert_eq!(json["format"], "gif");
        assert_eq!(json["frames"], 24);
        assert!(json.get("bytes").is_none());
    }
}
