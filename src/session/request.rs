use crate::encode::sink::ContainerFormat;
use crate::foundation::core::Fps;
use crate::foundation::error::{KenBurnsError, KenBurnsResult};
use crate::motion::presets::{self, DEFAULT_PRESET};
use crate::motion::spec::MotionSpec;

pub const MIN_DURATION_SECS: f64 = 1.0;
pub const MAX_DURATION_SECS: f64 = 10.0;
pub const MIN_FPS: f64 = 12.0;
pub const MAX_FPS: f64 = 60.0;

/// Caller-facing request parameters, as received from the service boundary.
///
/// `duration` and `fps` are clamped into their supported ranges when resolved; `motion`, when
/// present, overrides `preset`.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SynthesisRequest {
    pub preset: String,
    pub duration: f64,
    pub fps: f64,
    pub format: ContainerFormat,
    pub motion: Option<MotionSpec>,
}

impl Default for SynthesisRequest {
    fn default() -> Self {
        Self {
            preset: DEFAULT_PRESET.to_string(),
            duration: 3.0,
            fps: 24.0,
            format: ContainerFormat::Gif,
            motion: None,
        }
    }
}

/// Fully resolved render parameters. No clamping is applied to these.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderParams {
    /// Label echoed back in the output; the preset name or the caller's label.
    pub preset: String,
    pub motion: MotionSpec,
    pub duration_secs: f64,
    pub fps: Fps,
    pub format: ContainerFormat,
}

impl RenderParams {
    /// Parameters for a catalog preset. Unknown names use the default motion.
    pub fn preset(name: &str, duration_secs: f64, fps: Fps, format: ContainerFormat) -> Self {
        Self {
            preset: name.to_string(),
            motion: presets::lookup(name),
            duration_secs,
            fps,
            format,
        }
    }

    /// Parameters for an explicit motion.
    pub fn custom(motion: MotionSpec, duration_secs: f64, fps: Fps, format: ContainerFormat) -> Self {
        Self {
            preset: "custom".to_string(),
            motion,
            duration_secs,
            fps,
            format,
        }
    }

    pub fn frame_count(&self) -> KenBurnsResult<u32> {
        self.fps.frames_for(self.duration_secs)
    }
}

impl SynthesisRequest {
    pub fn from_json_str(json: &str) -> KenBurnsResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| KenBurnsError::invalid_input(format!("parse synthesis request: {e}")))
    }

    /// Clamp timing, pick the motion and validate it.
    pub fn resolve(&self) -> KenBurnsResult<RenderParams> {
        if !self.duration.is_finite() {
            return Err(KenBurnsError::invalid_input(format!(
                "duration must be finite, got {}",
                self.duration
            )));
        }
        if !self.fps.is_finite() {
            return Err(KenBurnsError::invalid_input(format!(
                "fps must be finite, got {}",
                self.fps
            )));
        }
        let duration_secs = self.duration.clamp(MIN_DURATION_SECS, MAX_DURATION_SECS);
        let fps = Fps::new(self.fps.clamp(MIN_FPS, MAX_FPS).round() as u32)?;

        let motion = match self.motion {
            Some(m) => m,
            None => {
                if presets::get(&self.preset).is_none() {
                    tracing::debug!(preset = %self.preset, "unknown preset, using {DEFAULT_PRESET}");
                }
                presets::lookup(&self.preset)
            }
        };
        motion.validate()?;

        Ok(RenderParams {
            preset: self.preset.clone(),
            motion,
            duration_secs,
            fps,
            format: self.format,
        })
    }
}
