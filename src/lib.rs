//! Camera-motion video synthesis from a single still image.
//!
//! A [`MotionSpec`] (or a named preset) describes how a virtual camera zooms and pans across the
//! source. Every output frame crops the source around the eased camera state and resamples it
//! back to full size; the ordered frames are then encoded as GIF or, when `ffmpeg` is present,
//! MP4.
//!
//! - Decode a [`SourceImage`]
//! - Build a [`Synthesizer`] once (it probes encoder support)
//! - Call [`Synthesizer::synthesize`] per request
#![forbid(unsafe_code)]

pub mod encode;
pub mod foundation;
pub mod motion;
pub mod render;
pub mod session;

pub use crate::encode::sink::{ContainerFormat, Encoded, FrameSink, InMemorySink, SinkConfig};
pub use crate::encode::{EncodeOpts, EncoderSupport, begin_sink, encode};
pub use crate::foundation::cancel::CancelToken;
pub use crate::foundation::core::{Canvas, Fps, FrameIndex, FrameRange};
pub use crate::foundation::error::{KenBurnsError, KenBurnsResult};
pub use crate::motion::ease::ease;
pub use crate::motion::presets::{DEFAULT_PRESET, Preset};
pub use crate::motion::spec::{CameraState, MotionSpec};
pub use crate::render::frame::{CropWindow, crop_window, frame_progress, generate};
pub use crate::render::pipeline::{RenderStats, RenderThreading, render_frames, render_to_sink};
pub use crate::render::source::SourceImage;
pub use crate::session::config::{SynthesisConfig, SynthesisLimits};
pub use crate::session::request::{RenderParams, SynthesisRequest};
pub use crate::session::synth::{Synthesizer, VideoOutput};
