use std::path::Path;

use anyhow::Context as _;

use crate::encode::EncodeOpts;
use crate::foundation::error::{KenBurnsError, KenBurnsResult};
use crate::render::pipeline::RenderThreading;

/// 2 GiB of raw RGB8 frames.
pub const DEFAULT_MAX_FRAME_BYTES: u64 = 2 << 30;

/// Per-request resource ceilings.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SynthesisLimits {
    /// Upper bound for `frame_count * width * height * 3`.
    pub max_frame_bytes: u64,
    /// Wall-clock budget per request in seconds.
    pub timeout_secs: Option<u64>,
}

impl Default for SynthesisLimits {
    fn default() -> Self {
        Self {
            max_frame_bytes: DEFAULT_MAX_FRAME_BYTES,
            timeout_secs: None,
        }
    }
}

/// Engine configuration, usually loaded once at startup.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SynthesisConfig {
    pub limits: SynthesisLimits,
    pub threading: RenderThreading,
    pub encode: EncodeOpts,
}

impl SynthesisConfig {
    pub fn from_json_str(json: &str) -> KenBurnsResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| KenBurnsError::invalid_input(format!("parse synthesis config: {e}")))
    }

    pub fn from_path(path: &Path) -> KenBurnsResult<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("read config '{}'", path.display()))?;
        Self::from_json_str(&json)
    }
}
