use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, ExitStatus, Stdio};
use std::sync::atomic::{AtomicU64, Ordering};

use image::RgbImage;

use crate::encode::sink::{ContainerFormat, Encoded, FrameSink, OrderGuard, SinkConfig};
use crate::foundation::core::FrameIndex;
use crate::foundation::error::{KenBurnsError, KenBurnsResult};

/// Video encoder `ffmpeg` must provide for MP4 output.
pub const H264_ENCODER: &str = "libx264";

static TEMP_SEQ: AtomicU64 = AtomicU64::new(0);

/// Options for [`Mp4Sink`].
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Mp4Opts {
    /// Encoder program, looked up on `PATH` unless absolute.
    pub ffmpeg: PathBuf,
    /// x264 constant rate factor (0-51, lower is better).
    pub crf: u8,
    /// Directory for the intermediate MP4 file; defaults to the system temp dir.
    pub temp_dir: Option<PathBuf>,
}

impl Default for Mp4Opts {
    fn default() -> Self {
        Self {
            ffmpeg: PathBuf::from("ffmpeg"),
            crf: 20,
            temp_dir: None,
        }
    }
}

/// Sink that spawns `ffmpeg`, streams raw RGB24 frames to stdin and returns the MP4 bytes.
///
/// The container is written to a request-scoped temporary file (MP4 `+faststart` needs a
/// seekable output) which is removed on success and on failure.
pub struct Mp4Sink {
    opts: Mp4Opts,

    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stderr_drain: Option<std::thread::JoinHandle<std::io::Result<Vec<u8>>>>,
    out: TempFileGuard,

    cfg: Option<SinkConfig>,
    order: OrderGuard,
}

impl Mp4Sink {
    pub fn new(opts: Mp4Opts) -> Self {
        Self {
            opts,
            child: None,
            stdin: None,
            stderr_drain: None,
            out: TempFileGuard(None),
            cfg: None,
            order: OrderGuard::default(),
        }
    }

    fn temp_path(&self) -> PathBuf {
        let dir = self.opts.temp_dir.clone().unwrap_or_else(std::env::temp_dir);
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        let seq = TEMP_SEQ.fetch_add(1, Ordering::Relaxed);
        dir.join(format!("kenburns_{}_{nanos}_{seq}.mp4", std::process::id()))
    }

    /// Close stdin, reap the child and return its exit status with trimmed stderr.
    fn finish_child(&mut self) -> KenBurnsResult<(ExitStatus, String)> {
        drop(self.stdin.take());
        let mut child = self
            .child
            .take()
            .ok_or_else(|| KenBurnsError::synthesis("mp4 sink not started"))?;

        let status = child.wait().map_err(|e| {
            KenBurnsError::synthesis(format!("failed to wait for ffmpeg to finish: {e}"))
        })?;
        let stderr_bytes = match self.stderr_drain.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| KenBurnsError::synthesis("ffmpeg stderr drain thread panicked"))?
                .map_err(|e| KenBurnsError::synthesis(format!("ffmpeg stderr read failed: {e}")))?,
            None => Vec::new(),
        };
        Ok((status, String::from_utf8_lossy(&stderr_bytes).trim().to_owned()))
    }

    fn read_output(&mut self) -> KenBurnsResult<Vec<u8>> {
        let (status, stderr) = self.finish_child()?;
        if !status.success() {
            return Err(KenBurnsError::synthesis(format!(
                "ffmpeg exited with status {status}: {stderr}"
            )));
        }

        let path = self
            .out
            .path()
            .ok_or_else(|| KenBurnsError::synthesis("mp4 sink lost its output path"))?;
        use anyhow::Context as _;
        let bytes = std::fs::read(path)
            .with_context(|| format!("read encoded mp4 '{}'", path.display()))?;
        Ok(bytes)
    }

    fn abort(&mut self) {
        drop(self.stdin.take());
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
        drop(self.stderr_drain.take());
        self.out.remove();
    }
}

impl FrameSink for Mp4Sink {
    fn begin(&mut self, cfg: SinkConfig) -> KenBurnsResult<()> {
        if cfg.width == 0 || cfg.height == 0 {
            return Err(KenBurnsError::invalid_input(
                "mp4 sink width/height must be non-zero",
            ));
        }
        if !cfg.width.is_multiple_of(2) || !cfg.height.is_multiple_of(2) {
            return Err(KenBurnsError::invalid_input(
                "mp4 sink width/height must be even (required for yuv420p mp4 output)",
            ));
        }
        if self.opts.crf > 51 {
            return Err(KenBurnsError::invalid_input(format!(
                "mp4 crf must be within [0, 51], got {}",
                self.opts.crf
            )));
        }

        let out_path = self.temp_path();
        let mut cmd = Command::new(&self.opts.ffmpeg);
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        cmd.args([
            "-y",
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgb24",
            "-s",
            &format!("{}x{}", cfg.width, cfg.height),
            "-r",
            &cfg.fps.get().to_string(),
            "-i",
            "pipe:0",
            "-an",
            "-c:v",
            H264_ENCODER,
            "-crf",
            &self.opts.crf.to_string(),
            "-pix_fmt",
            "yuv420p",
            "-movflags",
            "+faststart",
            "-f",
            "mp4",
        ])
        .arg(&out_path);

        let mut child = cmd.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                KenBurnsError::encoder_unavailable(format!(
                    "'{}' was not found: {e}",
                    self.opts.ffmpeg.display()
                ))
            } else {
                KenBurnsError::synthesis(format!("failed to spawn ffmpeg: {e}"))
            }
        })?;
        self.out = TempFileGuard(Some(out_path));

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| KenBurnsError::synthesis("failed to open ffmpeg stdin (unexpected)"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| KenBurnsError::synthesis("failed to open ffmpeg stderr (unexpected)"))?;
        let stderr_drain = std::thread::spawn(move || {
            let mut stderr_bytes = Vec::new();
            stderr.read_to_end(&mut stderr_bytes)?;
            Ok(stderr_bytes)
        });

        self.child = Some(child);
        self.stdin = Some(stdin);
        self.stderr_drain = Some(stderr_drain);
        self.cfg = Some(cfg);
        self.order = OrderGuard::default();
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &RgbImage) -> KenBurnsResult<()> {
        let cfg = self
            .cfg
            .ok_or_else(|| KenBurnsError::synthesis("mp4 sink not started"))?;
        cfg.check_frame(frame)?;
        self.order.advance(idx)?;

        let Some(stdin) = self.stdin.as_mut() else {
            return Err(KenBurnsError::synthesis("mp4 sink is already finalized"));
        };

        use std::io::Write as _;
        if let Err(e) = stdin.write_all(frame.as_raw()) {
            // A broken pipe means ffmpeg already quit; its stderr says why.
            let cause = match self.finish_child() {
                Ok((status, stderr)) => format!("ffmpeg exited with status {status}: {stderr}"),
                Err(reap) => reap.to_string(),
            };
            self.out.remove();
            self.cfg = None;
            return Err(KenBurnsError::synthesis(format!(
                "failed to write frame {} to ffmpeg stdin ({e}); {cause}",
                idx.0
            )));
        }
        Ok(())
    }

    fn end(&mut self) -> KenBurnsResult<Encoded> {
        let result = self.read_output();
        self.out.remove();
        self.cfg = None;
        let bytes = result?;
        tracing::debug!(bytes = bytes.len(), "mp4 encoded");
        Ok(Encoded {
            format: ContainerFormat::Mp4,
            bytes,
        })
    }
}

impl Drop for Mp4Sink {
    fn drop(&mut self) {
        if self.child.is_some() {
            self.abort();
        }
    }
}

struct TempFileGuard(Option<PathBuf>);

impl TempFileGuard {
    fn path(&self) -> Option<&PathBuf> {
        self.0.as_ref()
    }

    fn remove(&mut self) {
        if let Some(path) = self.0.take() {
            let _ = std::fs::remove_file(path);
        }
    }
}

impl Drop for TempFileGuard {
    fn drop(&mut self) {
        self.remove();
    }
}

/// Return `true` when `program` runs and lists the [`H264_ENCODER`] that MP4 output needs.
pub fn is_ffmpeg_available(program: &Path) -> bool {
    let output = match Command::new(program)
        .args(["-hide_banner", "-encoders"])
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output()
    {
        Ok(output) => output,
        Err(e) => {
            tracing::debug!(program = %program.display(), error = %e, "ffmpeg not runnable");
            return false;
        }
    };
    if !output.status.success() {
        tracing::debug!(
            program = %program.display(),
            status = %output.status,
            "ffmpeg -encoders failed"
        );
        return false;
    }
    let listed = lists_encoder(&String::from_utf8_lossy(&output.stdout), H264_ENCODER);
    if !listed {
        tracing::warn!(
            program = %program.display(),
            encoder = H264_ENCODER,
            "ffmpeg is missing the mp4 video encoder"
        );
    }
    listed
}

/// Whether an `ffmpeg -encoders` listing contains `name` (second column of an entry line).
fn lists_encoder(listing: &str, name: &str) -> bool {
    listing
        .lines()
        .any(|line| line.split_whitespace().nth(1) == Some(name))
}
