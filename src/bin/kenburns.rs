use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "kenburns", version, about = "Camera-motion videos from a still image")]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace). `RUST_LOG` takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a GIF or MP4 (MP4 requires `ffmpeg` on PATH, otherwise GIF is written).
    Render(RenderArgs),
    /// Render a single frame as a PNG.
    Frame(FrameArgs),
    /// List the motion presets.
    Presets {
        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
    },
    /// Print engine information and encoder availability.
    Info,
}

#[derive(Args, Debug)]
struct MotionArgs {
    /// Motion preset name (unknown names fall back to `zoom_in`).
    #[arg(long, default_value = kenburns::DEFAULT_PRESET)]
    preset: String,

    /// Custom motion as a JSON object or a path to a JSON file; overrides `--preset`.
    #[arg(long)]
    motion: Option<String>,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Input image (PNG, JPEG, ...).
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output path. The extension is replaced when a different container is produced.
    #[arg(long)]
    out: PathBuf,

    #[command(flatten)]
    motion: MotionArgs,

    /// Duration in seconds (clamped to 1..=10 unless `--no-clamp`).
    #[arg(long, default_value_t = 3.0)]
    duration: f64,

    /// Frames per second (clamped to 12..=60 unless `--no-clamp`).
    #[arg(long, default_value_t = 24)]
    fps: u32,

    /// Requested container.
    #[arg(long, value_enum, default_value_t = FormatChoice::Gif)]
    format: FormatChoice,

    /// Use duration and fps as given.
    #[arg(long)]
    no_clamp: bool,

    /// Engine configuration JSON.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Worker threads for frame rendering.
    #[arg(long)]
    threads: Option<usize>,

    /// Render frames on the calling thread only.
    #[arg(long)]
    sequential: bool,

    /// Frames rendered per batch.
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Ceiling for raw frame bytes (frames * width * height * 3).
    #[arg(long)]
    max_frame_bytes: Option<u64>,

    /// Abort the render after this many seconds.
    #[arg(long)]
    timeout_secs: Option<u64>,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Input image (PNG, JPEG, ...).
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Frame index (0-based).
    #[arg(long)]
    index: u32,

    /// Total frames in the sequence.
    #[arg(long)]
    total: u32,

    #[command(flatten)]
    motion: MotionArgs,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FormatChoice {
    Gif,
    Mp4,
}

impl From<FormatChoice> for kenburns::ContainerFormat {
    fn from(choice: FormatChoice) -> Self {
        match choice {
            FormatChoice::Gif => Self::Gif,
            FormatChoice::Mp4 => Self::Mp4,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Frame(args) => cmd_frame(args),
        Command::Presets { json } => cmd_presets(json),
        Command::Info => cmd_info(),
    }
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn read_source(path: &Path) -> anyhow::Result<kenburns::SourceImage> {
    let bytes = std::fs::read(path).with_context(|| format!("read image '{}'", path.display()))?;
    Ok(kenburns::SourceImage::decode(&bytes)?)
}

fn parse_motion(arg: &str) -> anyhow::Result<kenburns::MotionSpec> {
    let json = if arg.trim_start().starts_with('{') {
        arg.to_string()
    } else {
        std::fs::read_to_string(arg).with_context(|| format!("read motion file '{arg}'"))?
    };
    serde_json::from_str(&json).with_context(|| "parse motion JSON")
}

impl MotionArgs {
    fn resolve(&self) -> anyhow::Result<(String, kenburns::MotionSpec)> {
        match self.motion.as_deref() {
            Some(arg) => Ok(("custom".to_string(), parse_motion(arg)?)),
            None => Ok((
                self.preset.clone(),
                kenburns::motion::presets::lookup(&self.preset),
            )),
        }
    }
}

fn load_config(args: &RenderArgs) -> anyhow::Result<kenburns::SynthesisConfig> {
    let mut cfg = match &args.config {
        Some(path) => kenburns::SynthesisConfig::from_path(path)?,
        None => kenburns::SynthesisConfig::default(),
    };
    if args.threads.is_some() {
        cfg.threading.threads = args.threads;
    }
    if args.sequential {
        cfg.threading.parallel = false;
    }
    if let Some(n) = args.chunk_size {
        cfg.threading.chunk_size = n;
    }
    if let Some(n) = args.max_frame_bytes {
        cfg.limits.max_frame_bytes = n;
    }
    if args.timeout_secs.is_some() {
        cfg.limits.timeout_secs = args.timeout_secs;
    }
    Ok(cfg)
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let cfg = load_config(&args)?;
    let source = read_source(&args.in_path)?;
    let (label, motion) = args.motion.resolve()?;
    let format = kenburns::ContainerFormat::from(args.format);

    let params = if args.no_clamp {
        kenburns::RenderParams {
            preset: label,
            motion,
            duration_secs: args.duration,
            fps: kenburns::Fps::new(args.fps)?,
            format,
        }
    } else {
        let request = kenburns::SynthesisRequest {
            preset: label,
            duration: args.duration,
            fps: f64::from(args.fps),
            format,
            motion: Some(motion),
        };
        request.resolve()?
    };

    let engine = kenburns::Synthesizer::new(cfg);
    let cancel = match args.timeout_secs {
        Some(secs) => kenburns::CancelToken::with_timeout(Duration::from_secs(secs)),
        None => kenburns::CancelToken::new(),
    };
    let output = engine.synthesize_with_params(&source, &params, &cancel)?;

    let out_path = output_path_for(&args.out, output.format);
    if let Some(parent) = out_path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    std::fs::write(&out_path, &output.bytes)
        .with_context(|| format!("write video '{}'", out_path.display()))?;

    let mut summary = serde_json::to_value(&output)?;
    summary["success"] = serde_json::Value::Bool(true);
    summary["out"] = serde_json::Value::String(out_path.display().to_string());
    summary["bytes"] = serde_json::Value::from(output.bytes.len());
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

/// Keep the caller's path unless its extension names a different container.
fn output_path_for(requested: &Path, produced: kenburns::ContainerFormat) -> PathBuf {
    match requested.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case(produced.extension()) => requested.to_path_buf(),
        Some("gif" | "mp4" | "GIF" | "MP4") | None => {
            requested.with_extension(produced.extension())
        }
        Some(_) => requested.to_path_buf(),
    }
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let source = read_source(&args.in_path)?;
    let (_, motion) = args.motion.resolve()?;
    let frame = kenburns::generate(
        &source,
        kenburns::FrameIndex(args.index),
        args.total,
        &motion,
    )?;

    if let Some(parent) = args.out.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    frame
        .save_with_format(&args.out, image::ImageFormat::Png)
        .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_presets(json: bool) -> anyhow::Result<()> {
    let presets = kenburns::motion::presets::all();
    if json {
        println!("{}", serde_json::to_string_pretty(presets)?);
        return Ok(());
    }
    for p in presets {
        println!("{:<14} {}", p.name, p.description);
    }
    Ok(())
}

fn cmd_info() -> anyhow::Result<()> {
    let support = kenburns::EncoderSupport::detect(&kenburns::EncodeOpts::default());
    let names: Vec<&str> = kenburns::motion::presets::all()
        .iter()
        .map(|p| p.name)
        .collect();
    let info = serde_json::json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Create smooth camera motion videos from images",
        "features": [
            "Ken Burns effect",
            "Multiple motion presets",
            "Custom motion paths",
            "GIF and MP4 output",
            "No GPU required",
        ],
        "encoders": { "gif": true, "mp4": support.mp4 },
        "presets": names,
    });
    println!("{}", serde_json::to_string_pretty(&info)?);
    Ok(())
}
