use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use lottie_player::{Animation, PixelFormat, RenderConfig, Surface};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(author, version, about = "Render Lottie animation frames to PNG", long_about = None)]
struct Cli {
    /// Path to the Lottie JSON file
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Frame number to render
    #[arg(long, conflicts_with_all = ["pos", "all"])]
    frame: Option<usize>,

    /// Normalized position in [0, 1] to render
    #[arg(long, conflicts_with = "all")]
    pos: Option<f64>,

    /// Render every frame
    #[arg(long)]
    all: bool,

    /// Output width in pixels (defaults to the composition width)
    #[arg(long)]
    width: Option<usize>,

    /// Output height in pixels (defaults to the composition height)
    #[arg(long)]
    height: Option<usize>,

    /// Directory the PNG files are written to
    #[arg(long, value_name = "DIR", default_value = ".")]
    out: PathBuf,

    /// Log level
    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    log_level: LogLevel,

    /// Log format
    #[arg(long, value_enum, default_value_t = LogFormat::Pretty)]
    log_format: LogFormat,
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
enum LogFormat {
    Pretty,
    Json,
}

fn init_logging(level: LogLevel, format: LogFormat) {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from(level).into())
        .from_env_lossy();

    let subscriber_builder = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    match format {
        LogFormat::Json => subscriber_builder.json().init(),
        LogFormat::Pretty => subscriber_builder.pretty().init(),
    }
}

fn frames_to_render(cli: &Cli, animation: &Animation) -> Vec<usize> {
    let first = animation.frame_at_pos(0.0);
    if cli.all {
        (first..first + animation.total_frame()).collect()
    } else if let Some(frame) = cli.frame {
        vec![frame]
    } else {
        vec![animation.frame_at_pos(cli.pos.unwrap_or(0.0))]
    }
}

fn save_png(surface: &Surface, path: &Path) -> Result<()> {
    let image = image::RgbaImage::from_raw(
        surface.width() as u32,
        surface.height() as u32,
        surface.to_rgba8(),
    )
    .context("surface does not match its own dimensions")?;
    image
        .save(path)
        .with_context(|| format!("failed to write {}", path.display()))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_level, cli.log_format);

    let animation = Animation::from_file(&cli.input)
        .with_context(|| format!("failed to load {}", cli.input.display()))?
        .with_config(RenderConfig {
            pixel_format: PixelFormat::Rgba8888Premultiplied,
            ..RenderConfig::default()
        });

    let (comp_w, comp_h) = animation.size();
    let width = cli.width.unwrap_or(comp_w);
    let height = cli.height.unwrap_or(comp_h);
    if width == 0 || height == 0 {
        bail!("output size must be non-zero, got {width}x{height}");
    }

    info!(
        input = %cli.input.display(),
        frames = animation.total_frame(),
        fps = animation.frame_rate(),
        "animation loaded"
    );

    std::fs::create_dir_all(&cli.out)
        .with_context(|| format!("failed to create {}", cli.out.display()))?;
    let stem = cli
        .input
        .file_stem()
        .map_or_else(|| "frame".to_string(), |s| s.to_string_lossy().into_owned());

    let mut surface = Surface::new(width, height, None, animation.config().pixel_format)?;
    for frame in frames_to_render(&cli, &animation) {
        surface = animation
            .render_async(frame, surface)
            .join()
            .with_context(|| format!("failed to render frame {frame}"))?;
        let path = cli.out.join(format!("{stem}_{frame:05}.png"));
        save_png(&surface, &path)?;
        info!(frame, path = %path.display(), "frame written");
    }
    Ok(())
}
