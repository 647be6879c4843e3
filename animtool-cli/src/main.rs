use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "animtool", version, about = "Edit animated WebP and GIF images")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Drop frames, cap the duration, and crop/resize into one or more outputs.
    Dropframes(DropframesArgs),
    /// Print meta info for an image file.
    Info(InfoArgs),
    /// Count the pixels of one frame matching a predicate.
    Count(CountArgs),
    /// Print the average opacity of an image file.
    Opacity(OpacityArgs),
    /// Draw a still image over every frame.
    Overlay(LayerArgs),
    /// Draw a still image under every frame.
    Underlay(LayerArgs),
}

/// Encoder flags shared by every command that writes an animation.
#[derive(Args, Debug)]
struct OutputFlags {
    /// Minimize the output size (slow). Implicitly disables key-frame insertion.
    #[arg(long, default_value_t = false)]
    minimize_size: bool,

    /// Lossless encoding.
    #[arg(long, default_value_t = false)]
    lossless: bool,

    /// Quality factor between 0 and 100.
    #[arg(long, default_value_t = 75.0)]
    quality: f32,

    /// Quality/speed trade-off (0 = fast, 6 = slower but better).
    #[arg(long, default_value_t = 0, value_parser = clap::value_parser!(u8).range(0..=6))]
    method: u8,

    /// Print debug logs.
    #[arg(short, long, default_value_t = false)]
    verbose: bool,
}

impl OutputFlags {
    fn encoder_options(&self) -> animtool::EncoderOptions {
        animtool::EncoderOptions {
            minimize_size: self.minimize_size,
            ..animtool::EncoderOptions::default()
        }
    }

    fn frame_options(&self) -> animtool::FrameOptions {
        animtool::FrameOptions {
            lossless: self.lossless,
            quality: self.quality,
            method: self.method,
        }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
enum GifLoop {
    /// Report a loop count only for explicit nonzero counts.
    #[default]
    Compatible,
    /// Missing count plays once; explicit repeats gain one play.
    Webp,
}

impl GifLoop {
    fn decode_options(self) -> animtool::DecodeOptions {
        animtool::DecodeOptions {
            gif_loop_mode: match self {
                Self::Compatible => animtool::GifLoopMode::Compatible,
                Self::Webp => animtool::GifLoopMode::WebP,
            },
        }
    }
}

#[derive(Parser, Debug)]
struct DropframesArgs {
    /// Input image (WebP, GIF, or any still image).
    image: PathBuf,

    /// Output path of the first destination; others derive their names from it.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output directory; files are named `t{i}d{j}.{ext}` unless a destination names them.
    #[arg(short = 'd', long)]
    output_dir: Option<PathBuf>,

    /// Target frame rate; 0 keeps every frame.
    #[arg(short = 'R', long, default_value_t = 0)]
    frame_rate: u32,

    /// Maximum total duration in milliseconds; 0 keeps the full length.
    #[arg(short = 'D', long, default_value_t = 0)]
    total_duration: u64,

    /// Force the loop count (0 = infinite); negative respects the input.
    #[arg(
        short = 'L',
        long,
        default_value_t = -1,
        allow_negative_numbers = true,
        value_parser = clap::value_parser!(i32).range(-1..=65535)
    )]
    loop_count: i32,

    /// Transform `SRC->DST;DST...`, e.g. `0:0:100:100->50:50@small.webp;0:0#gif` or
    /// `center,1:1->200:0`. Repeatable; defaults to one passthrough output.
    #[arg(short = 'T', long = "transform")]
    transforms: Vec<animtool::FrameTransform>,

    /// GIF loop-count interpretation.
    #[arg(long, value_enum, default_value_t = GifLoop::Compatible)]
    gif_loop: GifLoop,

    #[command(flatten)]
    out: OutputFlags,
}

#[derive(Parser, Debug)]
struct InfoArgs {
    /// Input image.
    image: PathBuf,

    /// Print details for every frame.
    #[arg(short, long, default_value_t = false)]
    detail: bool,

    /// Print JSON instead of text.
    #[arg(long, default_value_t = false)]
    json: bool,

    /// GIF loop-count interpretation.
    #[arg(long, value_enum, default_value_t = GifLoop::Compatible)]
    gif_loop: GifLoop,

    /// Print debug logs.
    #[arg(short, long, default_value_t = false)]
    verbose: bool,
}

#[derive(Parser, Debug)]
struct CountArgs {
    /// Input image.
    image: PathBuf,

    /// Index of the frame to count.
    #[arg(short, long, default_value_t = 0)]
    frame: usize,

    /// Region origin x.
    #[arg(short = 'x', long, default_value_t = 0)]
    origin_x: u32,

    /// Region origin y.
    #[arg(short = 'y', long, default_value_t = 0)]
    origin_y: u32,

    /// Region width; defaults to the rest of the frame.
    #[arg(short, long)]
    width: Option<u32>,

    /// Region height; defaults to the rest of the frame.
    #[arg(short = 'H', long)]
    height: Option<u32>,

    /// Predicate such as `15<red<=100:alpha=0`.
    #[arg(short, long, default_value = "15<red<=100:alpha=0")]
    predicate: animtool::PixelPredicate,

    /// Print debug logs.
    #[arg(short, long, default_value_t = false)]
    verbose: bool,
}

#[derive(Parser, Debug)]
struct OpacityArgs {
    /// Input image.
    image: PathBuf,

    /// Sample every N-th frame; 0 samples every frame.
    #[arg(short = 'O', long, default_value_t = 0)]
    sample_divider: u32,

    /// Print debug logs.
    #[arg(short, long, default_value_t = false)]
    verbose: bool,
}

#[derive(Parser, Debug)]
struct LayerArgs {
    /// Input image.
    image: PathBuf,

    /// Still image to draw.
    #[arg(long)]
    layer: PathBuf,

    /// Center the layer on the canvas.
    #[arg(long, default_value_t = false, conflicts_with = "fit")]
    center: bool,

    /// Scale the layer to fit the canvas, centered.
    #[arg(long, default_value_t = false)]
    fit: bool,

    /// Layer origin x (ignored with --center/--fit).
    #[arg(short = 'x', long, default_value_t = 0, allow_negative_numbers = true)]
    origin_x: i64,

    /// Layer origin y (ignored with --center/--fit).
    #[arg(short = 'y', long, default_value_t = 0, allow_negative_numbers = true)]
    origin_y: i64,

    /// Tint color like `0xFFF034`; applied when its alpha is non-zero.
    #[arg(long, default_value = "0x00000000")]
    tint: animtool::Color,

    /// Output image path.
    #[arg(short, long)]
    output: PathBuf,

    /// Output format: webp or gif.
    #[arg(long, default_value = "webp")]
    format: animtool::OutputFormat,

    #[command(flatten)]
    out: OutputFlags,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Dropframes(args) => with_logging(args.out.verbose, || cmd_dropframes(args)),
        Command::Info(args) => with_logging(args.verbose, || cmd_info(args)),
        Command::Count(args) => with_logging(args.verbose, || cmd_count(args)),
        Command::Opacity(args) => with_logging(args.verbose, || cmd_opacity(args)),
        Command::Overlay(args) => with_logging(args.out.verbose, || {
            cmd_layer(args, animtool::LayerMode::Over)
        }),
        Command::Underlay(args) => with_logging(args.out.verbose, || {
            cmd_layer(args, animtool::LayerMode::Under)
        }),
    }
}

/// Run `f` with a stderr subscriber installed for its duration only.
fn with_logging<T>(verbose: bool, f: impl FnOnce() -> anyhow::Result<T>) -> anyhow::Result<T> {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .finish();
    tracing::subscriber::with_default(subscriber, f)
}

fn cmd_dropframes(args: DropframesArgs) -> anyhow::Result<()> {
    let mut transforms = args.transforms;
    if transforms.is_empty() {
        transforms.push(animtool::FrameTransform::default());
    }
    let options = animtool::DropFramesOptions {
        input: args.image,
        output: args.output,
        output_dir: args.output_dir,
        frame_rate: args.frame_rate,
        total_duration: args.total_duration,
        loop_count: u16::try_from(args.loop_count).ok(),
        encoder: args.out.encoder_options(),
        frame: args.out.frame_options(),
        transforms,
        decode: args.gif_loop.decode_options(),
    };
    let report = animtool::drop_frames(&options)
        .with_context(|| format!("dropframes '{}'", options.input.display()))?;
    for path in &report.written {
        println!("{}", path.display());
    }
    Ok(())
}

fn cmd_info(args: InfoArgs) -> anyhow::Result<()> {
    let report = animtool::inspect(&args.image, args.detail, &args.gif_loop.decode_options())
        .with_context(|| format!("info '{}'", args.image.display()))?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{report}");
    }
    Ok(())
}

fn cmd_count(args: CountArgs) -> anyhow::Result<()> {
    let region = animtool::Region {
        x: args.origin_x,
        y: args.origin_y,
        width: args.width,
        height: args.height,
    };
    let count = animtool::count_pixels(&args.image, args.frame, region, &args.predicate)
        .with_context(|| format!("count '{}'", args.image.display()))?;
    println!("{count}");
    Ok(())
}

fn cmd_opacity(args: OpacityArgs) -> anyhow::Result<()> {
    let opts = animtool::DecodeOptions::default();
    let opacity = animtool::average_opacity(&args.image, args.sample_divider, &opts)
        .with_context(|| format!("opacity '{}'", args.image.display()))?;
    println!("{opacity:.2}");
    Ok(())
}

fn cmd_layer(args: LayerArgs, mode: animtool::LayerMode) -> anyhow::Result<()> {
    let placement = if args.fit {
        animtool::Placement::Fit
    } else if args.center {
        animtool::Placement::Center
    } else {
        animtool::Placement::At(animtool::Point::new(args.origin_x, args.origin_y))
    };
    let options = animtool::LayerOptions {
        input: args.image,
        layer: args.layer,
        output: args.output,
        mode,
        placement,
        tint: args.tint,
        format: args.format,
        encoder: args.out.encoder_options(),
        frame: args.out.frame_options(),
        decode: animtool::DecodeOptions::default(),
    };
    animtool::add_layer(&options)
        .with_context(|| format!("{mode:?} '{}'", options.input.display()))?;
    println!("{}", options.output.display());
    Ok(())
}
