use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use clap::Parser;
use colored::Colorize;
use facereel::{
    AssemblerOptions, BatchDriver, BatchSummary, FfmpegLogLevel, NullRecognizer,
    OperationType, PipelineOptions, ProgressCallback, ProgressInfo, Recognizer, VideoCodec,
};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;

const CLI_AFTER_HELP: &str = "Examples:\n  facereel --video_dir clip.mp4\n  facereel --video_dir videos/ --sample-interval 5 --progress\n  facereel --video_dir videos/ --output annotated.mp4 --html player.html --json";

#[derive(Debug, Parser)]
#[command(
    name = "facereel",
    version,
    about = "Annotate videos with face recognition overlays and reassemble them into one video",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    /// Path to the video or folder input. It can be either a video or a dir
    /// containing some videos.
    #[arg(long = "video_dir", visible_alias = "video-dir")]
    video_dir: PathBuf,

    /// Enable some debug outputs.
    #[arg(long)]
    debug: bool,

    /// Directory the annotated frames are written to.
    #[arg(long, default_value = facereel::options::DEFAULT_IMAGE_DIR)]
    image_dir: PathBuf,

    /// Path of the assembled video.
    #[arg(long, default_value = facereel::assemble::DEFAULT_OUTPUT_VIDEO)]
    output: PathBuf,

    /// Run recognition on every Nth frame.
    #[arg(long, default_value_t = facereel::options::DEFAULT_SAMPLE_INTERVAL)]
    sample_interval: u64,

    /// Seconds between refreshes of the displayed frame rate.
    #[arg(long, default_value_t = 5.0)]
    fps_interval: f64,

    /// Frame rate of the assembled video.
    #[arg(long, default_value_t = facereel::assemble::DEFAULT_OUTPUT_FPS)]
    output_fps: u32,

    /// Output codec (h264, h265, mpeg4).
    #[arg(long, default_value = "h264")]
    codec: String,

    /// TrueType/OpenType font for overlay text.
    #[arg(long)]
    font: Option<PathBuf>,

    /// Write the HTML player snippet to this file instead of stdout.
    #[arg(long)]
    html: Option<PathBuf>,

    /// Print the run summary as machine-readable JSON.
    #[arg(long)]
    json: bool,

    /// Show a progress bar.
    #[arg(long)]
    progress: bool,
}

fn parse_codec(value: &str) -> Option<VideoCodec> {
    match value.to_ascii_lowercase().as_str() {
        "h264" | "avc" | "x264" => Some(VideoCodec::H264),
        "h265" | "hevc" | "x265" => Some(VideoCodec::H265),
        "mpeg4" | "mp4v" => Some(VideoCodec::Mpeg4),
        _ => None,
    }
}

fn init_logging(debug: bool) {
    let default_filter = if debug { "facereel=debug" } else { "facereel=info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();

    facereel::set_ffmpeg_log_level(if debug {
        FfmpegLogLevel::Info
    } else {
        FfmpegLogLevel::Error
    });
}

struct TerminalProgress {
    bar: ProgressBar,
}

impl TerminalProgress {
    fn new() -> Result<Self, Box<dyn std::error::Error>> {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::with_template(
            "{spinner:.green} {bar:40.cyan/blue} {pos}/{len} {msg}",
        )?;
        bar.set_style(style.progress_chars("##-"));
        Ok(Self { bar })
    }
}

impl ProgressCallback for TerminalProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        let stage = match info.operation {
            OperationType::Annotation => "annotating",
            OperationType::Assembly => "assembling",
            _ => "working",
        };
        let file = info
            .current_file
            .as_deref()
            .and_then(Path::file_name)
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        self.bar.set_length(info.total.unwrap_or(info.current));
        self.bar.set_position(info.current);
        self.bar.set_message(format!("{stage} {file}"));
    }
}

fn print_summary(summary: &BatchSummary) {
    for skipped in &summary.skipped {
        eprintln!(
            "{} {}",
            "skipped:".yellow().bold(),
            format!("{} ({})", skipped.path.display(), skipped.reason).yellow()
        );
    }
    for report in &summary.succeeded {
        eprintln!(
            "{} {} ({} frames, {} recognition calls)",
            "annotated:".green().bold(),
            report.source.display(),
            report.frames,
            report.recognition_calls
        );
    }
    for failure in &summary.failed {
        eprintln!(
            "{} {}",
            "failed:".red().bold(),
            format!("{}: {}", failure.source.display(), failure.error).red()
        );
    }
    match (&summary.output_video, &summary.assembly_error) {
        (Some(video), None) => eprintln!(
            "{} {}",
            "success:".green().bold(),
            format!("Assembled {}", video.display()).green()
        ),
        (_, Some(error)) => eprintln!("{} {}", "error:".red().bold(), error),
        (None, None) => {}
    }
}

fn summary_json(summary: &BatchSummary) -> serde_json::Value {
    json!({
        "succeeded": summary.succeeded.iter().map(|report| json!({
            "source": report.source.display().to_string(),
            "basename": report.basename,
            "frames": report.frames,
            "recognition_calls": report.recognition_calls,
        })).collect::<Vec<_>>(),
        "failed": summary.failed.iter().map(|failure| json!({
            "source": failure.source.display().to_string(),
            "error": failure.error.to_string(),
            "frames_written": failure.frames_written,
        })).collect::<Vec<_>>(),
        "skipped": summary.skipped.iter().map(|skipped| json!({
            "path": skipped.path.display().to_string(),
            "reason": skipped.reason.to_string(),
        })).collect::<Vec<_>>(),
        "output_video": summary.output_video.as_ref().map(|path| path.display().to_string()),
        "error": summary.assembly_error.as_ref().map(|error| error.to_string()),
    })
}

fn run() -> Result<bool, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.debug);

    let codec = parse_codec(&cli.codec).ok_or(format!("unsupported --codec: {}", cli.codec))?;
    let fps_interval = facereel::options::display_interval_from_secs(cli.fps_interval)
        .map_err(|_| "--fps-interval must be a positive number of seconds")?;

    let assembler = AssemblerOptions::default()
        .fps(cli.output_fps)
        .codec(codec)
        .output(&cli.output);
    let mut options = PipelineOptions::new()
        .with_sample_interval(cli.sample_interval)
        .with_fps_display_interval(fps_interval)
        .with_image_dir(&cli.image_dir)
        .with_assembler(assembler);
    if let Some(font) = &cli.font {
        options = options.with_font(font);
    }

    let progress = if cli.progress {
        let progress = Arc::new(TerminalProgress::new()?);
        options = options.with_progress(progress.clone());
        Some(progress)
    } else {
        None
    };

    let mut engine = NullRecognizer;
    if cli.debug {
        eprintln!("{}", "Debug enabled".cyan().bold());
        engine.set_debug(true);
    }

    let mut driver = BatchDriver::new(options);
    let summary = driver.run(&cli.video_dir, &mut engine)?;

    if let Some(progress) = progress {
        progress.bar.finish_and_clear();
    }

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&summary_json(&summary))?);
    } else {
        print_summary(&summary);
    }

    if let Some(html) = &summary.html {
        match &cli.html {
            Some(path) => {
                fs::write(path, html)?;
                eprintln!("{} {}", "saved".green().bold(), path.display());
            }
            None if !cli.json => println!("{html}"),
            None => {}
        }
    }

    Ok(summary.is_success())
}

fn main() {
    match run() {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(error) => {
            eprintln!("error: {error}");
            std::process::exit(1);
        }
    }
}
