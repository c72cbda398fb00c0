use std::{path::PathBuf, sync::Arc};

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use framesplit::{
    CancellationToken, ExtractError, ExtractOptions, ExtractionPipeline, ExtractionReport,
    FfmpegLogLevel, ProgressCallback, ProgressEvent, VideoFile, VideoSource,
};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;

const CLI_AFTER_HELP: &str = "Examples:\n  framesplit extract input.mp4 --out frames --progress\n  framesplit extract input.avi --out frames --json\n  framesplit probe input.mp4\n  framesplit completions zsh > _framesplit";

#[derive(Debug, Parser)]
#[command(
    name = "framesplit",
    version,
    about = "Save every frame of a video as a PNG image",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOptions,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Parser, Clone, Default)]
struct GlobalOptions {
    /// Show debug logging (overridden by RUST_LOG).
    #[arg(long, global = true)]
    verbose: bool,

    /// FFmpeg log level (quiet, error, warning, info, debug).
    #[arg(long, global = true)]
    ffmpeg_log_level: Option<String>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Extract every frame into an output directory.
    #[command(
        about = "Extract all frames as PNG",
        after_help = "Examples:\n  framesplit extract input.mp4 --out frames --progress"
    )]
    Extract {
        /// Video file to split.
        input: PathBuf,
        /// Directory receiving frame_0000.png, frame_0001.png, ...
        #[arg(long)]
        out: PathBuf,
        /// Show a progress bar.
        #[arg(long)]
        progress: bool,
        /// Print the final report as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Print frame count, dimensions and codec of a video.
    #[command(about = "Print video information", visible_alias = "info")]
    Probe {
        /// Video file to inspect.
        input: PathBuf,
        /// Output as machine-readable JSON.
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completion scripts.
    #[command(about = "Generate shell completions")]
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Mirrors intermediate progress events onto an `indicatif` bar.
struct TerminalProgress {
    bar: ProgressBar,
}

impl TerminalProgress {
    fn new() -> Result<Self, Box<dyn std::error::Error>> {
        let bar = ProgressBar::new(0);
        let style =
            ProgressStyle::with_template("{spinner:.green} {bar:40.cyan/blue} {pos}/{len} {msg}")?;
        bar.set_style(style.progress_chars("##-"));
        Ok(Self { bar })
    }
}

impl ProgressCallback for TerminalProgress {
    fn on_progress(&self, event: &ProgressEvent) {
        self.bar.set_length(event.total.max(event.processed));
        self.bar.set_position(event.processed);
        self.bar
            .set_message(format!("Processing: {}/{} frames", event.processed, event.total));
    }

    fn on_summary(&self, report: &ExtractionReport) {
        self.bar.finish_with_message(format!(
            "Done! Processed {} frames",
            report.frames_processed
        ));
    }
}

fn init_logging(global: &GlobalOptions) -> Result<(), Box<dyn std::error::Error>> {
    let default_level = if global.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    if let Some(level) = &global.ffmpeg_log_level {
        let parsed = FfmpegLogLevel::parse(level)
            .ok_or(format!("unsupported --ffmpeg-log-level: {level}"))?;
        framesplit::set_ffmpeg_log_level(parsed);
    }

    Ok(())
}

fn report_json(report: &ExtractionReport) -> serde_json::Value {
    json!({
        "frames_processed": report.frames_processed,
        "frames_expected": report.frames_expected,
        "frames_written": report.frames_written(),
        "output_dir": report.output_dir.display().to_string(),
        "cancelled": report.cancelled,
        "elapsed_seconds": report.elapsed.as_secs_f64(),
        "failures": report.failures.iter().map(|failure| json!({
            "frame_index": failure.frame_index,
            "path": failure.path.display().to_string(),
            "kind": format!("{:?}", failure.error.kind()),
            "message": failure.error.to_string(),
        })).collect::<Vec<_>>(),
    })
}

fn print_report(report: &ExtractionReport) {
    for failure in &report.failures {
        eprintln!(
            "{} {}",
            "warning:".yellow().bold(),
            failure.error.to_string().yellow()
        );
    }
    if let Some(hint) = report
        .failures
        .last()
        .and_then(|failure| failure.error.remediation())
    {
        eprintln!("{} {hint}", "hint:".cyan().bold());
    }
    if report.cancelled {
        eprintln!(
            "{} {}",
            "warning:".yellow().bold(),
            "extraction was cancelled".yellow()
        );
    }

    let summary = format!(
        "Extracted {}/{} frame(s) to {}",
        report.frames_written(),
        report.frames_expected,
        report.output_dir.display(),
    );
    if report.is_complete() {
        println!("{} {}", "success:".green().bold(), summary.green());
    } else {
        println!(
            "{} {} ({} processed)",
            "done:".yellow().bold(),
            summary,
            report.frames_processed
        );
    }
}

fn extract(
    input: PathBuf,
    out: PathBuf,
    progress: bool,
    json_output: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let token = CancellationToken::new();
    let handler_token = token.clone();
    ctrlc::set_handler(move || {
        eprintln!("\nInterrupted, stopping after the current frame...");
        handler_token.cancel();
    })?;

    let mut options = ExtractOptions::new().with_cancellation(token);
    if progress {
        options = options.with_progress(Arc::new(TerminalProgress::new()?));
    }

    let mut pipeline = ExtractionPipeline::new(options);
    let report = pipeline.run(&input, &out)?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&report_json(&report))?);
    } else {
        print_report(&report);
    }

    Ok(())
}

fn probe(input: PathBuf, json_output: bool) -> Result<(), Box<dyn std::error::Error>> {
    if !input.is_file() {
        return Err(ExtractError::MissingSource { path: input }.into());
    }

    let mut video = VideoFile::open(&input)?;
    let info = video.info().clone();
    video.close();

    if json_output {
        let payload = json!({
            "total_frames": info.total_frames,
            "width": info.width,
            "height": info.height,
            "fps": info.frames_per_second,
            "codec": info.codec,
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        println!("Frames: {}", info.total_frames);
        println!(
            "Video: {}x{} @ {:.2} fps [{}]",
            info.width, info.height, info.frames_per_second, info.codec
        );
    }

    Ok(())
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(&cli.global)?;

    match cli.command {
        Commands::Extract {
            input,
            out,
            progress,
            json,
        } => extract(input, out, progress, json),
        Commands::Probe { input, json } => probe(input, json),
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "framesplit", &mut std::io::stdout());
            Ok(())
        }
    }
}

fn main() {
    if let Err(error) = run() {
        eprintln!("{} {error}", "error:".red().bold());
        if let Some(hint) = error
            .downcast_ref::<ExtractError>()
            .and_then(|error| error.remediation())
        {
            // The container message already carries its own advice.
            if !error.to_string().contains(hint) {
                eprintln!("{} {hint}", "hint:".cyan().bold());
            }
        }
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::time::Duration;

    use framesplit::{ExtractError, ExtractionReport, FrameFailure};

    use super::report_json;

    #[test]
    fn json_report_lists_failures() {
        let report = ExtractionReport {
            frames_processed: 3,
            frames_expected: 3,
            failures: vec![FrameFailure {
                frame_index: 1,
                path: PathBuf::from("out/frame_0001.png"),
                error: ExtractError::FrameWriteFailed {
                    frame_index: 1,
                    path: PathBuf::from("out/frame_0001.png"),
                    reason: "disk full".to_string(),
                },
            }],
            output_dir: PathBuf::from("out"),
            cancelled: false,
            elapsed: Duration::from_secs(1),
        };

        let value = report_json(&report);
        assert_eq!(value["frames_written"], 2);
        assert_eq!(value["failures"][0]["frame_index"], 1);
        assert_eq!(value["failures"][0]["kind"], "FrameWriteFailed");
    }
}
