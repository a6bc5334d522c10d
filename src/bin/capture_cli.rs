use anyhow::{bail, Context, Result};
use capture_session::edit::{CompressQuality, EditCoordinator, FfmpegTool, JobOutcome};
use capture_session::session::{EventSink, SessionEvent};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "capture-cli")]
#[command(about = "Merge section recordings and compress clips with FFmpeg")]
#[command(version)]
struct Cli {
    /// FFmpeg binary to use
    #[arg(long, global = true, default_value = "ffmpeg")]
    ffmpeg: PathBuf,

    /// FFprobe binary to use
    #[arg(long, global = true, default_value = "ffprobe")]
    ffprobe: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Concatenate segments into one video
    Merge {
        /// Merged output file
        #[arg(short, long)]
        output: PathBuf,

        /// Concat manifest (default: next to the output)
        #[arg(short, long)]
        manifest: Option<PathBuf>,

        /// Segments, in order
        #[arg(required = true)]
        segments: Vec<PathBuf>,
    },

    /// Re-encode a clip
    Compress {
        #[arg(short, long)]
        input: PathBuf,

        #[arg(short, long)]
        output: PathBuf,

        #[arg(short, long, value_enum, default_value = "medium")]
        quality: Quality,
    },

    /// Print a clip's duration in milliseconds
    Probe { input: PathBuf },
}

#[derive(Clone, Copy, ValueEnum)]
enum Quality {
    Low,
    Medium,
    High,
}

impl From<Quality> for CompressQuality {
    fn from(quality: Quality) -> Self {
        match quality {
            Quality::Low => CompressQuality::Low,
            Quality::Medium => CompressQuality::Medium,
            Quality::High => CompressQuality::High,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    capture_session::init_logging();

    let cli = Cli::parse();
    let tool = FfmpegTool::new().with_binaries(&cli.ffmpeg, &cli.ffprobe);

    match cli.command {
        Commands::Merge {
            output,
            manifest,
            segments,
        } => {
            let manifest = manifest.unwrap_or_else(|| output.with_extension("txt"));
            let (events, mut rx) = EventSink::channel();
            let coordinator = EditCoordinator::new(Arc::new(tool), events);
            let ticket = coordinator
                .merge(&output, &segments, &manifest)
                .context("Failed to start merge")?;
            tokio::spawn(async move {
                while let Some(event) = rx.recv().await {
                    print_event(&event);
                }
            });
            finish(ticket.finished().await)
        }
        Commands::Compress {
            input,
            output,
            quality,
        } => {
            let tool = tool.with_quality(quality.into());
            let (events, mut rx) = EventSink::channel();
            let coordinator = EditCoordinator::new(Arc::new(tool), events);
            let ticket = coordinator
                .compress(&input, &output)
                .context("Failed to start compression")?;
            tokio::spawn(async move {
                while let Some(event) = rx.recv().await {
                    print_event(&event);
                }
            });
            finish(ticket.finished().await)
        }
        Commands::Probe { input } => {
            let duration = tokio::task::spawn_blocking(move || tool.probe_duration_ms(&input))
                .await
                .context("Probe task failed")??;
            println!("{duration}");
            Ok(())
        }
    }
}

fn print_event(event: &SessionEvent) {
    match event {
        SessionEvent::MergeProgress { percent } | SessionEvent::CompressProgress { percent } => {
            println!("progress {percent}%");
        }
        _ => {}
    }
}

fn finish(outcome: JobOutcome) -> Result<()> {
    match outcome {
        JobOutcome::Finished(path) => {
            println!("progress 100%");
            println!("{}", path.display());
            Ok(())
        }
        JobOutcome::Cancelled => bail!("Job was cancelled"),
        JobOutcome::Failed(message) => bail!("Job failed: {message}"),
    }
}
