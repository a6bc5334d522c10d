//! FFmpeg-backed video tool
//!
//! Merges section segments with the concat demuxer and compresses clips with
//! libx264. Progress comes from `-progress pipe:1`; stderr is drained on a
//! helper thread and surfaced when the process fails.

use crate::edit::tool::VideoTool;
use crate::edit::types::{CompressQuality, JobControl, ToolError};
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::thread::{self, JoinHandle};

/// Keep this much of stderr when reporting a failure
const STDERR_TAIL: usize = 2000;

#[derive(Debug, Clone)]
pub struct FfmpegTool {
    ffmpeg: PathBuf,
    ffprobe: PathBuf,
    quality: CompressQuality,
}

impl Default for FfmpegTool {
    fn default() -> Self {
        Self {
            ffmpeg: PathBuf::from("ffmpeg"),
            ffprobe: PathBuf::from("ffprobe"),
            quality: CompressQuality::default(),
        }
    }
}

impl FfmpegTool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use binaries from explicit locations instead of `PATH`
    pub fn with_binaries(mut self, ffmpeg: impl Into<PathBuf>, ffprobe: impl Into<PathBuf>) -> Self {
        self.ffmpeg = ffmpeg.into();
        self.ffprobe = ffprobe.into();
        self
    }

    pub fn with_quality(mut self, quality: CompressQuality) -> Self {
        self.quality = quality;
        self
    }

    /// Duration of a media file in milliseconds, via ffprobe
    pub fn probe_duration_ms(&self, path: &Path) -> Result<u64, ToolError> {
        let output = Command::new(&self.ffprobe)
            .args(["-v", "error", "-show_entries", "format=duration", "-of", "csv=p=0"])
            .arg(path)
            .output()
            .map_err(|e| ToolError::Failed(format!("Failed to run ffprobe: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ToolError::Failed(format!("ffprobe failed: {}", stderr.trim())));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let seconds: f64 = stdout
            .trim()
            .parse()
            .map_err(|_| ToolError::Failed(format!("Unexpected ffprobe output: {}", stdout)))?;

        Ok((seconds * 1000.0).round().max(0.0) as u64)
    }

    fn total_duration_ms(&self, inputs: &[PathBuf]) -> u64 {
        inputs
            .iter()
            .map(|input| match self.probe_duration_ms(input) {
                Ok(ms) => ms,
                Err(e) => {
                    tracing::debug!("No duration for {:?}: {}", input, e);
                    0
                }
            })
            .sum()
    }

    fn run(
        &self,
        args: Vec<String>,
        total_ms: u64,
        control: &mut JobControl,
    ) -> Result<(), ToolError> {
        tracing::info!("Starting FFmpeg: {:?}", args);

        let mut child = Command::new(&self.ffmpeg)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| ToolError::Failed(format!("Failed to start FFmpeg: {}", e)))?;

        let stderr_reader = spawn_stderr_reader(&mut child);
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ToolError::Failed("Failed to capture FFmpeg stdout".to_string()))?;

        for line in BufReader::new(stdout).lines() {
            if control.is_cancelled() {
                kill_child(&mut child);
                let _ = collect_stderr(stderr_reader);
                return Err(ToolError::Cancelled);
            }

            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    tracing::warn!("Failed to read FFmpeg progress: {}", e);
                    break;
                }
            };

            if let Some(out_ms) = parse_progress_line(&line) {
                if total_ms > 0 {
                    control.report(out_ms as f64 / total_ms as f64);
                }
            } else if line.trim() == "progress=end" {
                control.report(1.0);
            }
        }

        let status = child.wait()?;
        let stderr = collect_stderr(stderr_reader);

        if control.is_cancelled() {
            return Err(ToolError::Cancelled);
        }

        if !status.success() {
            return Err(ToolError::Failed(format!(
                "FFmpeg exited with {}: {}",
                status,
                tail(&stderr, STDERR_TAIL)
            )));
        }

        Ok(())
    }
}

impl VideoTool for FfmpegTool {
    fn concat(
        &self,
        manifest: &Path,
        segments: &[PathBuf],
        output: &Path,
        control: &mut JobControl,
    ) -> Result<(), ToolError> {
        let total_ms = self.total_duration_ms(segments);
        self.run(concat_args(manifest, output), total_ms, control)
    }

    fn compress(
        &self,
        input: &Path,
        output: &Path,
        control: &mut JobControl,
    ) -> Result<(), ToolError> {
        let total_ms = self.total_duration_ms(&[input.to_path_buf()]);
        self.run(compress_args(input, output, self.quality), total_ms, control)
    }
}

/// Arguments for a stream-copy concat of the manifest's segments
pub fn concat_args(manifest: &Path, output: &Path) -> Vec<String> {
    vec![
        "-y".to_string(),
        "-hide_banner".to_string(),
        "-f".to_string(),
        "concat".to_string(),
        "-safe".to_string(),
        "0".to_string(),
        "-i".to_string(),
        manifest.to_string_lossy().into_owned(),
        "-c".to_string(),
        "copy".to_string(),
        "-progress".to_string(),
        "pipe:1".to_string(),
        "-nostats".to_string(),
        output.to_string_lossy().into_owned(),
    ]
}

/// Arguments for an H.264/AAC re-encode
pub fn compress_args(input: &Path, output: &Path, quality: CompressQuality) -> Vec<String> {
    vec![
        "-y".to_string(),
        "-hide_banner".to_string(),
        "-i".to_string(),
        input.to_string_lossy().into_owned(),
        "-c:v".to_string(),
        "libx264".to_string(),
        "-preset".to_string(),
        quality.h264_preset().to_string(),
        "-crf".to_string(),
        quality.crf().to_string(),
        "-pix_fmt".to_string(),
        "yuv420p".to_string(),
        "-c:a".to_string(),
        "aac".to_string(),
        "-b:a".to_string(),
        "128k".to_string(),
        "-movflags".to_string(),
        "+faststart".to_string(),
        "-progress".to_string(),
        "pipe:1".to_string(),
        "-nostats".to_string(),
        output.to_string_lossy().into_owned(),
    ]
}

/// Output position in milliseconds from one `-progress` line.
///
/// FFmpeg reports `out_time_us` and `out_time_ms`, both in microseconds.
pub fn parse_progress_line(line: &str) -> Option<u64> {
    let (key, value) = line.trim().split_once('=')?;
    match key {
        "out_time_us" | "out_time_ms" => value.trim().parse::<u64>().ok().map(|us| us / 1000),
        _ => None,
    }
}

fn spawn_stderr_reader(child: &mut Child) -> Option<JoinHandle<String>> {
    let mut stderr = child.stderr.take()?;
    Some(thread::spawn(move || {
        let mut buffer = String::new();
        let _ = stderr.read_to_string(&mut buffer);
        buffer
    }))
}

fn collect_stderr(reader: Option<JoinHandle<String>>) -> String {
    reader
        .and_then(|handle| handle.join().ok())
        .unwrap_or_default()
}

fn kill_child(child: &mut Child) {
    if let Err(e) = child.kill() {
        tracing::warn!("Failed to kill FFmpeg: {}", e);
    }
    let _ = child.wait();
}

fn tail(text: &str, max_chars: usize) -> &str {
    let trimmed = text.trim();
    let count = trimmed.chars().count();
    if count <= max_chars {
        return trimmed;
    }
    let skip = trimmed
        .char_indices()
        .nth(count - max_chars)
        .map(|(idx, _)| idx)
        .unwrap_or(0);
    &trimmed[skip..]
}
