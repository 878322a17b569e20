use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use serde::Deserialize;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, instrument, warn};

use crate::error::ThumbnailError;
use crate::{ThumbnailOutput, Thumbnailer};

fn default_ffmpeg_path() -> PathBuf {
    PathBuf::from("ffmpeg")
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_bound() -> u32 {
    500
}

/// Configuration for the ffmpeg thumbnail pipeline.
#[derive(Debug, Clone, Deserialize)]
pub struct ThumbnailConfig {
    /// Path to the ffmpeg binary.
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: PathBuf,

    /// Deadline for each ffmpeg invocation; the process is killed on expiry.
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Maximum thumbnail dimension on either axis.
    #[serde(default = "default_bound")]
    pub bound: u32,
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: default_ffmpeg_path(),
            timeout_seconds: default_timeout_seconds(),
            bound: default_bound(),
        }
    }
}

impl ThumbnailConfig {
    fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

struct ProcessOutput {
    status: std::process::ExitStatus,
    stdout: Vec<u8>,
    stderr: String,
}

/// [`Thumbnailer`] that shells out to ffmpeg.
///
/// Two passes per upload, both fed the raw bytes on stdin:
/// first-frame extraction to a bounded JPEG, then a two-frame decode to the
/// null muxer whose progress output reveals whether the source is animated.
/// The process lifetime is scoped to the call: spawned, fed, awaited, and
/// reaped (or killed at the deadline) before control returns.
#[derive(Debug)]
pub struct FfmpegThumbnailer {
    config: ThumbnailConfig,
}

impl FfmpegThumbnailer {
    /// Create a thumbnailer with the given configuration.
    pub fn new(config: ThumbnailConfig) -> Self {
        Self { config }
    }

    /// Arguments for the thumbnail pass: take the first frame, shrink it to
    /// fit the bound while preserving aspect ratio (`decrease` never
    /// upscales), emit MJPEG on stdout.
    fn thumbnail_args(bound: u32) -> Vec<String> {
        vec![
            "-i".into(),
            "pipe:0".into(),
            "-f".into(),
            "mjpeg".into(),
            "-frames:v".into(),
            "1".into(),
            "-vf".into(),
            format!("scale=w={bound}:h={bound}:force_original_aspect_ratio=decrease"),
            "pipe:1".into(),
        ]
    }

    /// Arguments for the animation probe: decode at most two frames of the
    /// first video stream into the null muxer. The final `frame=N` progress
    /// line on stderr tells us how many frames actually decoded.
    fn probe_args() -> Vec<String> {
        vec![
            "-i".into(),
            "pipe:0".into(),
            "-map".into(),
            "0:v:0".into(),
            "-frames:v".into(),
            "2".into(),
            "-f".into(),
            "null".into(),
            "-".into(),
        ]
    }

    async fn run(&self, args: &[String], input: Bytes) -> Result<ProcessOutput, ThumbnailError> {
        let command = self.config.ffmpeg_path.display().to_string();
        debug!(command = %command, ?args, "spawning transcoder");

        let mut child = Command::new(&self.config.ffmpeg_path)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ThumbnailError::Spawn {
                command: command.clone(),
                message: e.to_string(),
            })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| ThumbnailError::Io("transcoder stdin unavailable".into()))?;

        // Feed stdin from a separate task so a full pipe can't deadlock
        // against us reading stdout. EPIPE from an early exit is fine; the
        // exit status tells the real story.
        let writer = tokio::spawn(async move {
            let _ = stdin.write_all(&input).await;
            let _ = stdin.shutdown().await;
        });

        let waited = tokio::time::timeout(self.config.timeout(), child.wait_with_output()).await;
        writer.abort();

        match waited {
            Ok(Ok(output)) => Ok(ProcessOutput {
                status: output.status,
                stdout: output.stdout,
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            }),
            Ok(Err(e)) => Err(ThumbnailError::Io(e.to_string())),
            Err(_) => {
                // Dropping the wait future kills the child (kill_on_drop).
                warn!(command = %command, timeout = ?self.config.timeout(), "transcoder timed out");
                Err(ThumbnailError::Timeout(self.config.timeout()))
            }
        }
    }
}

/// Extract the frame count from ffmpeg's final `frame=N` progress line.
///
/// ffmpeg rewrites the progress line as it works; the last occurrence holds
/// the total. Returns `None` when no progress line is present (e.g. the run
/// failed before decoding anything).
fn parse_frame_count(stderr: &str) -> Option<u64> {
    let start = stderr.rfind("frame=")? + "frame=".len();
    let rest = stderr[start..].trim_start();
    let digits: String = rest.chars().take_while(char::is_ascii_digit).collect();
    digits.parse().ok()
}

/// Keep the tail of a stderr dump for error messages.
fn stderr_tail(stderr: &str) -> String {
    const TAIL: usize = 500;
    if stderr.len() <= TAIL {
        stderr.trim_end().to_owned()
    } else {
        let mut start = stderr.len() - TAIL;
        while !stderr.is_char_boundary(start) {
            start += 1;
        }
        stderr[start..].trim_end().to_owned()
    }
}

#[async_trait]
impl Thumbnailer for FfmpegThumbnailer {
    #[instrument(skip(self, data), fields(input_size = data.len()))]
    async fn render(&self, data: Bytes) -> Result<ThumbnailOutput, ThumbnailError> {
        let thumbnail = self
            .run(&Self::thumbnail_args(self.config.bound), data.clone())
            .await?;
        if !thumbnail.status.success() {
            return Err(ThumbnailError::Transcode(stderr_tail(&thumbnail.stderr)));
        }
        if thumbnail.stdout.is_empty() {
            return Err(ThumbnailError::Transcode(
                "transcoder produced no output".into(),
            ));
        }

        let probe = self.run(&Self::probe_args(), data).await?;
        if !probe.status.success() {
            return Err(ThumbnailError::Transcode(stderr_tail(&probe.stderr)));
        }
        let frames = parse_frame_count(&probe.stderr).unwrap_or(0);
        let is_animated = frames >= 2;
        debug!(frames, is_animated, "animation probe complete");

        Ok(ThumbnailOutput {
            data: Bytes::from(thumbnail.stdout),
            is_animated,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thumbnail_args_encode_the_bound() {
        let args = FfmpegThumbnailer::thumbnail_args(500);
        assert!(args.contains(&"scale=w=500:h=500:force_original_aspect_ratio=decrease".to_owned()));
        let frames_flag = args.iter().position(|a| a == "-frames:v").unwrap();
        assert_eq!(args[frames_flag + 1], "1");
        assert_eq!(args.first().map(String::as_str), Some("-i"));
        assert_eq!(args.last().map(String::as_str), Some("pipe:1"));
    }

    #[test]
    fn probe_args_decode_two_frames_to_null() {
        let args = FfmpegThumbnailer::probe_args();
        let frames_flag = args.iter().position(|a| a == "-frames:v").unwrap();
        assert_eq!(args[frames_flag + 1], "2");
        assert!(args.contains(&"null".to_owned()));
    }

    #[test]
    fn frame_count_takes_the_last_progress_line() {
        let stderr = "frame=    1 fps=0.0 q=2.0\rframe=    2 fps=1.9 q=2.0 Lsize=N/A";
        assert_eq!(parse_frame_count(stderr), Some(2));
    }

    #[test]
    fn frame_count_single_frame() {
        let stderr = "Output #0, null, to '-':\nframe=    1 fps=0.0 q=-0.0 Lsize=N/A time=00:00:00.04";
        assert_eq!(parse_frame_count(stderr), Some(1));
    }

    #[test]
    fn frame_count_absent_when_nothing_decoded() {
        assert_eq!(parse_frame_count("pipe:0: Invalid data found"), None);
        assert_eq!(parse_frame_count(""), None);
    }

    #[test]
    fn stderr_tail_keeps_short_output_intact() {
        assert_eq!(stderr_tail("boom\n"), "boom");
    }

    #[test]
    fn stderr_tail_truncates_long_output() {
        let long = "x".repeat(2000);
        assert_eq!(stderr_tail(&long).len(), 500);
    }

    #[tokio::test]
    async fn missing_binary_is_a_spawn_error() {
        let thumbnailer = FfmpegThumbnailer::new(ThumbnailConfig {
            ffmpeg_path: PathBuf::from("/nonexistent/ffmpeg"),
            ..ThumbnailConfig::default()
        });
        let result = thumbnailer.render(Bytes::from_static(b"data")).await;
        assert!(matches!(result, Err(ThumbnailError::Spawn { .. })));
    }

    #[tokio::test]
    async fn nonzero_exit_is_a_transcode_error() {
        // `false` ignores its arguments and exits 1, standing in for a
        // transcoder that rejects the input.
        let thumbnailer = FfmpegThumbnailer::new(ThumbnailConfig {
            ffmpeg_path: PathBuf::from("false"),
            ..ThumbnailConfig::default()
        });
        let result = thumbnailer.render(Bytes::from_static(b"data")).await;
        assert!(matches!(result, Err(ThumbnailError::Transcode(_))));
    }

    #[tokio::test]
    async fn hung_process_is_killed_at_the_deadline() {
        let thumbnailer = FfmpegThumbnailer::new(ThumbnailConfig {
            ffmpeg_path: PathBuf::from("sleep"),
            timeout_seconds: 1,
            ..ThumbnailConfig::default()
        });
        // Drive `run` directly so the argument list suits `sleep`.
        let result = thumbnailer
            .run(&["5".to_owned()], Bytes::new())
            .await;
        assert!(matches!(result, Err(ThumbnailError::Timeout(_))));
    }
}
