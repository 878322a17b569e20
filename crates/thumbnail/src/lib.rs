mod error;
mod ffmpeg;

pub use error::ThumbnailError;
pub use ffmpeg::{FfmpegThumbnailer, ThumbnailConfig};

use async_trait::async_trait;
use bytes::Bytes;

/// A derived preview frame plus what the source turned out to be.
#[derive(Debug, Clone)]
pub struct ThumbnailOutput {
    /// JPEG bytes of the preview frame, bounded to the configured dimensions.
    pub data: Bytes,
    /// `true` if the source media decoded to more than one frame.
    pub is_animated: bool,
}

/// Derives a bounded still-frame preview from arbitrary uploaded media.
///
/// The default implementation shells out to ffmpeg; tests substitute stubs.
/// Failures are surfaced to the caller and never retried.
#[async_trait]
pub trait Thumbnailer: Send + Sync {
    /// Render a thumbnail from raw upload bytes.
    async fn render(&self, data: Bytes) -> Result<ThumbnailOutput, ThumbnailError>;
}
