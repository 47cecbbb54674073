use image::{DynamicImage, RgbaImage};

use crate::errors::Result;

/// Per-frame transformation applied by a batch run.
///
/// Implementations are shared read-only across worker threads; a failure for
/// one frame is recorded by the runner and never stops the run.
pub trait FrameProcessor: Send + Sync {
    /// Stage name used in logs and progress output.
    fn name(&self) -> &'static str;

    /// Transforms a decoded frame into its RGBA output.
    fn process_frame(&self, frame: &DynamicImage) -> Result<RgbaImage>;
}
