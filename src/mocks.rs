use std::{thread, time::Duration};

use image::{DynamicImage, RgbaImage};

use crate::{
    errors::{FramekitError, Result},
    traits::FrameProcessor,
};

/// Stand-in for the external background-removal collaborator: returns the
/// frame unchanged, forced to RGBA.
#[derive(Debug, Clone, Default)]
pub struct MockRemover;

impl MockRemover {
    pub const fn new() -> Self {
        Self
    }
}

impl FrameProcessor for MockRemover {
    fn name(&self) -> &'static str {
        "mock removal"
    }

    fn process_frame(&self, frame: &DynamicImage) -> Result<RgbaImage> {
        Ok(frame.to_rgba8())
    }
}

/// Passthrough that sleeps per frame, long enough to observe a run while it
/// is still in flight.
#[derive(Debug, Clone)]
pub struct SlowRemover {
    pub delay: Duration,
}

impl SlowRemover {
    pub const fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl FrameProcessor for SlowRemover {
    fn name(&self) -> &'static str {
        "slow mock removal"
    }

    fn process_frame(&self, frame: &DynamicImage) -> Result<RgbaImage> {
        thread::sleep(self.delay);
        Ok(frame.to_rgba8())
    }
}

/// Fails every frame, for exercising total-failure reporting.
#[derive(Debug, Clone, Default)]
pub struct FailingRemover;

impl FailingRemover {
    pub const fn new() -> Self {
        Self
    }
}

impl FrameProcessor for FailingRemover {
    fn name(&self) -> &'static str {
        "failing mock removal"
    }

    fn process_frame(&self, _frame: &DynamicImage) -> Result<RgbaImage> {
        Err(FramekitError::Removal {
            program: "mock".to_string(),
            detail: "refuses every frame".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::GenericImageView;

    #[test]
    fn test_mock_remover_passes_the_frame_through() -> Result<()> {
        let frame = DynamicImage::new_rgb8(4, 2);
        let cutout = MockRemover::new().process_frame(&frame)?;
        assert_eq!(cutout.dimensions(), frame.dimensions());
        Ok(())
    }

    #[test]
    fn test_failing_remover_always_errors() {
        let error = FailingRemover::new()
            .process_frame(&DynamicImage::new_rgb8(1, 1))
            .unwrap_err();
        assert!(matches!(error, FramekitError::Removal { .. }));
    }
}
