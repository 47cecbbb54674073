use image::{DynamicImage, GrayImage, Luma, Rgb, Rgba, RgbaImage};
use imageproc::{
    filter::gaussian_blur_f32,
    morphology::{grayscale_erode, Mask},
};

use crate::{compose::apply_mask, errors::Result, traits::FrameProcessor};

/// Chroma-key parameters tuned in the interactive session and snapshotted by
/// batch runs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeyerSettings {
    /// Color treated as background.
    pub target: Rgb<u8>,
    /// Euclidean RGB distance up to which a pixel still counts as background.
    pub tolerance: u32,
    /// Gaussian standard deviation applied to the mask edge. `0.0` disables.
    pub edge_smooth: f32,
    /// Radius of the square minimum filter shrinking the silhouette. `0` disables.
    pub erosion: u32,
}

impl KeyerSettings {
    pub const fn new(target: Rgb<u8>, tolerance: u32, edge_smooth: f32, erosion: u32) -> Self {
        Self {
            target,
            tolerance,
            edge_smooth,
            erosion,
        }
    }
}

impl Default for KeyerSettings {
    fn default() -> Self {
        Self::new(Rgb([0, 255, 0]), 50, 1.0, 0)
    }
}

/// Builds a foreground mask by thresholding the Euclidean RGB distance to
/// `target`.
///
/// A pixel maps to 255 (foreground) only when its distance is strictly
/// greater than `tolerance`; a pixel exactly at the tolerance stays
/// background. Alpha is ignored. The comparison runs on squared distances,
/// which is exact for non-negative integers.
pub fn compute_mask(image: &RgbaImage, target: Rgb<u8>, tolerance: u32) -> GrayImage {
    let Rgb([tr, tg, tb]) = target;
    let limit = u64::from(tolerance) * u64::from(tolerance);
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        let Rgba([r, g, b, _]) = *image.get_pixel(x, y);
        let dr = i32::from(r) - i32::from(tr);
        let dg = i32::from(g) - i32::from(tg);
        let db = i32::from(b) - i32::from(tb);
        let distance_sq = (dr * dr + dg * dg + db * db) as u64;
        if distance_sq > limit {
            Luma([255])
        } else {
            Luma([0])
        }
    })
}

/// Refines a raw mask: erosion first, edge smoothing second.
///
/// Erosion is a minimum filter over a square of side `2 * erosion + 1`,
/// trimming halos of residual background color at the silhouette edge.
/// Smoothing is a Gaussian blur with standard deviation `edge_smooth`,
/// turning the hard threshold into a graduated alpha ramp. The order is
/// fixed; blurring before eroding would re-harden the edge. `(0, 0.0)`
/// returns the mask unchanged.
pub fn refine_mask(mask: &GrayImage, erosion: u32, edge_smooth: f32) -> GrayImage {
    let mut refined = if erosion > 0 {
        let radius = u8::try_from(erosion).unwrap_or(u8::MAX);
        grayscale_erode(mask, &Mask::square(radius))
    } else {
        mask.clone()
    };
    if edge_smooth > 0.0 {
        refined = gaussian_blur_f32(&refined, edge_smooth);
    }
    refined
}

/// Full keying transform: compute the mask, refine it, apply it as alpha.
pub fn key_frame(image: &RgbaImage, settings: &KeyerSettings) -> RgbaImage {
    let mask = compute_mask(image, settings.target, settings.tolerance);
    let mask = refine_mask(&mask, settings.erosion, settings.edge_smooth);
    apply_mask(image, &mask)
}

/// Keys every frame of a batch with a fixed settings snapshot.
pub struct ChromaKeyer {
    settings: KeyerSettings,
}

impl ChromaKeyer {
    pub const fn new(settings: KeyerSettings) -> Self {
        Self { settings }
    }

    pub const fn settings(&self) -> &KeyerSettings {
        &self.settings
    }
}

impl FrameProcessor for ChromaKeyer {
    fn name(&self) -> &'static str {
        "chroma key"
    }

    fn process_frame(&self, frame: &DynamicImage) -> Result<RgbaImage> {
        Ok(key_frame(&frame.to_rgba8(), &self.settings))
    }
}
