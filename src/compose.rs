use image::{imageops, DynamicImage, GrayImage, Luma, Rgba, RgbaImage};
use imageproc::morphology::{grayscale_dilate, Mask};

use crate::{errors::Result, traits::FrameProcessor};

/// Outline parameters for the outline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutlineSettings {
    pub width: u32,
    pub color: Rgba<u8>,
}

impl OutlineSettings {
    pub const fn new(width: u32, color: Rgba<u8>) -> Self {
        Self { width, color }
    }
}

impl Default for OutlineSettings {
    fn default() -> Self {
        Self::new(10, Rgba([220, 20, 60, 255]))
    }
}

/// Replaces the alpha channel of `image` with `mask`, channel for channel.
///
/// RGB values pass through untouched even where the new alpha is 0; nothing
/// is premultiplied.
///
/// # Panics
///
/// Panics when the dimensions differ. Masks are always derived from the image
/// they are applied to, so a mismatch is a bug, not an input error.
pub fn apply_mask(image: &RgbaImage, mask: &GrayImage) -> RgbaImage {
    assert_eq!(
        image.dimensions(),
        mask.dimensions(),
        "image and mask dimensions do not match"
    );
    RgbaImage::from_fn(image.width(), image.height(), |x, y| {
        let Rgba([r, g, b, _]) = *image.get_pixel(x, y);
        let Luma([alpha]) = *mask.get_pixel(x, y);
        Rgba([r, g, b, alpha])
    })
}

/// Draws a solid `color` border of thickness `width` around the opaque
/// silhouette of `image`, behind the artwork.
///
/// The silhouette is grown by running a 3x3 maximum filter over the alpha
/// channel once per ring, `width` times in sequence. Iterating the small
/// filter is deliberate: it grows corners octagonally, and collapsing the
/// passes into one large kernel would square them off. The ring between the
/// grown and the original alpha becomes the border's alpha, replacing
/// whatever alpha component `color` carries. `width == 0` returns the input
/// unchanged.
pub fn apply_outline(image: &RgbaImage, width: u32, color: Rgba<u8>) -> RgbaImage {
    if width == 0 {
        return image.clone();
    }

    let (w, h) = image.dimensions();
    let alpha = GrayImage::from_fn(w, h, |x, y| Luma([image.get_pixel(x, y).0[3]]));

    let mut grown = alpha.clone();
    for _ in 0..width {
        grown = grayscale_dilate(&grown, &Mask::square(1));
    }

    let Rgba([r, g, b, _]) = color;
    let border = RgbaImage::from_fn(w, h, |x, y| {
        let ring = grown.get_pixel(x, y).0[0].saturating_sub(alpha.get_pixel(x, y).0[0]);
        Rgba([r, g, b, ring])
    });

    let mut canvas = RgbaImage::new(w, h);
    imageops::overlay(&mut canvas, &border, 0, 0);
    imageops::overlay(&mut canvas, image, 0, 0);
    canvas
}

/// Outlines every frame of a batch with fixed settings.
pub struct Outliner {
    settings: OutlineSettings,
}

impl Outliner {
    pub const fn new(settings: OutlineSettings) -> Self {
        Self { settings }
    }
}

impl FrameProcessor for Outliner {
    fn name(&self) -> &'static str {
        "outline"
    }

    fn process_frame(&self, frame: &DynamicImage) -> Result<RgbaImage> {
        Ok(apply_outline(
            &frame.to_rgba8(),
            self.settings.width,
            self.settings.color,
        ))
    }
}
