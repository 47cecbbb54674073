use std::path::PathBuf;

use clap::{Parser, Subcommand};
use image::{Rgb, Rgba};

/// Conventional stage layout, used as argument defaults only; every
/// component receives its directories explicitly.
pub mod stage {
    pub const RAW_FRAMES: &str = "input/raw_frames";
    pub const CUTOUT_FRAMES: &str = "output/no_bg_frames";
    pub const OUTLINED_FRAMES: &str = "output/outlined_frames";
    pub const PACKAGES: &str = "output/package";
}

#[derive(Parser)]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Remove backgrounds with the external AI tool
    RemoveBg {
        #[arg(long, default_value = stage::RAW_FRAMES)]
        source: PathBuf,

        #[arg(long, default_value = stage::CUTOUT_FRAMES)]
        dest: PathBuf,

        /// Removal command, fed PNG on stdin, read from stdout
        #[arg(long, default_value = "rembg i")]
        command: String,
    },

    /// Key out a background color across all raw frames
    Key {
        #[arg(long, default_value = stage::RAW_FRAMES)]
        source: PathBuf,

        #[arg(long, default_value = stage::CUTOUT_FRAMES)]
        dest: PathBuf,

        /// Background color as R,G,B
        #[arg(long, default_value = "0,255,0", value_parser = parse_rgb)]
        color: Rgb<u8>,

        /// Color distance up to which a pixel still counts as background
        #[arg(long, default_value_t = 50)]
        tolerance: u32,

        /// Gaussian edge smoothing, 0 disables
        #[arg(long, default_value_t = 1.0)]
        smooth: f32,

        /// Erosion radius in pixels, 0 disables
        #[arg(long, default_value_t = 0)]
        erosion: u32,
    },

    /// Draw an outline around each transparent cutout
    Outline {
        #[arg(long, default_value = stage::CUTOUT_FRAMES)]
        source: PathBuf,

        #[arg(long, default_value = stage::OUTLINED_FRAMES)]
        dest: PathBuf,

        /// Outline thickness in pixels
        #[arg(long, default_value_t = 10)]
        width: u32,

        /// Outline color as R,G,B
        #[arg(long, default_value = "220,20,60", value_parser = parse_outline_color)]
        color: Rgba<u8>,
    },

    /// Pack outlined frames into a zip archive
    Pack {
        /// Archive file name, e.g. walkcycle.bfk
        name: String,

        #[arg(long, default_value = stage::OUTLINED_FRAMES)]
        source: PathBuf,

        #[arg(long, default_value = stage::PACKAGES)]
        dest: PathBuf,
    },

    /// Empty the stage directories, keeping the directories themselves
    Clean {
        #[arg(
            long = "dir",
            default_values = [stage::RAW_FRAMES, stage::CUTOUT_FRAMES, stage::OUTLINED_FRAMES]
        )]
        dirs: Vec<PathBuf>,
    },
}

fn parse_rgb(s: &str) -> Result<Rgb<u8>, String> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    if parts.len() != 3 {
        return Err(format!("expected R,G,B, got {s:?}"));
    }
    let mut channels = [0_u8; 3];
    for (slot, part) in channels.iter_mut().zip(&parts) {
        *slot = part
            .parse()
            .map_err(|_| format!("invalid channel value {part:?}"))?;
    }
    Ok(Rgb(channels))
}

fn parse_outline_color(s: &str) -> Result<Rgba<u8>, String> {
    let Rgb([r, g, b]) = parse_rgb(s)?;
    Ok(Rgba([r, g, b, 255]))
}
