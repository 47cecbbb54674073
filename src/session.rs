use std::path::{Path, PathBuf};

use image::{Rgb, Rgba, RgbaImage};

use crate::{
    batch::{collect_frames, FRAME_EXTENSIONS},
    errors::{FramekitError, Result},
    keying::{key_frame, KeyerSettings},
};

/// Where the session is in the pick, tune, preview loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No frame loaded yet.
    Idle,
    /// A frame is loaded and shown unmodified.
    Loaded,
    /// The keyed preview is shown and tracks parameter changes.
    Previewing,
}

/// A parameter change forwarded from the embedding surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Adjustment {
    Target(Rgb<u8>),
    Tolerance(u32),
    EdgeSmooth(f32),
    Erosion(u32),
}

/// UI-agnostic controller for the interactive keying workflow.
///
/// A surface forwards its pick, adjust, and toggle events here and renders
/// whatever [`view`](Self::view) returns. The session owns the only mutable
/// [`KeyerSettings`]; a batch run takes a [`snapshot`](Self::snapshot) at
/// start and later edits never reach it.
pub struct KeySession {
    settings: KeyerSettings,
    frame: Option<RgbaImage>,
    source: Option<PathBuf>,
    preview: Option<RgbaImage>,
}

impl KeySession {
    pub const fn new(settings: KeyerSettings) -> Self {
        Self {
            settings,
            frame: None,
            source: None,
            preview: None,
        }
    }

    pub fn state(&self) -> SessionState {
        match (&self.frame, &self.preview) {
            (None, _) => SessionState::Idle,
            (Some(_), None) => SessionState::Loaded,
            (Some(_), Some(_)) => SessionState::Previewing,
        }
    }

    pub const fn settings(&self) -> &KeyerSettings {
        &self.settings
    }

    /// Copy of the current parameters for a batch run to keep.
    pub const fn snapshot(&self) -> KeyerSettings {
        self.settings
    }

    /// Path of the loaded frame, if any.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// What the surface should render right now.
    pub fn view(&self) -> Option<&RgbaImage> {
        self.preview.as_ref().or(self.frame.as_ref())
    }

    /// Loads a sample frame, forcing RGBA. Any active preview is discarded;
    /// on failure the previous frame stays in place.
    pub fn load_frame(&mut self, path: &Path) -> Result<()> {
        let frame = image::open(path).map_err(|source| FramekitError::Image {
            path: path.to_path_buf(),
            operation: "load frame".to_string(),
            source,
        })?;
        self.frame = Some(frame.to_rgba8());
        self.source = Some(path.to_path_buf());
        self.preview = None;
        Ok(())
    }

    /// Loads the lexicographically first recognized frame of `dir`, the way
    /// a fresh session picks its sample.
    pub fn load_first_frame(&mut self, dir: &Path) -> Result<PathBuf> {
        let frames = collect_frames(dir, FRAME_EXTENSIONS)?;
        let first = frames
            .into_iter()
            .next()
            .ok_or_else(|| FramekitError::NoFrames {
                path: dir.to_path_buf(),
            })?;
        self.load_frame(&first)?;
        Ok(first)
    }

    /// Reads the key color from the loaded frame at `(x, y)`.
    ///
    /// Picking only answers while the unmodified frame is visible; while
    /// previewing, or out of bounds, nothing changes and `None` is returned.
    pub fn pick_color(&mut self, x: u32, y: u32) -> Option<Rgb<u8>> {
        if self.state() != SessionState::Loaded {
            return None;
        }
        let frame = self.frame.as_ref()?;
        if x >= frame.width() || y >= frame.height() {
            return None;
        }
        let Rgba([r, g, b, _]) = *frame.get_pixel(x, y);
        let picked = Rgb([r, g, b]);
        self.settings.target = picked;
        Some(picked)
    }

    /// Applies a parameter change in any state. While previewing, the
    /// preview is recomputed immediately; otherwise the new value simply
    /// waits for the next preview or batch.
    pub fn adjust(&mut self, change: Adjustment) {
        match change {
            Adjustment::Target(color) => self.settings.target = color,
            Adjustment::Tolerance(value) => self.settings.tolerance = value,
            Adjustment::EdgeSmooth(value) => self.settings.edge_smooth = value,
            Adjustment::Erosion(value) => self.settings.erosion = value,
        }
        if self.state() == SessionState::Previewing {
            self.render_preview();
        }
    }

    /// Switches between the original frame and the keyed preview, returning
    /// the new state. Does nothing while no frame is loaded.
    pub fn toggle_preview(&mut self) -> SessionState {
        match self.state() {
            SessionState::Idle => {}
            SessionState::Loaded => self.render_preview(),
            SessionState::Previewing => self.preview = None,
        }
        self.state()
    }

    fn render_preview(&mut self) {
        if let Some(frame) = &self.frame {
            self.preview = Some(key_frame(frame, &self.settings));
        }
    }
}

impl Default for KeySession {
    fn default() -> Self {
        Self::new(KeyerSettings::default())
    }
}
