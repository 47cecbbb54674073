use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
    sync::{
        mpsc::{self, Receiver},
        Arc,
    },
    thread::{self, JoinHandle},
};

use parking_lot::Mutex;
use rayon::prelude::*;
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::{
    errors::{FramekitError, Result},
    traits::FrameProcessor,
};

/// Extensions recognized when enumerating raw frames.
pub const FRAME_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp", "bmp"];

/// Extension set for stages whose inputs are earlier pipeline products.
pub const PNG_ONLY: &[&str] = &["png"];

fn has_recognized_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension().map_or(false, |ext| {
        let ext = ext.to_string_lossy().to_lowercase();
        extensions.iter().any(|candidate| *candidate == ext)
    })
}

/// Enumerates the recognized frames of `dir`, top level only, sorted by
/// filename so every run sees the same order.
///
/// Errors when `dir` does not exist or holds no recognized frame.
pub fn collect_frames(dir: &Path, extensions: &[&str]) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(FramekitError::MissingSourceDir {
            path: dir.to_path_buf(),
        });
    }

    let frames: Vec<PathBuf> = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(walkdir::DirEntry::into_path)
        .filter(|path| has_recognized_extension(path, extensions))
        .collect();

    if frames.is_empty() {
        return Err(FramekitError::NoFrames {
            path: dir.to_path_buf(),
        });
    }
    Ok(frames)
}

/// How a single frame fared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameStatus {
    /// Output written to the contained path.
    Written(PathBuf),
    /// Output already existed and was left untouched.
    Skipped(PathBuf),
    /// Processing failed with the recorded reason; the run went on.
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameOutcome {
    pub source: PathBuf,
    pub status: FrameStatus,
}

/// Per-frame outcomes of a finished run, in enumeration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchReport {
    outcomes: Vec<FrameOutcome>,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn written(&self) -> usize {
        self.count(|status| matches!(status, FrameStatus::Written(_)))
    }

    pub fn skipped(&self) -> usize {
        self.count(|status| matches!(status, FrameStatus::Skipped(_)))
    }

    pub fn failed(&self) -> usize {
        self.count(|status| matches!(status, FrameStatus::Failed(_)))
    }

    /// The recorded failures as `(source, reason)` pairs.
    pub fn failures(&self) -> impl Iterator<Item = (&Path, &str)> {
        self.outcomes
            .iter()
            .filter_map(|outcome| match &outcome.status {
                FrameStatus::Failed(reason) => Some((outcome.source.as_path(), reason.as_str())),
                _ => None,
            })
    }

    pub fn outcomes(&self) -> &[FrameOutcome] {
        &self.outcomes
    }

    fn count(&self, matcher: impl Fn(&FrameStatus) -> bool) -> usize {
        self.outcomes
            .iter()
            .filter(|outcome| matcher(&outcome.status))
            .count()
    }
}

/// One directory-to-directory run of a processor over every recognized frame.
///
/// Frames are decoded, transformed, and written as `<stem>.png` in parallel.
/// A per-frame failure is recorded and never aborts the run; an output that
/// already exists is skipped untouched, so re-running is idempotent. Sources
/// sharing a stem collide on one output file; the first in enumeration order
/// writes it and the rest are skipped.
pub struct FrameBatch<P: FrameProcessor> {
    processor: P,
    source: PathBuf,
    dest: PathBuf,
    extensions: &'static [&'static str],
}

impl<P: FrameProcessor> FrameBatch<P> {
    pub fn new(processor: P, source: impl Into<PathBuf>, dest: impl Into<PathBuf>) -> Self {
        Self {
            processor,
            source: source.into(),
            dest: dest.into(),
            extensions: FRAME_EXTENSIONS,
        }
    }

    /// Restricts enumeration to `extensions`, for stages whose inputs are
    /// pipeline products rather than raw frames.
    pub fn with_extensions(mut self, extensions: &'static [&'static str]) -> Self {
        self.extensions = extensions;
        self
    }

    /// Runs to completion without progress reporting.
    pub fn run(&self) -> Result<BatchReport> {
        self.run_with(|_, _| {})
    }

    /// Runs to completion, invoking `progress` with `(completed, total)`
    /// after every frame. Pairs arrive in strictly increasing order even
    /// though frames are processed in parallel.
    pub fn run_with<F>(&self, progress: F) -> Result<BatchReport>
    where
        F: Fn(usize, usize) + Send + Sync,
    {
        let frames = self.plan()?;
        Ok(self.process_frames(&frames, &progress))
    }

    /// Validates the input set and prepares the output directory. Input
    /// errors surface here, before any work starts.
    fn plan(&self) -> Result<Vec<PathBuf>> {
        let frames = collect_frames(&self.source, self.extensions)?;
        fs::create_dir_all(&self.dest).map_err(|source| FramekitError::FileSystem {
            path: self.dest.clone(),
            operation: "create output directory".to_string(),
            source,
        })?;
        info!(
            stage = self.processor.name(),
            source = %self.source.display(),
            frames = frames.len(),
            "starting batch"
        );
        Ok(frames)
    }

    fn process_frames<F>(&self, frames: &[PathBuf], progress: &F) -> BatchReport
    where
        F: Fn(usize, usize) + Send + Sync,
    {
        let total = frames.len();
        let completed = Mutex::new(0_usize);
        // which frame owns each output is settled up front, so colliding
        // stems never race on the file
        let mut claimed = HashSet::new();
        let claims: Vec<bool> = frames
            .iter()
            .map(|path| claimed.insert(self.output_path(path)))
            .collect();
        let outcomes = frames
            .par_iter()
            .zip(claims)
            .map(|(path, owns_output)| {
                let status = match self.process_one(path, owns_output) {
                    Ok(status) => status,
                    Err(error) => {
                        let reason = error_chain(&error);
                        warn!(frame = %path.display(), reason = %reason, "frame failed");
                        FrameStatus::Failed(reason)
                    }
                };
                {
                    let mut done = completed.lock();
                    *done += 1;
                    progress(*done, total);
                }
                FrameOutcome {
                    source: path.clone(),
                    status,
                }
            })
            .collect();
        BatchReport { outcomes }
    }

    fn process_one(&self, path: &Path, owns_output: bool) -> Result<FrameStatus> {
        let output = self.output_path(path);
        if !owns_output {
            warn!(frame = %path.display(), "stem collides with an earlier frame, skipping");
            return Ok(FrameStatus::Skipped(output));
        }
        if output.exists() {
            info!(frame = %path.display(), "output exists, skipping");
            return Ok(FrameStatus::Skipped(output));
        }

        let frame = image::open(path).map_err(|source| FramekitError::Image {
            path: path.to_path_buf(),
            operation: "decode".to_string(),
            source,
        })?;
        let processed = self.processor.process_frame(&frame)?;
        processed
            .save(&output)
            .map_err(|source| FramekitError::Image {
                path: output.clone(),
                operation: "encode".to_string(),
                source,
            })?;
        Ok(FrameStatus::Written(output))
    }

    fn output_path(&self, source: &Path) -> PathBuf {
        let mut name = source.file_stem().unwrap_or_default().to_os_string();
        name.push(".png");
        self.dest.join(name)
    }
}

fn error_chain(error: &FramekitError) -> String {
    use std::error::Error as _;

    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

/// Events streamed from a background batch run.
#[derive(Debug)]
pub enum BatchEvent {
    Progress { completed: usize, total: usize },
    Finished(BatchReport),
}

/// Launches batch runs on a worker thread, one at a time.
///
/// The embedding surface drains [`RunningBatch::events`] to stay responsive.
/// `Finished` arrives exactly once per run, even when every frame failed, and
/// only after the controller is free to accept the next start.
#[derive(Clone, Default)]
pub struct BatchController {
    in_flight: Arc<Mutex<bool>>,
}

impl BatchController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        *self.in_flight.lock()
    }

    /// Starts `batch` on a background thread.
    ///
    /// At most one run may be in flight; a second start is rejected with
    /// [`FramekitError::BatchInFlight`]. Input validation happens up front,
    /// so a rejected or invalid start spawns nothing.
    pub fn start<P>(&self, batch: FrameBatch<P>) -> Result<RunningBatch>
    where
        P: FrameProcessor + 'static,
    {
        let mut running = self.in_flight.lock();
        if *running {
            return Err(FramekitError::BatchInFlight);
        }
        let frames = batch.plan()?;
        *running = true;
        drop(running);

        let (sender, events) = mpsc::channel();
        let in_flight = Arc::clone(&self.in_flight);
        let worker = thread::spawn(move || {
            let report = batch.process_frames(&frames, &|completed, total| {
                let _ = sender.send(BatchEvent::Progress { completed, total });
            });
            // hand the guard back before announcing completion, otherwise a
            // start chained off the `Finished` event can bounce
            *in_flight.lock() = false;
            let _ = sender.send(BatchEvent::Finished(report.clone()));
            report
        });

        Ok(RunningBatch { events, worker })
    }
}

/// Handle to a batch run in progress.
#[derive(Debug)]
pub struct RunningBatch {
    events: Receiver<BatchEvent>,
    worker: JoinHandle<BatchReport>,
}

impl RunningBatch {
    /// Event stream for progress rendering.
    pub fn events(&self) -> &Receiver<BatchEvent> {
        &self.events
    }

    /// Blocks until the run completes.
    pub fn wait(self) -> BatchReport {
        self.worker.join().expect("batch worker thread panicked")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::MockRemover;

    #[test]
    fn test_extension_matching_is_case_insensitive() {
        assert!(has_recognized_extension(
            Path::new("frame_001.PNG"),
            FRAME_EXTENSIONS
        ));
        assert!(has_recognized_extension(
            Path::new("frame_001.JpEg"),
            FRAME_EXTENSIONS
        ));
        assert!(!has_recognized_extension(
            Path::new("frame_001.gif"),
            FRAME_EXTENSIONS
        ));
        assert!(!has_recognized_extension(
            Path::new("frames"),
            FRAME_EXTENSIONS
        ));
        assert!(!has_recognized_extension(Path::new("a.jpg"), PNG_ONLY));
    }

    #[test]
    fn test_output_keeps_the_full_stem() {
        let batch = FrameBatch::new(MockRemover::new(), "in", "out");
        assert_eq!(
            batch.output_path(Path::new("in/walk.cycle.webp")),
            PathBuf::from("out/walk.cycle.png")
        );
        assert_eq!(
            batch.output_path(Path::new("in/idle.png")),
            PathBuf::from("out/idle.png")
        );
    }

    #[test]
    fn test_report_tallies_by_status() {
        let report = BatchReport {
            outcomes: vec![
                FrameOutcome {
                    source: PathBuf::from("a.png"),
                    status: FrameStatus::Written(PathBuf::from("out/a.png")),
                },
                FrameOutcome {
                    source: PathBuf::from("b.png"),
                    status: FrameStatus::Skipped(PathBuf::from("out/b.png")),
                },
                FrameOutcome {
                    source: PathBuf::from("c.png"),
                    status: FrameStatus::Failed("decode failed".to_string()),
                },
            ],
        };
        assert_eq!(report.total(), 3);
        assert_eq!(report.written(), 1);
        assert_eq!(report.skipped(), 1);
        assert_eq!(report.failed(), 1);
        let failures: Vec<_> = report.failures().collect();
        assert_eq!(failures, vec![(Path::new("c.png"), "decode failed")]);
    }
}
