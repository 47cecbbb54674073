pub mod batch;
pub mod clean;
pub mod compose;
pub mod config;
pub mod errors;
pub mod keying;
pub mod pack;
pub mod removal;
pub mod session;
pub mod traits;

pub mod mocks;

pub use batch::{BatchController, BatchEvent, BatchReport, FrameBatch, RunningBatch};
pub use compose::{apply_mask, apply_outline, OutlineSettings, Outliner};
pub use errors::{FramekitError, Result};
pub use keying::{compute_mask, key_frame, refine_mask, ChromaKeyer, KeyerSettings};
pub use pack::{pack_frames, PackSummary};
pub use removal::CommandRemover;
pub use session::{Adjustment, KeySession, SessionState};
pub use traits::FrameProcessor;

#[cfg(test)]
pub use mocks::*;
