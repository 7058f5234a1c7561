//! Frame-serving host interface.
//!
//! `mpgg` never touches pixels. Everything it does to video is expressed as a
//! handful of clip operations the host implements lazily: load the indexed
//! stream, assemble frames from source fields, remap frame indices, and
//! splice a processed sub-clip back into place.

use crate::{
    error::BoxError,
    frame::{FrameRecord, ScanType},
    project::Project,
};

/// How to build one output frame from the loaded source clip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameOp {
    /// Source frame `n` as coded, RFF not applied.
    Picture(usize),
    /// Top field of one source frame woven with the bottom field of another.
    Weave {
        /// Source frame supplying the top field.
        top: usize,
        /// Source frame supplying the bottom field.
        bottom: usize,
    },
}

impl FrameOp {
    /// The operation producing `record` from the source clip.
    pub fn for_record(record: &FrameRecord) -> Self {
        if record.top == record.bottom && record.scan != ScanType::MixedField {
            FrameOp::Picture(record.top)
        } else {
            FrameOp::Weave {
                top: record.top,
                bottom: record.bottom,
            }
        }
    }
}

/// A frame server the session drives.
///
/// Implementations are expected to be lazy: every method returns a new
/// handle describing the result without decoding anything. Handles must be
/// cheap to clone.
pub trait ClipHost {
    /// Opaque clip handle.
    type Clip: Clone;

    /// Load the indexed stream with one frame per coded picture (RFF not
    /// applied).
    fn load(&mut self, project: &Project) -> Result<Self::Clip, BoxError>;

    /// Number of frames in `clip`.
    fn frame_count(&self, clip: &Self::Clip) -> usize;

    /// Build a clip whose frame `i` is `ops[i]` applied to `source`.
    fn assemble(&mut self, source: &Self::Clip, ops: &[FrameOp]) -> Result<Self::Clip, BoxError>;

    /// Build a clip whose frame `i` is `clip[frames[i]]`. Indices may repeat
    /// (duplication) or be skipped (dropping) but are never out of range.
    fn remap(&mut self, clip: &Self::Clip, frames: &[usize]) -> Result<Self::Clip, BoxError>;

    /// Replace `base[positions[i]]` with `replacement[i]` for every `i`.
    /// `positions` is ascending and has `replacement`'s length.
    fn splice(
        &mut self,
        base: &Self::Clip,
        positions: &[usize],
        replacement: &Self::Clip,
    ) -> Result<Self::Clip, BoxError>;
}
