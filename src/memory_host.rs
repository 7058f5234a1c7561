//! In-memory reference host.
//!
//! [`MemoryHost`] materialises clips as lists of frame descriptions: which
//! source frames supply the two fields and which filters have been applied.
//! It is what the `mpgg plan` command prints, and it lets a frame plan be
//! checked end to end without a real frame server.
//!
//! # Example
//!
//! ```
//! use mpgg::{ClipHost, FrameOp, MemoryHost};
//!
//! let mut host = MemoryHost::new();
//! let source = host.source(3);
//! let clip = host.assemble(&source, &[FrameOp::Picture(0), FrameOp::Weave { top: 1, bottom: 2 }])?;
//! assert_eq!(clip.frames()[1].to_string(), "1t+2b");
//! # Ok::<(), mpgg::BoxError>(())
//! ```

use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::{
    error::BoxError,
    host::{ClipHost, FrameOp},
    project::Project,
};

/// Description of one frame of a [`MemoryClip`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryFrame {
    /// Source frame supplying the top field.
    pub top: usize,
    /// Source frame supplying the bottom field.
    pub bottom: usize,
    /// Filters applied to the frame, oldest first.
    pub filters: Vec<String>,
}

impl Display for MemoryFrame {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        if self.top == self.bottom {
            write!(f, "{}", self.top)?;
        } else {
            write!(f, "{}t+{}b", self.top, self.bottom)?;
        }
        for filter in &self.filters {
            write!(f, " |{filter}")?;
        }
        Ok(())
    }
}

/// A clip held entirely in memory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryClip {
    frames: Vec<MemoryFrame>,
}

impl MemoryClip {
    /// Frames in order.
    pub fn frames(&self) -> &[MemoryFrame] {
        &self.frames
    }

    /// A copy of this clip with `filter` recorded on every frame.
    ///
    /// Handy as a stand-in deinterlace kernel.
    pub fn filtered(&self, filter: impl Into<String>) -> Self {
        let filter = filter.into();
        Self {
            frames: self
                .frames
                .iter()
                .map(|frame| {
                    let mut frame = frame.clone();
                    frame.filters.push(filter.clone());
                    frame
                })
                .collect(),
        }
    }

    /// A copy of this clip without its last frame.
    pub fn truncated(&self) -> Self {
        let mut frames = self.frames.clone();
        frames.pop();
        Self { frames }
    }
}

/// Host whose clips are [`MemoryClip`]s.
#[derive(Debug, Clone, Default)]
pub struct MemoryHost {
    frame_count: Option<usize>,
}

impl MemoryHost {
    /// A host that loads one frame per indexed picture.
    pub fn new() -> Self {
        Self::default()
    }

    /// A host that reports `count` frames for every loaded stream regardless
    /// of the project, mimicking a source whose decoder disagrees with the
    /// index.
    pub fn with_frame_count(count: usize) -> Self {
        Self {
            frame_count: Some(count),
        }
    }

    /// A plain source clip of `count` frames.
    pub fn source(&self, count: usize) -> MemoryClip {
        MemoryClip {
            frames: (0..count)
                .map(|n| MemoryFrame {
                    top: n,
                    bottom: n,
                    filters: Vec::new(),
                })
                .collect(),
        }
    }
}

fn frame_at(clip: &MemoryClip, index: usize) -> Result<&MemoryFrame, BoxError> {
    clip.frames.get(index).ok_or_else(|| {
        format!(
            "frame {index} is out of range (clip has {} frames)",
            clip.frames.len()
        )
        .into()
    })
}

impl ClipHost for MemoryHost {
    type Clip = MemoryClip;

    fn load(&mut self, project: &Project) -> Result<MemoryClip, BoxError> {
        Ok(self.source(self.frame_count.unwrap_or(project.pictures.len())))
    }

    fn frame_count(&self, clip: &MemoryClip) -> usize {
        clip.frames.len()
    }

    fn assemble(&mut self, source: &MemoryClip, ops: &[FrameOp]) -> Result<MemoryClip, BoxError> {
        let frames = ops
            .iter()
            .map(|op| match *op {
                FrameOp::Picture(n) => frame_at(source, n).cloned(),
                FrameOp::Weave { top, bottom } => {
                    let top_frame = frame_at(source, top)?;
                    frame_at(source, bottom)?;
                    Ok(MemoryFrame {
                        top,
                        bottom,
                        filters: top_frame.filters.clone(),
                    })
                }
            })
            .collect::<Result<_, _>>()?;
        Ok(MemoryClip { frames })
    }

    fn remap(&mut self, clip: &MemoryClip, frames: &[usize]) -> Result<MemoryClip, BoxError> {
        let frames = frames
            .iter()
            .map(|&n| frame_at(clip, n).cloned())
            .collect::<Result<_, _>>()?;
        Ok(MemoryClip { frames })
    }

    fn splice(
        &mut self,
        base: &MemoryClip,
        positions: &[usize],
        replacement: &MemoryClip,
    ) -> Result<MemoryClip, BoxError> {
        if positions.len() != replacement.frames.len() {
            return Err(format!(
                "{} positions but {} replacement frames",
                positions.len(),
                replacement.frames.len()
            )
            .into());
        }
        let mut frames = base.frames.clone();
        for (&position, frame) in positions.iter().zip(&replacement.frames) {
            let slot = frames.get_mut(position).ok_or_else(|| {
                BoxError::from(format!("splice position {position} is out of range"))
            })?;
            *slot = frame.clone();
        }
        Ok(MemoryClip { frames })
    }
}
