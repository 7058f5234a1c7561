//! Verbose stage reports.
//!
//! A [`Report`] lists what a stage did to each frame it touched. Reports are
//! informational only: no stage reads another stage's report.

use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::frame::FieldOrder;

/// What a stage did to one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// A coded picture was expanded into several displayed frames.
    Expanded {
        /// The expanded picture.
        source: usize,
    },
    /// Two fields were woven into a progressive frame.
    Recovered {
        /// Picture supplying the top field.
        top: usize,
        /// Picture supplying the bottom field.
        bottom: usize,
    },
    /// The frame went through the deinterlace kernel.
    Deinterlaced {
        /// Field order the kernel was told to assume.
        order: FieldOrder,
    },
    /// The frame was left untouched by the kernel.
    PassedThrough,
    /// The frame is a duplicate of the frame at plan position `of`.
    Duplicated {
        /// Output position of the frame being repeated.
        of: usize,
    },
    /// The frame derived from `source` was dropped.
    Dropped {
        /// Picture whose frame was removed.
        source: usize,
    },
}

impl Display for Action {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Action::Expanded { source } => write!(f, "expanded from picture {source}"),
            Action::Recovered { top, bottom } => {
                write!(f, "recovered (top {top}, bottom {bottom})")
            }
            Action::Deinterlaced { order } => write!(f, "deinterlaced ({order})"),
            Action::PassedThrough => f.write_str("progressive"),
            Action::Duplicated { of } => write!(f, "duplicate of {of}"),
            Action::Dropped { source } => write!(f, "dropped picture {source}"),
        }
    }
}

/// Ordered `(frame, action)` entries produced by one stage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    /// Name of the stage that produced the report.
    pub stage: &'static str,
    /// Entries in plan order. For `Dropped` the position is in the input plan.
    pub entries: Vec<(usize, Action)>,
}

impl Report {
    pub(crate) fn new(stage: &'static str) -> Self {
        Self {
            stage,
            entries: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, frame: usize, action: Action) {
        self.entries.push((frame, action));
    }

    /// Frames the report mentions, in order.
    pub fn frames(&self) -> Vec<usize> {
        self.entries.iter().map(|(frame, _)| *frame).collect()
    }

    /// Send every entry to the `log` facade at info level.
    pub(crate) fn log(&self) {
        for (frame, action) in &self.entries {
            log::info!("[{}] frame {frame}: {action}", self.stage);
        }
    }
}

impl Display for Report {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        if self.entries.is_empty() {
            return writeln!(f, "[{}] no frames changed", self.stage);
        }
        for (frame, action) in &self.entries {
            writeln!(f, "[{}] {frame:>6}: {action}", self.stage)?;
        }
        Ok(())
    }
}
