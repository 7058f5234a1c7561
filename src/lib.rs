//! # mpgg
//!
//! Load DVD MPEG-1/MPEG-2 video into a frame server and normalize it: recover
//! progressive frames from mixed field material, deinterlace the rest, and
//! turn variable frame rate pulldown content into constant frame rate.
//!
//! `mpgg` never decodes video. It reads the per-picture flags from a DGIndex
//! project, builds a frame plan describing which fields every output frame
//! is made of, and drives a frame-serving host through the [`ClipHost`]
//! trait to materialise it. All timing is exact rational arithmetic.
//!
//! ## Quick Start
//!
//! ```no_run
//! use mpgg::{MemoryHost, Session, SessionOptions};
//!
//! let options = SessionOptions::new().with_verbose(true);
//! let mut session = Session::open(MemoryHost::new(), "VTS_01_1.VOB", options)?;
//! println!("{}", session.summary());
//!
//! session.recover(false)?.ceil()?;
//! println!("{} frames at {} fps", session.plan().len(), session.project().settings.frame_rate);
//! # Ok::<(), mpgg::MpggError>(())
//! ```
//!
//! ## Stages
//!
//! - **Loading** builds one frame per coded picture and expands interlaced
//!   runs at field level, so hard-telecined frames show up as mixed-field
//!   frames.
//! - **Recovery** weaves interlaced frames with the matching field of an
//!   adjacent mixed-field frame.
//! - **Deinterlacing** hands the remaining interlaced frames to a kernel,
//!   grouped by field order.
//! - **Normalization** duplicates (`ceil`) or drops (`floor`) frames so every
//!   frame lasts exactly one tick of the target rate.
//!
//! ### Optional Features
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `ffmpeg` | `StreamProbe` reads the colour range and stream size through FFmpeg |

pub mod analysis;
pub mod classify;
pub mod configuration;
pub mod deinterlace;
pub mod error;
pub mod frame;
pub mod host;
pub mod indexer;
pub mod loader;
pub mod memory_host;
pub mod normalize;
#[cfg(feature = "ffmpeg")]
pub mod probe;
pub mod project;
pub mod recovery;
pub mod report;
pub mod session;
mod utilities;

pub use analysis::{ColorRange, SourceSummary};
pub use configuration::SessionOptions;
pub use deinterlace::Deinterlaced;
pub use error::{BoxError, MpggError};
pub use frame::{FieldOrder, FieldParity, FramePlan, FrameRecord, Origin, ScanType};
pub use host::{ClipHost, FrameOp};
pub use indexer::{Demuxer, DgIndex, Indexer, MkvExtract};
pub use memory_host::{MemoryClip, MemoryFrame, MemoryHost};
pub use normalize::Normalized;
#[cfg(feature = "ffmpeg")]
pub use probe::StreamProbe;
pub use project::{PictureFlags, PictureType, Project, ProjectSettings};
pub use recovery::Recovery;
pub use report::{Action, Report};
pub use session::Session;
