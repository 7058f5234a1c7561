//! Session configuration.
//!
//! [`SessionOptions`] is a builder that carries the operational settings of a
//! [`Session`](crate::Session): which external tools to run, whether to log
//! per-frame reports, and how the source is expected to be treated.
//!
//! # Example
//!
//! ```no_run
//! use mpgg::{MemoryHost, Session, SessionOptions};
//!
//! let options = SessionOptions::new()
//!     .with_verbose(true)
//!     .with_auto_floor(false)
//!     .with_dgindex_path("/opt/dgindex/DGIndex");
//! let session = Session::open(MemoryHost::new(), "VTS_01_1.VOB", options)?;
//! # Ok::<(), mpgg::MpggError>(())
//! ```

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    path::{Path, PathBuf},
};

/// Options for opening a [`Session`](crate::Session).
#[derive(Clone)]
pub struct SessionOptions {
    /// Log a report for every stage at info level.
    pub(crate) verbose: bool,
    /// Floor fully progressive pulldown sources when the session opens.
    pub(crate) auto_floor: bool,
    /// The source is known to mix scan types; deinterlacing requires a prior
    /// recovery pass.
    pub(crate) recovery_required: bool,
    /// DGIndex executable.
    pub(crate) dgindex_path: PathBuf,
    /// mkvextract executable.
    pub(crate) mkvextract_path: PathBuf,
    /// Use an existing `.d2v` next to the input instead of re-indexing.
    pub(crate) reuse_index: bool,
}

impl Debug for SessionOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("SessionOptions")
            .field("verbose", &self.verbose)
            .field("auto_floor", &self.auto_floor)
            .field("recovery_required", &self.recovery_required)
            .field("dgindex", &self.dgindex_path.display())
            .field("mkvextract", &self.mkvextract_path.display())
            .field("reuse_index", &self.reuse_index)
            .finish()
    }
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionOptions {
    /// Create options with default settings.
    ///
    /// Defaults: quiet, auto-floor on, recovery not required, `DGIndex` and
    /// `mkvextract` looked up on `PATH`, existing indexes reused.
    pub fn new() -> Self {
        Self {
            verbose: false,
            auto_floor: true,
            recovery_required: false,
            dgindex_path: PathBuf::from("DGIndex"),
            mkvextract_path: PathBuf::from("mkvextract"),
            reuse_index: true,
        }
    }

    /// Log the per-frame report of every stage, including the ones run when
    /// the session opens.
    #[must_use]
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Floor sources that are entirely soft-pulldown progressive to their
    /// film rate as soon as they are loaded. Defaults to `true`.
    #[must_use]
    pub fn with_auto_floor(mut self, auto_floor: bool) -> Self {
        self.auto_floor = auto_floor;
        self
    }

    /// Declare the source mixed-scan, so that
    /// [`deinterlace`](crate::Session::deinterlace) refuses to run before
    /// [`recover`](crate::Session::recover).
    #[must_use]
    pub fn with_recovery_required(mut self, required: bool) -> Self {
        self.recovery_required = required;
        self
    }

    /// Path to the DGIndex executable.
    #[must_use]
    pub fn with_dgindex_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.dgindex_path = path.as_ref().to_path_buf();
        self
    }

    /// Path to the mkvextract executable.
    #[must_use]
    pub fn with_mkvextract_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.mkvextract_path = path.as_ref().to_path_buf();
        self
    }

    /// Reuse a `.d2v` project already sitting next to the input. Defaults to
    /// `true`; turn it off to force DGIndex to run again.
    #[must_use]
    pub fn with_reuse_index(mut self, reuse: bool) -> Self {
        self.reuse_index = reuse;
        self
    }

    /// `true` if stage reports are logged.
    pub fn verbose(&self) -> bool {
        self.verbose
    }
}
