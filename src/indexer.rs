//! External indexing and demuxing.
//!
//! DGIndex turns an MPEG program or elementary stream into a `.d2v` project
//! listing every coded picture and its flags. Matroska files are demuxed to a
//! raw MPEG stream with mkvextract first, since DGIndex cannot read them.
//! Both tools are run to completion as subprocesses; their output files are
//! left next to the input so later runs can reuse them.
//!
//! # Example
//!
//! ```no_run
//! use mpgg::{DgIndex, Indexer};
//!
//! let project = DgIndex::new("DGIndex").index("VTS_01_1.VOB".as_ref())?;
//! println!("{} pictures", project.pictures.len());
//! # Ok::<(), mpgg::MpggError>(())
//! ```

use std::{
    ffi::{OsStr, OsString},
    path::{Path, PathBuf},
    process::Command,
};

use crate::{configuration::SessionOptions, error::MpggError, project::Project};

/// Container extensions that must be demuxed before indexing.
const CONTAINER_EXTENSIONS: &[&str] = &["mkv", "mka", "mk3d"];

/// Produces a project for a media file.
pub trait Indexer {
    /// Index `path`, or load it directly if it already is a project.
    fn index(&self, path: &Path) -> Result<Project, MpggError>;
}

/// Extracts the MPEG video track from a container.
pub trait Demuxer {
    /// Demux `path` and return the path of the extracted stream.
    fn demux(&self, path: &Path) -> Result<PathBuf, MpggError>;
}

/// `true` if `path` has a project file extension.
pub fn is_project(path: &Path) -> bool {
    has_extension(path, &["d2v"])
}

/// `true` if `path` is a container that has to be demuxed first.
pub fn is_container(path: &Path) -> bool {
    has_extension(path, CONTAINER_EXTENSIONS)
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(OsStr::to_str)
        .is_some_and(|extension| {
            extensions
                .iter()
                .any(|candidate| extension.eq_ignore_ascii_case(candidate))
        })
}

/// Path of the project DGIndex writes for `input`: the input path with
/// `.d2v` appended.
pub fn project_path(input: &Path) -> PathBuf {
    let mut name = input.as_os_str().to_os_string();
    name.push(".d2v");
    PathBuf::from(name)
}

/// The DGIndex indexer.
#[derive(Debug, Clone)]
pub struct DgIndex {
    executable: PathBuf,
    reuse: bool,
}

impl DgIndex {
    /// Run `executable` to index, reusing existing projects.
    pub fn new<P: AsRef<Path>>(executable: P) -> Self {
        Self {
            executable: executable.as_ref().to_path_buf(),
            reuse: true,
        }
    }

    /// Indexer configured from session options.
    pub fn from_options(options: &SessionOptions) -> Self {
        Self {
            executable: options.dgindex_path.clone(),
            reuse: options.reuse_index,
        }
    }

    /// Whether an existing `<input>.d2v` is loaded instead of re-indexing.
    #[must_use]
    pub fn with_reuse(mut self, reuse: bool) -> Self {
        self.reuse = reuse;
        self
    }

    fn run(&self, input: &Path, output: &Path) -> Result<(), MpggError> {
        // DGIndex appends the extension itself.
        let stem = output.with_extension("");
        log::debug!(
            "Running {} on {}",
            self.executable.display(),
            input.display()
        );

        let result = Command::new(&self.executable)
            .arg("-i")
            .arg(input)
            .args(["-ia", "5", "-fo", "0", "-yr", "2", "-om", "0", "-hide", "-exit", "-o"])
            .arg(&stem)
            .output()
            .map_err(|error| MpggError::Load {
                path: input.to_path_buf(),
                reason: format!(
                    "could not run {}: {error}",
                    self.executable.display()
                ),
            })?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(MpggError::Load {
                path: input.to_path_buf(),
                reason: format!("DGIndex exited with {}: {}", result.status, stderr.trim()),
            });
        }
        if !output.is_file() {
            return Err(MpggError::Load {
                path: input.to_path_buf(),
                reason: format!("DGIndex did not write {}", output.display()),
            });
        }
        Ok(())
    }
}

impl Indexer for DgIndex {
    fn index(&self, path: &Path) -> Result<Project, MpggError> {
        if is_project(path) {
            return Project::load(path);
        }
        if !path.is_file() {
            return Err(MpggError::Load {
                path: path.to_path_buf(),
                reason: "file not found".to_string(),
            });
        }

        let output = project_path(path);
        if self.reuse && output.is_file() {
            log::debug!("Reusing existing project {}", output.display());
        } else {
            self.run(path, &output)?;
        }
        Project::load(&output)
    }
}

/// The mkvextract demuxer.
#[derive(Debug, Clone)]
pub struct MkvExtract {
    executable: PathBuf,
    track: u32,
}

impl MkvExtract {
    /// Run `executable` to extract track 0.
    pub fn new<P: AsRef<Path>>(executable: P) -> Self {
        Self {
            executable: executable.as_ref().to_path_buf(),
            track: 0,
        }
    }

    /// Demuxer configured from session options.
    pub fn from_options(options: &SessionOptions) -> Self {
        Self::new(&options.mkvextract_path)
    }

    /// Extract track `track` instead of 0.
    #[must_use]
    pub fn with_track(mut self, track: u32) -> Self {
        self.track = track;
        self
    }

    /// Where the stream extracted from `path` is written.
    pub fn output_path(path: &Path) -> PathBuf {
        path.with_extension("m2v")
    }
}

impl Demuxer for MkvExtract {
    fn demux(&self, path: &Path) -> Result<PathBuf, MpggError> {
        let output = Self::output_path(path);
        log::debug!(
            "Extracting track {} of {} to {}",
            self.track,
            path.display(),
            output.display()
        );

        let mut target = OsString::from(format!("{}:", self.track));
        target.push(output.as_os_str());

        let result = Command::new(&self.executable)
            .arg(path)
            .arg("tracks")
            .arg(&target)
            .output()
            .map_err(|error| MpggError::Demux {
                path: path.to_path_buf(),
                reason: format!("could not run {}: {error}", self.executable.display()),
            })?;

        // mkvextract exits with 1 for warnings and 2 for errors.
        if result.status.code().is_none_or(|code| code > 1) {
            let stdout = String::from_utf8_lossy(&result.stdout);
            return Err(MpggError::Demux {
                path: path.to_path_buf(),
                reason: format!("mkvextract exited with {}: {}", result.status, stdout.trim()),
            });
        }
        if !output.is_file() {
            return Err(MpggError::Demux {
                path: path.to_path_buf(),
                reason: format!("track {} was not written to {}", self.track, output.display()),
            });
        }
        Ok(output)
    }
}

/// Index `path` with the tools named in `options`, demuxing containers
/// first.
pub fn index_with_options(path: &Path, options: &SessionOptions) -> Result<Project, MpggError> {
    let indexer = DgIndex::from_options(options);
    if is_container(path) {
        let stream = MkvExtract::from_options(options).demux(path)?;
        return indexer.index(&stream);
    }
    indexer.index(path)
}
