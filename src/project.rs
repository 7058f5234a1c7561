//! DGIndex project (`.d2v`) model and parser.
//!
//! A project file lists the indexed video files, the stream settings that
//! DGIndex detected, and one flag byte per coded picture. The flags are all
//! the frame plan needs: progressive_frame, TFF and RFF per picture, plus the
//! VOB/cell the picture belongs to.
//!
//! # Example
//!
//! ```no_run
//! use mpgg::Project;
//!
//! let project = Project::load("VTS_01_1.d2v")?;
//! println!("{} pictures @ {}", project.pictures.len(), project.settings.frame_rate);
//! # Ok::<(), mpgg::MpggError>(())
//! ```

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use num_rational::Rational64;

use crate::{error::MpggError, loader::is_plausible_rate};

/// Header line prefix every supported project starts with.
const PROJECT_MAGIC: &str = "DGIndexProjectFile";

/// Flag value DGIndex writes after the last picture of the stream.
const END_OF_STREAM: u8 = 0xff;

/// MPEG picture coding type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PictureType {
    /// Intra-coded picture.
    I,
    /// Predicted picture.
    P,
    /// Bidirectionally predicted picture.
    B,
    /// Reserved coding type.
    Unknown,
}

/// Per-picture flags decoded from one `.d2v` flag byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PictureFlags {
    /// The picture was coded as a progressive frame.
    pub progressive_frame: bool,
    /// Picture coding type.
    pub picture_type: PictureType,
    /// Top field is displayed first.
    pub tff: bool,
    /// The first field is repeated after the second (soft pulldown).
    pub rff: bool,
    /// VOB ID of the picture's GOP line.
    pub vob: u32,
    /// Cell ID of the picture's GOP line.
    pub cell: u32,
}

impl PictureFlags {
    /// Decode a DGIndex flag byte.
    ///
    /// Bit 6 is progressive_frame, bits 5-4 the coding type, bit 1 TFF and
    /// bit 0 RFF.
    pub fn from_byte(byte: u8, vob: u32, cell: u32) -> Self {
        let picture_type = match (byte >> 4) & 0b11 {
            1 => PictureType::I,
            2 => PictureType::P,
            3 => PictureType::B,
            _ => PictureType::Unknown,
        };
        Self {
            progressive_frame: byte & 0b0100_0000 != 0,
            picture_type,
            tff: byte & 0b10 != 0,
            rff: byte & 0b1 != 0,
            vob,
            cell,
        }
    }

    /// Shorthand for a flag set outside of any VOB/cell, used when building
    /// projects by hand.
    pub fn new(progressive_frame: bool, tff: bool, rff: bool) -> Self {
        Self {
            progressive_frame,
            picture_type: PictureType::Unknown,
            tff,
            rff,
            vob: 0,
            cell: 0,
        }
    }

    /// Number of fields this picture is displayed for.
    pub fn field_count(&self) -> i64 {
        if self.rff { 3 } else { 2 }
    }
}

/// Stream settings from the project header.
#[derive(Debug, Clone)]
pub struct ProjectSettings {
    /// MPEG version (1 or 2).
    pub mpeg_type: u8,
    /// Display aspect ratio, e.g. `"16:9"`. The first entry when several are listed.
    pub aspect_ratio: String,
    /// Coded width in pixels.
    pub width: u32,
    /// Coded height in pixels.
    pub height: u32,
    /// Nominal (coded) frame rate, RFF not applied.
    pub frame_rate: Rational64,
    /// DGIndex field operation (0 = honor pulldown, 1 = force film, 2 = raw).
    pub field_operation: u8,
    /// Every `key=value` header line, including the ones parsed above.
    pub raw: BTreeMap<String, String>,
}

/// A parsed DGIndex project.
#[derive(Debug, Clone)]
pub struct Project {
    /// Location of the `.d2v` file (or a synthetic name for hand-built projects).
    pub path: PathBuf,
    /// Format version from the magic line, e.g. `"16"`.
    pub version: String,
    /// Indexed elementary streams, resolved against the project directory.
    pub videos: Vec<PathBuf>,
    /// Stream settings.
    pub settings: ProjectSettings,
    /// One entry per coded picture in decode-to-display order.
    pub pictures: Vec<PictureFlags>,
}

impl Project {
    /// Read and parse a project file.
    ///
    /// # Errors
    ///
    /// Returns [`MpggError::Load`] if the file cannot be read or is malformed.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, MpggError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|error| MpggError::Load {
            path: path.to_path_buf(),
            reason: error.to_string(),
        })?;
        Self::parse(path, &text)
    }

    /// Parse project text. `path` is used for error messages and to resolve
    /// relative video paths.
    pub fn parse<P: AsRef<Path>>(path: P, text: &str) -> Result<Self, MpggError> {
        let path = path.as_ref();
        let fail = |line: usize, reason: String| MpggError::Load {
            path: path.to_path_buf(),
            reason: format!("line {line}: {reason}"),
        };

        let mut lines = text.lines().enumerate().map(|(n, l)| (n + 1, l.trim_end()));

        let (_, magic) = lines
            .next()
            .ok_or_else(|| fail(1, "empty project file".to_string()))?;
        let version = magic
            .strip_prefix(PROJECT_MAGIC)
            .ok_or_else(|| fail(1, format!("not a DGIndex project: {magic:?}")))?
            .to_string();

        let (count_line, count) = lines
            .next()
            .ok_or_else(|| fail(2, "missing video file count".to_string()))?;
        let count: usize = count
            .trim()
            .parse()
            .map_err(|_| fail(count_line, format!("invalid video file count {count:?}")))?;

        let base = path.parent().unwrap_or_else(|| Path::new(""));
        // The count is untrusted; the list grows only as lines are read.
        let mut videos = Vec::new();
        for _ in 0..count {
            let (n, video) = lines
                .next()
                .ok_or_else(|| fail(count_line, "video file list is truncated".to_string()))?;
            if video.is_empty() {
                return Err(fail(n, "empty video file path".to_string()));
            }
            let video = PathBuf::from(video);
            videos.push(if video.is_absolute() { video } else { base.join(video) });
        }

        // Settings block, delimited by blank lines.
        let mut raw = BTreeMap::new();
        let mut in_settings = false;
        let mut last_line = count_line;
        for (n, line) in lines.by_ref() {
            last_line = n;
            if line.is_empty() {
                if in_settings {
                    break;
                }
                continue;
            }
            in_settings = true;
            let (key, value) = line
                .split_once('=')
                .ok_or_else(|| fail(n, format!("expected key=value, got {line:?}")))?;
            raw.insert(key.trim().to_string(), value.trim().to_string());
        }
        let settings = parse_settings(raw).map_err(|reason| fail(last_line, reason))?;

        // Data block: one GOP per line until a blank line or the end marker.
        let mut pictures = Vec::new();
        let mut finished = false;
        for (n, line) in lines {
            if line.is_empty() {
                if pictures.is_empty() {
                    continue;
                }
                break;
            }
            let columns: Vec<&str> = line.split_whitespace().collect();
            if columns.len() < 8 {
                return Err(fail(n, format!("expected at least 8 columns, got {}", columns.len())));
            }
            let vob = columns[5]
                .parse()
                .map_err(|_| fail(n, format!("invalid vob id {:?}", columns[5])))?;
            let cell = columns[6]
                .parse()
                .map_err(|_| fail(n, format!("invalid cell id {:?}", columns[6])))?;
            for flag in &columns[7..] {
                let byte = u8::from_str_radix(flag, 16)
                    .map_err(|_| fail(n, format!("invalid flag byte {flag:?}")))?;
                if byte == END_OF_STREAM {
                    finished = true;
                    break;
                }
                pictures.push(PictureFlags::from_byte(byte, vob, cell));
            }
            if finished {
                break;
            }
        }

        log::debug!(
            "Parsed project {} (v{version}): {} videos, {} pictures",
            path.display(),
            videos.len(),
            pictures.len()
        );

        Ok(Self {
            path: path.to_path_buf(),
            version,
            videos,
            settings,
            pictures,
        })
    }

    /// Build a project from already-known pictures, bypassing DGIndex.
    ///
    /// Useful for other indexers and for tests. Width and height default to
    /// DVD NTSC (720×480) and the aspect ratio to 4:3.
    pub fn from_pictures<P: AsRef<Path>>(
        path: P,
        frame_rate: Rational64,
        pictures: Vec<PictureFlags>,
    ) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            version: "16".to_string(),
            videos: Vec::new(),
            settings: ProjectSettings {
                mpeg_type: 2,
                aspect_ratio: "4:3".to_string(),
                width: 720,
                height: 480,
                frame_rate,
                field_operation: 0,
                raw: BTreeMap::new(),
            },
            pictures,
        }
    }
}

fn parse_settings(raw: BTreeMap<String, String>) -> Result<ProjectSettings, String> {
    let get = |key: &str| raw.get(key).ok_or_else(|| format!("missing setting {key}"));

    let mpeg_type = get("MPEG_Type")?
        .parse()
        .map_err(|_| "invalid MPEG_Type".to_string())?;

    let aspect_ratio = get("Aspect_Ratio")?
        .split(',')
        .next()
        .unwrap_or_default()
        .trim()
        .to_string();

    let (width, height) = get("Picture_Size")?
        .split_once('x')
        .and_then(|(w, h)| Some((w.trim().parse().ok()?, h.trim().parse().ok()?)))
        .ok_or_else(|| "invalid Picture_Size".to_string())?;

    let frame_rate = parse_frame_rate(get("Frame_Rate")?)
        .ok_or_else(|| "invalid Frame_Rate".to_string())?;

    let field_operation = raw
        .get("Field_Operation")
        .and_then(|value| value.parse().ok())
        .unwrap_or(0);

    Ok(ProjectSettings {
        mpeg_type,
        aspect_ratio,
        width,
        height,
        frame_rate,
        field_operation,
        raw,
    })
}

/// Parse `Frame_Rate=29970 (30000/1001)`.
///
/// The exact ratio in parentheses wins; a bare value is read as
/// thousandths of a frame per second. Non-positive and implausibly large
/// rates are rejected.
pub(crate) fn parse_frame_rate(value: &str) -> Option<Rational64> {
    if let Some((_, ratio)) = value.split_once('(') {
        let (numerator, denominator) = ratio.trim_end_matches(')').split_once('/')?;
        let numerator: i64 = numerator.trim().parse().ok()?;
        let denominator: i64 = denominator.trim().parse().ok()?;
        if numerator <= 0 || denominator <= 0 {
            return None;
        }
        let rate = Rational64::new(numerator, denominator);
        return is_plausible_rate(rate).then_some(rate);
    }
    let millis: i64 = value.trim().parse().ok()?;
    if millis <= 0 {
        return None;
    }
    let rate = Rational64::new(millis, 1000);
    is_plausible_rate(rate).then_some(rate)
}
