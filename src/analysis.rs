//! Source analysis.
//!
//! Derives the facts about a DVD stream that decide how it should be
//! normalized: its pulldown cycle, whether it is variable frame rate, its
//! broadcast standard and its aspect ratios. [`SourceSummary`] bundles them
//! for display.

use std::fmt::{Display, Formatter, Result as FmtResult};

use num_rational::Rational64;

use crate::{
    project::{PictureFlags, Project},
    utilities::{gcd, most_common},
};

/// Colour range of the decoded video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorRange {
    /// 0-255.
    Full,
    /// 16-235 (TV). MPEG streams almost always use it.
    #[default]
    Limited,
}

impl Display for ColorRange {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(match self {
            ColorRange::Full => "full",
            ColorRange::Limited => "limited",
        })
    }
}

/// Colour range of the project's first video file.
///
/// Read through FFmpeg when the `ffmpeg` feature is enabled; otherwise, or
/// when probing fails, MPEG's usual limited range is assumed.
pub fn detect_color_range(project: &Project) -> ColorRange {
    #[cfg(feature = "ffmpeg")]
    if let Some(video) = project.videos.first() {
        match crate::probe::StreamProbe::probe(video) {
            Ok(probe) => return probe.color_range,
            Err(error) => log::warn!("Could not probe colour range, assuming limited: {error}"),
        }
    }
    #[cfg(not(feature = "ffmpeg"))]
    let _ = project;
    ColorRange::default()
}

/// Most common distance between soft-pulldown pictures, plus one.
///
/// Pictures are split into sections at every interlaced picture. In each
/// section the progressive TFF+RFF pictures are paired off and the most
/// common distance within a pair wins the section; the most common section
/// result wins overall. Returns `None` when no section has at least two
/// such pictures.
pub fn pulldown_cycle(pictures: &[PictureFlags]) -> Option<usize> {
    let mut votes = Vec::new();
    let mut section: Vec<usize> = Vec::new();

    let mut close_section = |section: &mut Vec<usize>| {
        if section.len() > 1 {
            let distances: Vec<usize> = section
                .chunks_exact(2)
                .map(|pair| pair[1] - pair[0])
                .collect();
            if let Some(distance) = most_common(&distances) {
                votes.push(distance);
            }
        }
        section.clear();
    };

    for (index, flags) in pictures.iter().enumerate() {
        if !flags.progressive_frame {
            close_section(&mut section);
        } else if flags.rff && flags.tff {
            section.push(index);
        }
    }
    close_section(&mut section);

    most_common(&votes).map(|distance| distance + 1)
}

/// Pulldown pattern string for a cycle, e.g. `"2:3"` for 5.
pub fn pulldown_pattern(cycle: usize) -> String {
    let mut pattern = vec!["2"; cycle / 2];
    if cycle % 2 == 1 {
        pattern.pop();
        pattern.push("3");
    }
    pattern.join(":")
}

/// A DVD stream is variable frame rate when it mixes soft-pulldown
/// progressive pictures with interlaced ones; otherwise it is plain NTSC or
/// PAL and therefore constant.
pub fn is_variable_frame_rate(pictures: &[PictureFlags]) -> bool {
    pictures
        .iter()
        .any(|flags| flags.progressive_frame && flags.rff && flags.tff)
        && pictures.iter().any(|flags| !flags.progressive_frame)
}

/// Broadcast standard name for a nominal frame rate, `"?"` when unknown.
pub fn standard(frame_rate: Rational64) -> &'static str {
    match (*frame_rate.numer(), *frame_rate.denom()) {
        (24, 1) => "FILM",
        (25, 1) => "PAL",
        (50, 1) => "PALi",
        (30000, 1001) => "NTSC",
        (60000, 1001) => "NTSCi",
        (24000, 1001) => "NTSC (FILM)",
        _ => "?",
    }
}

/// Storage aspect ratio of a resolution, reduced, e.g. `"3:2"` for 720×480.
pub fn storage_aspect_ratio(width: u32, height: u32) -> String {
    let divisor = gcd(width as u64, height as u64).max(1);
    format!("{}:{}", width as u64 / divisor, height as u64 / divisor)
}

/// Pixel aspect ratio of a resolution displayed at `dar_width:dar_height`.
pub fn pixel_aspect_ratio(width: u32, height: u32, dar_width: u64, dar_height: u64) -> String {
    let par_width = height as u64 * dar_width;
    let par_height = width as u64 * dar_height;
    let divisor = gcd(par_width, par_height).max(1);
    format!("{}:{}", par_width / divisor, par_height / divisor)
}

/// Parse a `"16:9"` style ratio.
pub(crate) fn parse_ratio(value: &str) -> Option<(u64, u64)> {
    let (width, height) = value.split_once(':')?;
    Some((width.trim().parse().ok()?, height.trim().parse().ok()?))
}

/// What the session learned about its source at load time.
#[derive(Debug, Clone)]
#[must_use]
pub struct SourceSummary {
    /// Number of coded pictures.
    pub total_frames: usize,
    /// Pictures flagged progressive.
    pub progressive_frames: usize,
    /// Pictures not flagged progressive.
    pub interlaced_frames: usize,
    /// Detected pulldown cycle, if any.
    pub pulldown: Option<usize>,
    /// Mixed progressive-pulldown and interlaced content.
    pub variable_frame_rate: bool,
    /// Nominal frame rate (RFF not applied).
    pub frame_rate: Rational64,
    /// Broadcast standard name.
    pub standard: &'static str,
    /// Display aspect ratio from the project.
    pub display_aspect_ratio: String,
    /// Storage aspect ratio from the resolution.
    pub storage_aspect_ratio: String,
    /// Pixel aspect ratio, `"?"` when the display ratio is unreadable.
    pub pixel_aspect_ratio: String,
    /// Colour range of the stream.
    pub color_range: ColorRange,
}

impl SourceSummary {
    /// Summarize a project. The colour range defaults to limited.
    pub fn from_project(project: &Project) -> Self {
        let pictures = &project.pictures;
        let settings = &project.settings;
        let progressive_frames = pictures.iter().filter(|f| f.progressive_frame).count();
        let pixel_aspect_ratio = parse_ratio(&settings.aspect_ratio)
            .map(|(w, h)| pixel_aspect_ratio(settings.width, settings.height, w, h))
            .unwrap_or_else(|| "?".to_string());

        Self {
            total_frames: pictures.len(),
            progressive_frames,
            interlaced_frames: pictures.len() - progressive_frames,
            pulldown: pulldown_cycle(pictures),
            variable_frame_rate: is_variable_frame_rate(pictures),
            frame_rate: settings.frame_rate,
            standard: standard(settings.frame_rate),
            display_aspect_ratio: settings.aspect_ratio.clone(),
            storage_aspect_ratio: storage_aspect_ratio(settings.width, settings.height),
            pixel_aspect_ratio,
            color_range: ColorRange::default(),
        }
    }

    /// Share of progressive pictures in percent.
    pub fn progressive_percentage(&self) -> f64 {
        if self.total_frames == 0 {
            return 0.0;
        }
        self.progressive_frames as f64 / self.total_frames as f64 * 100.0
    }

    /// Pulldown pattern string, if a cycle was detected.
    pub fn pulldown_pattern(&self) -> Option<String> {
        self.pulldown.map(pulldown_pattern)
    }
}

impl Display for SourceSummary {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let progressive = self.progressive_percentage();
        write!(f, "Progressive: {progressive:05.2}% ({})", self.progressive_frames)?;
        match (self.pulldown, self.pulldown_pattern()) {
            (Some(cycle), Some(pattern)) => writeln!(f, " w/ Pulldown {pattern} (Cycle: {cycle})")?,
            _ => writeln!(f, " - No Pulldown")?,
        }
        writeln!(
            f,
            "Interlaced:  {:05.2}% ({})",
            100.0 - progressive,
            self.interlaced_frames
        )?;
        writeln!(
            f,
            "VFR? {}  DAR: {}  SAR: {}  PAR: {}",
            self.variable_frame_rate,
            self.display_aspect_ratio,
            self.storage_aspect_ratio,
            self.pixel_aspect_ratio
        )?;
        write!(
            f,
            "{} @ {} fps, {} range",
            self.standard, self.frame_rate, self.color_range
        )
    }
}
