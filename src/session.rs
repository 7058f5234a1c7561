//! The [`Session`] entry point.
//!
//! A session owns the project, the host and the current clip, and walks the
//! frame plan through the processing stages: recovery, deinterlacing and
//! VFR to CFR normalization. Every stage works on a copy of the plan and asks
//! the host for a new clip; plan and clip are swapped in together only when
//! the whole stage succeeded.
//!
//! # Example
//!
//! ```no_run
//! use mpgg::{MemoryHost, Session, SessionOptions};
//!
//! let mut session = Session::open(MemoryHost::new(), "VTS_01_1.VOB", SessionOptions::new())?;
//! session
//!     .recover(false)?
//!     .deinterlace(|clip, order| Ok(clip.filtered(format!("bwdif {order}"))), false)?
//!     .ceil()?;
//! for frame in session.clip().frames() {
//!     println!("{frame}");
//! }
//! # Ok::<(), mpgg::MpggError>(())
//! ```

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    path::Path,
};

use num_rational::Rational64;

use crate::{
    analysis::{SourceSummary, detect_color_range},
    classify::classify,
    configuration::SessionOptions,
    deinterlace::deinterlace,
    error::{BoxError, MpggError},
    frame::{FieldOrder, FramePlan},
    host::{ClipHost, FrameOp},
    indexer::index_with_options,
    loader::{field_duration, load_plan},
    normalize::{self, Normalized, decimated_rate},
    project::Project,
    recovery::recover,
    report::Report,
};

/// A loaded MPEG source and its processing state.
pub struct Session<H: ClipHost> {
    host: H,
    project: Project,
    options: SessionOptions,
    summary: SourceSummary,
    source: H::Clip,
    clip: H::Clip,
    plan: FramePlan,
    report: Option<Report>,
    recovered: Vec<usize>,
    deinterlaced: Vec<usize>,
    recovery_ran: bool,
    deinterlace_ran: bool,
    normalized: Option<&'static str>,
}

impl<H: ClipHost> Debug for Session<H> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("Session")
            .field("project", &self.project.path)
            .field("frames", &self.plan.len())
            .field("recovered", &self.recovered.len())
            .field("deinterlaced", &self.deinterlaced.len())
            .field("normalized", &self.normalized)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl<H: ClipHost> Session<H> {
    /// Index `path` (or load it, if it is a `.d2v`) and open a session on it.
    ///
    /// Matroska inputs are demuxed with mkvextract first. See
    /// [`from_project`](Session::from_project) for what happens next.
    ///
    /// # Errors
    ///
    /// Returns [`MpggError::Demux`] if a container cannot be demuxed, and
    /// [`MpggError::Load`] if indexing or loading fails.
    pub fn open<P: AsRef<Path>>(host: H, path: P, options: SessionOptions) -> Result<Self, MpggError> {
        let project = index_with_options(path.as_ref(), &options)?;
        Self::from_project(host, project, options)
    }

    /// Open a session on an already loaded project.
    ///
    /// The host loads the stream, the initial plan is built and classified,
    /// and sources that are entirely soft-pulldown progressive are floored to
    /// their film rate unless [`SessionOptions::with_auto_floor`] is off.
    ///
    /// # Errors
    ///
    /// Returns [`MpggError::Load`] if the project is empty or disagrees with
    /// the host's clip, and [`MpggError::Host`] if the host fails.
    pub fn from_project(mut host: H, project: Project, options: SessionOptions) -> Result<Self, MpggError> {
        let source = host
            .load(&project)
            .map_err(|error| MpggError::host("load", error))?;
        let initial = load_plan(&project, host.frame_count(&source))?;

        let (plan, report) = classify(&initial, field_duration(project.settings.frame_rate));
        let ops: Vec<FrameOp> = plan.records().iter().map(FrameOp::for_record).collect();
        let clip = host
            .assemble(&source, &ops)
            .map_err(|error| MpggError::host("assemble", error))?;

        let mut summary = SourceSummary::from_project(&project);
        summary.color_range = detect_color_range(&project);

        if options.verbose {
            log::info!("{}: {} frames", project.path.display(), plan.len());
            for line in summary.to_string().lines() {
                log::info!("{line}");
            }
            report.log();
        }

        let mut session = Self {
            host,
            project,
            options,
            summary,
            source,
            clip,
            plan,
            report: Some(report),
            recovered: Vec::new(),
            deinterlaced: Vec::new(),
            recovery_ran: false,
            deinterlace_ran: false,
            normalized: None,
        };

        let summary = &session.summary;
        if session.options.auto_floor
            && !summary.variable_frame_rate
            && summary.interlaced_frames == 0
            && summary.pulldown.is_some()
        {
            log::debug!("Source is fully progressive pulldown, flooring to film rate");
            session.floor()?;
        }

        Ok(session)
    }

    /// Weave progressive frames back together from split fields.
    ///
    /// Interlaced frames whose missing field sits in an adjacent mixed-field
    /// frame are rebuilt from the two source pictures. The plan keeps its
    /// length; only the recovered frames of the clip change.
    ///
    /// Running this after [`deinterlace`](Session::deinterlace) or a rate
    /// change works but is not what it is meant for: recovered frames replace
    /// their deinterlaced versions, and duplicates made by
    /// [`ceil`](Session::ceil) are left as they were.
    ///
    /// # Errors
    ///
    /// Returns [`MpggError::Host`] if the host fails; the session is left
    /// unchanged.
    pub fn recover(&mut self, verbose: bool) -> Result<&mut Self, MpggError> {
        if self.deinterlace_ran || self.normalized.is_some() {
            log::warn!(
                "recover() called after {}; recovered frames are patched into the processed clip",
                if self.deinterlace_ran { "deinterlace()" } else { "a rate change" }
            );
        }

        let recovery = recover(&self.plan);
        let ops: Vec<FrameOp> = recovery
            .recovered
            .iter()
            .map(|&position| FrameOp::for_record(&recovery.plan.records()[position]))
            .collect();

        let clip = if ops.is_empty() {
            self.clip.clone()
        } else {
            let woven = self
                .host
                .assemble(&self.source, &ops)
                .map_err(|error| MpggError::host("assemble", error))?;
            self.host
                .splice(&self.clip, &recovery.recovered, &woven)
                .map_err(|error| MpggError::host("splice", error))?
        };

        log::debug!("Recovered {} frames", recovery.recovered.len());
        self.log_report(&recovery.report, verbose);

        self.deinterlaced
            .retain(|position| recovery.recovered.binary_search(position).is_err());
        self.recovered.extend(&recovery.recovered);
        self.recovered.sort_unstable();
        self.recovered.dedup();
        self.plan = recovery.plan;
        self.clip = clip;
        self.report = Some(recovery.report);
        self.recovery_ran = true;
        Ok(self)
    }

    /// Deinterlace the frames that are still interlaced or mixed-field.
    ///
    /// `kernel` is called once per field order with a clip holding only the
    /// frames of that order, and must return a clip of the same length.
    ///
    /// # Errors
    ///
    /// Returns [`MpggError::Usage`] if the session already deinterlaced, or
    /// if it was declared mixed-scan and [`recover`](Session::recover) has
    /// not run. Returns [`MpggError::Kernel`] if the kernel fails or changes
    /// the frame count. The clip is left unchanged on error.
    pub fn deinterlace<K>(&mut self, kernel: K, verbose: bool) -> Result<&mut Self, MpggError>
    where
        K: FnMut(&H::Clip, FieldOrder) -> Result<H::Clip, BoxError>,
    {
        if self.deinterlace_ran {
            return Err(MpggError::Usage(
                "deinterlace() has already been applied to this session".to_string(),
            ));
        }
        if self.options.recovery_required && !self.recovery_ran {
            return Err(MpggError::Usage(
                "the source mixes scan types; call recover() before deinterlace()".to_string(),
            ));
        }

        let result = deinterlace(&mut self.host, &self.plan, &self.clip, kernel)?;
        log::debug!("Deinterlaced {} frames", result.altered.len());
        self.log_report(&result.report, verbose);

        self.clip = result.clip;
        self.deinterlaced = result.altered;
        self.report = Some(result.report);
        self.deinterlace_ran = true;
        Ok(self)
    }

    /// Convert VFR to CFR at the source frame rate by duplicating frames.
    ///
    /// A source that is not VFR is already constant rate: the plan and clip
    /// are left alone, but the session still counts as normalized.
    ///
    /// # Errors
    ///
    /// Returns [`MpggError::Rate`] if the session was already normalized.
    pub fn ceil(&mut self) -> Result<&mut Self, MpggError> {
        self.check_unnormalized()?;
        if !self.summary.variable_frame_rate {
            log::debug!("Source is not VFR, ceil() leaves the plan unchanged");
            self.report = Some(Report::new("ceil"));
            self.normalized = Some("ceil");
            return Ok(self);
        }
        let result = normalize::ceil(&self.plan, self.project.settings.frame_rate)?;
        self.commit_normalized("ceil", result)
    }

    /// Convert VFR to CFR by dropping one frame per pulldown cycle.
    ///
    /// The target rate is the source rate times `(cycle - 1) / cycle`, e.g.
    /// 24000/1001 for 2:3 pulldown on NTSC.
    ///
    /// # Errors
    ///
    /// Returns [`MpggError::Usage`] after [`recover`](Session::recover), and
    /// [`MpggError::Rate`] if the session was already normalized or no
    /// pulldown cycle was detected.
    pub fn floor(&mut self) -> Result<&mut Self, MpggError> {
        let rate = self
            .summary
            .pulldown
            .and_then(|cycle| decimated_rate(self.project.settings.frame_rate, cycle))
            .ok_or_else(|| {
                MpggError::Rate(
                    "no pulldown cycle was detected; use floor_to() with an explicit rate"
                        .to_string(),
                )
            })?;
        self.floor_to(rate)
    }

    /// Convert VFR to CFR at `rate` by dropping frames.
    ///
    /// # Errors
    ///
    /// As for [`floor`](Session::floor), plus [`MpggError::Rate`] for a rate
    /// of zero or below, or one with terms above 200000.
    pub fn floor_to(&mut self, rate: Rational64) -> Result<&mut Self, MpggError> {
        self.check_floor()?;
        let result = normalize::floor(&self.plan, rate)?;
        self.commit_normalized("floor", result)
    }

    /// Decimate interlaced sections with a fixed pattern.
    ///
    /// Interlaced runs keep the frames at `offsets` of every `cycle`;
    /// `None` keeps all but the last. Everything is retimed to the source
    /// rate times `(cycle - 1) / cycle`.
    ///
    /// # Errors
    ///
    /// As for [`floor`](Session::floor), plus [`MpggError::Rate`] for a
    /// cycle below 2 or invalid offsets.
    pub fn floor_pattern(&mut self, cycle: usize, offsets: Option<&[usize]>) -> Result<&mut Self, MpggError> {
        self.check_floor()?;
        let rate = decimated_rate(self.project.settings.frame_rate, cycle)
            .ok_or_else(|| MpggError::Rate(format!("cannot decimate with a cycle of {cycle}")))?;
        let default_offsets: Vec<usize> = (0..cycle.saturating_sub(1)).collect();
        let offsets = offsets.unwrap_or(&default_offsets);
        let result = normalize::floor_pattern(&self.plan, cycle, offsets, rate)?;
        self.commit_normalized("floor", result)
    }

    /// The current clip.
    pub fn clip(&self) -> &H::Clip {
        &self.clip
    }

    /// Consume the session and return the current clip.
    pub fn into_clip(self) -> H::Clip {
        self.clip
    }

    /// The current frame plan.
    pub fn plan(&self) -> &FramePlan {
        &self.plan
    }

    /// The loaded project.
    pub fn project(&self) -> &Project {
        &self.project
    }

    /// The host driving this session.
    pub fn host(&self) -> &H {
        &self.host
    }

    /// What was learned about the source when the session opened.
    pub fn summary(&self) -> &SourceSummary {
        &self.summary
    }

    /// Report of the last stage that ran.
    pub fn report(&self) -> Option<&Report> {
        self.report.as_ref()
    }

    /// Positions of recovered frames in the current plan.
    pub fn recovered(&self) -> &[usize] {
        &self.recovered
    }

    /// Positions of deinterlaced frames in the current plan.
    pub fn deinterlaced(&self) -> &[usize] {
        &self.deinterlaced
    }

    /// The rate change applied so far, `"ceil"` or `"floor"`.
    pub fn normalized(&self) -> Option<&'static str> {
        self.normalized
    }

    fn check_unnormalized(&self) -> Result<(), MpggError> {
        match self.normalized {
            Some(stage) => Err(MpggError::Rate(format!(
                "the frame rate was already normalized with {stage}()"
            ))),
            None => Ok(()),
        }
    }

    fn check_floor(&self) -> Result<(), MpggError> {
        if self.recovery_ran {
            return Err(MpggError::Usage(
                "floor() cannot follow recover(): field-matched frames no longer follow the pulldown cycle"
                    .to_string(),
            ));
        }
        self.check_unnormalized()
    }

    fn commit_normalized(&mut self, stage: &'static str, result: Normalized) -> Result<&mut Self, MpggError> {
        let clip = self
            .host
            .remap(&self.clip, &result.frames)
            .map_err(|error| MpggError::host("remap", error))?;

        log::debug!(
            "{stage}: {} frames -> {} frames",
            self.plan.len(),
            result.plan.len()
        );
        self.log_report(&result.report, false);

        self.recovered = remap_positions(&self.recovered, &result.frames);
        self.deinterlaced = remap_positions(&self.deinterlaced, &result.frames);
        self.plan = result.plan;
        self.clip = clip;
        self.report = Some(result.report);
        self.normalized = Some(stage);
        Ok(self)
    }

    fn log_report(&self, report: &Report, verbose: bool) {
        if verbose || self.options.verbose {
            report.log();
        }
    }
}

/// Positions in the output of a remap whose input position is in `marked`.
fn remap_positions(marked: &[usize], frames: &[usize]) -> Vec<usize> {
    frames
        .iter()
        .enumerate()
        .filter(|(_, from)| marked.binary_search(from).is_ok())
        .map(|(position, _)| position)
        .collect()
}
