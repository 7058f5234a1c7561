//! Frame metadata loader.
//!
//! Turns a [`Project`] into the initial [`FramePlan`]: one record per coded
//! picture, scan type taken from the progressive_frame flag and duration from
//! the number of fields the picture is displayed for.

use num_rational::Rational64;

use crate::{
    error::MpggError,
    frame::{FramePlan, FrameRecord},
    project::Project,
};

/// Largest numerator or denominator accepted in a frame rate. DVD rates stay
/// far below it (60000/1001), and it keeps the duration sums of an index
/// with tens of millions of pictures inside `i64`.
pub(crate) const MAX_RATE_TERM: i64 = 200_000;

/// `true` for a positive rate whose terms are at most [`MAX_RATE_TERM`].
pub(crate) fn is_plausible_rate(rate: Rational64) -> bool {
    rate > Rational64::from_integer(0)
        && *rate.numer() <= MAX_RATE_TERM
        && *rate.denom() <= MAX_RATE_TERM
}

/// Duration of a single field at the project's nominal frame rate.
pub(crate) fn field_duration(frame_rate: Rational64) -> Rational64 {
    frame_rate.recip() / 2
}

/// Build the initial plan.
///
/// `clip_frames` is the frame count the host reports for the loaded clip
/// with RFF not applied; it must match the number of indexed pictures.
///
/// # Errors
///
/// Returns [`MpggError::Load`] if the project has no pictures, declares a
/// frame rate of zero or below or with terms above 200000, or disagrees with
/// the clip's frame count.
pub fn load_plan(project: &Project, clip_frames: usize) -> Result<FramePlan, MpggError> {
    let fail = |reason: String| MpggError::Load {
        path: project.path.clone(),
        reason,
    };

    if project.pictures.is_empty() {
        return Err(fail("project does not index any pictures".to_string()));
    }

    let frame_rate = project.settings.frame_rate;
    if !is_plausible_rate(frame_rate) {
        return Err(fail(format!("invalid frame rate {frame_rate}")));
    }

    if clip_frames != project.pictures.len() {
        return Err(fail(format!(
            "project indexes {} pictures but the source clip has {clip_frames} frames",
            project.pictures.len()
        )));
    }

    let field = field_duration(frame_rate);
    let records = project
        .pictures
        .iter()
        .enumerate()
        .map(|(index, flags)| {
            let duration = field * flags.field_count();
            if flags.progressive_frame {
                FrameRecord {
                    tff: flags.tff,
                    ..FrameRecord::progressive(index, duration)
                }
            } else {
                FrameRecord::interlaced(index, flags.tff, duration)
            }
        })
        .collect();

    log::debug!(
        "Loaded {} pictures from {}",
        project.pictures.len(),
        project.path.display()
    );

    Ok(FramePlan::from_parts(records, project.pictures.len()))
}
