//! VFR to CFR normalization.
//!
//! All timing is done on [`Rational64`] seconds, so long sequences never
//! drift. A constant-rate timeline with tick `T` has one slot per tick, and
//! a frame spanning `[start, end)` owns the slots whose sampling instant
//! falls inside that span.
//!
//! * [`ceil`] samples at the start of each slot, so a frame owns
//!   `ceil(end/T) - ceil(start/T)` slots and the output has
//!   `ceil(total/T)` frames. Duplicates go right after the frame they
//!   repeat. It never drops, so every frame must last at least one tick.
//! * [`floor`] samples at the middle of each slot, which keeps every frame
//!   of a clean 2:3 cadence exactly once. Frames owning no slot are dropped;
//!   a frame owning several is still kept only once.
//! * [`floor_pattern`] decimates interlaced sections with a fixed
//!   cycle/offset pattern and retimes progressive sections.

use num_rational::Rational64;

use crate::{
    error::MpggError,
    frame::{FramePlan, FrameRecord, Origin},
    loader::is_plausible_rate,
    report::{Action, Report},
    utilities::{group_runs, select_every},
};

/// Outcome of a normalization pass.
#[derive(Debug, Clone)]
pub struct Normalized {
    /// The constant-rate plan; every duration is one target tick.
    pub plan: FramePlan,
    /// For each output frame, its position in the input plan. Feed this to
    /// [`ClipHost::remap`](crate::ClipHost::remap).
    pub frames: Vec<usize>,
    /// `Duplicated` or `Dropped` entries.
    pub report: Report,
}

fn check_input(plan: &FramePlan, rate: Rational64) -> Result<Rational64, MpggError> {
    if !is_plausible_rate(rate) {
        return Err(MpggError::Rate(format!(
            "cannot normalize to a frame rate of {rate}"
        )));
    }
    if let Some(position) = plan
        .records()
        .iter()
        .position(|record| record.origin == Origin::Duplicated)
    {
        return Err(MpggError::Rate(format!(
            "frame {position} was already inserted by a previous rate change"
        )));
    }
    Ok(rate.recip())
}

/// Slots of length `tick` whose sampling instant (`phase` into the slot)
/// falls inside `[start, end)`.
fn owned_slots(start: Rational64, end: Rational64, tick: Rational64, phase: Rational64) -> i64 {
    (((end - phase) / tick).ceil() - ((start - phase) / tick).ceil()).to_integer()
}

/// Convert to `rate` by duplicating frames.
///
/// # Errors
///
/// Returns [`MpggError::Rate`] if `rate` is not positive or has terms above
/// 200000, if the plan already holds duplicated frames, or if a frame is
/// shorter than one tick.
pub fn ceil(plan: &FramePlan, rate: Rational64) -> Result<Normalized, MpggError> {
    let tick = check_input(plan, rate)?;
    let phase = Rational64::from_integer(0);
    let mut output = Vec::with_capacity(plan.len());
    let mut frames = Vec::with_capacity(plan.len());
    let mut report = Report::new("ceil");

    let mut start = Rational64::from_integer(0);
    for (position, record) in plan.records().iter().enumerate() {
        let end = start + record.duration;
        let slots = owned_slots(start, end, tick, phase);
        if slots < 1 {
            return Err(MpggError::Rate(format!(
                "frame {position} lasts {}s, less than one tick at {rate} fps",
                record.duration
            )));
        }

        let first = output.len();
        output.push(FrameRecord {
            duration: tick,
            ..record.clone()
        });
        frames.push(position);
        for _ in 1..slots {
            report.push(output.len(), Action::Duplicated { of: first });
            output.push(FrameRecord {
                duration: tick,
                origin: Origin::Duplicated,
                ..record.clone()
            });
            frames.push(position);
        }
        start = end;
    }

    log::debug!(
        "Ceiled {} frames to {} at {rate} fps",
        plan.len(),
        output.len()
    );

    Ok(Normalized {
        plan: FramePlan::from_parts(output, plan.source_count()),
        frames,
        report,
    })
}

/// Convert to `rate` by dropping frames.
///
/// # Errors
///
/// Returns [`MpggError::Rate`] if `rate` is not positive or has terms above
/// 200000, or if the plan already holds duplicated frames.
pub fn floor(plan: &FramePlan, rate: Rational64) -> Result<Normalized, MpggError> {
    let tick = check_input(plan, rate)?;
    let phase = tick / 2;
    let mut output = Vec::with_capacity(plan.len());
    let mut frames = Vec::with_capacity(plan.len());
    let mut report = Report::new("floor");

    let mut start = Rational64::from_integer(0);
    for (position, record) in plan.records().iter().enumerate() {
        let end = start + record.duration;
        let slots = owned_slots(start, end, tick, phase);
        if slots == 0 {
            report.push(position, Action::Dropped { source: record.source });
        } else {
            if slots > 1 {
                log::warn!(
                    "Frame {position} spans {slots} slots at {rate} fps; keeping it once"
                );
            }
            output.push(FrameRecord {
                duration: tick,
                ..record.clone()
            });
            frames.push(position);
        }
        start = end;
    }

    log::debug!(
        "Floored {} frames to {} at {rate} fps",
        plan.len(),
        output.len()
    );

    Ok(Normalized {
        plan: FramePlan::from_parts(output, plan.source_count()),
        frames,
        report,
    })
}

/// Decimate interlaced sections by pattern and retime the rest to `rate`.
///
/// Within each run of non-progressive frames the frames at `offsets` of every
/// `cycle` are kept. Progressive runs are kept whole.
///
/// # Errors
///
/// Returns [`MpggError::Rate`] for a rate [`ceil`] rejects, already duplicated
/// frames, or offsets that are empty, out of the cycle, or as many as the cycle.
pub fn floor_pattern(
    plan: &FramePlan,
    cycle: usize,
    offsets: &[usize],
    rate: Rational64,
) -> Result<Normalized, MpggError> {
    let tick = check_input(plan, rate)?;
    if offsets.is_empty() || offsets.len() >= cycle || offsets.iter().any(|&o| o >= cycle) {
        return Err(MpggError::Rate(format!(
            "invalid offsets {offsets:?} for a cycle of {cycle}: need 1 to {} offsets below {cycle}",
            cycle.saturating_sub(1)
        )));
    }

    let interlaced = plan.interlaced_positions();
    let mut dropped = Vec::new();
    for section in group_runs(&interlaced) {
        dropped.extend(select_every(&section, cycle, offsets, true));
    }
    dropped.sort_unstable();

    let mut output = Vec::with_capacity(plan.len() - dropped.len());
    let mut frames = Vec::with_capacity(plan.len() - dropped.len());
    let mut report = Report::new("floor");
    for (position, record) in plan.records().iter().enumerate() {
        if dropped.binary_search(&position).is_ok() {
            report.push(position, Action::Dropped { source: record.source });
            continue;
        }
        output.push(FrameRecord {
            duration: tick,
            ..record.clone()
        });
        frames.push(position);
    }

    log::debug!(
        "Decimated {} of {} frames (cycle {cycle}, offsets {offsets:?})",
        dropped.len(),
        plan.len()
    );

    Ok(Normalized {
        plan: FramePlan::from_parts(output, plan.source_count()),
        frames,
        report,
    })
}

/// Target rate for decimating one frame out of every `cycle`, `None` for a
/// cycle below 2 or one so large the rate overflows.
pub fn decimated_rate(frame_rate: Rational64, cycle: usize) -> Option<Rational64> {
    let cycle = i64::try_from(cycle).ok().filter(|&cycle| cycle >= 2)?;
    let numerator = frame_rate.numer().checked_mul(cycle - 1)?;
    let denominator = frame_rate.denom().checked_mul(cycle)?;
    Some(Rational64::new(numerator, denominator))
}
