//! Deinterlace dispatcher.
//!
//! Frames that are still interlaced or mixed-field are pulled out of the clip
//! in two sub-clips, one per field order, handed to the caller's kernel, and
//! spliced back at their original positions. Progressive frames, including
//! recovered ones, never reach the kernel.

use crate::{
    error::{BoxError, MpggError},
    frame::{FieldOrder, FramePlan},
    host::ClipHost,
    report::{Action, Report},
};

/// Outcome of a deinterlace pass.
#[derive(Debug, Clone)]
pub struct Deinterlaced<C> {
    /// The clip with processed frames spliced in.
    pub clip: C,
    /// Positions that went through the kernel, ascending.
    pub altered: Vec<usize>,
    /// One entry per frame of the plan.
    pub report: Report,
}

/// Run `kernel` over the non-progressive frames of `clip`.
///
/// The kernel receives a sub-clip holding only frames of one field order and
/// must return a clip of the same length.
///
/// # Errors
///
/// Returns [`MpggError::Kernel`] if the kernel fails or returns a clip of a
/// different length, and [`MpggError::Host`] if the host cannot cut or splice
/// the clip. `clip` itself is never modified.
pub fn deinterlace<H, K>(
    host: &mut H,
    plan: &FramePlan,
    clip: &H::Clip,
    mut kernel: K,
) -> Result<Deinterlaced<H::Clip>, MpggError>
where
    H: ClipHost,
    K: FnMut(&H::Clip, FieldOrder) -> Result<H::Clip, BoxError>,
{
    let mut tff = Vec::new();
    let mut bff = Vec::new();
    for position in plan.interlaced_positions() {
        match plan.records()[position].field_order() {
            FieldOrder::Tff => tff.push(position),
            FieldOrder::Bff => bff.push(position),
        }
    }

    let mut current = clip.clone();
    for (order, positions) in [(FieldOrder::Tff, &tff), (FieldOrder::Bff, &bff)] {
        if positions.is_empty() {
            continue;
        }
        log::debug!("Deinterlacing {} {order} frames", positions.len());

        let subset = host
            .remap(&current, positions)
            .map_err(|error| MpggError::host("remap", error))?;
        let processed = kernel(&subset, order).map_err(|error| MpggError::Kernel {
            reason: format!(
                "kernel failed on {} {order} frames starting at frame {}: {error}",
                positions.len(),
                positions[0]
            ),
        })?;

        let produced = host.frame_count(&processed);
        if produced != positions.len() {
            return Err(MpggError::Kernel {
                reason: format!(
                    "kernel returned {produced} frames for {} {order} frames; only single-rate kernels are supported",
                    positions.len()
                ),
            });
        }

        current = host
            .splice(&current, positions, &processed)
            .map_err(|error| MpggError::host("splice", error))?;
    }

    let mut altered: Vec<usize> = tff.iter().chain(&bff).copied().collect();
    altered.sort_unstable();

    let mut report = Report::new("deinterlace");
    for (position, record) in plan.records().iter().enumerate() {
        if altered.binary_search(&position).is_ok() {
            report.push(
                position,
                Action::Deinterlaced {
                    order: record.field_order(),
                },
            );
        } else {
            report.push(position, Action::PassedThrough);
        }
    }

    Ok(Deinterlaced {
        clip: current,
        altered,
        report,
    })
}
