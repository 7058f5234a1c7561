//! Recovery engine.
//!
//! An interlaced frame next to a mixed-field frame drawn from the same pair of
//! adjacent pictures can be rebuilt as a progressive frame: the neighbour
//! offers the field that belongs to the other picture of the pair and the
//! interlaced frame keeps its own field of the opposite parity.
//!
//! Only the two immediate neighbours are considered, previous first, so a
//! progressive frame is never reached across.

use crate::{
    frame::{FieldParity, FramePlan, FrameRecord, Origin, ScanType},
    report::{Action, Report},
};

/// Outcome of a recovery pass.
#[derive(Debug, Clone)]
pub struct Recovery {
    /// The rewritten plan. Same length as the input.
    pub plan: FramePlan,
    /// Positions of the recovered frames, ascending.
    pub recovered: Vec<usize>,
    /// One `Recovered` entry per recovered frame.
    pub report: Report,
}

/// Recover progressive frames from matching field pairs.
pub fn recover(plan: &FramePlan) -> Recovery {
    let input = plan.records();
    let mut output = plan.clone();
    let mut recovered = Vec::new();
    let mut report = Report::new("recover");

    for (position, record) in input.iter().enumerate() {
        if record.scan != ScanType::Interlaced || record.origin != Origin::Source {
            continue;
        }

        let previous = position.checked_sub(1).and_then(|p| input.get(p));
        let next = input.get(position + 1);
        let Some((top, bottom)) = previous
            .and_then(|neighbour| match_fields(record, neighbour))
            .or_else(|| next.and_then(|neighbour| match_fields(record, neighbour)))
        else {
            continue;
        };

        let target = &mut output.records_mut()[position];
        target.top = top;
        target.bottom = bottom;
        target.scan = ScanType::Progressive;
        target.origin = Origin::Recovered;

        recovered.push(position);
        report.push(position, Action::Recovered { top, bottom });
    }

    log::debug!("Recovered {} of {} frames", recovered.len(), input.len());

    Recovery {
        plan: output,
        recovered,
        report,
    }
}

/// Returns the `(top, bottom)` provenance of the rebuilt frame when
/// `neighbour` offers a compatible field.
fn match_fields(target: &FrameRecord, neighbour: &FrameRecord) -> Option<(usize, usize)> {
    if neighbour.scan != ScanType::MixedField || neighbour.is_synthesized() {
        return None;
    }
    let source = target.source;
    let (low, high) = (
        neighbour.top.min(neighbour.bottom),
        neighbour.top.max(neighbour.bottom),
    );
    if high != low + 1 || (low != source && high != source) {
        return None;
    }

    let offered = if neighbour.top != source {
        FieldParity::Top
    } else {
        FieldParity::Bottom
    };
    let partner = neighbour.field(offered);
    let kept = target.field(offered.opposite());

    Some(match offered {
        FieldParity::Top => (partner, kept),
        FieldParity::Bottom => (kept, partner),
    })
}
