//! Scan classifier.
//!
//! Runs of interlaced pictures are unpacked at field level: every picture
//! contributes its fields in display order (first field, second field, and the
//! first field again when RFF is set), and consecutive fields are paired into
//! displayed frames. A pair whose fields come from two pictures becomes a
//! [`ScanType::MixedField`] record. This is how hard-coded 3:2 field repeats
//! on interlaced material turn into a flat per-displayed-frame plan.
//!
//! Progressive pictures are left alone; their RFF stays in the record's
//! duration for [`crate::normalize`] to deal with.

use num_rational::Rational64;

use crate::{
    frame::{FieldParity, FramePlan, FrameRecord, ScanType},
    report::{Action, Report},
};

#[derive(Debug, Clone, Copy)]
struct Field {
    source: usize,
    parity: FieldParity,
}

/// Expand interlaced runs into displayed frames.
///
/// `field` is the duration of one field at the nominal frame rate. Pairs
/// never borrow a field across a progressive picture; a field left without a
/// partner (odd field count or a parity glitch) is folded into the previous
/// displayed frame as a plain repeat.
pub fn classify(plan: &FramePlan, field: Rational64) -> (FramePlan, Report) {
    let records = plan.records();
    let mut output = Vec::with_capacity(records.len());
    let mut report = Report::new("classify");

    let mut start = 0;
    while start < records.len() {
        if !is_expandable(&records[start]) {
            output.push(records[start].clone());
            start += 1;
            continue;
        }
        let end = records[start..]
            .iter()
            .position(|record| !is_expandable(record))
            .map_or(records.len(), |offset| start + offset);
        expand_run(&records[start..end], field, &mut output, &mut report);
        start = end;
    }

    log::debug!(
        "Classified {} pictures into {} displayed frames",
        records.len(),
        output.len()
    );

    (FramePlan::from_parts(output, plan.source_count()), report)
}

fn is_expandable(record: &FrameRecord) -> bool {
    record.scan == ScanType::Interlaced && !record.is_synthesized() && record.top == record.bottom
}

fn expand_run(
    run: &[FrameRecord],
    field: Rational64,
    output: &mut Vec<FrameRecord>,
    report: &mut Report,
) {
    let run_start = output.len();
    let mut pending: Option<Field> = None;

    for record in run {
        let first = if record.tff { FieldParity::Top } else { FieldParity::Bottom };
        let count = (record.duration / field).to_integer().max(2);
        for k in 0..count {
            let current = Field {
                source: record.source,
                parity: if k % 2 == 0 { first } else { first.opposite() },
            };
            match pending.take() {
                None => pending = Some(current),
                Some(previous) if previous.parity == current.parity => {
                    fold(previous, field, run_start, output, report);
                    pending = Some(current);
                }
                Some(previous) => {
                    let frame = pair(previous, current, field);
                    if frame.scan == ScanType::MixedField {
                        report.push(output.len(), Action::Expanded { source: current.source });
                    }
                    output.push(frame);
                }
            }
        }
    }

    if let Some(dangling) = pending {
        fold(dangling, field, run_start, output, report);
    }
}

fn pair(first: Field, second: Field, field: Rational64) -> FrameRecord {
    let (top, bottom) = match first.parity {
        FieldParity::Top => (first.source, second.source),
        FieldParity::Bottom => (second.source, first.source),
    };
    let tff = first.parity == FieldParity::Top;
    if top == bottom {
        FrameRecord::interlaced(top, tff, field * 2)
    } else {
        FrameRecord::mixed(top, bottom, tff, field * 2)
    }
}

/// Duration wins over field structure: an unpaired field extends the frame
/// before it instead of being matched across a boundary.
fn fold(
    dangling: Field,
    field: Rational64,
    run_start: usize,
    output: &mut Vec<FrameRecord>,
    report: &mut Report,
) {
    if output.len() > run_start {
        let position = output.len() - 1;
        if let Some(last) = output.last_mut() {
            last.duration += field;
        }
        report.push(position, Action::Expanded { source: dangling.source });
    } else {
        output.push(FrameRecord::interlaced(
            dangling.source,
            dangling.parity == FieldParity::Top,
            field,
        ));
    }
}
