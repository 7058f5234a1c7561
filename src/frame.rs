//! Frame records and the frame plan.
//!
//! A [`FramePlan`] is the ordered output timeline: one [`FrameRecord`] per
//! output frame, each naming the coded pictures its top and bottom fields
//! come from. Stages rewrite, insert or drop records but never reorder them.

use std::fmt::{Display, Formatter, Result as FmtResult};

use num_rational::Rational64;

use crate::error::MpggError;

/// How a frame's two fields relate to each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScanType {
    /// One full image.
    Progressive,
    /// Two fields of the same picture captured at different times.
    Interlaced,
    /// Top and bottom fields taken from two different (adjacent) pictures.
    MixedField,
}

impl Display for ScanType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let name = match self {
            ScanType::Progressive => "progressive",
            ScanType::Interlaced => "interlaced",
            ScanType::MixedField => "mixed-field",
        };
        f.write_str(name)
    }
}

/// Field parity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldParity {
    /// Even lines.
    Top,
    /// Odd lines.
    Bottom,
}

impl FieldParity {
    /// The other parity.
    pub fn opposite(self) -> Self {
        match self {
            FieldParity::Top => FieldParity::Bottom,
            FieldParity::Bottom => FieldParity::Top,
        }
    }
}

/// Temporal field order handed to deinterlace kernels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldOrder {
    /// Top field first.
    Tff,
    /// Bottom field first.
    Bff,
}

impl Display for FieldOrder {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(match self {
            FieldOrder::Tff => "TFF",
            FieldOrder::Bff => "BFF",
        })
    }
}

/// Where a record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Origin {
    /// Straight from the index (possibly expanded by the classifier).
    Source,
    /// Reassembled into a progressive frame by recovery.
    Recovered,
    /// Inserted by VFR→CFR ceiling.
    Duplicated,
}

/// One output frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameRecord {
    /// Coded picture this record was derived from.
    pub source: usize,
    /// Current scan classification.
    pub scan: ScanType,
    /// Coded picture supplying the top field.
    pub top: usize,
    /// Coded picture supplying the bottom field.
    pub bottom: usize,
    /// Top field is displayed first.
    pub tff: bool,
    /// Display duration in seconds.
    pub duration: Rational64,
    /// Whether the record is original or synthesized.
    pub origin: Origin,
}

impl FrameRecord {
    /// A progressive record of a single picture.
    pub fn progressive(source: usize, duration: Rational64) -> Self {
        Self {
            source,
            scan: ScanType::Progressive,
            top: source,
            bottom: source,
            tff: true,
            duration,
            origin: Origin::Source,
        }
    }

    /// An interlaced record of a single picture.
    pub fn interlaced(source: usize, tff: bool, duration: Rational64) -> Self {
        Self {
            source,
            scan: ScanType::Interlaced,
            top: source,
            bottom: source,
            tff,
            duration,
            origin: Origin::Source,
        }
    }

    /// A record whose fields come from two different pictures.
    pub fn mixed(top: usize, bottom: usize, tff: bool, duration: Rational64) -> Self {
        Self {
            source: top.min(bottom),
            scan: ScanType::MixedField,
            top,
            bottom,
            tff,
            duration,
            origin: Origin::Source,
        }
    }

    /// `true` for recovered and duplicated records.
    pub fn is_synthesized(&self) -> bool {
        self.origin != Origin::Source
    }

    /// Picture supplying the field of the given parity.
    pub fn field(&self, parity: FieldParity) -> usize {
        match parity {
            FieldParity::Top => self.top,
            FieldParity::Bottom => self.bottom,
        }
    }

    /// Field order of this record.
    pub fn field_order(&self) -> FieldOrder {
        if self.tff { FieldOrder::Tff } else { FieldOrder::Bff }
    }
}

/// The ordered output timeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FramePlan {
    records: Vec<FrameRecord>,
    source_count: usize,
}

impl FramePlan {
    /// Build a plan over `source_count` coded pictures.
    ///
    /// # Errors
    ///
    /// Returns [`MpggError::Usage`] if a record references a picture outside
    /// `0..source_count` or does not last a positive time.
    pub fn new(records: Vec<FrameRecord>, source_count: usize) -> Result<Self, MpggError> {
        for (position, record) in records.iter().enumerate() {
            if record.source >= source_count
                || record.top >= source_count
                || record.bottom >= source_count
            {
                return Err(MpggError::Usage(format!(
                    "frame {position} references a picture outside 0..{source_count}"
                )));
            }
            if record.duration <= Rational64::from_integer(0) {
                return Err(MpggError::Usage(format!(
                    "frame {position} has a duration of {}s",
                    record.duration
                )));
            }
        }
        Ok(Self {
            records,
            source_count,
        })
    }

    /// Records in output order.
    pub fn records(&self) -> &[FrameRecord] {
        &self.records
    }

    /// Number of coded pictures the plan draws from.
    pub fn source_count(&self) -> usize {
        self.source_count
    }

    /// Number of output frames.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// `true` when the plan has no frames.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Sum of all record durations.
    pub fn total_duration(&self) -> Rational64 {
        self.records
            .iter()
            .fold(Rational64::from_integer(0), |total, record| total + record.duration)
    }

    /// Positions of records that are not progressive.
    pub fn interlaced_positions(&self) -> Vec<usize> {
        self.records
            .iter()
            .enumerate()
            .filter(|(_, record)| record.scan != ScanType::Progressive)
            .map(|(position, _)| position)
            .collect()
    }

    pub(crate) fn records_mut(&mut self) -> &mut [FrameRecord] {
        &mut self.records
    }

    pub(crate) fn from_parts(records: Vec<FrameRecord>, source_count: usize) -> Self {
        Self {
            records,
            source_count,
        }
    }
}
