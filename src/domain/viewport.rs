// Viewport controller - visible time/value window over aligned entries
use super::aligner::AlignedEntry;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Offset added around the data extent of the value axis.
const VALUE_OFFSET: f64 = 1.0;
/// Margin kept between the outermost reference lines and the axis edge.
const REFERENCE_MARGIN: f64 = 0.4;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimeBound {
    Full,
    At(DateTime<Utc>),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ValueBound {
    Full,
    At(f64),
}

/// Fixed horizontal guides, e.g. alert thresholds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ReferenceLines {
    pub bottom: Option<f64>,
    pub low: Option<f64>,
    pub up: Option<f64>,
    pub top: Option<f64>,
}

impl ReferenceLines {
    /// Override lines with the series' reference percentiles where published:
    /// bottom from p95, low from p75, up from p25, top from p5.
    pub fn with_percentiles(self, percentiles: &BTreeMap<u32, f64>) -> Self {
        Self {
            bottom: percentiles.get(&95).copied().or(self.bottom),
            low: percentiles.get(&75).copied().or(self.low),
            up: percentiles.get(&25).copied().or(self.up),
            top: percentiles.get(&5).copied().or(self.top),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PendingSelection {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewportMode {
    Full,
    Zoomed,
    Selecting,
}

#[derive(Debug, Clone)]
pub struct Viewport {
    entries: Vec<AlignedEntry>,
    visible_range: (TimeBound, TimeBound),
    value_range: (ValueBound, ValueBound),
    pending: PendingSelection,
    reference_lines: ReferenceLines,
}

impl Viewport {
    /// `entries` must be ascending by date, as produced by the aligner.
    pub fn new(entries: Vec<AlignedEntry>, reference_lines: ReferenceLines) -> Self {
        Self {
            entries,
            visible_range: (TimeBound::Full, TimeBound::Full),
            value_range: (ValueBound::Full, ValueBound::Full),
            pending: PendingSelection::default(),
            reference_lines,
        }
    }

    pub fn entries(&self) -> &[AlignedEntry] {
        &self.entries
    }

    pub fn visible_range(&self) -> (TimeBound, TimeBound) {
        self.visible_range
    }

    pub fn value_range(&self) -> (ValueBound, ValueBound) {
        self.value_range
    }

    pub fn pending_selection(&self) -> PendingSelection {
        self.pending
    }

    pub fn reference_lines(&self) -> ReferenceLines {
        self.reference_lines
    }

    pub fn mode(&self) -> ViewportMode {
        if self.pending.start.is_some() {
            ViewportMode::Selecting
        } else if self.visible_range == (TimeBound::Full, TimeBound::Full) {
            ViewportMode::Full
        } else {
            ViewportMode::Zoomed
        }
    }

    /// Press: anchor a new selection.
    pub fn begin_selection(&mut self, at: DateTime<Utc>) {
        self.pending = PendingSelection {
            start: Some(at),
            end: None,
        };
    }

    /// Move: drag the free end. Ignored until a selection has begun.
    pub fn extend_selection(&mut self, at: DateTime<Utc>) {
        if self.pending.start.is_some() {
            self.pending.end = Some(at);
        }
    }

    pub fn begin_or_extend_selection(&mut self, at: DateTime<Utc>) {
        if self.pending.start.is_none() {
            self.begin_selection(at);
        } else {
            self.extend_selection(at);
        }
    }

    /// Release: zoom into the pending selection, or drop it when degenerate.
    pub fn commit_selection(&mut self) {
        let pending = std::mem::take(&mut self.pending);

        let (start, end) = match (pending.start, pending.end) {
            (Some(start), Some(end)) if start != end => (start.min(end), start.max(end)),
            _ => {
                tracing::debug!("Discarding degenerate selection {:?}", pending);
                return;
            }
        };

        let (bottom, top) = zoomed_value_domain(self.entries_between(start, end));
        tracing::debug!(
            "Zooming to {} .. {} (values {} .. {})",
            start, end, bottom, top
        );

        self.visible_range = (TimeBound::At(start), TimeBound::At(end));
        self.value_range = (ValueBound::At(bottom), ValueBound::At(top));
    }

    pub fn reset_zoom(&mut self) {
        self.pending = PendingSelection::default();
        self.visible_range = (TimeBound::Full, TimeBound::Full);
        self.value_range = (ValueBound::Full, ValueBound::Full);
    }

    /// Swap in a freshly aligned data set and return to the full view.
    pub fn replace(&mut self, entries: Vec<AlignedEntry>) {
        self.entries = entries;
        self.reset_zoom();
    }

    /// Entries inside the visible time window.
    pub fn visible_entries(&self) -> &[AlignedEntry] {
        match self.visible_range {
            (TimeBound::At(start), TimeBound::At(end)) => self.entries_between(start, end),
            (TimeBound::At(start), TimeBound::Full) => {
                let from = self.entries.partition_point(|e| e.date < start);
                &self.entries[from..]
            }
            (TimeBound::Full, TimeBound::At(end)) => {
                let to = self.entries.partition_point(|e| e.date <= end);
                &self.entries[..to]
            }
            (TimeBound::Full, TimeBound::Full) => &self.entries,
        }
    }

    /// Concrete time window; `None` when a full bound has no data to extend to.
    pub fn resolved_time_range(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let left = match self.visible_range.0 {
            TimeBound::At(t) => t,
            TimeBound::Full => self.entries.first()?.date,
        };
        let right = match self.visible_range.1 {
            TimeBound::At(t) => t,
            TimeBound::Full => self.entries.last()?.date,
        };
        Some((left, right))
    }

    /// Concrete value-axis bounds. Full bounds follow the data extent widened
    /// so the outer reference lines stay visible.
    pub fn resolved_value_range(&self) -> (f64, f64) {
        let (data_min, data_max) = full_extent(&self.entries);

        let bottom = match self.value_range.0 {
            ValueBound::At(v) => v,
            ValueBound::Full => {
                let from_data = data_min - VALUE_OFFSET;
                match self.reference_lines.bottom {
                    Some(line) => from_data.min(line - REFERENCE_MARGIN),
                    None => from_data,
                }
            }
        };
        let top = match self.value_range.1 {
            ValueBound::At(v) => v,
            ValueBound::Full => {
                let from_data = data_max + VALUE_OFFSET;
                match self.reference_lines.top {
                    Some(line) => from_data.max(line + REFERENCE_MARGIN),
                    None => from_data,
                }
            }
        };
        (bottom, top)
    }

    fn entries_between(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> &[AlignedEntry] {
        let from = self.entries.partition_point(|e| e.date < start);
        let to = self.entries.partition_point(|e| e.date <= end);
        if from >= to {
            &[]
        } else {
            &self.entries[from..to]
        }
    }
}

/// Min/max of the given per-entry extents; an empty set collapses to zero.
fn fold_extent(extents: impl Iterator<Item = (Option<f64>, Option<f64>)>) -> (f64, f64) {
    let (min, max) = extents.fold(
        (f64::INFINITY, f64::NEG_INFINITY),
        |(min, max), (floor, ceiling)| {
            (
                floor.map_or(min, |v| min.min(v)),
                ceiling.map_or(max, |v| max.max(v)),
            )
        },
    );
    (finite_or_zero(min), finite_or_zero(max))
}

/// Extent of everything drawn on the value axis, auxiliary series included.
fn full_extent(entries: &[AlignedEntry]) -> (f64, f64) {
    fold_extent(entries.iter().map(|entry| {
        let aux = entry.auxiliary.iter().flatten().copied();
        (
            entry.value_floor().into_iter().chain(aux.clone()).reduce(f64::min),
            entry.value_ceiling().into_iter().chain(aux).reduce(f64::max),
        )
    }))
}

/// Zoom bounds follow the band, estimate and observation only.
fn zoomed_value_domain(entries: &[AlignedEntry]) -> (f64, f64) {
    let (min, max) = fold_extent(entries.iter().map(|e| (e.value_floor(), e.value_ceiling())));
    (min.floor() - VALUE_OFFSET, max.ceil() + VALUE_OFFSET)
}

fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() { v } else { 0.0 }
}
