// Series aligner - merges independently sampled series into date-indexed rows
use super::series::TimedValue;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet};

/// Low/high pair around the estimate. Either side may be missing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ErrorBand {
    pub low: Option<f64>,
    pub high: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AlignedEntry {
    pub date: DateTime<Utc>,
    pub observed: Option<f64>,
    pub estimated: Option<f64>,
    pub error_band: Option<ErrorBand>,
    pub auxiliary: Vec<Option<f64>>,
}

impl AlignedEntry {
    /// Lowest of band low, estimate and observation, ignoring gaps.
    pub fn value_floor(&self) -> Option<f64> {
        [
            self.error_band.and_then(|b| b.low),
            self.estimated,
            self.observed,
        ]
        .into_iter()
        .flatten()
        .reduce(f64::min)
    }

    /// Highest of band high, estimate and observation, ignoring gaps.
    pub fn value_ceiling(&self) -> Option<f64> {
        [
            self.error_band.and_then(|b| b.high),
            self.estimated,
            self.observed,
        ]
        .into_iter()
        .flatten()
        .reduce(f64::max)
    }
}

#[derive(Debug, Clone, Default)]
pub struct AlignmentSources {
    pub estimated: Vec<TimedValue>,
    pub observed: Vec<TimedValue>,
    pub low_band: Vec<TimedValue>,
    pub high_band: Vec<TimedValue>,
    pub auxiliary: Vec<Vec<TimedValue>>,
}

/// Index of one source by instant. Duplicate timestamps keep the first sample.
struct SampleIndex(BTreeMap<DateTime<Utc>, Option<f64>>);

impl SampleIndex {
    fn build(values: &[TimedValue]) -> Self {
        let mut index = BTreeMap::new();
        for v in values {
            index.entry(v.timestamp).or_insert(v.value);
        }
        Self(index)
    }

    fn contains(&self, date: &DateTime<Utc>) -> bool {
        self.0.contains_key(date)
    }

    fn get(&self, date: &DateTime<Utc>) -> Option<f64> {
        self.0.get(date).copied().flatten()
    }

    fn dates(&self) -> impl Iterator<Item = &DateTime<Utc>> {
        self.0.keys()
    }
}

/// Build one entry per distinct timestamp across all sources, ascending by date.
pub fn align(sources: &AlignmentSources) -> Vec<AlignedEntry> {
    let estimated = SampleIndex::build(&sources.estimated);
    let observed = SampleIndex::build(&sources.observed);
    let low = SampleIndex::build(&sources.low_band);
    let high = SampleIndex::build(&sources.high_band);
    let auxiliary: Vec<SampleIndex> = sources
        .auxiliary
        .iter()
        .map(|s| SampleIndex::build(s))
        .collect();

    let dates: BTreeSet<DateTime<Utc>> = [&estimated, &observed, &low, &high]
        .into_iter()
        .chain(auxiliary.iter())
        .flat_map(|index| index.dates().copied())
        .collect();

    dates
        .into_iter()
        .map(|date| {
            let error_band = if low.contains(&date) || high.contains(&date) {
                Some(ErrorBand {
                    low: low.get(&date),
                    high: high.get(&date),
                })
            } else {
                None
            };

            AlignedEntry {
                date,
                observed: observed.get(&date),
                estimated: estimated.get(&date),
                error_band,
                auxiliary: auxiliary.iter().map(|a| a.get(&date)).collect(),
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct WindEntry {
    pub date: DateTime<Utc>,
    pub direction: Option<f64>,
    pub velocity: Option<f64>,
}

/// Wind direction and velocity observations merged the same way as [`align`].
pub fn align_wind(direction: &[TimedValue], velocity: &[TimedValue]) -> Vec<WindEntry> {
    let direction = SampleIndex::build(direction);
    let velocity = SampleIndex::build(velocity);

    let dates: BTreeSet<DateTime<Utc>> = direction
        .dates()
        .chain(velocity.dates())
        .copied()
        .collect();

    dates
        .into_iter()
        .map(|date| WindEntry {
            date,
            direction: direction.get(&date),
            velocity: velocity.get(&date),
        })
        .collect()
}
