// Chart domain models
use super::aligner::WindEntry;
use super::station::{SeriesMetadata, StationMetadata};
use super::viewport::Viewport;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone)]
pub struct HydroChart {
    pub title: String,
    pub metadata: SeriesMetadata,
    /// Issue time of the forecast run, drawn as a vertical marker.
    pub forecast_date: Option<DateTime<Utc>>,
    /// Display names of the auxiliary series, parallel to `AlignedEntry::auxiliary`.
    pub aux_columns: Vec<String>,
    pub viewport: Viewport,
}

impl HydroChart {
    pub fn new(
        title: String,
        metadata: SeriesMetadata,
        forecast_date: Option<DateTime<Utc>>,
        aux_columns: Vec<String>,
        viewport: Viewport,
    ) -> Self {
        Self {
            title,
            metadata,
            forecast_date,
            aux_columns,
            viewport,
        }
    }
}

#[derive(Debug, Clone)]
pub struct WindChart {
    pub station: StationMetadata,
    pub entries: Vec<WindEntry>,
}

impl WindChart {
    pub fn new(station: StationMetadata, entries: Vec<WindEntry>) -> Self {
        Self { station, entries }
    }
}
