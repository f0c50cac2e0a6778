// Repository trait for forecast API access
use crate::domain::series::{QualifiedSeries, TimedValue};
use crate::domain::station::{SeriesMetadata, StationMetadata};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Latest run of a calibrated model, one tagged series per qualifier.
#[derive(Debug, Clone, Default)]
pub struct SimulationRun {
    pub forecast_date: Option<DateTime<Utc>>,
    pub series: Vec<QualifiedSeries>,
}

/// Closed time window of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }
}

#[async_trait]
pub trait ForecastRepository: Send + Sync {
    /// Station, variable and units of an observed series
    async fn get_series_metadata(&self, obs_type: &str, series_id: i64) -> anyhow::Result<SeriesMetadata>;

    /// Observations of a series inside the window
    async fn get_observations(
        &self,
        obs_type: &str,
        series_id: i64,
        window: TimeWindow,
    ) -> anyhow::Result<Vec<TimedValue>>;

    /// Last run of a calibration for one simulated series, grouped by qualifier.
    /// Without a window the API returns the whole run.
    async fn get_latest_run(
        &self,
        cal_id: i64,
        series_id: i64,
        window: Option<TimeWindow>,
    ) -> anyhow::Result<SimulationRun>;

    /// Station location and description
    async fn get_station_metadata(&self, obs_type: &str, station_id: i64) -> anyhow::Result<StationMetadata>;
}
