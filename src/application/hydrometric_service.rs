// Hydrometric service - Use case for building observed/forecast charts
use crate::application::forecast_repository::{ForecastRepository, TimeWindow};
use crate::domain::aligner::{AlignmentSources, align};
use crate::domain::chart::HydroChart;
use crate::domain::series::{TimedValue, select_by_qualifier, select_optional_qualifier};
use crate::domain::viewport::Viewport;
use crate::infrastructure::config::{AuxSeriesConfig, PageConfig};
use anyhow::Context;
use chrono::{DateTime, Duration, Utc};
use futures::future::join_all;
use std::sync::Arc;

#[derive(Clone)]
pub struct HydrometricService {
    repository: Arc<dyn ForecastRepository>,
}

/// An auxiliary observation series that could be fetched.
struct AuxSeries {
    name: String,
    values: Vec<TimedValue>,
}

impl HydrometricService {
    pub fn new(repository: Arc<dyn ForecastRepository>) -> Self {
        Self { repository }
    }

    /// Observation window of a page: the requested one, or the page's day
    /// offsets relative to `now`.
    pub fn observation_window(
        page: &PageConfig,
        now: DateTime<Utc>,
        requested: Option<TimeWindow>,
    ) -> TimeWindow {
        requested.unwrap_or_else(|| {
            TimeWindow::new(
                now - Duration::days(page.time_start_days),
                now - Duration::days(page.time_end_days),
            )
        })
    }

    pub async fn build_chart(
        &self,
        page: &PageConfig,
        now: DateTime<Utc>,
        requested: Option<TimeWindow>,
    ) -> anyhow::Result<HydroChart> {
        let window = Self::observation_window(page, now, requested);
        tracing::info!(
            "Building chart for page {} ({} .. {})",
            page.id, window.start, window.end
        );

        let mut metadata = self
            .repository
            .get_series_metadata(&page.obs_type, page.series_id_obs)
            .await
            .with_context(|| format!("Failed to fetch metadata of series {}", page.series_id_obs))?;
        if metadata.station_name.trim().is_empty() {
            metadata.station_name = page.station_name.clone();
        }

        let observed = self
            .repository
            .get_observations(&page.obs_type, page.series_id_obs, window)
            .await
            .with_context(|| format!("Failed to fetch observations of series {}", page.series_id_obs))?;

        let auxiliary = self.fetch_auxiliary(&page.auxiliary, window).await;

        let mut sources = AlignmentSources {
            observed,
            auxiliary: auxiliary.iter().map(|a| a.values.clone()).collect(),
            ..Default::default()
        };

        let mut forecast_date = None;
        if let Some((cal_id, series_id_sim)) = page.simulation() {
            let run = self
                .repository
                .get_latest_run(cal_id, series_id_sim, None)
                .await
                .with_context(|| format!("Failed to fetch last run of calibration {}", cal_id))?;

            sources.estimated = select_by_qualifier(&run.series, &page.main_qualifier)?.to_vec();
            sources.low_band =
                select_optional_qualifier(&run.series, page.error_band_low.as_deref())?.to_vec();
            sources.high_band =
                select_optional_qualifier(&run.series, page.error_band_high.as_deref())?.to_vec();
            forecast_date = run.forecast_date;
        }

        let entries = align(&sources);
        tracing::debug!("Aligned {} entries for page {}", entries.len(), page.id);

        let reference_lines = page.ref_lines.with_percentiles(&metadata.percentiles_ref);
        let title = page
            .title
            .clone()
            .unwrap_or_else(|| metadata.display_name());

        Ok(HydroChart::new(
            title,
            metadata,
            forecast_date,
            auxiliary.into_iter().map(|a| a.name).collect(),
            Viewport::new(entries, reference_lines),
        ))
    }

    /// Auxiliary series are optional: a failing one is left out of the chart.
    async fn fetch_auxiliary(&self, configs: &[AuxSeriesConfig], window: TimeWindow) -> Vec<AuxSeries> {
        let requests = configs.iter().map(|aux| async move {
            let metadata = self
                .repository
                .get_series_metadata(&aux.obs_type, aux.series_id)
                .await?;
            let values = self
                .repository
                .get_observations(&aux.obs_type, aux.series_id, window)
                .await?;
            anyhow::Ok(AuxSeries {
                name: metadata.station_name,
                values,
            })
        });

        join_all(requests)
            .await
            .into_iter()
            .zip(configs)
            .filter_map(|(result, aux)| match result {
                Ok(series) => Some(series),
                Err(e) => {
                    tracing::warn!("Skipping auxiliary series {}: {:#}", aux.series_id, e);
                    None
                }
            })
            .collect()
    }
}
