// Wind service - Use case for the wind sub-chart of meteorological pages
use crate::application::forecast_repository::{ForecastRepository, TimeWindow};
use crate::application::hydrometric_service::HydrometricService;
use crate::domain::aligner::align_wind;
use crate::domain::chart::WindChart;
use crate::infrastructure::config::{PageConfig, PageType};
use anyhow::{Context, bail};
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

#[derive(Clone)]
pub struct WindService {
    repository: Arc<dyn ForecastRepository>,
}

impl WindService {
    pub fn new(repository: Arc<dyn ForecastRepository>) -> Self {
        Self { repository }
    }

    /// Meteorological pages always carry the wind sub-chart; other pages only
    /// when a `wind` section is configured. `None` when there is none to draw.
    pub async fn build_chart(
        &self,
        page: &PageConfig,
        now: DateTime<Utc>,
        requested: Option<TimeWindow>,
    ) -> anyhow::Result<Option<WindChart>> {
        let wind = match (page.page_type, &page.wind) {
            (_, Some(wind)) => wind,
            (PageType::Meteorological, None) => {
                bail!("Page {} is missing the wind chart parameters", page.id)
            }
            (PageType::ObservedWithSimulation, None) => return Ok(None),
        };

        // wind forecasts reach past the end of the observation window
        let observed = HydrometricService::observation_window(page, now, requested);
        let window = TimeWindow::new(observed.start, observed.end + Duration::days(wind.timeend_days));

        let station = self
            .repository
            .get_station_metadata(&page.obs_type, wind.station_id)
            .await
            .with_context(|| format!("Failed to fetch station {}", wind.station_id))?;

        let (velocity, direction) = futures::try_join!(
            self.repository
                .get_observations(&page.obs_type, wind.series_id_wind_vel, window),
            self.repository
                .get_observations(&page.obs_type, wind.series_id_wind_dir, window),
        )
        .context("Failed to fetch wind observations")?;

        let entries = align_wind(&direction, &velocity);
        tracing::debug!("Aligned {} wind entries for page {}", entries.len(), page.id);

        Ok(Some(WindChart::new(station, entries)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::hydrometric_service::tests::{InMemoryRepository, page, t, values};
    use crate::domain::station::StationMetadata;
    use crate::infrastructure::config::WindConfig;

    fn wind_page() -> PageConfig {
        let mut page = page();
        page.wind = Some(WindConfig {
            station_id: 1843,
            series_id_wind_vel: 3344,
            series_id_wind_dir: 3345,
            timeend_days: 15,
        });
        page
    }

    fn repository() -> InMemoryRepository {
        let mut repo = InMemoryRepository::default();
        repo.stations.insert(
            1843,
            StationMetadata {
                id: 1843,
                name: "Aeroparque".to_string(),
                ..Default::default()
            },
        );
        repo.observations.insert(3344, values(&[(0, 12.0), (1, 14.0)]));
        repo.observations.insert(3345, values(&[(1, 180.0), (2, 200.0)]));
        repo
    }

    #[tokio::test]
    async fn test_build_wind_chart() {
        let repo = Arc::new(repository());
        let service = WindService::new(repo.clone());

        let chart = service.build_chart(&wind_page(), t(12), None).await.unwrap().unwrap();
        assert_eq!(chart.station.name, "Aeroparque");
        assert_eq!(chart.entries.len(), 3);
        assert_eq!(chart.entries[0].velocity, Some(12.0));
        assert_eq!(chart.entries[0].direction, None);
        assert_eq!(chart.entries[1].direction, Some(180.0));

        let windows = repo.windows.lock().unwrap();
        assert!(windows.iter().all(|(_, w)| w.end == t(12) + Duration::days(15)));
    }

    #[tokio::test]
    async fn test_page_without_wind() {
        let service = WindService::new(Arc::new(repository()));
        assert!(service.build_chart(&page(), t(12), None).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_meteorological_page_requires_wind() {
        let service = WindService::new(Arc::new(repository()));
        let mut page = page();
        page.page_type = PageType::Meteorological;

        let err = service.build_chart(&page, t(12), None).await.unwrap_err();
        assert!(err.to_string().contains("missing the wind chart parameters"));

        page.wind = wind_page().wind;
        assert!(service.build_chart(&page, t(12), None).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_requested_window_moves_wind_window() {
        let repo = Arc::new(repository());
        let service = WindService::new(repo.clone());
        let requested = TimeWindow::new(t(0), t(6));

        service.build_chart(&wind_page(), t(12), Some(requested)).await.unwrap();

        let windows = repo.windows.lock().unwrap();
        assert_eq!(windows.len(), 2);
        assert!(
            windows
                .iter()
                .all(|(_, w)| *w == TimeWindow::new(t(0), t(6) + Duration::days(15)))
        );
    }
}
