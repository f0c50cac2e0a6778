use crate::domain::viewport::ReferenceLines;
use anyhow::Context;
use serde::Deserialize;

pub const DEFAULT_CONFIG_PATH: &str = "config/dashboard";
const ENV_PREFIX: &str = "HYDRO";

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub api: ApiSettings,
    #[serde(default)]
    pub pages: Vec<PageConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiSettings {
    pub base_url: String,
    #[serde(default)]
    pub token: String,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum PageType {
    #[serde(rename = "serieObsConSim")]
    ObservedWithSimulation,
    #[serde(rename = "meteorological")]
    Meteorological,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PageConfig {
    pub id: String,
    pub page_type: PageType,
    /// Observation kind in the API path ("puntual", "areal", ...)
    pub obs_type: String,
    pub series_id_obs: i64,
    pub station_name: String,
    pub title: Option<String>,
    pub cal_id: Option<i64>,
    pub series_id_sim: Option<i64>,
    #[serde(default = "default_time_start_days")]
    pub time_start_days: i64,
    #[serde(default)]
    pub time_end_days: i64,
    #[serde(default = "default_main_qualifier")]
    pub main_qualifier: String,
    pub error_band_low: Option<String>,
    pub error_band_high: Option<String>,
    #[serde(default)]
    pub ref_lines: ReferenceLines,
    #[serde(default)]
    pub auxiliary: Vec<AuxSeriesConfig>,
    pub wind: Option<WindConfig>,
}

impl PageConfig {
    /// Calibration and simulated series id, when the page shows a forecast.
    pub fn simulation(&self) -> Option<(i64, i64)> {
        self.cal_id.zip(self.series_id_sim)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuxSeriesConfig {
    pub obs_type: String,
    pub series_id: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WindConfig {
    pub station_id: i64,
    pub series_id_wind_vel: i64,
    pub series_id_wind_dir: i64,
    #[serde(default = "default_wind_timeend_days")]
    pub timeend_days: i64,
}

fn default_time_start_days() -> i64 {
    7
}

fn default_main_qualifier() -> String {
    "main".to_string()
}

fn default_wind_timeend_days() -> i64 {
    15
}

impl AppConfig {
    pub fn page(&self, id: &str) -> anyhow::Result<&PageConfig> {
        self.pages
            .iter()
            .find(|p| p.id == id)
            .with_context(|| format!("Page {} not found in configuration", id))
    }
}

/// Load `<path>.toml` (or any format the config crate recognises), overlaid
/// with `HYDRO__`-prefixed environment variables.
pub fn load_app_config(path: &str) -> anyhow::Result<AppConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name(path))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__"),
        )
        .build()
        .with_context(|| format!("Failed to load configuration from {}", path))?;

    Ok(settings.try_deserialize()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[api]
base_url = "https://alerta.example.org/a6"
token = "secret"

[[pages]]
id = "rosario"
page_type = "serieObsConSim"
obs_type = "puntual"
series_id_obs = 29
station_name = "Rosario"
cal_id = 288
series_id_sim = 3403
error_band_low = "p05"
error_band_high = "p95"

[pages.ref_lines]
bottom = 0.5
top = 5.1

[[pages.auxiliary]]
obs_type = "puntual"
series_id = 34

[[pages]]
id = "baires-wind"
page_type = "meteorological"
obs_type = "puntual"
series_id_obs = 52
station_name = "Buenos Aires"
time_start_days = 3

[pages.wind]
station_id = 1843
series_id_wind_vel = 3344
series_id_wind_dir = 3345
"#;

    fn sample() -> AppConfig {
        config::Config::builder()
            .add_source(config::File::from_str(SAMPLE, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_page_defaults() {
        let cfg = sample();
        let page = cfg.page("rosario").unwrap();

        assert_eq!(page.page_type, PageType::ObservedWithSimulation);
        assert_eq!(page.time_start_days, 7);
        assert_eq!(page.time_end_days, 0);
        assert_eq!(page.main_qualifier, "main");
        assert_eq!(page.simulation(), Some((288, 3403)));
        assert_eq!(page.ref_lines.bottom, Some(0.5));
        assert_eq!(page.ref_lines.low, None);
        assert_eq!(page.auxiliary.len(), 1);
        assert!(page.wind.is_none());
    }

    #[test]
    fn test_wind_page() {
        let cfg = sample();
        let page = cfg.page("baires-wind").unwrap();

        assert_eq!(page.page_type, PageType::Meteorological);
        assert_eq!(page.time_start_days, 3);
        assert_eq!(page.simulation(), None);
        assert_eq!(page.ref_lines, ReferenceLines::default());
        let wind = page.wind.as_ref().unwrap();
        assert_eq!(wind.timeend_days, 15);
        assert_eq!(wind.series_id_wind_dir, 3345);
    }

    #[test]
    fn test_missing_page() {
        let cfg = sample();
        let err = cfg.page("nowhere").unwrap_err();
        assert_eq!(err.to_string(), "Page nowhere not found in configuration");
    }
}
