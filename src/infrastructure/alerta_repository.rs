// Forecast API repository implementation
use crate::application::forecast_repository::{ForecastRepository, SimulationRun, TimeWindow};
use crate::domain::series::{QualifiedSeries, TimedValue, parse_instant};
use crate::domain::station::{SeriesMetadata, StationMetadata};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
pub struct AlertaRepository {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

#[derive(Debug, Deserialize)]
struct SeriesMetadataResponse {
    estacion: StationRef,
    var: NamedRef,
    unidades: NamedRef,
    #[serde(default)]
    percentiles_ref: Option<BTreeMap<u32, f64>>,
}

#[derive(Debug, Deserialize)]
struct StationRef {
    nombre: String,
    #[serde(default)]
    provincia: Option<String>,
    #[serde(default)]
    rio: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NamedRef {
    nombre: String,
}

#[derive(Debug, Deserialize)]
struct ObservationRow {
    timestart: String,
    valor: Option<NumberOrString>,
}

/// The API sends values as numbers or as numeric strings.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(f64),
    Text(String),
}

impl NumberOrString {
    fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(v) => Some(*v),
            Self::Text(s) => s.trim().parse().ok(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SimulationResponse {
    #[serde(default)]
    forecast_date: Option<String>,
    #[serde(default)]
    series: Vec<SimulationSeries>,
}

#[derive(Debug, Deserialize)]
struct SimulationSeries {
    #[serde(default)]
    series_id: Option<i64>,
    qualifier: String,
    #[serde(default)]
    pronosticos: Vec<ObservationRow>,
}

#[derive(Debug, Deserialize)]
struct StationFeature {
    geometry: Geometry,
    properties: StationProperties,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    #[serde(default)]
    coordinates: Vec<f64>,
}

#[derive(Debug, Deserialize)]
struct StationProperties {
    id: i64,
    nombre: String,
    #[serde(default)]
    pais: Option<String>,
    #[serde(default)]
    rio: Option<String>,
    #[serde(default)]
    tipo: Option<String>,
}

impl AlertaRepository {
    pub fn new(base_url: String, token: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    fn series_url(&self, obs_type: &str, series_id: i64) -> String {
        format!(
            "{}/obs/{}/series/{}",
            self.base_url,
            urlencoding::encode(obs_type),
            series_id
        )
    }

    fn observations_url(&self, obs_type: &str, series_id: i64, window: TimeWindow) -> String {
        format!(
            "{}/observaciones?timestart={}&timeend={}",
            self.series_url(obs_type, series_id),
            encode_instant(window.start),
            encode_instant(window.end)
        )
    }

    fn latest_run_url(&self, cal_id: i64, series_id: i64, window: Option<TimeWindow>) -> String {
        let (start, end) = window
            .map(|w| (encode_instant(w.start), encode_instant(w.end)))
            .unwrap_or_default();
        format!(
            "{}/sim/calibrados/{}/corridas/last?series_id={}&timestart={}&timeend={}&includeProno=true&group_by_qualifier=true",
            self.base_url, cal_id, series_id, start, end
        )
    }

    fn station_url(&self, obs_type: &str, station_id: i64) -> String {
        format!(
            "{}/obs/{}/estaciones/{}?format=geojson",
            self.base_url,
            urlencoding::encode(obs_type),
            station_id
        )
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .bearer_auth(&self.token)
            .header("Accept", "application/json")
            .send()
            .await
            .context("Failed to send request to forecast API")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Forecast API request failed with status {}: {}", status, body);
        }

        response
            .json::<T>()
            .await
            .context("Failed to parse forecast API response")
    }
}

fn encode_instant(at: DateTime<Utc>) -> String {
    urlencoding::encode(&at.to_rfc3339_opts(SecondsFormat::Millis, true)).into_owned()
}

/// Rows with unparseable timestamps are dropped; unparseable values become gaps.
fn to_timed_values(rows: Vec<ObservationRow>) -> Vec<TimedValue> {
    rows.into_iter()
        .filter_map(|row| {
            let value = row.valor.as_ref().and_then(NumberOrString::as_f64);
            match TimedValue::parse(&row.timestart, value) {
                Ok(v) => Some(v),
                Err(e) => {
                    tracing::warn!("Skipping sample: {}", e);
                    None
                }
            }
        })
        .collect()
}

fn to_series_metadata(response: SeriesMetadataResponse) -> SeriesMetadata {
    SeriesMetadata {
        station_name: response.estacion.nombre,
        province: response.estacion.provincia,
        river: response.estacion.rio,
        variable: response.var.nombre,
        units: response.unidades.nombre,
        percentiles_ref: response.percentiles_ref.unwrap_or_default(),
    }
}

fn to_simulation_run(response: SimulationResponse) -> SimulationRun {
    let forecast_date = response
        .forecast_date
        .as_deref()
        .and_then(|raw| match parse_instant(raw) {
            Ok(at) => Some(at),
            Err(e) => {
                tracing::warn!("Ignoring forecast date: {}", e);
                None
            }
        });

    let series = response
        .series
        .into_iter()
        .map(|s| QualifiedSeries::new(s.series_id, s.qualifier, to_timed_values(s.pronosticos)))
        .collect();

    SimulationRun {
        forecast_date,
        series,
    }
}

fn to_station_metadata(feature: StationFeature) -> StationMetadata {
    StationMetadata {
        id: feature.properties.id,
        name: feature.properties.nombre,
        country: feature.properties.pais,
        river: feature.properties.rio,
        kind: feature.properties.tipo,
        coordinates: feature.geometry.coordinates,
    }
}

#[async_trait]
impl ForecastRepository for AlertaRepository {
    async fn get_series_metadata(&self, obs_type: &str, series_id: i64) -> Result<SeriesMetadata> {
        let response: SeriesMetadataResponse = self.get_json(&self.series_url(obs_type, series_id)).await?;
        Ok(to_series_metadata(response))
    }

    async fn get_observations(
        &self,
        obs_type: &str,
        series_id: i64,
        window: TimeWindow,
    ) -> Result<Vec<TimedValue>> {
        let rows: Vec<ObservationRow> = self
            .get_json(&self.observations_url(obs_type, series_id, window))
            .await?;

        let values = to_timed_values(rows);
        tracing::debug!("Fetched {} observations of series {}", values.len(), series_id);
        Ok(values)
    }

    async fn get_latest_run(
        &self,
        cal_id: i64,
        series_id: i64,
        window: Option<TimeWindow>,
    ) -> Result<SimulationRun> {
        let response: SimulationResponse = self
            .get_json(&self.latest_run_url(cal_id, series_id, window))
            .await?;

        let run = to_simulation_run(response);
        tracing::debug!(
            "Fetched run of calibration {} with {} qualified series",
            cal_id,
            run.series.len()
        );
        Ok(run)
    }

    async fn get_station_metadata(&self, obs_type: &str, station_id: i64) -> Result<StationMetadata> {
        let feature: StationFeature = self.get_json(&self.station_url(obs_type, station_id)).await?;
        Ok(to_station_metadata(feature))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn repository() -> AlertaRepository {
        AlertaRepository::new("https://alerta.example.org/a6/".to_string(), "secret".to_string())
    }

    #[test]
    fn test_urls() {
        let repo = repository();
        let window = TimeWindow::new(
            Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 5, 8, 0, 0, 0).unwrap(),
        );

        assert_eq!(
            repo.observations_url("puntual", 29, window),
            "https://alerta.example.org/a6/obs/puntual/series/29/observaciones?timestart=2024-05-01T00%3A00%3A00.000Z&timeend=2024-05-08T00%3A00%3A00.000Z"
        );
        assert_eq!(
            repo.latest_run_url(288, 3403, None),
            "https://alerta.example.org/a6/sim/calibrados/288/corridas/last?series_id=3403&timestart=&timeend=&includeProno=true&group_by_qualifier=true"
        );
        assert_eq!(
            repo.station_url("puntual", 1843),
            "https://alerta.example.org/a6/obs/puntual/estaciones/1843?format=geojson"
        );
    }

    #[test]
    fn test_decode_simulation() {
        let body = r#"{
            "forecast_date": "2024-05-01T09:00:00.000Z",
            "series": [
                {"series_id": 3403, "qualifier": "main", "pronosticos": [
                    {"timestart": "2024-05-01T00:00:00.000Z", "valor": "2.5"},
                    {"timestart": "2024-05-01T03:00:00.000Z", "valor": 2.75},
                    {"timestart": "not a date", "valor": 1.0}
                ]},
                {"series_id": 3403, "qualifier": "p05", "pronosticos": []}
            ]
        }"#;

        let response: SimulationResponse = serde_json::from_str(body).unwrap();
        let run = to_simulation_run(response);

        assert_eq!(run.forecast_date, Some(Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap()));
        assert_eq!(run.series.len(), 2);
        assert_eq!(run.series[0].qualifier, "main");
        let values: Vec<_> = run.series[0].values.iter().map(|v| v.value).collect();
        assert_eq!(values, vec![Some(2.5), Some(2.75)]);
    }

    #[test]
    fn test_decode_observations_with_gaps() {
        let body = r#"[
            {"timestart": "2024-05-01T00:00:00.000Z", "valor": 1.8},
            {"timestart": "2024-05-01T01:00:00.000Z", "valor": null},
            {"timestart": "2024-05-01T02:00:00.000Z", "valor": "n/a"}
        ]"#;

        let rows: Vec<ObservationRow> = serde_json::from_str(body).unwrap();
        let values = to_timed_values(rows);
        assert_eq!(values.len(), 3);
        assert_eq!(values[0].value, Some(1.8));
        assert_eq!(values[1].value, None);
        assert_eq!(values[2].value, None);
    }

    #[test]
    fn test_decode_series_metadata() {
        let body = r#"{
            "estacion": {"nombre": "Rosario", "provincia": "Santa Fe", "rio": "Paraná"},
            "var": {"nombre": "Altura hidrométrica"},
            "unidades": {"nombre": "metros"},
            "percentiles_ref": {"5": 5.2, "95": 0.6}
        }"#;

        let response: SeriesMetadataResponse = serde_json::from_str(body).unwrap();
        let metadata = to_series_metadata(response);
        assert_eq!(metadata.station_name, "Rosario");
        assert_eq!(metadata.units, "metros");
        assert_eq!(metadata.percentiles_ref.get(&5), Some(&5.2));
        assert_eq!(metadata.percentiles_ref.get(&95), Some(&0.6));
    }

    #[test]
    fn test_decode_station_feature() {
        let body = r#"{
            "type": "Feature",
            "geometry": {"type": "Point", "coordinates": [-58.41, -34.56]},
            "properties": {"id": 1843, "nombre": "Aeroparque", "pais": "Argentina", "rio": null, "tipo": "M"}
        }"#;

        let feature: StationFeature = serde_json::from_str(body).unwrap();
        let station = to_station_metadata(feature);
        assert_eq!(station.id, 1843);
        assert_eq!(station.name, "Aeroparque");
        assert_eq!(station.river, None);
        assert_eq!(station.coordinates, vec![-58.41, -34.56]);
    }
}
