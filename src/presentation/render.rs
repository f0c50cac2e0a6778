// Mapper from chart domain models to the JSON payload consumed by the chart surface
use crate::domain::aligner::WindEntry;
use crate::domain::chart::{HydroChart, WindChart};
use crate::domain::export::flatten_entries;
use crate::domain::viewport::{ReferenceLines, ViewportMode};
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Serialize)]
pub struct ChartPayload {
    pub title: String,
    pub station: String,
    pub variable: String,
    pub units: String,
    /// Epoch milliseconds
    pub forecast_date: Option<i64>,
    pub aux_columns: Vec<String>,
    pub mode: ViewportMode,
    pub visible_range: Option<(i64, i64)>,
    pub value_range: (f64, f64),
    pub reference_lines: ReferenceLines,
    pub rows: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wind: Option<WindPayload>,
}

#[derive(Debug, Serialize)]
pub struct WindPayload {
    pub station: String,
    pub coordinates: Vec<f64>,
    pub rows: Vec<WindRow>,
}

#[derive(Debug, Serialize)]
pub struct WindRow {
    pub date: i64,
    pub wind_direction_obs: Option<f64>,
    pub wind_velocity_obs: Option<f64>,
}

pub fn chart_to_payload(chart: &HydroChart, wind: Option<&WindChart>) -> ChartPayload {
    let viewport = &chart.viewport;

    ChartPayload {
        title: chart.title.clone(),
        station: chart.metadata.station_name.clone(),
        variable: chart.metadata.variable.clone(),
        units: chart.metadata.units.clone(),
        forecast_date: chart.forecast_date.map(|d| d.timestamp_millis()),
        aux_columns: chart.aux_columns.clone(),
        mode: viewport.mode(),
        visible_range: viewport
            .resolved_time_range()
            .map(|(left, right)| (left.timestamp_millis(), right.timestamp_millis())),
        value_range: viewport.resolved_value_range(),
        reference_lines: viewport.reference_lines(),
        rows: flatten_entries(viewport.entries(), &chart.aux_columns),
        wind: wind.map(wind_to_payload),
    }
}

fn wind_to_payload(chart: &WindChart) -> WindPayload {
    WindPayload {
        station: chart.station.name.clone(),
        coordinates: chart.station.coordinates.clone(),
        rows: chart.entries.iter().map(wind_row).collect(),
    }
}

fn wind_row(entry: &WindEntry) -> WindRow {
    WindRow {
        date: entry.date.timestamp_millis(),
        wind_direction_obs: entry.direction,
        wind_velocity_obs: entry.velocity,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aligner::{AlignmentSources, align};
    use crate::domain::series::TimedValue;
    use crate::domain::station::{SeriesMetadata, StationMetadata};
    use crate::domain::viewport::Viewport;
    use chrono::{TimeZone, Utc};

    fn chart() -> HydroChart {
        let t0 = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        let t1 = Utc.with_ymd_and_hms(2024, 5, 1, 1, 0, 0).unwrap();
        let sources = AlignmentSources {
            observed: vec![TimedValue::new(t0, Some(2.0))],
            estimated: vec![TimedValue::new(t1, Some(3.0))],
            ..Default::default()
        };
        HydroChart::new(
            "Rosario".to_string(),
            SeriesMetadata {
                station_name: "Rosario".to_string(),
                variable: "Altura hidrométrica".to_string(),
                units: "m".to_string(),
                ..Default::default()
            },
            Some(t1),
            vec![],
            Viewport::new(align(&sources), ReferenceLines::default()),
        )
    }

    #[test]
    fn test_chart_payload() {
        let payload = chart_to_payload(&chart(), None);
        assert_eq!(payload.mode, ViewportMode::Full);
        assert_eq!(payload.value_range, (1.0, 4.0));
        assert_eq!(payload.visible_range, Some((1714521600000, 1714525200000)));
        assert_eq!(payload.forecast_date, Some(1714525200000));
        assert_eq!(payload.rows.len(), 2);

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["mode"], "full");
        assert!(json.get("wind").is_none());
    }

    #[test]
    fn test_wind_payload() {
        let wind = WindChart::new(
            StationMetadata {
                id: 1,
                name: "Aeroparque".to_string(),
                ..Default::default()
            },
            vec![WindEntry {
                date: Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap(),
                direction: Some(90.0),
                velocity: None,
            }],
        );
        let payload = chart_to_payload(&chart(), Some(&wind));
        let wind = payload.wind.unwrap();
        assert_eq!(wind.station, "Aeroparque");
        assert_eq!(wind.rows[0].wind_direction_obs, Some(90.0));
        assert_eq!(wind.rows[0].wind_velocity_obs, None);
    }
}
