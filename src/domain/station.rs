// Station and series metadata domain models
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeriesMetadata {
    pub station_name: String,
    pub province: Option<String>,
    pub river: Option<String>,
    pub variable: String,
    pub units: String,
    /// Reference percentiles of the variable, keyed by percentile.
    pub percentiles_ref: BTreeMap<u32, f64>,
}

impl SeriesMetadata {
    /// Chart heading, e.g. "Rosario (Paraná)".
    pub fn display_name(&self) -> String {
        match self.river.as_deref().map(str::trim) {
            Some(river) if !river.is_empty() => format!("{} ({})", self.station_name, river),
            _ => self.station_name.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StationMetadata {
    pub id: i64,
    pub name: String,
    pub country: Option<String>,
    pub river: Option<String>,
    pub kind: Option<String>,
    /// GeoJSON point coordinates, longitude first.
    pub coordinates: Vec<f64>,
}
