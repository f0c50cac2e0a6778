// Chart exports: CSV download and flattened chart rows
use super::aligner::AlignedEntry;
use chrono::SecondsFormat;
use serde_json::{Map, Value, json};
use std::io::Write;

const CSV_DELIMITER: u8 = b';';
const BASE_HEADERS: [&str; 5] = [
    "Fecha",
    "Nivel observado",
    "Nivel pronosticado",
    "Banda de error inferior",
    "Banda de error superior",
];

/// Write entries as a `;` separated table, one column per auxiliary series.
pub fn write_csv<W: Write>(
    entries: &[AlignedEntry],
    aux_columns: &[String],
    writer: W,
) -> anyhow::Result<()> {
    let mut csv = csv::WriterBuilder::new()
        .delimiter(CSV_DELIMITER)
        .from_writer(writer);

    let headers = BASE_HEADERS
        .iter()
        .map(|h| h.to_string())
        .chain(aux_columns.iter().cloned());
    csv.write_record(headers)?;

    for entry in entries {
        let (low, high) = entry
            .error_band
            .map_or((None, None), |band| (band.low, band.high));
        let mut record = vec![
            entry.date.to_rfc3339_opts(SecondsFormat::Millis, true),
            cell(entry.observed),
            cell(entry.estimated),
            cell(low),
            cell(high),
        ];
        record.extend((0..aux_columns.len()).map(|i| cell(aux_value(entry, i))));
        csv.write_record(&record)?;
    }

    csv.flush()?;
    Ok(())
}

/// Chart-ready rows keyed `date`, `observed`, `estimated`, `error_band`, `aux_<i>`.
pub fn flatten_entries(entries: &[AlignedEntry], aux_columns: &[String]) -> Vec<Value> {
    entries
        .iter()
        .map(|entry| {
            let mut row = Map::new();
            row.insert("date".into(), json!(entry.date.timestamp_millis()));
            row.insert("observed".into(), json!(entry.observed));
            row.insert("estimated".into(), json!(entry.estimated));
            row.insert(
                "error_band".into(),
                match entry.error_band {
                    Some(band) => json!([band.low, band.high]),
                    None => Value::Null,
                },
            );
            for i in 0..aux_columns.len() {
                row.insert(format!("aux_{}", i), json!(aux_value(entry, i)));
            }
            Value::Object(row)
        })
        .collect()
}

fn aux_value(entry: &AlignedEntry, slot: usize) -> Option<f64> {
    entry.auxiliary.get(slot).copied().flatten()
}

fn cell(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aligner::ErrorBand;
    use chrono::{TimeZone, Utc};

    fn entries() -> Vec<AlignedEntry> {
        vec![
            AlignedEntry {
                date: Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap(),
                observed: Some(1.25),
                estimated: None,
                error_band: None,
                auxiliary: vec![Some(0.5)],
            },
            AlignedEntry {
                date: Utc.with_ymd_and_hms(2024, 5, 1, 3, 0, 0).unwrap(),
                observed: None,
                estimated: Some(2.0),
                error_band: Some(ErrorBand { low: Some(1.5), high: None }),
                auxiliary: vec![],
            },
        ]
    }

    #[test]
    fn test_write_csv() {
        let mut out = Vec::new();
        write_csv(&entries(), &["Rosario".to_string()], &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(
            lines[0],
            "Fecha;Nivel observado;Nivel pronosticado;Banda de error inferior;Banda de error superior;Rosario"
        );
        assert_eq!(lines[1], "2024-05-01T00:00:00.000Z;1.25;;;;0.5");
        assert_eq!(lines[2], "2024-05-01T03:00:00.000Z;;2;1.5;;");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_flatten_entries() {
        let rows = flatten_entries(&entries(), &["Rosario".to_string()]);
        assert_eq!(rows[0]["date"], json!(1714521600000_i64));
        assert_eq!(rows[0]["error_band"], Value::Null);
        assert_eq!(rows[0]["aux_0"], json!(0.5));
        assert_eq!(rows[1]["error_band"], json!([1.5, null]));
        assert_eq!(rows[1]["aux_0"], Value::Null);
        assert_eq!(rows[1]["observed"], Value::Null);
    }
}
