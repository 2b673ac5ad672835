use std::collections::BTreeMap;

use thiserror::Error;

use super::model::{
    AccidentDataset, BoundingBox, Category, CellValue, Coordinate, EnrichedRecord, RawTable,
    RejectReason,
};

/// Substring that identifies the location column (compared uppercased).
pub const LOCATION_TOKEN: &str = "LOCATION";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("no column containing 'LOCATION' found; available columns: {available:?}")]
    MissingLocationColumn { available: Vec<String> },
}

// ---------------------------------------------------------------------------
// Column resolution
// ---------------------------------------------------------------------------

/// First column whose uppercased name contains `LOCATION`.
pub fn find_location_column(columns: &[String]) -> Option<usize> {
    columns
        .iter()
        .position(|c| c.to_uppercase().contains(LOCATION_TOKEN))
}

/// Index of the first candidate column present for each category.
fn resolve_categories(table: &RawTable) -> BTreeMap<Category, usize> {
    Category::ALL
        .into_iter()
        .filter_map(|cat| {
            cat.candidates()
                .iter()
                .find_map(|name| table.column_index(name))
                .map(|idx| (cat, idx))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Per-row parsing
// ---------------------------------------------------------------------------

/// Parse a `[lon, lat]` cell and validate it against `bbox`.
///
/// Brackets are optional: a single leading `[` and trailing `]` are stripped
/// when present. The first component is always the longitude.
pub fn parse_location(cell: &CellValue, bbox: &BoundingBox) -> Result<Coordinate, RejectReason> {
    let text = match cell {
        CellValue::Null => return Err(RejectReason::Missing),
        other => other.to_string(),
    };
    let text = text.trim();
    if text.is_empty() || text == "NaN" || text == "nan" {
        return Err(RejectReason::Missing);
    }

    let inner = text.strip_prefix('[').unwrap_or(text);
    let inner = inner.strip_suffix(']').unwrap_or(inner).trim();

    let parts: Vec<&str> = inner.split(',').collect();
    let [lon, lat] = parts.as_slice() else {
        return Err(RejectReason::PartCount);
    };

    let lon = parse_component(lon)?;
    let lat = parse_component(lat)?;

    let coord = Coordinate { lat, lon };
    if bbox.contains(&coord) {
        Ok(coord)
    } else {
        Err(RejectReason::OutOfBounds)
    }
}

fn parse_component(s: &str) -> Result<f64, RejectReason> {
    s.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or(RejectReason::NotNumeric)
}

// ---------------------------------------------------------------------------
// Normalizer
// ---------------------------------------------------------------------------

/// Turn a raw table into the session dataset.
///
/// Fails only when no location column exists; every row-level problem is
/// counted as a rejection.
pub fn normalize(table: &RawTable, bbox: &BoundingBox) -> Result<AccidentDataset, NormalizeError> {
    let loc_idx = find_location_column(&table.columns).ok_or_else(|| {
        NormalizeError::MissingLocationColumn {
            available: table.columns.clone(),
        }
    })?;
    let location_column = table.columns[loc_idx].clone();
    if table.is_empty() {
        log::warn!("Table has columns but no rows");
    }
    let categories = resolve_categories(table);

    log::debug!(
        "Location column '{location_column}', categories resolved: {:?}",
        categories
            .iter()
            .map(|(cat, idx)| (cat.name(), table.columns[*idx].as_str()))
            .collect::<Vec<_>>()
    );

    let mut records = Vec::with_capacity(table.len());
    let mut rejections: BTreeMap<RejectReason, usize> = BTreeMap::new();

    for (row_no, row) in table.rows.iter().enumerate() {
        let cell = row.get(loc_idx).unwrap_or(&CellValue::Null);
        match parse_location(cell, bbox) {
            Ok(coord) => {
                let mut rec = EnrichedRecord {
                    row: row_no,
                    lat: coord.lat,
                    lon: coord.lon,
                    ..Default::default()
                };
                for (cat, idx) in &categories {
                    if let Some(value) = row.get(*idx) {
                        *rec.field_mut(*cat) = value.to_string();
                    }
                }
                records.push(rec);
            }
            Err(reason) => {
                *rejections.entry(reason).or_default() += 1;
            }
        }
    }

    let resolved = categories
        .into_iter()
        .map(|(cat, idx)| (cat, table.columns[idx].clone()))
        .collect();

    let dataset = AccidentDataset::from_parts(records, rejections, location_column, resolved);
    log::info!(
        "Normalized {} rows: {} valid, {} rejected",
        table.len(),
        dataset.len(),
        dataset.rejected
    );
    if dataset.rejected > 0 {
        log::warn!("Rejected rows by reason: {:?}", dataset.rejections);
    }
    Ok(dataset)
}

/// The first `n` accepted coordinates as `Lat: .., Lon: ..` lines.
pub fn coordinate_preview(dataset: &AccidentDataset, n: usize) -> Vec<String> {
    dataset
        .coordinates
        .iter()
        .take(n)
        .enumerate()
        .map(|(i, c)| format!("{}. Lat: {:.6}, Lon: {:.6}", i + 1, c.lat, c.lon))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(v: &str) -> CellValue {
        CellValue::String(v.to_string())
    }

    fn table(columns: &[&str], rows: Vec<Vec<CellValue>>) -> RawTable {
        RawTable::new(columns.iter().map(|c| c.to_string()).collect(), rows)
    }

    fn parse(v: &str) -> Result<Coordinate, RejectReason> {
        parse_location(&s(v), &BoundingBox::MEDELLIN)
    }

    #[test]
    fn accepts_bracketed_lon_lat() {
        assert_eq!(parse("[-75.58, 6.25]"), Ok(Coordinate { lat: 6.25, lon: -75.58 }));
        assert_eq!(parse("  [-75.58,6.25]  "), Ok(Coordinate { lat: 6.25, lon: -75.58 }));
    }

    #[test]
    fn brackets_are_optional() {
        assert_eq!(parse("-75.58, 6.25"), Ok(Coordinate { lat: 6.25, lon: -75.58 }));
        assert_eq!(parse("[-75.58, 6.25"), Ok(Coordinate { lat: 6.25, lon: -75.58 }));
        // lat-first text parses but lands outside the box because order is never swapped
        assert_eq!(parse("6.25,-75.58"), Err(RejectReason::OutOfBounds));
    }

    #[test]
    fn rejects_malformed_values() {
        assert_eq!(parse("[100, 6.25]"), Err(RejectReason::OutOfBounds));
        assert_eq!(parse("[-75.58]"), Err(RejectReason::PartCount));
        assert_eq!(parse("[-75.58, 6.25, 0]"), Err(RejectReason::PartCount));
        assert_eq!(parse("[-75.58; 6.25]"), Err(RejectReason::PartCount));
        assert_eq!(parse("[abc, 6.25]"), Err(RejectReason::NotNumeric));
        assert_eq!(parse("[-75.58, inf]"), Err(RejectReason::NotNumeric));
        assert_eq!(parse("[[-75.58, 6.25]]"), Err(RejectReason::NotNumeric));
        assert_eq!(parse(""), Err(RejectReason::Missing));
        assert_eq!(parse("NaN"), Err(RejectReason::Missing));
        assert_eq!(parse("nan"), Err(RejectReason::Missing));
        assert_eq!(
            parse_location(&CellValue::Null, &BoundingBox::MEDELLIN),
            Err(RejectReason::Missing)
        );
        assert_eq!(
            parse_location(&CellValue::Float(6.25), &BoundingBox::MEDELLIN),
            Err(RejectReason::PartCount)
        );
    }

    #[test]
    fn narrow_box_rejects_outskirts() {
        let bbox = BoundingBox::MEDELLIN_URBAN;
        assert!(parse_location(&s("[-75.58, 6.25]"), &bbox).is_ok());
        assert_eq!(
            parse_location(&s("[-75.9, 6.25]"), &bbox),
            Err(RejectReason::OutOfBounds)
        );
    }

    #[test]
    fn location_column_match_is_case_insensitive_substring() {
        for name in ["location", "Location", "ACCIDENT_LOCATION"] {
            let cols = vec!["ID".to_string(), name.to_string()];
            assert_eq!(find_location_column(&cols), Some(1), "{name}");
        }
        let cols = vec!["LOCATION_A".to_string(), "location_b".to_string()];
        assert_eq!(find_location_column(&cols), Some(0));
        assert_eq!(find_location_column(&["LAT".to_string()]), None);
    }

    #[test]
    fn missing_location_column_is_fatal() {
        let t = table(&["LAT", "LON"], vec![vec![s("6.2"), s("-75.5")]]);
        let err = normalize(&t, &BoundingBox::MEDELLIN).unwrap_err();
        assert_eq!(
            err,
            NormalizeError::MissingLocationColumn {
                available: vec!["LAT".into(), "LON".into()]
            }
        );
    }

    #[test]
    fn counts_add_up_to_input_rows() {
        let t = table(
            &["LOCATION", "CLASE"],
            vec![
                vec![s("[-75.58, 6.25]"), s("Choque")],
                vec![s("[100, 6.25]"), s("Choque")],
                vec![s("6.25,-75.58"), s("Caída")],
                vec![CellValue::Null, s("Atropello")],
                vec![s("[-75.60, 6.21]"), s("Caída")],
                vec![s("garbage"), s("Otro")],
            ],
        );
        let ds = normalize(&t, &BoundingBox::MEDELLIN).unwrap();
        assert_eq!(ds.coordinates.len() + ds.rejected, t.len());
        assert_eq!(ds.coordinates.len(), ds.records.len());
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.rejected, 4);
        assert_eq!(ds.rejections[&RejectReason::OutOfBounds], 2);
        assert_eq!(ds.rejections[&RejectReason::Missing], 1);
        assert_eq!(ds.rejections[&RejectReason::PartCount], 1);
        assert_eq!(ds.coordinates[0], Coordinate { lat: 6.25, lon: -75.58 });
        assert_eq!(ds.records[1].row, 4);
    }

    #[test]
    fn enriches_with_first_present_candidate() {
        let t = table(
            &["Location", "CLASE", "CLASE_ACCIDENTE", "AÑO", "comuna"],
            vec![vec![
                s("[-75.58, 6.25]"),
                s("ignored"),
                s("Choque"),
                CellValue::Integer(2019),
                CellValue::Null,
            ]],
        );
        let ds = normalize(&t, &BoundingBox::MEDELLIN).unwrap();
        let rec = &ds.records[0];
        assert_eq!(rec.clase, "Choque");
        assert_eq!(rec.anio, "2019");
        assert_eq!(rec.comuna, "");
        assert_eq!(rec.barrio, "");
        assert_eq!(rec.gravedad, "");
        assert_eq!(ds.resolved[&Category::Clase], "CLASE_ACCIDENTE");
        assert_eq!(ds.resolved[&Category::Comuna], "comuna");
        assert!(!ds.resolved.contains_key(&Category::Barrio));
        assert_eq!(ds.location_column, "Location");
    }

    #[test]
    fn empty_table_normalizes_to_empty_dataset() {
        let t = table(&["LOCATION"], Vec::new());
        let ds = normalize(&t, &BoundingBox::MEDELLIN).unwrap();
        assert!(ds.is_empty());
        assert_eq!(ds.rejected, 0);
    }

    #[test]
    fn preview_formats_six_decimals() {
        let t = table(&["LOCATION"], vec![vec![s("[-75.58, 6.25]")]]);
        let ds = normalize(&t, &BoundingBox::MEDELLIN).unwrap();
        assert_eq!(
            coordinate_preview(&ds, 5),
            vec!["1. Lat: 6.250000, Lon: -75.580000".to_string()]
        );
    }
}
