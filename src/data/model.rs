use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

// ---------------------------------------------------------------------------
// CellValue – a single cell of the raw source table
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value mirroring what a CSV reader infers.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl fmt::Display for CellValue {
    /// The string form categories are compared against. `Null` renders empty.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::String(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Null => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// RawTable – the table as handed over by the loader
// ---------------------------------------------------------------------------

/// Column names plus rows of cells. Every row has exactly `columns.len()` cells.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl RawTable {
    /// Build a table, padding short rows with `Null` and dropping surplus cells.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<CellValue>>) -> Self {
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, CellValue::Null);
                row
            })
            .collect();
        RawTable { columns, rows }
    }

    /// Position of the column with exactly this name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Column names and the first `n` rows as display text.
    pub fn preview(&self, n: usize) -> RawPreview {
        RawPreview {
            columns: self.columns.clone(),
            rows: self
                .rows
                .iter()
                .take(n)
                .map(|row| row.iter().map(CellValue::to_string).collect())
                .collect(),
            total_rows: self.len(),
        }
    }
}

/// What the source table looked like before normalization.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawPreview {
    /// Source column names, in file order.
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub total_rows: usize,
}

// ---------------------------------------------------------------------------
// Coordinates and the validity box
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

/// Inclusive latitude/longitude rectangle used as an outlier filter.
#[derive(Debug, Clone, Copy, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    /// Municipal extent of Medellín used by the first dashboards.
    pub const MEDELLIN: BoundingBox = BoundingBox {
        min_lat: 6.0,
        max_lat: 6.5,
        min_lon: -76.0,
        max_lon: -75.0,
    };

    /// Tighter urban-area box.
    pub const MEDELLIN_URBAN: BoundingBox = BoundingBox {
        min_lat: 6.1,
        max_lat: 6.4,
        min_lon: -75.7,
        max_lon: -75.5,
    };

    pub fn contains(&self, c: &Coordinate) -> bool {
        (self.min_lat..=self.max_lat).contains(&c.lat)
            && (self.min_lon..=self.max_lon).contains(&c.lon)
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        BoundingBox::MEDELLIN
    }
}

// ---------------------------------------------------------------------------
// Category – the fixed set of filterable fields
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Category {
    Anio,
    Clase,
    Gravedad,
    Barrio,
    Comuna,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown category '{0}'")]
pub struct UnknownCategory(pub String);

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Anio,
        Category::Clase,
        Category::Gravedad,
        Category::Barrio,
        Category::Comuna,
    ];

    /// Field name in the enriched schema.
    pub fn name(self) -> &'static str {
        match self {
            Category::Anio => "año",
            Category::Clase => "clase",
            Category::Gravedad => "gravedad",
            Category::Barrio => "barrio",
            Category::Comuna => "comuna",
        }
    }

    /// Human label for the filter panel.
    pub fn label(self) -> &'static str {
        match self {
            Category::Anio => "Year",
            Category::Clase => "Accident type",
            Category::Gravedad => "Severity",
            Category::Barrio => "Neighborhood",
            Category::Comuna => "District",
        }
    }

    /// Source column names tried in order; the first one present wins.
    pub fn candidates(self) -> &'static [&'static str] {
        match self {
            Category::Anio => &[
                "AÑO",
                "AÑO_ACCIDENTE",
                "ANO",
                "ANIO",
                "año",
                "Año",
                "ano",
                "anio",
            ],
            Category::Clase => &[
                "CLASE_ACCIDENTE",
                "CLASE",
                "clase_accidente",
                "clase",
                "Clase",
            ],
            Category::Gravedad => &[
                "GRAVEDAD_ACCIDENTE",
                "GRAVEDAD",
                "gravedad_accidente",
                "gravedad",
                "Gravedad",
            ],
            Category::Barrio => &["BARRIO", "barrio", "Barrio"],
            Category::Comuna => &["COMUNA", "comuna", "Comuna"],
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        if matches!(lower.as_str(), "ano" | "anio" | "year") {
            return Ok(Category::Anio);
        }
        Category::ALL
            .into_iter()
            .find(|c| c.name() == lower)
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// EnrichedRecord – one accepted accident
// ---------------------------------------------------------------------------

/// A validated coordinate plus best-effort category fields.
/// Fields missing from the source are empty strings, never absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnrichedRecord {
    /// Zero-based row index in the source table.
    pub row: usize,
    pub lat: f64,
    pub lon: f64,
    pub clase: String,
    pub gravedad: String,
    pub barrio: String,
    pub comuna: String,
    pub anio: String,
}

impl EnrichedRecord {
    pub fn field(&self, category: Category) -> &str {
        match category {
            Category::Anio => &self.anio,
            Category::Clase => &self.clase,
            Category::Gravedad => &self.gravedad,
            Category::Barrio => &self.barrio,
            Category::Comuna => &self.comuna,
        }
    }

    pub fn field_mut(&mut self, category: Category) -> &mut String {
        match category {
            Category::Anio => &mut self.anio,
            Category::Clase => &mut self.clase,
            Category::Gravedad => &mut self.gravedad,
            Category::Barrio => &mut self.barrio,
            Category::Comuna => &mut self.comuna,
        }
    }

    pub fn coordinate(&self) -> Coordinate {
        Coordinate {
            lat: self.lat,
            lon: self.lon,
        }
    }
}

// ---------------------------------------------------------------------------
// RejectReason – why a row did not make it
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Error)]
pub enum RejectReason {
    #[error("missing location")]
    Missing,
    #[error("expected two comma-separated parts")]
    PartCount,
    #[error("non-numeric component")]
    NotNumeric,
    #[error("outside bounding box")]
    OutOfBounds,
}

// ---------------------------------------------------------------------------
// AccidentDataset – the normalized dataset held for the session
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct AccidentDataset {
    /// Accepted coordinates, parallel to `records`.
    pub coordinates: Vec<Coordinate>,
    pub records: Vec<EnrichedRecord>,
    /// Total number of rejected rows.
    pub rejected: usize,
    pub rejections: BTreeMap<RejectReason, usize>,
    /// Source column that held the coordinates.
    pub location_column: String,
    /// Source column each category was read from. Unresolved categories are absent.
    pub resolved: BTreeMap<Category, String>,
    /// Distinct non-empty, non-"nan" values per category.
    pub options: BTreeMap<Category, BTreeSet<String>>,
}

impl AccidentDataset {
    /// Build the per-category option index from the accepted records.
    pub fn from_parts(
        records: Vec<EnrichedRecord>,
        rejections: BTreeMap<RejectReason, usize>,
        location_column: String,
        resolved: BTreeMap<Category, String>,
    ) -> Self {
        let mut options: BTreeMap<Category, BTreeSet<String>> = BTreeMap::new();
        for category in resolved.keys() {
            let values = options.entry(*category).or_default();
            for rec in &records {
                let v = rec.field(*category);
                if !v.is_empty() && !v.eq_ignore_ascii_case("nan") {
                    values.insert(v.to_string());
                }
            }
        }

        AccidentDataset {
            coordinates: records.iter().map(EnrichedRecord::coordinate).collect(),
            rejected: rejections.values().sum(),
            records,
            rejections,
            location_column,
            resolved,
            options,
        }
    }

    /// Number of accepted records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Share of accepted rows, in percent. Zero for an empty source table.
    pub fn valid_percentage(&self) -> f64 {
        let total = self.len() + self.rejected;
        if total == 0 {
            0.0
        } else {
            self.len() as f64 / total as f64 * 100.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_display_is_plain_text() {
        assert_eq!(CellValue::Integer(2019).to_string(), "2019");
        assert_eq!(CellValue::Float(2019.0).to_string(), "2019");
        assert_eq!(CellValue::Float(1.5).to_string(), "1.5");
        assert_eq!(CellValue::Null.to_string(), "");
    }

    #[test]
    fn raw_table_pads_short_rows() {
        let table = RawTable::new(
            vec!["a".into(), "b".into()],
            vec![vec![CellValue::Integer(1)], vec![
                CellValue::Integer(1),
                CellValue::Integer(2),
                CellValue::Integer(3),
            ]],
        );
        assert_eq!(table.rows[0], vec![CellValue::Integer(1), CellValue::Null]);
        assert_eq!(table.rows[1].len(), 2);
    }

    #[test]
    fn preview_keeps_column_order_and_caps_rows() {
        let rows = (0..4)
            .map(|i| vec![CellValue::Integer(i), CellValue::Null])
            .collect();
        let table = RawTable::new(vec!["z".into(), "a".into()], rows);
        let preview = table.preview(3);
        assert_eq!(preview.columns, vec!["z", "a"]);
        assert_eq!(preview.rows.len(), 3);
        assert_eq!(preview.rows[2], vec!["2".to_string(), String::new()]);
        assert_eq!(preview.total_rows, 4);
    }

    #[test]
    fn bounding_box_is_inclusive() {
        let bbox = BoundingBox::MEDELLIN;
        assert!(bbox.contains(&Coordinate { lat: 6.0, lon: -76.0 }));
        assert!(bbox.contains(&Coordinate { lat: 6.5, lon: -75.0 }));
        assert!(!bbox.contains(&Coordinate { lat: 6.51, lon: -75.5 }));
        assert!(!BoundingBox::MEDELLIN_URBAN.contains(&Coordinate { lat: 6.05, lon: -75.6 }));
    }

    #[test]
    fn category_parses_from_field_names() {
        assert_eq!("clase".parse::<Category>(), Ok(Category::Clase));
        assert_eq!("AÑO".parse::<Category>(), Ok(Category::Anio));
        assert_eq!("anio".parse::<Category>(), Ok(Category::Anio));
        assert!("weather".parse::<Category>().is_err());
    }

    #[test]
    fn options_skip_empty_and_nan() {
        let records = vec![
            EnrichedRecord { clase: "Choque".into(), ..Default::default() },
            EnrichedRecord { clase: "".into(), ..Default::default() },
            EnrichedRecord { clase: "nan".into(), ..Default::default() },
            EnrichedRecord { clase: "Caída".into(), ..Default::default() },
        ];
        let resolved = BTreeMap::from([(Category::Clase, "CLASE".to_string())]);
        let ds = AccidentDataset::from_parts(records, BTreeMap::new(), "LOCATION".into(), resolved);
        let opts: Vec<_> = ds.options[&Category::Clase].iter().cloned().collect();
        assert_eq!(opts, vec!["Caída".to_string(), "Choque".to_string()]);
        assert!(!ds.options.contains_key(&Category::Barrio));
    }

    #[test]
    fn valid_percentage_handles_empty() {
        assert_eq!(AccidentDataset::default().valid_percentage(), 0.0);
        let ds = AccidentDataset::from_parts(
            vec![EnrichedRecord::default()],
            BTreeMap::from([(RejectReason::Missing, 3)]),
            "LOCATION".into(),
            BTreeMap::new(),
        );
        assert_eq!(ds.rejected, 3);
        assert!((ds.valid_percentage() - 25.0).abs() < 1e-9);
    }
}
