use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use super::columns;
use super::error::LoadError;

// ---------------------------------------------------------------------------
// CellValue – a single cell of the source table
// ---------------------------------------------------------------------------

/// A dynamically-typed cell as read from the source file.
///
/// The raw cells are kept alongside the typed [`Record`]s so that the CSV
/// export reproduces every column, including the ones the engine ignores.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Null,
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            CellValue::DateTime(dt) if dt.time() == NaiveTime::MIN => {
                write!(f, "{}", dt.format("%Y-%m-%d"))
            }
            CellValue::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
            CellValue::Null => Ok(()),
        }
    }
}

impl CellValue {
    /// Interpret the cell as a number. Text is parsed after trimming.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Float(v) if v.is_finite() => Some(*v),
            CellValue::Integer(i) => Some(*i as f64),
            CellValue::Text(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
            _ => None,
        }
    }

    /// Interpret the cell as a category label; empty text and nulls are `None`.
    pub fn as_category(&self) -> Option<String> {
        match self {
            CellValue::Null => None,
            CellValue::Text(s) if s.trim().is_empty() => None,
            CellValue::Text(s) => Some(s.trim().to_string()),
            other => Some(other.to_string()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }
}

// ---------------------------------------------------------------------------
// Dimension – a categorical attribute usable as filter / group-by key
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Dimension {
    Zone,
    ProductType,
    Channel,
    Country,
}

impl Dimension {
    pub const ALL: [Dimension; 4] = [
        Dimension::Zone,
        Dimension::ProductType,
        Dimension::Channel,
        Dimension::Country,
    ];

    /// Human-readable label for filter headers and chart titles.
    pub fn label(self) -> &'static str {
        match self {
            Dimension::Zone => "Zone",
            Dimension::ProductType => "Product type",
            Dimension::Channel => "Sales channel",
            Dimension::Country => "Country",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Record – one sales transaction
// ---------------------------------------------------------------------------

/// The typed projection of one row that the query engine works on.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    pub zone: Option<String>,
    pub product_type: Option<String>,
    pub channel: Option<String>,
    pub country: Option<String>,
    pub order_date: Option<NaiveDate>,
    /// Missing or non-numeric revenue cells count as zero.
    pub revenue: f64,
    pub units: Option<i64>,
}

impl Record {
    pub fn dimension(&self, dim: Dimension) -> Option<&str> {
        match dim {
            Dimension::Zone => self.zone.as_deref(),
            Dimension::ProductType => self.product_type.as_deref(),
            Dimension::Channel => self.channel.as_deref(),
            Dimension::Country => self.country.as_deref(),
        }
    }
}

// ---------------------------------------------------------------------------
// Schema – where the canonical columns live in the source table
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Schema {
    /// Column index for every dimension present in the source.
    pub dimensions: BTreeMap<Dimension, usize>,
    pub order_date: Option<usize>,
    pub revenue: usize,
    pub units: Option<usize>,
    /// Header of the column revenue was aliased from, if it was derived.
    pub revenue_derived_from: Option<String>,
}

impl Schema {
    pub fn has(&self, dim: Dimension) -> bool {
        self.dimensions.contains_key(&dim)
    }

    pub fn has_units(&self) -> bool {
        self.units.is_some()
    }

    pub fn has_dates(&self) -> bool {
        self.order_date.is_some()
    }
}

// ---------------------------------------------------------------------------
// Dataset – the complete, normalized, immutable table
// ---------------------------------------------------------------------------

/// The loaded sales table after schema normalization.
#[derive(Debug, Clone)]
pub struct Dataset {
    /// Header row in source order (a derived Revenue column is appended last).
    pub headers: Vec<String>,
    /// Raw cells, one `Vec` per row, each exactly `headers.len()` long.
    pub rows: Vec<Vec<CellValue>>,
    /// Typed records, parallel to `rows`.
    pub records: Vec<Record>,
    pub schema: Schema,
    /// Sorted distinct non-null values per present dimension.
    pub distinct_values: BTreeMap<Dimension, BTreeSet<String>>,
    date_bounds: Option<(NaiveDate, NaiveDate)>,
}

impl Dataset {
    /// Normalize a raw header + rows table into a canonical dataset.
    ///
    /// Runs the Revenue derivation once; calling it again on its own output
    /// finds the Revenue column and changes nothing.
    pub fn from_table(headers: Vec<String>, rows: Vec<Vec<CellValue>>) -> Result<Self, LoadError> {
        let normalized = columns::normalize(headers, rows)?;

        let mut distinct_values: BTreeMap<Dimension, BTreeSet<String>> = normalized
            .schema
            .dimensions
            .keys()
            .map(|dim| (*dim, BTreeSet::new()))
            .collect();
        let mut date_bounds: Option<(NaiveDate, NaiveDate)> = None;

        for rec in &normalized.records {
            for (dim, values) in distinct_values.iter_mut() {
                if let Some(v) = rec.dimension(*dim) {
                    if !values.contains(v) {
                        values.insert(v.to_string());
                    }
                }
            }
            if let Some(d) = rec.order_date {
                date_bounds = Some(match date_bounds {
                    Some((lo, hi)) => (lo.min(d), hi.max(d)),
                    None => (d, d),
                });
            }
        }

        Ok(Dataset {
            headers: normalized.headers,
            rows: normalized.rows,
            records: normalized.records,
            schema: normalized.schema,
            distinct_values,
            date_bounds,
        })
    }

    /// `[min, max]` over the non-null order dates, if any.
    pub fn date_bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        self.date_bounds
    }

    /// Options for a dimension's filter control; `None` when the column is absent.
    pub fn options(&self, dim: Dimension) -> Option<&BTreeSet<String>> {
        self.distinct_values.get(&dim)
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    #[test]
    fn display_renders_nulls_empty_and_midnight_as_date() {
        let midnight = NaiveDate::from_ymd_opt(2024, 3, 5)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(CellValue::Null.to_string(), "");
        assert_eq!(CellValue::DateTime(midnight).to_string(), "2024-03-05");
        assert_eq!(
            CellValue::DateTime(midnight + chrono::Duration::hours(13)).to_string(),
            "2024-03-05 13:00:00"
        );
        assert_eq!(CellValue::Float(12.5).to_string(), "12.5");
    }

    #[test]
    fn category_ignores_blank_text() {
        assert_eq!(text("  ").as_category(), None);
        assert_eq!(text(" Europa ").as_category(), Some("Europa".to_string()));
        assert_eq!(CellValue::Integer(7).as_category(), Some("7".to_string()));
        assert_eq!(CellValue::Null.as_category(), None);
    }

    #[test]
    fn distinct_values_and_date_bounds() {
        let headers = vec!["Zona".into(), "Fecha pedido".into(), "Ingresos".into()];
        let rows = vec![
            vec![text("Norte"), text("2024-02-01"), CellValue::Float(1.0)],
            vec![text("Sur"), text("not a date"), CellValue::Float(2.0)],
            vec![text("Norte"), text("2024-01-15"), CellValue::Float(3.0)],
            vec![CellValue::Null, text("2024-03-10"), CellValue::Float(4.0)],
        ];
        let ds = Dataset::from_table(headers, rows).unwrap();

        let zones: Vec<&str> = ds
            .options(Dimension::Zone)
            .unwrap()
            .iter()
            .map(String::as_str)
            .collect();
        assert_eq!(zones, vec!["Norte", "Sur"]);
        assert!(ds.options(Dimension::Country).is_none());
        assert_eq!(
            ds.date_bounds(),
            Some((
                NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
                NaiveDate::from_ymd_opt(2024, 3, 10).unwrap()
            ))
        );
        assert_eq!(ds.len(), 4);
    }
}
