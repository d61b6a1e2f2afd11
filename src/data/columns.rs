//! Canonical sales columns, their accepted headers, and the one-time schema
//! normalization that turns a raw table into typed [`Record`]s.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate, NaiveDateTime};

use super::error::{LoadError, MissingColumnError};
use super::model::{CellValue, Dimension, Record, Schema};

pub const ZONE_HEADERS: &[&str] = &["Zona", "Zone", "Region"];
pub const PRODUCT_TYPE_HEADERS: &[&str] = &["Tipo de producto", "Product Type", "Item Type"];
pub const CHANNEL_HEADERS: &[&str] = &["Canal de venta", "Sales Channel"];
pub const COUNTRY_HEADERS: &[&str] = &["País", "Pais", "Country"];
pub const ORDER_DATE_HEADERS: &[&str] = &["Fecha pedido", "Order Date"];
pub const REVENUE_HEADERS: &[&str] = &["Ingresos", "Revenue"];
pub const UNITS_HEADERS: &[&str] = &["Unidades", "Units", "Units Sold"];

/// Columns revenue may be aliased from, paired with the header of the
/// derived column appended to the table.
pub const REVENUE_ALIASES: &[(&str, &str)] = &[
    ("Importe venta total", "Ingresos"),
    ("Total Sale Amount", "Revenue"),
    ("Total Revenue", "Revenue"),
];

pub fn dimension_headers(dim: Dimension) -> &'static [&'static str] {
    match dim {
        Dimension::Zone => ZONE_HEADERS,
        Dimension::ProductType => PRODUCT_TYPE_HEADERS,
        Dimension::Channel => CHANNEL_HEADERS,
        Dimension::Country => COUNTRY_HEADERS,
    }
}

/// Text date layouts tried in order; the first successful parse wins.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d/%m/%Y", "%d-%m-%Y"];
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

/// Largest serial Excel can represent (9999-12-31).
const MAX_EXCEL_SERIAL: f64 = 2_958_465.0;

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

pub(crate) struct Normalized {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
    pub records: Vec<Record>,
    pub schema: Schema,
}

fn find(headers: &[String], accepted: &[&str]) -> Option<usize> {
    accepted
        .iter()
        .find_map(|name| headers.iter().position(|h| h == name))
}

/// Resolve canonical columns, derive Revenue if needed and build records.
pub(crate) fn normalize(
    headers: Vec<String>,
    mut rows: Vec<Vec<CellValue>>,
) -> Result<Normalized, LoadError> {
    let mut headers: Vec<String> = headers.into_iter().map(|h| h.trim().to_string()).collect();

    for row in &mut rows {
        row.resize(headers.len(), CellValue::Null);
    }

    let dimensions: BTreeMap<Dimension, usize> = Dimension::ALL
        .iter()
        .filter_map(|dim| find(&headers, dimension_headers(*dim)).map(|idx| (*dim, idx)))
        .collect();
    let order_date = find(&headers, ORDER_DATE_HEADERS);
    let units = find(&headers, UNITS_HEADERS);
    let revenue = find(&headers, REVENUE_HEADERS);
    let alias = REVENUE_ALIASES
        .iter()
        .find_map(|(src, derived)| headers.iter().position(|h| h == src).map(|i| (i, *src, *derived)));

    if dimensions.is_empty()
        && order_date.is_none()
        && units.is_none()
        && revenue.is_none()
        && alias.is_none()
    {
        return Err(LoadError::NoKnownColumns(headers));
    }

    for dim in Dimension::ALL {
        if !dimensions.contains_key(&dim) {
            log::warn!("column for {dim} not found; its filter and chart are omitted");
        }
    }

    let (revenue, revenue_derived_from) = match (revenue, alias) {
        (Some(idx), _) => (idx, None),
        (None, Some((src_idx, src, derived))) => {
            log::info!("deriving revenue column '{derived}' from '{src}'");
            headers.push(derived.to_string());
            for row in &mut rows {
                let cell = row[src_idx].clone();
                row.push(cell);
            }
            (headers.len() - 1, Some(src.to_string()))
        }
        (None, None) => {
            let mut accepted = REVENUE_HEADERS.to_vec();
            accepted.extend(REVENUE_ALIASES.iter().map(|(src, _)| *src));
            return Err(MissingColumnError {
                column: "Revenue",
                accepted,
            }
            .into());
        }
    };

    let schema = Schema {
        dimensions,
        order_date,
        revenue,
        units,
        revenue_derived_from,
    };

    let mut bad_dates = 0usize;
    let mut bad_numbers = 0usize;

    let records = rows
        .iter()
        .map(|row| {
            let category = |dim: Dimension| {
                schema
                    .dimensions
                    .get(&dim)
                    .and_then(|idx| row[*idx].as_category())
            };

            let order_date = schema.order_date.and_then(|idx| {
                let cell = &row[idx];
                let parsed = parse_date_cell(cell);
                if parsed.is_none() && !cell.is_null() {
                    bad_dates += 1;
                }
                parsed
            });

            let revenue_cell = &row[schema.revenue];
            let revenue = revenue_cell.as_f64().unwrap_or_else(|| {
                if !revenue_cell.is_null() {
                    bad_numbers += 1;
                }
                0.0
            });

            let units = schema.units.and_then(|idx| {
                let cell = &row[idx];
                let parsed = cell.as_f64().map(|v| v.round() as i64);
                if parsed.is_none() && !cell.is_null() {
                    bad_numbers += 1;
                }
                parsed
            });

            Record {
                zone: category(Dimension::Zone),
                product_type: category(Dimension::ProductType),
                channel: category(Dimension::Channel),
                country: category(Dimension::Country),
                order_date,
                revenue,
                units,
            }
        })
        .collect();

    if bad_dates > 0 {
        log::warn!("{bad_dates} order date(s) could not be parsed and were set to null");
    }
    if bad_numbers > 0 {
        log::warn!("{bad_numbers} revenue/units cell(s) were not numeric and count as missing");
    }

    Ok(Normalized {
        headers,
        rows,
        records,
        schema,
    })
}

// ---------------------------------------------------------------------------
// Cell coercion
// ---------------------------------------------------------------------------

/// Convert an Excel serial day number (1900 date system) to a timestamp.
pub fn excel_serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() || serial < 1.0 || serial > MAX_EXCEL_SERIAL {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let days = serial.trunc() as i64;
    let secs = (serial.fract() * 86_400.0).round() as i64;
    epoch.checked_add_signed(Duration::days(days) + Duration::seconds(secs))
}

/// Parse an order date cell; `None` for nulls and anything unparseable.
pub fn parse_date_cell(cell: &CellValue) -> Option<NaiveDate> {
    match cell {
        CellValue::Date(d) => Some(*d),
        CellValue::DateTime(dt) => Some(dt.date()),
        CellValue::Integer(i) => excel_serial_to_datetime(*i as f64).map(|dt| dt.date()),
        CellValue::Float(f) => excel_serial_to_datetime(*f).map(|dt| dt.date()),
        CellValue::Text(s) => parse_date_text(s),
        CellValue::Bool(_) | CellValue::Null => None,
    }
}

pub fn parse_date_text(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
                .map(|dt| dt.date())
        })
}
