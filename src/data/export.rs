use std::path::Path;

use super::error::ExportError;
use super::filter::FilteredView;

pub const CSV_MIME: &str = "text/csv";
pub const DEFAULT_EXPORT_NAME: &str = "datos_filtrados.csv";

/// Serialize the filtered rows as CSV: the full header row in source order,
/// then every column of every visible row. Nulls are written as empty fields.
pub fn export_csv(view: &FilteredView<'_>) -> Result<Vec<u8>, ExportError> {
    let dataset = view.dataset();
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer.write_record(&dataset.headers)?;
    for &idx in view.indices() {
        writer.write_record(dataset.rows[idx].iter().map(|cell| cell.to_string()))?;
    }

    writer.into_inner().map_err(|e| ExportError::Io(e.into_error()))
}

/// Write [`export_csv`] output to `path`, returning the number of data rows.
pub fn save_csv(view: &FilteredView<'_>, path: &Path) -> Result<usize, ExportError> {
    let bytes = export_csv(view)?;
    std::fs::write(path, bytes)?;
    log::info!("exported {} rows ({CSV_MIME}) to {}", view.len(), path.display());
    Ok(view.len())
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use tempfile::tempdir;

    use super::*;
    use crate::data::filter::{apply_filters, FilterCriteria};
    use crate::data::model::{CellValue, Dataset, Dimension};

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    fn sales() -> Dataset {
        let headers = vec![
            "ID".into(),
            "Zona".into(),
            "Fecha pedido".into(),
            "Importe venta total".into(),
            "Notas".into(),
        ];
        let rows = vec![
            vec![
                CellValue::Integer(1),
                text("North"),
                text("2024-01-01"),
                CellValue::Float(100.0),
                text("first, with comma"),
            ],
            vec![
                CellValue::Integer(2),
                text("South"),
                text("2024-01-02"),
                CellValue::Float(50.25),
                CellValue::Null,
            ],
            vec![
                CellValue::Integer(3),
                text("North"),
                text("2024-02-01"),
                CellValue::Float(25.0),
                text("third"),
            ],
        ];
        Dataset::from_table(headers, rows).unwrap()
    }

    fn parse(bytes: &[u8]) -> (Vec<String>, Vec<Vec<String>>) {
        let mut reader = csv::Reader::from_reader(bytes);
        let headers = reader.headers().unwrap().iter().map(String::from).collect();
        let rows = reader
            .records()
            .map(|r| r.unwrap().iter().map(String::from).collect())
            .collect();
        (headers, rows)
    }

    #[test]
    fn export_contains_only_filtered_rows_and_every_column() {
        let ds = sales();
        let mut criteria = FilterCriteria::default();
        criteria.set(Dimension::Zone, ["North"]);
        let view = apply_filters(&ds, &criteria);

        let (headers, rows) = parse(&export_csv(&view).unwrap());
        assert_eq!(
            headers,
            vec!["ID", "Zona", "Fecha pedido", "Importe venta total", "Notas", "Ingresos"]
        );
        assert_eq!(rows.len(), view.len());
        assert_eq!(rows[0][0], "1");
        assert_eq!(rows[0][4], "first, with comma");
        assert_eq!(rows[1][0], "3");
        assert!(rows.iter().all(|r| r.len() == headers.len()));
    }

    #[test]
    fn empty_view_exports_header_only() {
        let ds = sales();
        let mut criteria = FilterCriteria::default();
        let day = NaiveDate::from_ymd_opt(2030, 1, 1).unwrap();
        criteria.set_date_range(day, day);
        let view = apply_filters(&ds, &criteria);

        let (headers, rows) = parse(&export_csv(&view).unwrap());
        assert_eq!(headers.len(), 6);
        assert!(rows.is_empty());
    }

    #[test]
    fn exported_file_reloads_with_same_shape() {
        let ds = sales();
        let view = FilteredView::all(&ds);
        let dir = tempdir().unwrap();
        let path = dir.path().join(DEFAULT_EXPORT_NAME);

        assert_eq!(save_csv(&view, &path).unwrap(), 3);
        let reloaded = crate::data::loader::load_file(&path).unwrap();
        assert_eq!(reloaded.len(), view.len());
        assert_eq!(reloaded.headers, ds.headers);
        assert_eq!(reloaded.records[1].revenue, 50.25);
        assert_eq!(reloaded.records[1].zone.as_deref(), Some("South"));
    }
}
