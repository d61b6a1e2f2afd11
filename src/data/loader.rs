use std::path::Path;

use arrow::array::{Array, ArrayRef, AsArray};
use arrow::compute::cast;
use arrow::datatypes::{
    DataType, Date32Type, Float64Type, Int64Type, TimeUnit, TimestampMillisecondType,
};
use calamine::{open_workbook_auto, Data, Reader};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::columns::excel_serial_to_datetime;
use super::error::LoadError;
use super::model::{CellValue, Dataset};

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a sales dataset from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.xlsx` / `.xlsm` / `.xlsb` / `.xls` / `.ods` – first worksheet, header in row 1
/// * `.csv`     – comma separated, header row
/// * `.parquet` – one column per field
/// * `.json`    – `[{ "Zona": "...", "Ingresos": 12.5, ... }, ...]`
///
/// The result is schema-normalized (see [`Dataset::from_table`]).
pub fn load_file(path: &Path) -> Result<Dataset, LoadError> {
    if !path.exists() {
        return Err(LoadError::NotFound(path.to_path_buf()));
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let (headers, rows) = match ext.as_str() {
        "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => read_spreadsheet(path)?,
        "csv" => read_csv(path)?,
        "parquet" | "pq" => read_parquet(path)?,
        "json" => read_json(path)?,
        other => return Err(LoadError::UnsupportedFormat(other.to_string())),
    };

    log::debug!(
        "read {} rows x {} columns from {}",
        rows.len(),
        headers.len(),
        path.display()
    );

    Dataset::from_table(headers, rows)
}

type RawTable = (Vec<String>, Vec<Vec<CellValue>>);

// ---------------------------------------------------------------------------
// Spreadsheet loader
// ---------------------------------------------------------------------------

/// Reads the first worksheet; row 1 holds the headers.
fn read_spreadsheet(path: &Path) -> Result<RawTable, LoadError> {
    let mut workbook = open_workbook_auto(path)?;
    let sheet = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or(LoadError::EmptyWorkbook)?;
    let range = workbook.worksheet_range(&sheet)?;

    let mut rows_iter = range.rows();
    let headers: Vec<String> = match rows_iter.next() {
        Some(row) => row.iter().map(|c| spreadsheet_cell(c).to_string()).collect(),
        None => Vec::new(),
    };

    let rows = rows_iter
        .filter(|row| row.iter().any(|c| !matches!(c, Data::Empty)))
        .map(|row| row.iter().map(spreadsheet_cell).collect())
        .collect();

    Ok((headers, rows))
}

fn spreadsheet_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Null,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Float(f) => CellValue::Float(*f),
        Data::Int(i) => CellValue::Integer(*i),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::Error(_) => CellValue::Null,
        Data::DateTime(dt) => excel_serial_to_datetime(dt.as_f64())
            .map(CellValue::DateTime)
            .unwrap_or(CellValue::Float(dt.as_f64())),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names, one sale per line.
fn read_csv(path: &Path) -> Result<RawTable, LoadError> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .enumerate()
        .map(|(i, h)| {
            if i == 0 {
                h.trim_start_matches('\u{feff}').to_string()
            } else {
                h.to_string()
            }
        })
        .collect();

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        rows.push(record.iter().map(guess_cell_type).collect());
    }

    Ok((headers, rows))
}

fn guess_cell_type(s: &str) -> CellValue {
    if s.is_empty() {
        return CellValue::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return CellValue::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return CellValue::Float(f);
    }
    if s == "true" || s == "false" {
        return CellValue::Bool(s == "true");
    }
    CellValue::Text(s.to_string())
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Records-oriented JSON (`df.to_json(orient='records')`). Column order is
/// the order in which keys are first seen.
fn read_json(path: &Path) -> Result<RawTable, LoadError> {
    let text = std::fs::read_to_string(path)?;
    let root: JsonValue = serde_json::from_str(&text)?;

    let records = root
        .as_array()
        .ok_or_else(|| LoadError::JsonLayout("expected top-level JSON array".into()))?;

    let mut headers: Vec<String> = Vec::new();
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .ok_or_else(|| LoadError::JsonLayout(format!("row {i} is not a JSON object")))?;
        for key in obj.keys() {
            if !headers.contains(key) {
                headers.push(key.clone());
            }
        }
    }

    let rows = records
        .iter()
        .filter_map(JsonValue::as_object)
        .map(|obj| {
            headers
                .iter()
                .map(|h| obj.get(h).map(json_to_cell).unwrap_or(CellValue::Null))
                .collect()
        })
        .collect();

    Ok((headers, rows))
}

fn json_to_cell(val: &JsonValue) -> CellValue {
    match val {
        JsonValue::String(s) => CellValue::Text(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                CellValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                CellValue::Float(f)
            } else {
                CellValue::Text(n.to_string())
            }
        }
        JsonValue::Bool(b) => CellValue::Bool(*b),
        JsonValue::Null => CellValue::Null,
        other => CellValue::Text(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with one scalar column per field.
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`).
fn read_parquet(path: &Path) -> Result<RawTable, LoadError> {
    let file = std::fs::File::open(path)?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
    let headers: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build()?;

    let mut rows = Vec::new();

    for batch_result in reader {
        let batch = batch_result?;
        let columns: Vec<ArrayRef> = batch
            .columns()
            .iter()
            .map(widen_column)
            .collect::<Result<_, _>>()?;

        for row in 0..batch.num_rows() {
            rows.push(columns.iter().map(|col| arrow_cell(col, row)).collect());
        }
    }

    Ok((headers, rows))
}

// -- Parquet / Arrow helpers --

/// Cast a column to one of the few physical types [`arrow_cell`] understands.
fn widen_column(col: &ArrayRef) -> Result<ArrayRef, LoadError> {
    let target = match col.data_type() {
        DataType::Int8
        | DataType::Int16
        | DataType::Int32
        | DataType::UInt8
        | DataType::UInt16
        | DataType::UInt32
        | DataType::UInt64 => DataType::Int64,
        DataType::Float16 | DataType::Float32 | DataType::Decimal128(_, _) => DataType::Float64,
        DataType::Date64 | DataType::Timestamp(_, _) => {
            DataType::Timestamp(TimeUnit::Millisecond, None)
        }
        DataType::Dictionary(_, _) | DataType::Utf8View => DataType::Utf8,
        _ => return Ok(col.clone()),
    };
    Ok(cast(col, &target)?)
}

/// Extract a single cell from an Arrow column at a given row.
fn arrow_cell(col: &ArrayRef, row: usize) -> CellValue {
    if col.is_null(row) {
        return CellValue::Null;
    }
    match col.data_type() {
        DataType::Utf8 => CellValue::Text(col.as_string::<i32>().value(row).to_string()),
        DataType::LargeUtf8 => CellValue::Text(col.as_string::<i64>().value(row).to_string()),
        DataType::Int64 => CellValue::Integer(col.as_primitive::<Int64Type>().value(row)),
        DataType::Float64 => CellValue::Float(col.as_primitive::<Float64Type>().value(row)),
        DataType::Boolean => CellValue::Bool(col.as_boolean().value(row)),
        DataType::Date32 => col
            .as_primitive::<Date32Type>()
            .value_as_date(row)
            .map(CellValue::Date)
            .unwrap_or(CellValue::Null),
        DataType::Timestamp(TimeUnit::Millisecond, None) => col
            .as_primitive::<TimestampMillisecondType>()
            .value_as_datetime(row)
            .map(CellValue::DateTime)
            .unwrap_or(CellValue::Null),
        other => CellValue::Text(format!("{other:?}")),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::Arc;

    use arrow::array::{Date32Array, Float64Array, Int32Array, StringArray};
    use arrow::datatypes::{Field, Schema};
    use arrow::record_batch::RecordBatch;
    use chrono::NaiveDate;
    use parquet::arrow::ArrowWriter;
    use tempfile::tempdir;

    use super::*;
    use crate::data::model::Dimension;

    fn write_file(dir: &Path, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempdir().unwrap();
        let err = load_file(&dir.path().join("nope.xlsx")).unwrap_err();
        assert!(matches!(err, LoadError::NotFound(_)));
    }

    #[test]
    fn unsupported_extension() {
        let dir = tempdir().unwrap();
        let path = write_file(dir.path(), "data.txt", "hello");
        let err = load_file(&path).unwrap_err();
        assert!(matches!(err, LoadError::UnsupportedFormat(ext) if ext == "txt"));
    }

    #[test]
    fn corrupt_spreadsheet_is_a_load_error() {
        let dir = tempdir().unwrap();
        let path = write_file(dir.path(), "broken.xlsx", "this is not a zip archive");
        let err = load_file(&path).unwrap_err();
        assert!(matches!(err, LoadError::Spreadsheet(_)));
    }

    #[test]
    fn workbook_with_date_cells_and_blank_rows() {
        use rust_xlsxwriter::{Format, Workbook};

        let dir = tempdir().unwrap();
        let path = dir.path().join("ventas.xlsx");

        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        let date_format = Format::new().set_num_format("yyyy-mm-dd");
        for (col, header) in ["Zona", "País", "Fecha pedido", "Importe venta total"]
            .into_iter()
            .enumerate()
        {
            sheet.write_string(0, col as u16, header).unwrap();
        }
        // 45366 is 2024-03-15 in the 1900 date system.
        sheet.write_string(1, 0, "Europa").unwrap();
        sheet.write_string(1, 1, "España").unwrap();
        sheet.write_number_with_format(1, 2, 45366.0, &date_format).unwrap();
        sheet.write_number(1, 3, 120.5).unwrap();
        // Row 2 stays empty.
        sheet.write_string(3, 0, "Asia").unwrap();
        sheet.write_string(3, 1, "Japón").unwrap();
        sheet.write_string(3, 2, "2024-03-20").unwrap();
        sheet.write_number(3, 3, 80.0).unwrap();
        workbook.save(&path).unwrap();

        let ds = load_file(&path).unwrap();

        assert_eq!(
            ds.headers,
            vec!["Zona", "País", "Fecha pedido", "Importe venta total", "Ingresos"]
        );
        assert_eq!(ds.len(), 2);
        assert!(matches!(ds.rows[0][2], CellValue::DateTime(_)));
        assert_eq!(ds.records[0].order_date, NaiveDate::from_ymd_opt(2024, 3, 15));
        assert_eq!(ds.records[1].order_date, NaiveDate::from_ymd_opt(2024, 3, 20));
        assert_eq!(ds.records[0].revenue, 120.5);
        assert_eq!(ds.records[1].revenue, 80.0);
        assert_eq!(ds.rows[1][4], CellValue::Float(80.0));
        assert_eq!(ds.records[1].dimension(Dimension::Zone), Some("Asia"));
    }

    #[test]
    fn csv_with_bom_and_alias() {
        let dir = tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "ventas.csv",
            "\u{feff}Zona,País,Fecha pedido,Importe venta total,Unidades\n\
             Europa,España,2024-01-03,100.5,3\n\
             Asia,Japón,,20,1\n",
        );
        let ds = load_file(&path).unwrap();

        assert_eq!(ds.headers[0], "Zona");
        assert_eq!(ds.headers.last().map(String::as_str), Some("Ingresos"));
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.records[0].revenue, 100.5);
        assert_eq!(ds.records[0].units, Some(3));
        assert_eq!(
            ds.records[0].order_date,
            NaiveDate::from_ymd_opt(2024, 1, 3)
        );
        assert_eq!(ds.records[1].order_date, None);
        assert_eq!(ds.records[1].dimension(Dimension::Country), Some("Japón"));
    }

    #[test]
    fn csv_without_revenue_fails() {
        let dir = tempdir().unwrap();
        let path = write_file(dir.path(), "bad.csv", "Zona,País\nEuropa,España\n");
        let err = load_file(&path).unwrap_err();
        assert!(matches!(err, LoadError::MissingColumn(_)));
    }

    #[test]
    fn json_records() {
        let dir = tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "ventas.json",
            r#"[
                {"Zona": "Europa", "Ingresos": 10.0, "Fecha pedido": "2024-05-01"},
                {"Zona": null, "Ingresos": 5}
            ]"#,
        );
        let ds = load_file(&path).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.records[1].zone, None);
        assert_eq!(ds.records[1].revenue, 5.0);
        assert_eq!(ds.rows[1].len(), ds.headers.len());
    }

    #[test]
    fn json_must_be_an_array() {
        let dir = tempdir().unwrap();
        let path = write_file(dir.path(), "obj.json", r#"{"Zona": "Europa"}"#);
        let err = load_file(&path).unwrap_err();
        assert!(matches!(err, LoadError::JsonLayout(_)));
    }

    #[test]
    fn parquet_roundtrip_of_typed_columns() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ventas.parquet");

        let schema = Arc::new(Schema::new(vec![
            Field::new("Zona", DataType::Utf8, true),
            Field::new("Fecha pedido", DataType::Date32, true),
            Field::new("Ingresos", DataType::Float64, false),
            Field::new("Unidades", DataType::Int32, false),
        ]));
        // 19723 days after 1970-01-01 is 2024-01-01.
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(StringArray::from(vec![Some("Europa"), None])),
                Arc::new(Date32Array::from(vec![Some(19723), None])),
                Arc::new(Float64Array::from(vec![12.5, 7.5])),
                Arc::new(Int32Array::from(vec![2, 1])),
            ],
        )
        .unwrap();
        let file = std::fs::File::create(&path).unwrap();
        let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let ds = load_file(&path).unwrap();
        assert_eq!(ds.headers, vec!["Zona", "Fecha pedido", "Ingresos", "Unidades"]);
        assert_eq!(ds.records[0].zone.as_deref(), Some("Europa"));
        assert_eq!(ds.records[0].order_date, NaiveDate::from_ymd_opt(2024, 1, 1));
        assert_eq!(ds.records[1].zone, None);
        assert_eq!(ds.records[1].units, Some(1));
    }
}
