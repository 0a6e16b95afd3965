use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use arrow::array::{
    Array, AsArray, BooleanArray, Date32Array, Date64Array, Float32Array, Float64Array,
    Int32Array, Int64Array, StringArray, TimestampMicrosecondArray, TimestampMillisecondArray,
    TimestampNanosecondArray, TimestampSecondArray,
};
use arrow::compute::cast;
use arrow::datatypes::{DataType, TimeUnit};
use arrow::record_batch::RecordBatch;
use calamine::{open_workbook_auto, Data, Range, Reader};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::enrich::enrich;
use super::model::{AppointmentDataset, CellValue, RawRow, RawTable};

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load and enrich an appointment table.  Dispatch by extension.
///
/// Any read or schema failure aborts the whole load; no partially enriched
/// dataset is ever returned.
pub fn load_file(path: &Path) -> Result<AppointmentDataset> {
    let table = read_table(path)?;
    let dataset = enrich(path.display().to_string(), &table)
        .with_context(|| format!("validating {}", path.display()))?;
    log::info!(
        "Loaded {} appointments from {} (age bands up to {})",
        dataset.len(),
        path.display(),
        dataset.age_bands.top_edge
    );
    if dataset.is_empty() {
        log::warn!("{} contains no appointments", path.display());
    }
    Ok(dataset)
}

/// Read the raw, untyped table.
///
/// Supported formats:
/// * `.parquet` – one row per appointment (recommended)
/// * `.json`    – `[{ "AppointmentDate": "...", "Age": 34, ... }, ...]`
/// * `.csv`     – header row with the column names
/// * `.xlsx`    – first worksheet, header in the first row
pub fn read_table(path: &Path) -> Result<RawTable> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "parquet" | "pq" => load_parquet(path),
        "json" => load_json(path),
        "csv" => load_csv(path),
        "xlsx" | "xlsm" | "xls" => load_workbook(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, the default `df.to_json(orient='records')`):
///
/// ```json
/// [
///   {
///     "AppointmentDate": "2024-01-10",
///     "BookingDate": "2024-01-01",
///     "Age": 34,
///     "NoShow": false,
///     ...
///   },
///   ...
/// ]
/// ```
fn load_json(path: &Path) -> Result<RawTable> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    parse_json(&text)
}

fn parse_json(text: &str) -> Result<RawTable> {
    let root: JsonValue = serde_json::from_str(text).context("parsing JSON")?;

    let records = root
        .as_array()
        .context("Expected top-level JSON array")?;

    let mut table = RawTable::default();

    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;

        let mut row = RawRow::new();
        for (key, val) in obj {
            if !table.has_column(key) {
                table.columns.push(key.clone());
            }
            row.insert(key.clone(), json_to_cell(val));
        }
        table.rows.push(row);
    }

    Ok(table)
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
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names, one appointment per row.
/// Cell types are guessed per cell; the schema is applied during enrichment.
fn load_csv(path: &Path) -> Result<RawTable> {
    let reader = csv::Reader::from_path(path).context("opening CSV")?;
    read_csv(reader)
}

fn read_csv<R: std::io::Read>(mut reader: csv::Reader<R>) -> Result<RawTable> {
    let columns: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();

    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;

        let mut row = RawRow::new();
        for (col_idx, value) in record.iter().enumerate() {
            let Some(col_name) = columns.get(col_idx) else {
                bail!("CSV row {row_no}: more fields than header columns");
            };
            row.insert(col_name.clone(), guess_cell_type(value.trim()));
        }
        rows.push(row);
    }

    Ok(RawTable { columns, rows })
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
// Spreadsheet loader
// ---------------------------------------------------------------------------

/// Read the first worksheet of an Excel workbook. The first row holds the
/// column names; columns with a blank header are skipped.
fn load_workbook(path: &Path) -> Result<RawTable> {
    let mut workbook = open_workbook_auto(path).context("opening workbook")?;
    let sheet = workbook
        .sheet_names()
        .first()
        .cloned()
        .context("workbook has no worksheets")?;
    let range = workbook
        .worksheet_range(&sheet)
        .with_context(|| format!("reading worksheet '{sheet}'"))?;
    log::debug!("Reading worksheet '{sheet}' ({} rows)", range.height());
    range_to_table(&range)
}

fn range_to_table(range: &Range<Data>) -> Result<RawTable> {
    let mut sheet_rows = range.rows();
    let Some(header) = sheet_rows.next() else {
        return Ok(RawTable::default());
    };
    let named: Vec<(usize, String)> = header
        .iter()
        .enumerate()
        .map(|(idx, cell)| (idx, cell.to_string().trim().to_string()))
        .filter(|(_, name)| !name.is_empty())
        .collect();

    let mut rows = Vec::new();
    for (row_no, cells) in sheet_rows.enumerate() {
        let mut row = RawRow::new();
        for (idx, name) in &named {
            let value = match cells.get(*idx) {
                Some(cell) => sheet_cell(cell)
                    .with_context(|| format!("Sheet row {row_no}: column '{name}'"))?,
                None => CellValue::Null,
            };
            row.insert(name.clone(), value);
        }
        rows.push(row);
    }

    let columns = named.into_iter().map(|(_, name)| name).collect();
    Ok(RawTable { columns, rows })
}

fn sheet_cell(cell: &Data) -> Result<CellValue> {
    let value = match cell {
        Data::Empty => CellValue::Null,
        Data::String(s) if s.trim().is_empty() => CellValue::Null,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Int(i) => CellValue::Integer(*i),
        Data::Float(f) => CellValue::Float(*f),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => date_cell(dt.as_datetime().map(|d| d.date()))?,
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
        Data::Error(e) => bail!("cell holds a spreadsheet error ({e})"),
    };
    Ok(value)
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file containing one appointment per row.
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`); datetime columns may be stored as
/// `Date32`, `Date64`, timestamps or plain strings.
fn load_parquet(path: &Path) -> Result<RawTable> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?;
    let columns: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build().context("building parquet reader")?;

    let mut rows = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        append_batch(&mut rows, &batch)?;
    }

    Ok(RawTable { columns, rows })
}

/// Convert one record batch and append it to `rows`. Error messages number
/// rows across the whole file, not per batch.
fn append_batch(rows: &mut Vec<RawRow>, batch: &RecordBatch) -> Result<()> {
    let schema = batch.schema();
    let arrays = schema
        .fields()
        .iter()
        .zip(batch.columns())
        .map(|(field, col)| {
            decode_column(col).with_context(|| format!("column '{}'", field.name()))
        })
        .collect::<Result<Vec<_>>>()?;

    let offset = rows.len();
    for row in 0..batch.num_rows() {
        let mut cells = BTreeMap::new();
        for (field, col) in schema.fields().iter().zip(&arrays) {
            let value = extract_cell(col, row)
                .with_context(|| format!("Row {}: column '{}'", offset + row, field.name()))?;
            cells.insert(field.name().clone(), value);
        }
        rows.push(cells);
    }
    Ok(())
}

// -- Parquet / Arrow helpers --

/// Downcast an Arrow column to a concrete array type.
fn downcast<'a, T: 'static>(col: &'a Arc<dyn Array>) -> Result<&'a T> {
    col.as_any()
        .downcast_ref::<T>()
        .with_context(|| format!("unexpected array layout for {:?}", col.data_type()))
}

/// Expand dictionary-encoded columns (pandas `category`, Polars
/// `Categorical`) into plain arrays of their value type.
fn decode_column(col: &Arc<dyn Array>) -> Result<Arc<dyn Array>> {
    match col.data_type() {
        DataType::Dictionary(_, value_type) => {
            cast(col, value_type).context("decoding dictionary column")
        }
        _ => Ok(Arc::clone(col)),
    }
}

/// Extract a single cell from an Arrow column at a given row.
fn extract_cell(col: &Arc<dyn Array>, row: usize) -> Result<CellValue> {
    if col.is_null(row) {
        return Ok(CellValue::Null);
    }
    let value = match col.data_type() {
        DataType::Utf8 => CellValue::Text(downcast::<StringArray>(col)?.value(row).to_string()),
        DataType::LargeUtf8 => CellValue::Text(col.as_string::<i64>().value(row).to_string()),
        DataType::Int32 => CellValue::Integer(downcast::<Int32Array>(col)?.value(row) as i64),
        DataType::Int64 => CellValue::Integer(downcast::<Int64Array>(col)?.value(row)),
        DataType::Float32 => CellValue::Float(downcast::<Float32Array>(col)?.value(row) as f64),
        DataType::Float64 => CellValue::Float(downcast::<Float64Array>(col)?.value(row)),
        DataType::Boolean => CellValue::Bool(downcast::<BooleanArray>(col)?.value(row)),
        DataType::Date32 => date_cell(downcast::<Date32Array>(col)?.value_as_date(row))?,
        DataType::Date64 => date_cell(downcast::<Date64Array>(col)?.value_as_date(row))?,
        DataType::Timestamp(unit, _) => {
            let datetime = match unit {
                TimeUnit::Second => downcast::<TimestampSecondArray>(col)?.value_as_datetime(row),
                TimeUnit::Millisecond => {
                    downcast::<TimestampMillisecondArray>(col)?.value_as_datetime(row)
                }
                TimeUnit::Microsecond => {
                    downcast::<TimestampMicrosecondArray>(col)?.value_as_datetime(row)
                }
                TimeUnit::Nanosecond => {
                    downcast::<TimestampNanosecondArray>(col)?.value_as_datetime(row)
                }
            };
            date_cell(datetime.map(|dt| dt.date()))?
        }
        other => bail!("unsupported column type {other:?}"),
    };
    Ok(value)
}

fn date_cell(date: Option<chrono::NaiveDate>) -> Result<CellValue> {
    date.map(CellValue::Date)
        .context("date value out of range")
}
