use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{
    Array, AsArray, BooleanArray, Float32Array, Float64Array, Int32Array, Int64Array,
    StringArray,
};
use arrow::datatypes::DataType;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;
use thiserror::Error;

use super::model::MealTable;

/// Failure to produce a [`MealTable`] from a file.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The input file does not exist. Fatal for the dashboard.
    #[error("File '{}' was not found", .0.display())]
    NotFound(PathBuf),

    #[error("Unsupported file extension: .{0}")]
    UnsupportedFormat(String),

    #[error(transparent)]
    Malformed(#[from] anyhow::Error),
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a meal table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row plus one row per meal (the primary format)
/// * `.json`    – `[{ "meal_name": "...", "calories": 420, ... }, ...]`
/// * `.parquet` – flat Parquet file, one column per attribute
pub fn load_file(path: &Path) -> Result<MealTable, LoadError> {
    if !path.exists() {
        return Err(LoadError::NotFound(path.to_path_buf()));
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let table = match ext.as_str() {
        "csv" => load_csv(path)?,
        "json" => load_json(path)?,
        "parquet" | "pq" => load_parquet(path)?,
        other => return Err(LoadError::UnsupportedFormat(other.to_string())),
    };

    log::info!(
        "Loaded {} meals with {} columns from {}",
        table.len(),
        table.columns().len(),
        path.display()
    );
    Ok(table)
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

fn load_csv(path: &Path) -> Result<MealTable> {
    let file = std::fs::File::open(path).context("opening CSV")?;
    read_csv(file)
}

/// Parse comma-separated text with a header row.  Rows with fewer fields
/// than the header are padded with missing values.
pub fn read_csv<R: Read>(reader: R) -> Result<MealTable> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut rows = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        rows.push(
            record
                .iter()
                .map(|field| Some(field.to_string()))
                .collect::<Vec<_>>(),
        );
    }

    Ok(MealTable::from_raw(headers, rows))
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema, one object per meal:
///
/// ```json
/// [
///   { "meal_name": "Veggie Bowl", "cuisine": "Thai", "calories": 420.0 },
///   ...
/// ]
/// ```
///
/// Column order follows first appearance of each key across the records.
fn load_json(path: &Path) -> Result<MealTable> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let records = root
        .as_array()
        .context("Expected top-level JSON array")?;

    let mut columns: Vec<String> = Vec::new();
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;
        for key in obj.keys() {
            if !columns.contains(key) {
                columns.push(key.clone());
            }
        }
    }

    let rows = records.iter().filter_map(|rec| rec.as_object()).map(|obj| {
        columns
            .iter()
            .map(|col| obj.get(col).and_then(json_to_text))
            .collect::<Vec<_>>()
    });

    Ok(MealTable::from_raw(columns.clone(), rows))
}

fn json_to_text(val: &JsonValue) -> Option<String> {
    match val {
        JsonValue::Null => None,
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Bool(b) => Some(b.to_string()),
        JsonValue::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a flat Parquet file.  Every column becomes a table column; numeric
/// coercion is applied afterwards exactly as for CSV.
fn load_parquet(path: &Path) -> Result<MealTable> {
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

        for row in 0..batch.num_rows() {
            let cells = (0..batch.num_columns())
                .map(|col_idx| {
                    extract_cell_text(batch.column(col_idx), row).with_context(|| {
                        format!("Row {row}: failed to read '{}'", columns[col_idx])
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            rows.push(cells);
        }
    }

    Ok(MealTable::from_raw(columns, rows))
}

/// Extract a single cell from an Arrow column as text (`None` for null).
fn extract_cell_text(col: &Arc<dyn Array>, row: usize) -> Result<Option<String>> {
    if col.is_null(row) {
        return Ok(None);
    }
    let text = match col.data_type() {
        DataType::Utf8 => col
            .as_any()
            .downcast_ref::<StringArray>()
            .context("expected StringArray")?
            .value(row)
            .to_string(),
        DataType::LargeUtf8 => col.as_string::<i64>().value(row).to_string(),
        DataType::Int32 => col
            .as_any()
            .downcast_ref::<Int32Array>()
            .context("expected Int32Array")?
            .value(row)
            .to_string(),
        DataType::Int64 => col
            .as_any()
            .downcast_ref::<Int64Array>()
            .context("expected Int64Array")?
            .value(row)
            .to_string(),
        DataType::Float32 => col
            .as_any()
            .downcast_ref::<Float32Array>()
            .context("expected Float32Array")?
            .value(row)
            .to_string(),
        DataType::Float64 => col
            .as_any()
            .downcast_ref::<Float64Array>()
            .context("expected Float64Array")?
            .value(row)
            .to_string(),
        DataType::Boolean => col
            .as_any()
            .downcast_ref::<BooleanArray>()
            .context("expected BooleanArray")?
            .value(row)
            .to_string(),
        other => bail!("Unsupported column type {other:?}"),
    };
    Ok(Some(text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{CALORIES, CUISINE, CellValue, HEALTH_SCORE};

    fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_file(&dir.path().join("nope.csv")).unwrap_err();
        assert!(matches!(err, LoadError::NotFound(_)));
        assert!(err.to_string().contains("nope.csv"));
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "meals.xlsx", "");
        assert!(matches!(
            load_file(&path),
            Err(LoadError::UnsupportedFormat(ext)) if ext == "xlsx"
        ));
    }

    #[test]
    fn csv_preserves_column_order_and_coerces() {
        let table = read_csv(
            "meal_name,calories,cuisine,health_score\n\
             Pasta,500,Italian,80\n\
             \"Fish, chips\",oops,British,\n"
                .as_bytes(),
        )
        .unwrap();
        assert_eq!(
            table.columns(),
            ["meal_name", "calories", "cuisine", "health_score"]
        );
        assert_eq!(table.len(), 2);
        assert_eq!(table.text(1, "meal_name"), Some("Fish, chips"));
        assert_eq!(table.number(1, CALORIES), None);
        assert_eq!(table.cell(1, HEALTH_SCORE), Some(&CellValue::Missing));
    }

    #[test]
    fn csv_tolerates_short_rows() {
        let table = read_csv("cuisine,calories\nThai\n".as_bytes()).unwrap();
        assert_eq!(table.text(0, CUISINE), Some("Thai"));
        assert_eq!(table.number(0, CALORIES), None);
    }

    #[test]
    fn json_records_are_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "meals.json",
            r#"[{"calories": 420, "cuisine": "Thai"},
                {"cuisine": null, "calories": "bad", "rating": 4.5}]"#,
        );
        let table = load_file(&path).unwrap();
        assert_eq!(table.columns(), ["calories", "cuisine", "rating"]);
        assert_eq!(table.number(0, CALORIES), Some(420.0));
        assert_eq!(table.number(1, CALORIES), None);
        assert_eq!(table.cell(1, CUISINE), Some(&CellValue::Missing));
        assert_eq!(table.number(1, "rating"), Some(4.5));
        assert_eq!(table.cell(0, "rating"), Some(&CellValue::Missing));
    }

    #[test]
    fn json_must_be_an_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "meals.json", r#"{"cuisine": "Thai"}"#);
        assert!(matches!(load_file(&path), Err(LoadError::Malformed(_))));
    }
}
