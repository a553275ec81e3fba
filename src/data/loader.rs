use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::path::Path;

use arrow::array::{Array, ArrayRef, AsArray, Float64Array, Int64Array};
use arrow::compute::cast;
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;
use log::debug;
use ndarray::Array2;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde::Deserialize;

use super::model::SampleEntry;
use super::store::{MemoryNoiseGrid, MemoryPhysicsGrid, MemorySampleStore, ObjectSampleStore};
use crate::error::{GridError, Result};

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------
//
// Every loader opens its file, drains it into memory and drops the handle
// before returning, on success and on error alike.

/// Load a sparse-sample store. Dispatch by extension.
///
/// Supported formats:
/// * `.parquet` – one row per object: `key` (Utf8), `idx` (List<Int>), `lnp` (List<Float>)
/// * `.json`    – `{ "<key>": { "idx": [...], "lnp": [...] }, ... }`
pub fn load_sample_store(path: &Path) -> Result<MemorySampleStore> {
    match extension(path).as_str() {
        "parquet" | "pq" => load_samples_parquet(path),
        "json" => load_samples_json(path),
        other => Err(GridError::UnsupportedFormat(other.to_string())),
    }
}

/// Load the physics model grid. Dispatch by extension.
///
/// Supported formats:
/// * `.parquet` – one numeric column per parameter, one row per grid point
/// * `.csv`     – header row of parameter names, one numeric row per grid point
pub fn load_physics_grid(path: &Path) -> Result<MemoryPhysicsGrid> {
    match extension(path).as_str() {
        "parquet" | "pq" => load_physics_parquet(path),
        "csv" => load_physics_csv(path),
        other => Err(GridError::UnsupportedFormat(other.to_string())),
    }
}

/// Load the noise model grid from Parquet.
///
/// Each parameter is a List<Float> column; row `r` holds the realizations for
/// grid point `r` and every row of a column must hold the same number of them.
pub fn load_noise_grid(path: &Path) -> Result<MemoryNoiseGrid> {
    match extension(path).as_str() {
        "parquet" | "pq" => load_noise_parquet(path),
        other => Err(GridError::UnsupportedFormat(other.to_string())),
    }
}

fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase()
}

fn malformed(msg: impl Into<String>) -> GridError {
    GridError::Format(msg.into())
}

// ---------------------------------------------------------------------------
// Sample store: JSON
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct JsonEntry {
    idx: Vec<i64>,
    lnp: Vec<f64>,
}

/// Keys enumerate in sorted order.
fn load_samples_json(path: &Path) -> Result<MemorySampleStore> {
    let text = std::fs::read_to_string(path)?;
    let objects: BTreeMap<String, JsonEntry> = serde_json::from_str(&text)?;

    let mut store = MemorySampleStore::new();
    for (key, entry) in objects {
        store.insert(key, SampleEntry::new(entry.idx, entry.lnp));
    }
    debug!("read {} objects from {}", store.len(), path.display());
    Ok(store)
}

// ---------------------------------------------------------------------------
// Sample store: Parquet
// ---------------------------------------------------------------------------

/// Keys enumerate in row order and must be unique.
fn load_samples_parquet(path: &Path) -> Result<MemorySampleStore> {
    let mut store = MemorySampleStore::new();
    let mut seen = BTreeSet::new();

    for batch in read_batches(path)? {
        let key_col = required_column(&batch, "key")?;
        let idx_col = required_column(&batch, "idx")?;
        let lnp_col = required_column(&batch, "lnp")?;

        let keys = cast(key_col, &DataType::Utf8)?;
        let keys = keys.as_string::<i32>();

        for row in 0..batch.num_rows() {
            if keys.is_null(row) {
                return Err(malformed(format!("row {row}: null object key")));
            }
            let key = keys.value(row);
            if !seen.insert(key.to_string()) {
                return Err(GridError::DuplicateObject(key.to_string()));
            }
            let index = list_i64(idx_col, row)
                .map_err(|e| malformed(format!("object '{key}': reading 'idx': {e}")))?;
            let lnp = list_f64(lnp_col, row)
                .map_err(|e| malformed(format!("object '{key}': reading 'lnp': {e}")))?;
            store.insert(key, SampleEntry::new(index, lnp));
        }
    }

    debug!("read {} objects from {}", store.len(), path.display());
    Ok(store)
}

// ---------------------------------------------------------------------------
// Physics grid
// ---------------------------------------------------------------------------

/// Non-numeric columns are skipped.
fn load_physics_parquet(path: &Path) -> Result<MemoryPhysicsGrid> {
    let mut columns: BTreeMap<String, Vec<f64>> = BTreeMap::new();

    for batch in read_batches(path)? {
        let schema = batch.schema();
        for (field, col) in schema.fields().iter().zip(batch.columns()) {
            if !field.data_type().is_numeric() {
                debug!("skipping non-numeric grid column '{}'", field.name());
                continue;
            }
            columns
                .entry(field.name().clone())
                .or_default()
                .extend(to_f64(col)?);
        }
    }

    let mut grid = MemoryPhysicsGrid::new();
    for (name, values) in columns {
        grid = grid.with_column(name, values);
    }
    debug!(
        "read {} physics columns ({} rows) from {}",
        grid.columns.len(),
        grid.n_rows().unwrap_or(0),
        path.display()
    );
    Ok(grid)
}

fn load_physics_csv(path: &Path) -> Result<MemoryPhysicsGrid> {
    let mut reader = csv::Reader::from_path(path)?;
    let headers: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();
    let mut columns: Vec<Vec<f64>> = vec![Vec::new(); headers.len()];

    for (row_no, record) in reader.records().enumerate() {
        let record = record?;
        for (col_idx, cell) in record.iter().enumerate() {
            let value = cell.trim().parse::<f64>().map_err(|_| {
                malformed(format!(
                    "CSV row {row_no}, column '{}': '{cell}' is not a number",
                    headers[col_idx]
                ))
            })?;
            columns[col_idx].push(value);
        }
    }

    let mut grid = MemoryPhysicsGrid::new();
    for (name, values) in headers.into_iter().zip(columns) {
        grid = grid.with_column(name, values);
    }
    Ok(grid)
}

// ---------------------------------------------------------------------------
// Noise grid
// ---------------------------------------------------------------------------

/// Non-list columns are skipped.
fn load_noise_parquet(path: &Path) -> Result<MemoryNoiseGrid> {
    // name → (realizations per row, rows, row-major values)
    let mut columns: BTreeMap<String, (Option<usize>, usize, Vec<f64>)> = BTreeMap::new();

    for batch in read_batches(path)? {
        let schema = batch.schema();
        for (field, col) in schema.fields().iter().zip(batch.columns()) {
            if !matches!(field.data_type(), DataType::List(_) | DataType::LargeList(_)) {
                debug!("skipping non-list noise column '{}'", field.name());
                continue;
            }
            let (width, rows, flat) = columns.entry(field.name().clone()).or_default();
            for row in 0..batch.num_rows() {
                let trials = list_f64(col, row).map_err(|e| {
                    malformed(format!("noise column '{}', row {row}: {e}", field.name()))
                })?;
                match *width {
                    None => *width = Some(trials.len()),
                    Some(w) if w != trials.len() => {
                        return Err(malformed(format!(
                            "noise column '{}': row {row} has {} realizations, expected {w}",
                            field.name(),
                            trials.len()
                        )));
                    }
                    Some(_) => {}
                }
                flat.extend(trials);
                *rows += 1;
            }
        }
    }

    let mut grid = MemoryNoiseGrid::new();
    for (name, (width, rows, flat)) in columns {
        let array = Array2::from_shape_vec((rows, width.unwrap_or(0)), flat)
            .map_err(|e| malformed(format!("noise column '{name}': {e}")))?;
        grid = grid.with_column(name, array);
    }
    Ok(grid)
}

// ---------------------------------------------------------------------------
// Parquet / Arrow helpers
// ---------------------------------------------------------------------------

fn read_batches(path: &Path) -> Result<Vec<RecordBatch>> {
    let file = File::open(path)?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;
    let batches: std::result::Result<Vec<_>, _> = reader.collect();
    Ok(batches?)
}

fn required_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a ArrayRef> {
    batch
        .column_by_name(name)
        .ok_or_else(|| malformed(format!("Parquet file missing '{name}' column")))
}

/// The inner values of a List or LargeList column at the given row.
fn list_values(col: &ArrayRef, row: usize) -> Result<ArrayRef> {
    if col.is_null(row) {
        return Err(malformed("null value in list column"));
    }
    match col.data_type() {
        DataType::List(_) => Ok(col.as_list::<i32>().value(row)),
        DataType::LargeList(_) => Ok(col.as_list::<i64>().value(row)),
        other => Err(malformed(format!(
            "expected List or LargeList column, got {other:?}"
        ))),
    }
}

fn list_f64(col: &ArrayRef, row: usize) -> Result<Vec<f64>> {
    to_f64(&list_values(col, row)?)
}

fn list_i64(col: &ArrayRef, row: usize) -> Result<Vec<i64>> {
    let values = list_values(col, row)?;
    if !values.data_type().is_integer() {
        return Err(malformed(format!(
            "expected integer grid indices, got {:?}",
            values.data_type()
        )));
    }
    let values = cast(&values, &DataType::Int64)?;
    let ints = values
        .as_any()
        .downcast_ref::<Int64Array>()
        .ok_or_else(|| malformed("expected Int64 values"))?;
    if ints.null_count() > 0 {
        return Err(malformed("null grid index"));
    }
    Ok(ints.values().to_vec())
}

/// Any numeric array as `f64`; nulls become NaN.
fn to_f64(values: &ArrayRef) -> Result<Vec<f64>> {
    if !values.data_type().is_numeric() {
        return Err(malformed(format!(
            "expected numeric values, got {:?}",
            values.data_type()
        )));
    }
    let values = cast(values, &DataType::Float64)?;
    let floats = values
        .as_any()
        .downcast_ref::<Float64Array>()
        .ok_or_else(|| malformed("expected Float64 values"))?;
    Ok(floats.iter().map(|v| v.unwrap_or(f64::NAN)).collect())
}
