use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, StringArray, UInt64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

use super::model::GridProduct;
use crate::error::Result;

/// Columns written ahead of the gathered parameters.
const FIXED_COLUMNS: [&str; 4] = ["object", "sample", "idx", "lnp"];

/// Flatten a [`GridProduct`] into one record batch with a row per
/// `(object, sample)` slot, objects outermost.
///
/// Schema: `object` (Utf8), `sample` (UInt64), `idx` (UInt64), `lnp` (Float64),
/// then one Float64 column per gathered parameter in name order. A gathered
/// parameter that clashes with a fixed column name is prefixed with `grid_`.
pub fn to_record_batch(product: &GridProduct) -> Result<RecordBatch> {
    let lnp = &product.likelihood;
    let (n_samples, n_objects) = lnp.shape();
    let n_rows = n_samples * n_objects;

    let mut objects = Vec::with_capacity(n_rows);
    let mut samples = Vec::with_capacity(n_rows);
    let mut idx = Vec::with_capacity(n_rows);
    let mut values = Vec::with_capacity(n_rows);
    for (j, key) in lnp.keys.iter().enumerate() {
        for i in 0..n_samples {
            objects.push(key.as_str());
            samples.push(i as u64);
            idx.push(lnp.indices[[i, j]] as u64);
            values.push(lnp.values[[i, j]]);
        }
    }

    let mut fields = vec![
        Field::new("object", DataType::Utf8, false),
        Field::new("sample", DataType::UInt64, false),
        Field::new("idx", DataType::UInt64, false),
        Field::new("lnp", DataType::Float64, false),
    ];
    let mut arrays: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from(objects)),
        Arc::new(UInt64Array::from(samples)),
        Arc::new(UInt64Array::from(idx)),
        Arc::new(Float64Array::from(values)),
    ];

    for (name, gathered) in &product.gathered {
        let column_name = if FIXED_COLUMNS.contains(&name.as_str()) {
            format!("grid_{name}")
        } else {
            name.clone()
        };
        // Transposed view iterates object-major, matching the rows above.
        let column: Vec<f64> = gathered.t().iter().copied().collect();
        fields.push(Field::new(column_name, DataType::Float64, false));
        arrays.push(Arc::new(Float64Array::from(column)));
    }

    Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays)?)
}

/// Write a [`GridProduct`] to a Parquet file (see [`to_record_batch`] for the layout).
pub fn write_gathered_parquet(path: &Path, product: &GridProduct) -> Result<()> {
    let batch = to_record_batch(product)?;
    let file = File::create(path)?;
    let mut writer = ArrowWriter::try_new(file, batch.schema(), None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}
