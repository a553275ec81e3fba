//! End-to-end tests over file-backed stores.

use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{
    Array, ArrayRef, AsArray, Float32Builder, Float64Array, Float64Builder, Int32Builder,
    ListBuilder, StringArray,
};
use arrow::datatypes::{DataType, Field, Float64Type, Schema, UInt64Type};
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;

use lnp_grid::data::export::write_gathered_parquet;
use lnp_grid::data::lnp::SparseLikelihoodLoader;
use lnp_grid::data::loader::{load_noise_grid, load_physics_grid, load_sample_store};
use lnp_grid::data::store::ObjectSampleStore;
use lnp_grid::{run_pipeline, GridConfig, GridError, StoreKind, COMPLETENESS};

const EPS: f64 = 1e-12;

fn write_parquet(path: &Path, batch: &RecordBatch) {
    let file = File::create(path).unwrap();
    let mut writer = ArrowWriter::try_new(file, batch.schema(), None).unwrap();
    writer.write(batch).unwrap();
    writer.close().unwrap();
}

fn list_field(name: &str, inner: DataType) -> Field {
    Field::new(name, DataType::List(Arc::new(Field::new("item", inner, true))), false)
}

/// Objects A and B, with indices stored as Int32.
fn sample_batch() -> RecordBatch {
    let mut idx = ListBuilder::new(Int32Builder::new());
    let mut lnp = ListBuilder::new(Float64Builder::new());
    for (rows, values) in [
        ([0, 2, 5], [-1.0, -3.0, -0.5]),
        ([1, 2, 4], [-2.0, -0.1, -7.0]),
    ] {
        idx.values().append_slice(&rows);
        idx.append(true);
        lnp.values().append_slice(&values);
        lnp.append(true);
    }

    let schema = Schema::new(vec![
        Field::new("key", DataType::Utf8, false),
        list_field("idx", DataType::Int32),
        list_field("lnp", DataType::Float64),
    ]);
    RecordBatch::try_new(
        Arc::new(schema),
        vec![
            Arc::new(StringArray::from(vec!["A", "B"])) as ArrayRef,
            Arc::new(idx.finish()),
            Arc::new(lnp.finish()),
        ],
    )
    .unwrap()
}

fn physics_batch() -> RecordBatch {
    let schema = Schema::new(vec![
        Field::new("Av", DataType::Float64, false),
        Field::new("logA", DataType::Float64, false),
        Field::new("label", DataType::Utf8, false),
    ]);
    RecordBatch::try_new(
        Arc::new(schema),
        vec![
            Arc::new(Float64Array::from(vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6])) as ArrayRef,
            Arc::new(Float64Array::from(vec![6.0, 6.5, 7.0, 7.5, 8.0, 8.5])),
            Arc::new(StringArray::from(vec!["a", "b", "c", "d", "e", "f"])),
        ],
    )
    .unwrap()
}

fn noise_batch() -> RecordBatch {
    let mut trials = ListBuilder::new(Float32Builder::new());
    for row in [
        [0.1, 0.2, 0.0],
        [0.3, 0.1, 0.2],
        [0.9, 0.8, 0.5],
        [0.0, 0.25, 0.0],
        [0.5, 0.5, 0.5],
        [0.75, 0.5, 0.0],
    ] {
        trials.values().append_slice(&row);
        trials.append(true);
    }
    let schema = Schema::new(vec![list_field(COMPLETENESS, DataType::Float32)]);
    RecordBatch::try_new(Arc::new(schema), vec![Arc::new(trials.finish()) as ArrayRef]).unwrap()
}

fn params(list: &[&str]) -> GridConfig {
    GridConfig {
        parameters: list.iter().map(|p| p.to_string()).collect(),
        ..GridConfig::default()
    }
}

#[test]
fn parquet_stores_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let samples_path = dir.path().join("lnp.parquet");
    let physics_path = dir.path().join("physics.parquet");
    let noise_path = dir.path().join("noise.parquet");
    write_parquet(&samples_path, &sample_batch());
    write_parquet(&physics_path, &physics_batch());
    write_parquet(&noise_path, &noise_batch());

    let samples = load_sample_store(&samples_path).unwrap();
    let physics = load_physics_grid(&physics_path).unwrap();
    let noise = load_noise_grid(&noise_path).unwrap();
    assert_eq!(samples.keys(), vec!["A".to_string(), "B".to_string()]);

    let cfg = GridConfig {
        expected_objects: Some(2),
        ..params(&["Av", "logA", COMPLETENESS])
    };
    let product = run_pipeline(&samples, &physics, &noise, &cfg).unwrap();
    let lnp = &product.likelihood;

    assert_eq!(lnp.shape(), (3, 2));
    assert!((lnp.shift - -0.1).abs() < EPS);
    let expected = [[-0.9, -1.9], [-2.9, 0.0], [-0.4, -6.9]];
    for (i, row) in expected.iter().enumerate() {
        for (j, want) in row.iter().enumerate() {
            assert!((lnp.values[[i, j]] - want).abs() < EPS, "({i}, {j})");
        }
    }

    for gathered in product.gathered.values() {
        assert_eq!(gathered.dim(), lnp.shape());
    }
    assert_eq!(product.gathered["Av"].column(0).to_vec(), vec![0.1, 0.3, 0.6]);
    assert_eq!(product.gathered["logA"].column(1).to_vec(), vec![6.5, 7.0, 8.0]);

    // Float32 trials are widened to f64 on load.
    assert_eq!(
        product.gathered[COMPLETENESS].column(0).to_vec(),
        vec![0.2f32 as f64, 0.9f32 as f64, 0.75]
    );
    assert_eq!(
        product.gathered[COMPLETENESS].column(1).to_vec(),
        vec![0.3f32 as f64, 0.9f32 as f64, 0.5]
    );
}

#[test]
fn export_round_trips_through_parquet() {
    let dir = tempfile::tempdir().unwrap();
    let samples_path = dir.path().join("lnp.parquet");
    let physics_path = dir.path().join("physics.parquet");
    let noise_path = dir.path().join("noise.parquet");
    let out_path = dir.path().join("gathered.parquet");
    write_parquet(&samples_path, &sample_batch());
    write_parquet(&physics_path, &physics_batch());
    write_parquet(&noise_path, &noise_batch());

    let product = run_pipeline(
        &load_sample_store(&samples_path).unwrap(),
        &load_physics_grid(&physics_path).unwrap(),
        &load_noise_grid(&noise_path).unwrap(),
        &params(&["Av"]),
    )
    .unwrap();
    write_gathered_parquet(&out_path, &product).unwrap();

    let reader = ParquetRecordBatchReaderBuilder::try_new(File::open(&out_path).unwrap())
        .unwrap()
        .build()
        .unwrap();
    let batches: Vec<RecordBatch> = reader.map(Result::unwrap).collect();
    assert_eq!(batches.len(), 1);
    let batch = &batches[0];

    let names: Vec<&str> = batch.schema_ref().fields().iter().map(|f| f.name().as_str()).collect();
    assert_eq!(names, vec!["object", "sample", "idx", "lnp", "Av"]);

    let idx = batch.column_by_name("idx").unwrap().as_primitive::<UInt64Type>();
    assert_eq!(idx.values().to_vec(), vec![0, 2, 5, 1, 2, 4]);
    let av = batch.column_by_name("Av").unwrap().as_primitive::<Float64Type>();
    assert_eq!(av.len(), 6);
    assert_eq!(av.value(4), 0.3);
}

#[test]
fn json_samples_with_csv_grid() {
    let dir = tempfile::tempdir().unwrap();
    let samples_path = dir.path().join("lnp.json");
    let physics_path = dir.path().join("physics.csv");
    let noise_path = dir.path().join("noise.parquet");
    std::fs::write(
        &samples_path,
        r#"{ "B": { "idx": [1, 2, 4], "lnp": [-2.0, -0.1, -7.0] },
             "A": { "idx": [0, 2, 5], "lnp": [-1.0, -3.0, -0.5] } }"#,
    )
    .unwrap();
    std::fs::write(&physics_path, "Av\n0.1\n0.2\n0.3\n0.4\n0.5\n0.6\n").unwrap();
    write_parquet(&noise_path, &noise_batch());

    let samples = load_sample_store(&samples_path).unwrap();
    let physics = load_physics_grid(&physics_path).unwrap();
    let noise = load_noise_grid(&noise_path).unwrap();

    let product = run_pipeline(&samples, &physics, &noise, &params(&["Av"])).unwrap();
    assert_eq!(product.likelihood.keys, vec!["A".to_string(), "B".to_string()]);
    assert_eq!(product.gathered["Av"].column(0).to_vec(), vec![0.1, 0.3, 0.6]);

    let err = run_pipeline(&samples, &physics, &noise, &params(&["Av", "Rv"])).unwrap_err();
    assert!(matches!(
        err,
        GridError::MissingParameter { ref name, store: StoreKind::Physics } if name == "Rv"
    ));
}

#[test]
fn explicit_key_order_over_file_store() {
    let dir = tempfile::tempdir().unwrap();
    let samples_path = dir.path().join("lnp.parquet");
    write_parquet(&samples_path, &sample_batch());
    let samples = load_sample_store(&samples_path).unwrap();

    let keys = vec!["B".to_string(), "A".to_string()];
    let lnp = SparseLikelihoodLoader::load_ordered(&samples, &keys).unwrap();
    assert_eq!(lnp.indices.column(0).to_vec(), vec![1, 2, 4]);
    assert_eq!(lnp.indices.column(1).to_vec(), vec![0, 2, 5]);
}

#[test]
fn sample_store_without_idx_column_is_malformed() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lnp.parquet");
    let schema = Schema::new(vec![Field::new("key", DataType::Utf8, false)]);
    let batch = RecordBatch::try_new(
        Arc::new(schema),
        vec![Arc::new(StringArray::from(vec!["A"])) as ArrayRef],
    )
    .unwrap();
    write_parquet(&path, &batch);

    assert!(matches!(load_sample_store(&path), Err(GridError::Format(_))));
}

#[test]
fn repeated_key_in_parquet_store_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lnp.parquet");

    let mut idx = ListBuilder::new(Int32Builder::new());
    let mut lnp = ListBuilder::new(Float64Builder::new());
    for (rows, values) in [([0, 1], [-1.0, -2.0]), ([2, 3], [-0.5, -0.7]), ([4, 5], [-3.0, -0.2])] {
        idx.values().append_slice(&rows);
        idx.append(true);
        lnp.values().append_slice(&values);
        lnp.append(true);
    }
    let schema = Schema::new(vec![
        Field::new("key", DataType::Utf8, false),
        list_field("idx", DataType::Int32),
        list_field("lnp", DataType::Float64),
    ]);
    let batch = RecordBatch::try_new(
        Arc::new(schema),
        vec![
            Arc::new(StringArray::from(vec!["A", "B", "A"])) as ArrayRef,
            Arc::new(idx.finish()),
            Arc::new(lnp.finish()),
        ],
    )
    .unwrap();
    write_parquet(&path, &batch);

    assert!(matches!(
        load_sample_store(&path),
        Err(GridError::DuplicateObject(key)) if key == "A"
    ));
}

#[test]
fn ragged_noise_realizations_are_malformed() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("noise.parquet");

    let mut trials = ListBuilder::new(Float64Builder::new());
    trials.values().append_slice(&[0.1, 0.2, 0.3]);
    trials.append(true);
    trials.values().append_slice(&[0.4, 0.5]);
    trials.append(true);
    let schema = Schema::new(vec![list_field(COMPLETENESS, DataType::Float64)]);
    let batch =
        RecordBatch::try_new(Arc::new(schema), vec![Arc::new(trials.finish()) as ArrayRef]).unwrap();
    write_parquet(&path, &batch);

    match load_noise_grid(&path) {
        Err(GridError::Format(msg)) => assert!(msg.contains("row 1 has 2 realizations"), "{msg}"),
        other => panic!("unexpected result: {other:?}"),
    }
}
