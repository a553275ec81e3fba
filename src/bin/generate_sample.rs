use std::path::Path;
use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, Float64Builder, Int64Builder, ListBuilder, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

const N_GRID: usize = 600;
const N_REALIZATIONS: usize = 8;
const N_OBJECTS: usize = 40;
const N_SAMPLES: usize = 25;

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn below(&mut self, n: usize) -> usize {
        (self.next_f64() * n as f64) as usize % n
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

fn write_batch(path: &str, batch: &RecordBatch) {
    let file = std::fs::File::create(Path::new(path)).expect("Failed to create output file");
    let mut writer = ArrowWriter::try_new(file, batch.schema(), None).expect("Failed to create writer");
    writer.write(batch).expect("Failed to write batch");
    writer.close().expect("Failed to close writer");
}

fn list_field(name: &str, inner: DataType) -> Field {
    Field::new(name, DataType::List(Arc::new(Field::new("item", inner, true))), false)
}

/// Physics grid: a regular lattice over log-age, mass and extinction with a
/// few fixed dust and metallicity values.
fn physics_grid() -> RecordBatch {
    let columns: [(&str, fn(usize) -> f64); 6] = [
        ("Av", |r: usize| (r % 10) as f64 * 0.5),
        ("Rv", |r: usize| [2.5, 3.1, 4.0][(r / 10) % 3]),
        ("f_A", |r: usize| [0.0, 0.5, 1.0][(r / 30) % 3]),
        ("M_ini", |r: usize| 0.8 + (r / 90) as f64 * 0.6),
        ("logA", |r: usize| 6.0 + (r % 7) as f64 * 0.5),
        ("Z", |r: usize| [0.004, 0.008, 0.019][r % 3]),
    ];

    let mut fields = Vec::new();
    let mut arrays: Vec<ArrayRef> = Vec::new();
    for (name, f) in &columns {
        fields.push(Field::new(*name, DataType::Float64, false));
        arrays.push(Arc::new(Float64Array::from_iter_values((0..N_GRID).map(*f))));
    }
    RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays).expect("Failed to create RecordBatch")
}

/// Noise grid: per grid point, detection fractions from independent artificial-star trials.
fn noise_grid(rng: &mut SimpleRng) -> RecordBatch {
    let mut builder = ListBuilder::new(Float64Builder::new());
    for r in 0..N_GRID {
        let base = 1.0 - (r % 10) as f64 * 0.08;
        let values = builder.values();
        for _ in 0..N_REALIZATIONS {
            values.append_value(rng.gauss(base, 0.05).clamp(0.0, 1.0));
        }
        builder.append(true);
    }

    let schema = Schema::new(vec![list_field("completeness", DataType::Float64)]);
    RecordBatch::try_new(Arc::new(schema), vec![Arc::new(builder.finish())])
        .expect("Failed to create RecordBatch")
}

/// Sample store: each object samples grid rows around a preferred row.
fn sample_store(rng: &mut SimpleRng) -> RecordBatch {
    let mut keys = Vec::with_capacity(N_OBJECTS);
    let mut idx_builder = ListBuilder::new(Int64Builder::new());
    let mut lnp_builder = ListBuilder::new(Float64Builder::new());

    for k in 0..N_OBJECTS {
        keys.push(format!("star_{k:04}"));
        let centre = rng.below(N_GRID);
        for _ in 0..N_SAMPLES {
            let offset = rng.gauss(0.0, 15.0);
            let row = (centre as f64 + offset).round().clamp(0.0, (N_GRID - 1) as f64);
            idx_builder.values().append_value(row as i64);
            lnp_builder.values().append_value(-0.5 * (offset / 15.0).powi(2) - 20.0 - k as f64);
        }
        idx_builder.append(true);
        lnp_builder.append(true);
    }

    let schema = Schema::new(vec![
        Field::new("key", DataType::Utf8, false),
        list_field("idx", DataType::Int64),
        list_field("lnp", DataType::Float64),
    ]);
    RecordBatch::try_new(
        Arc::new(schema),
        vec![
            Arc::new(StringArray::from(keys)),
            Arc::new(idx_builder.finish()),
            Arc::new(lnp_builder.finish()),
        ],
    )
    .expect("Failed to create RecordBatch")
}

fn main() {
    let mut rng = SimpleRng::new(42);

    write_batch("sample_physics.parquet", &physics_grid());
    write_batch("sample_noise.parquet", &noise_grid(&mut rng));
    write_batch("sample_lnp.parquet", &sample_store(&mut rng));

    println!(
        "Wrote {N_GRID}-point grid ({N_REALIZATIONS} noise realizations) and \
         {N_OBJECTS} objects x {N_SAMPLES} samples to sample_*.parquet"
    );
}
