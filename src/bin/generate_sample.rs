use std::sync::Arc;

use arrow::array::{Date32Array, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::NaiveDate;
use parquet::arrow::ArrowWriter;

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
        (self.next_u64() % n as u64) as usize
    }

    fn pick<'a, T>(&mut self, items: &'a [T]) -> &'a T {
        &items[self.below(items.len())]
    }
}

const ROWS: usize = 1000;

const ZONES: &[(&str, &[&str])] = &[
    ("Europa", &["España", "Francia", "Alemania", "Italia", "Portugal"]),
    ("Asia", &["Japón", "India", "China", "Vietnam"]),
    ("América del Norte", &["México", "Canadá", "Estados Unidos"]),
    ("América del Sur", &["Chile", "Argentina", "Perú", "Colombia"]),
    ("África", &["Marruecos", "Kenia", "Egipto"]),
];

/// (product type, unit price)
const PRODUCTS: &[(&str, f64)] = &[
    ("Ropa", 109.28),
    ("Cosméticos", 437.20),
    ("Bebidas", 47.45),
    ("Fruta", 9.33),
    ("Cereales", 205.70),
    ("Material de oficina", 651.21),
    ("Electrodomésticos", 668.27),
];

const CHANNELS: &[&str] = &["Online", "Offline"];

fn main() {
    let mut rng = SimpleRng::new(42);

    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).expect("valid epoch");
    let first_day = NaiveDate::from_ymd_opt(2023, 1, 1).expect("valid start date");
    let first_offset = (first_day - epoch).num_days() as i32;

    let mut zones = Vec::with_capacity(ROWS);
    let mut countries = Vec::with_capacity(ROWS);
    let mut products = Vec::with_capacity(ROWS);
    let mut channels = Vec::with_capacity(ROWS);
    let mut dates = Vec::with_capacity(ROWS);
    let mut units = Vec::with_capacity(ROWS);
    let mut prices = Vec::with_capacity(ROWS);
    let mut totals = Vec::with_capacity(ROWS);

    for _ in 0..ROWS {
        let (zone, zone_countries) = rng.pick(ZONES);
        let (product, price) = rng.pick(PRODUCTS);
        let qty = 1 + rng.below(10_000) as i64;
        // Prices drift up to ±5% around the list price.
        let unit_price = ((price * (0.95 + rng.next_f64() * 0.10)) * 100.0).round() / 100.0;

        zones.push(*zone);
        countries.push(*rng.pick(*zone_countries));
        products.push(*product);
        channels.push(*rng.pick(CHANNELS));
        dates.push(first_offset + rng.below(730) as i32);
        units.push(qty);
        prices.push(unit_price);
        totals.push(((qty as f64 * unit_price) * 100.0).round() / 100.0);
    }

    let schema = Arc::new(Schema::new(vec![
        Field::new("Zona", DataType::Utf8, false),
        Field::new("País", DataType::Utf8, false),
        Field::new("Tipo de producto", DataType::Utf8, false),
        Field::new("Canal de venta", DataType::Utf8, false),
        Field::new("Fecha pedido", DataType::Date32, false),
        Field::new("Unidades", DataType::Int64, false),
        Field::new("Precio unitario", DataType::Float64, false),
        Field::new("Importe venta total", DataType::Float64, false),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(StringArray::from(zones)),
            Arc::new(StringArray::from(countries)),
            Arc::new(StringArray::from(products)),
            Arc::new(StringArray::from(channels)),
            Arc::new(Date32Array::from(dates)),
            Arc::new(Int64Array::from(units)),
            Arc::new(Float64Array::from(prices)),
            Arc::new(Float64Array::from(totals)),
        ],
    )
    .expect("Failed to create RecordBatch");

    // Write Parquet
    let output_path = "sample_sales.parquet";
    let file = std::fs::File::create(output_path).expect("Failed to create output file");
    let mut writer = ArrowWriter::try_new(file, schema, None).expect("Failed to create writer");
    writer.write(&batch).expect("Failed to write batch");
    writer.close().expect("Failed to close writer");

    println!("Wrote {ROWS} sales records to {output_path}");
}
