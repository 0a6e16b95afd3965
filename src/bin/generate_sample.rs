use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, BooleanArray, Date32Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use arrow::util::pretty::pretty_format_batches;
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use parquet::arrow::ArrowWriter;
use serde::Serialize;

const ROWS: usize = 2000;

const LOCATIONS: [(&str, f64); 5] = [
    ("Lagos", 0.16),
    ("Ibadan", 0.24),
    ("Abuja", 0.20),
    ("Kano", 0.27),
    ("Port Harcourt", 0.22),
];

/// Department name, typical patient age, no-show adjustment.
const DEPARTMENTS: [(&str, f64, f64); 7] = [
    ("General Medicine", 38.0, 0.00),
    ("Pediatrics", 7.0, -0.03),
    ("Cardiology", 58.0, 0.08),
    ("Endocrinology", 52.0, 0.07),
    ("Obstetrics/Gynecology", 29.0, -0.02),
    ("Orthopedics", 44.0, 0.01),
    ("Surgery", 47.0, 0.02),
];

/// One output row, column names as in the hospital workbook.
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct SampleRow {
    appointment_date: NaiveDate,
    booking_date: NaiveDate,
    age: i64,
    gender: &'static str,
    location: &'static str,
    department: &'static str,
    health_insurance: &'static str,
    #[serde(rename = "SMSReminderSent")]
    sms_reminder_sent: &'static str,
    no_show: bool,
}

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

    fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

fn generate_row(rng: &mut SimpleRng, start: NaiveDate) -> SampleRow {
    let (location, location_rate) = LOCATIONS[rng.below(LOCATIONS.len())];
    let (department, typical_age, department_shift) = DEPARTMENTS[rng.below(DEPARTMENTS.len())];

    let gender = match department {
        "Obstetrics/Gynecology" => "Female",
        "Surgery" | "Orthopedics" if rng.chance(0.62) => "Male",
        _ if rng.chance(0.47) => "Male",
        _ => "Female",
    };
    let age = rng.gauss(typical_age, 12.0).round().clamp(0.0, 95.0) as i64;

    let appointment_date = start + Duration::days(rng.below(365) as i64);
    let waiting = rng.gauss(12.0, 9.0).round().clamp(-2.0, 60.0) as i64;
    let booking_date = appointment_date - Duration::days(waiting);

    let insured = rng.chance(0.55);
    let reminded = rng.chance(0.6);

    let mut p = location_rate + department_shift + waiting as f64 * 0.004;
    if insured {
        p -= 0.06;
    }
    if reminded {
        p -= 0.08;
    }
    if matches!(appointment_date.weekday(), Weekday::Wed | Weekday::Thu) {
        p += 0.03;
    }

    SampleRow {
        appointment_date,
        booking_date,
        age,
        gender,
        location,
        department,
        health_insurance: if insured { "Yes" } else { "No" },
        sms_reminder_sent: if reminded { "Yes" } else { "No" },
        no_show: rng.chance(p.clamp(0.02, 0.9)),
    }
}

fn to_batch(rows: &[SampleRow]) -> Result<RecordBatch> {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).context("epoch date")?;
    let days = |d: NaiveDate| (d - epoch).num_days() as i32;
    let text = |f: fn(&SampleRow) -> &'static str| -> ArrayRef {
        Arc::new(StringArray::from(rows.iter().map(f).collect::<Vec<_>>()))
    };

    let schema = Arc::new(Schema::new(vec![
        Field::new("AppointmentDate", DataType::Date32, false),
        Field::new("BookingDate", DataType::Date32, false),
        Field::new("Age", DataType::Int64, false),
        Field::new("Gender", DataType::Utf8, false),
        Field::new("Location", DataType::Utf8, false),
        Field::new("Department", DataType::Utf8, false),
        Field::new("HealthInsurance", DataType::Utf8, false),
        Field::new("SMSReminderSent", DataType::Utf8, false),
        Field::new("NoShow", DataType::Boolean, false),
    ]));

    let columns: Vec<ArrayRef> = vec![
        Arc::new(Date32Array::from(
            rows.iter().map(|r| days(r.appointment_date)).collect::<Vec<_>>(),
        )),
        Arc::new(Date32Array::from(
            rows.iter().map(|r| days(r.booking_date)).collect::<Vec<_>>(),
        )),
        Arc::new(Int64Array::from(rows.iter().map(|r| r.age).collect::<Vec<_>>())),
        text(|r| r.gender),
        text(|r| r.location),
        text(|r| r.department),
        text(|r| r.health_insurance),
        text(|r| r.sms_reminder_sent),
        Arc::new(BooleanArray::from(
            rows.iter().map(|r| r.no_show).collect::<Vec<_>>(),
        )),
    ];

    RecordBatch::try_new(schema, columns).context("building record batch")
}

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).context("start date")?;
    let rows: Vec<SampleRow> = (0..ROWS).map(|_| generate_row(&mut rng, start)).collect();

    // CSV
    let csv_path = "sample_appointments.csv";
    let mut writer = csv::Writer::from_path(csv_path).context("creating CSV file")?;
    for row in &rows {
        writer.serialize(row).context("writing CSV row")?;
    }
    writer.flush().context("flushing CSV file")?;

    // Parquet
    let batch = to_batch(&rows)?;
    let parquet_path = "sample_appointments.parquet";
    let file = std::fs::File::create(parquet_path).context("creating parquet file")?;
    let mut parquet = ArrowWriter::try_new(file, batch.schema(), None).context("creating writer")?;
    parquet.write(&batch).context("writing batch")?;
    parquet.close().context("closing writer")?;

    println!("{}", pretty_format_batches(&[batch.slice(0, 5)])?);
    println!("Wrote {ROWS} appointments to {csv_path} and {parquet_path}");
    Ok(())
}
