/// Data layer: core types, loading, enrichment, filtering and aggregation.
///
/// Architecture:
/// ```text
///  .parquet / .json / .csv
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → RawTable (untyped cells)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  enrich   │  schema check, waiting days, weekday/month, age groups
///   └──────────┘
///        │
///        ▼
///   ┌────────────────────┐
///   │ AppointmentDataset │  immutable, memoized per source by `cache`
///   └────────────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  location AND department → FilteredView
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  stats    │  means, grouped rates, cross-tabs → DashboardReport
///   └──────────┘
/// ```

pub mod cache;
pub mod enrich;
pub mod filter;
pub mod loader;
pub mod model;
pub mod report;
pub mod stats;

#[cfg(test)]
pub mod test_support {
    use super::enrich::{self, enrich};
    use super::model::{AppointmentDataset, CellValue, RawRow, RawTable};

    /// One synthetic source row for tests.
    #[derive(Debug, Clone)]
    pub struct RowSpec {
        location: &'static str,
        department: &'static str,
        gender: &'static str,
        no_show: i64,
        age: i64,
        appointment: &'static str,
        booking: &'static str,
        insurance: &'static str,
        sms: &'static str,
    }

    impl RowSpec {
        pub fn new(
            location: &'static str,
            department: &'static str,
            gender: &'static str,
            no_show: i64,
        ) -> Self {
            RowSpec {
                location,
                department,
                gender,
                no_show,
                age: 30,
                appointment: "2024-01-10",
                booking: "2024-01-01",
                insurance: "Yes",
                sms: "No",
            }
        }

        pub fn aged(mut self, age: i64) -> Self {
            self.age = age;
            self
        }

        /// Appointment date.
        pub fn on(mut self, appointment: &'static str) -> Self {
            self.appointment = appointment;
            self
        }

        pub fn booked(mut self, booking: &'static str, appointment: &'static str) -> Self {
            self.booking = booking;
            self.appointment = appointment;
            self
        }

        pub fn insured(mut self, insurance: &'static str) -> Self {
            self.insurance = insurance;
            self
        }

        pub fn reminded(mut self, sms: &'static str) -> Self {
            self.sms = sms;
            self
        }

        fn to_row(&self) -> RawRow {
            let text = |s: &str| CellValue::Text(s.to_string());
            RawRow::from([
                (enrich::APPOINTMENT_DATE.to_string(), text(self.appointment)),
                (enrich::BOOKING_DATE.to_string(), text(self.booking)),
                (enrich::AGE.to_string(), CellValue::Integer(self.age)),
                (enrich::GENDER.to_string(), text(self.gender)),
                (enrich::LOCATION.to_string(), text(self.location)),
                (enrich::DEPARTMENT.to_string(), text(self.department)),
                (enrich::HEALTH_INSURANCE.to_string(), text(self.insurance)),
                (enrich::SMS_REMINDER_SENT.to_string(), text(self.sms)),
                (enrich::NO_SHOW.to_string(), CellValue::Integer(self.no_show)),
            ])
        }
    }

    pub fn dataset_from(rows: &[RowSpec]) -> AppointmentDataset {
        let table = RawTable {
            columns: enrich::REQUIRED_COLUMNS.iter().map(|c| c.to_string()).collect(),
            rows: rows.iter().map(RowSpec::to_row).collect(),
        };
        enrich("test", &table).expect("test rows satisfy the schema")
    }

    /// Lagos/Cardiology/Male/missed, Lagos/Cardiology/Female/attended,
    /// Abuja/Pediatrics/Male/attended.
    pub fn sample_dataset() -> AppointmentDataset {
        dataset_from(&[
            RowSpec::new("Lagos", "Cardiology", "Male", 1),
            RowSpec::new("Lagos", "Cardiology", "Female", 0),
            RowSpec::new("Abuja", "Pediatrics", "Male", 0),
        ])
    }
}
