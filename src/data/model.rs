use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{Datelike, Month, NaiveDate, Weekday};

// ---------------------------------------------------------------------------
// CellValue – a single cell as read from the source file
// ---------------------------------------------------------------------------

/// A dynamically-typed source cell, before the schema is applied.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    /// Native date columns (Parquet `Date32`/`Date64`/timestamps).
    Date(NaiveDate),
    Null,
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            CellValue::Null => write!(f, "<null>"),
        }
    }
}

/// One source row: column_name → cell.
pub type RawRow = BTreeMap<String, CellValue>;

/// The untyped table produced by the loaders.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    /// Column names in source order.
    pub columns: Vec<String>,
    pub rows: Vec<RawRow>,
}

impl RawTable {
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }
}

// ---------------------------------------------------------------------------
// Age groups
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AgeGroup {
    Children,
    YoungAdults,
    Adults,
}

impl AgeGroup {
    /// Canonical display order.
    pub const ALL: [AgeGroup; 3] = [AgeGroup::Children, AgeGroup::YoungAdults, AgeGroup::Adults];

    pub fn label(self) -> &'static str {
        match self {
            AgeGroup::Children => "Children",
            AgeGroup::YoungAdults => "Young Adults",
            AgeGroup::Adults => "Adults",
        }
    }

    pub fn rank(self) -> u32 {
        self as u32
    }
}

impl fmt::Display for AgeGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Right-closed age buckets: `[0,17]`, `[18,30]`, `[31, top_edge]`.
///
/// `top_edge` is the maximum age observed in the loaded dataset, so it has to
/// be rebuilt with [`AgeBands::from_max_age`] every time a dataset is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgeBands {
    pub top_edge: u32,
}

impl AgeBands {
    pub const CHILDREN_MAX: u32 = 17;
    pub const YOUNG_ADULTS_MAX: u32 = 30;

    pub fn from_max_age(max_age: u32) -> Self {
        Self { top_edge: max_age }
    }

    /// Bucket an age. Callers only pass ages `<= top_edge`, so the last band
    /// always catches the remainder.
    pub fn classify(&self, age: u32) -> AgeGroup {
        if age <= Self::CHILDREN_MAX {
            AgeGroup::Children
        } else if age <= Self::YOUNG_ADULTS_MAX {
            AgeGroup::YoungAdults
        } else {
            AgeGroup::Adults
        }
    }

    /// Human readable range for a group, e.g. `31–87`.
    pub fn range_label(&self, group: AgeGroup) -> String {
        match group {
            AgeGroup::Children => format!("0–{}", Self::CHILDREN_MAX),
            AgeGroup::YoungAdults => {
                format!("{}–{}", Self::CHILDREN_MAX + 1, Self::YOUNG_ADULTS_MAX)
            }
            AgeGroup::Adults => format!("{}–{}", Self::YOUNG_ADULTS_MAX + 1, self.top_edge),
        }
    }
}

// ---------------------------------------------------------------------------
// Calendar names
// ---------------------------------------------------------------------------

const MONTHS: [Month; 12] = [
    Month::January,
    Month::February,
    Month::March,
    Month::April,
    Month::May,
    Month::June,
    Month::July,
    Month::August,
    Month::September,
    Month::October,
    Month::November,
    Month::December,
];

pub fn month_of(date: NaiveDate) -> Month {
    MONTHS[date.month0() as usize]
}

/// English weekday name, independent of the process locale.
pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

// ---------------------------------------------------------------------------
// AppointmentRecord – one enriched row
// ---------------------------------------------------------------------------

/// A single scheduled visit with its derived fields.
#[derive(Debug, Clone, PartialEq)]
pub struct AppointmentRecord {
    pub appointment_date: NaiveDate,
    pub booking_date: NaiveDate,
    pub age: u32,
    pub gender: String,
    pub location: String,
    pub department: String,
    pub health_insurance: String,
    pub sms_reminder_sent: String,
    /// 0 = attended, 1 = missed.
    pub no_show: u8,

    // -- derived at enrichment time --
    /// May be negative when the booking date is after the appointment date.
    pub waiting_days: i64,
    pub weekday: Weekday,
    pub month: Month,
    pub age_group: AgeGroup,
}

impl AppointmentRecord {
    pub fn weekday_name(&self) -> &'static str {
        weekday_name(self.weekday)
    }

    pub fn month_name(&self) -> &'static str {
        self.month.name()
    }
}

// ---------------------------------------------------------------------------
// Facet – a categorical dimension records can be grouped by
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Facet {
    Gender,
    Location,
    Department,
    HealthInsurance,
    SmsReminder,
    Weekday,
    Month,
    AgeGroup,
}

impl Facet {
    pub fn title(self) -> &'static str {
        match self {
            Facet::Gender => "Gender",
            Facet::Location => "Location",
            Facet::Department => "Department",
            Facet::HealthInsurance => "Health Insurance",
            Facet::SmsReminder => "SMS Reminder Sent",
            Facet::Weekday => "Weekday",
            Facet::Month => "Month",
            Facet::AgeGroup => "Age Group",
        }
    }

    /// Grouping key of a record: `(rank, label)`.
    ///
    /// Calendar and age facets carry their canonical position in `rank`;
    /// free-text facets use rank 0 so that keys sort by label.
    pub fn key(self, record: &AppointmentRecord) -> (u32, &str) {
        match self {
            Facet::Gender => (0, record.gender.as_str()),
            Facet::Location => (0, record.location.as_str()),
            Facet::Department => (0, record.department.as_str()),
            Facet::HealthInsurance => (0, record.health_insurance.as_str()),
            Facet::SmsReminder => (0, record.sms_reminder_sent.as_str()),
            Facet::Weekday => (
                record.weekday.num_days_from_monday(),
                record.weekday_name(),
            ),
            Facet::Month => (record.month.number_from_month(), record.month_name()),
            Facet::AgeGroup => (record.age_group.rank(), record.age_group.label()),
        }
    }
}

// ---------------------------------------------------------------------------
// AppointmentDataset – the enriched, immutable record set
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct AppointmentDataset {
    /// Where the records came from (display only).
    pub source: String,
    pub records: Vec<AppointmentRecord>,
    pub age_bands: AgeBands,
    /// Observed values of the two filterable facets.
    pub locations: BTreeSet<String>,
    pub departments: BTreeSet<String>,
}

impl AppointmentDataset {
    /// Build the filter option sets from enriched records.
    pub fn from_records(
        source: impl Into<String>,
        records: Vec<AppointmentRecord>,
        age_bands: AgeBands,
    ) -> Self {
        let locations = records.iter().map(|r| r.location.clone()).collect();
        let departments = records.iter().map(|r| r.department.clone()).collect();
        AppointmentDataset {
            source: source.into(),
            records,
            age_bands,
            locations,
            departments,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn age_bands_are_right_closed() {
        let bands = AgeBands::from_max_age(90);
        assert_eq!(bands.classify(0), AgeGroup::Children);
        assert_eq!(bands.classify(17), AgeGroup::Children);
        assert_eq!(bands.classify(18), AgeGroup::YoungAdults);
        assert_eq!(bands.classify(30), AgeGroup::YoungAdults);
        assert_eq!(bands.classify(31), AgeGroup::Adults);
        assert_eq!(bands.classify(90), AgeGroup::Adults);
        assert_eq!(bands.range_label(AgeGroup::Adults), "31–90");
    }

    #[test]
    fn calendar_names_are_english() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        assert_eq!(weekday_name(date.weekday()), "Wednesday");
        assert_eq!(month_of(date).name(), "January");
        let date = NaiveDate::from_ymd_opt(2024, 12, 1).unwrap();
        assert_eq!(month_of(date), Month::December);
    }
}
