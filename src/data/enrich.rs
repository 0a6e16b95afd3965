//! Schema validation and derived fields.
//!
//! Turns an untyped [`RawTable`] into an [`AppointmentDataset`]. Every row must
//! satisfy the schema; the first failure aborts the whole load.

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use thiserror::Error;

use super::model::{
    month_of, AgeBands, AppointmentDataset, AppointmentRecord, CellValue, RawRow, RawTable,
};

pub const APPOINTMENT_DATE: &str = "AppointmentDate";
pub const BOOKING_DATE: &str = "BookingDate";
pub const AGE: &str = "Age";
pub const GENDER: &str = "Gender";
pub const LOCATION: &str = "Location";
pub const DEPARTMENT: &str = "Department";
pub const HEALTH_INSURANCE: &str = "HealthInsurance";
pub const SMS_REMINDER_SENT: &str = "SMSReminderSent";
pub const NO_SHOW: &str = "NoShow";

/// Columns every source must provide. Other columns are ignored.
pub const REQUIRED_COLUMNS: [&str; 9] = [
    APPOINTMENT_DATE,
    BOOKING_DATE,
    AGE,
    GENDER,
    LOCATION,
    DEPARTMENT,
    HEALTH_INSURANCE,
    SMS_REMINDER_SENT,
    NO_SHOW,
];

/// Slashed dates are month-first, as pandas reads them by default.
const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d.%m.%Y"];
const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%m/%d/%Y %H:%M:%S",
];

/// Load-boundary schema violations. Rows are 0-based data rows.
#[derive(Debug, Error, PartialEq)]
pub enum SchemaError {
    #[error("missing required column '{column}'")]
    MissingColumn { column: &'static str },
    #[error("row {row}: missing value in column '{column}'")]
    MissingValue { row: usize, column: &'static str },
    #[error("row {row}: cannot parse '{value}' in column '{column}' as a date")]
    BadDate {
        row: usize,
        column: &'static str,
        value: String,
    },
    #[error("row {row}: '{value}' is not a valid age")]
    BadAge { row: usize, value: String },
    #[error("row {row}: '{value}' in column '{column}' is not a yes/no flag")]
    BadFlag {
        row: usize,
        column: &'static str,
        value: String,
    },
}

/// Validate `table` and derive waiting days, calendar names and age groups.
pub fn enrich(
    source: impl Into<String>,
    table: &RawTable,
) -> Result<AppointmentDataset, SchemaError> {
    if let Some(column) = REQUIRED_COLUMNS.iter().copied().find(|c| !table.has_column(c)) {
        return Err(SchemaError::MissingColumn { column });
    }

    // The top band reaches the oldest patient in *this* dataset.
    let mut max_age: u32 = 0;
    for (row_no, row) in table.rows.iter().enumerate() {
        max_age = max_age.max(age_field(row_no, row)?);
    }
    let bands = AgeBands::from_max_age(max_age);

    let records = table
        .rows
        .iter()
        .enumerate()
        .map(|(row_no, row)| parse_row(row_no, row, &bands))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(AppointmentDataset::from_records(source, records, bands))
}

fn parse_row(
    row_no: usize,
    row: &RawRow,
    bands: &AgeBands,
) -> Result<AppointmentRecord, SchemaError> {
    let appointment_date = date_field(row_no, row, APPOINTMENT_DATE)?;
    let booking_date = date_field(row_no, row, BOOKING_DATE)?;
    let age = age_field(row_no, row)?;

    Ok(AppointmentRecord {
        appointment_date,
        booking_date,
        age,
        gender: text_field(row_no, row, GENDER)?,
        location: text_field(row_no, row, LOCATION)?,
        department: text_field(row_no, row, DEPARTMENT)?,
        health_insurance: text_field(row_no, row, HEALTH_INSURANCE)?,
        sms_reminder_sent: text_field(row_no, row, SMS_REMINDER_SENT)?,
        no_show: flag_field(row_no, row, NO_SHOW)?,
        waiting_days: (appointment_date - booking_date).num_days(),
        weekday: appointment_date.weekday(),
        month: month_of(appointment_date),
        age_group: bands.classify(age),
    })
}

fn cell<'a>(
    row_no: usize,
    row: &'a RawRow,
    column: &'static str,
) -> Result<&'a CellValue, SchemaError> {
    match row.get(column) {
        None | Some(CellValue::Null) => Err(SchemaError::MissingValue { row: row_no, column }),
        Some(value) => Ok(value),
    }
}

fn text_field(row_no: usize, row: &RawRow, column: &'static str) -> Result<String, SchemaError> {
    let text = cell(row_no, row, column)?.to_string();
    let text = text.trim();
    if text.is_empty() {
        return Err(SchemaError::MissingValue { row: row_no, column });
    }
    Ok(text.to_string())
}

fn date_field(
    row_no: usize,
    row: &RawRow,
    column: &'static str,
) -> Result<NaiveDate, SchemaError> {
    let value = cell(row_no, row, column)?;
    let parsed = match value {
        CellValue::Date(d) => Some(*d),
        CellValue::Text(s) => parse_date_text(s),
        _ => None,
    };
    parsed.ok_or_else(|| SchemaError::BadDate {
        row: row_no,
        column,
        value: value.to_string(),
    })
}

/// Parse a date, accepting a handful of common layouts and discarding any
/// time-of-day part.
pub fn parse_date_text(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
                .map(|dt| dt.date())
        })
}

fn age_field(row_no: usize, row: &RawRow) -> Result<u32, SchemaError> {
    let value = cell(row_no, row, AGE)?;
    let age = match value {
        CellValue::Integer(i) => u32::try_from(*i).ok(),
        CellValue::Float(f) if f.is_finite() && f.fract() == 0.0 && *f >= 0.0 => {
            u32::try_from(*f as i64).ok()
        }
        CellValue::Text(s) => s.trim().parse::<u32>().ok(),
        _ => None,
    };
    age.ok_or_else(|| SchemaError::BadAge {
        row: row_no,
        value: value.to_string(),
    })
}

/// Normalise a boolean-like cell to 0/1.
fn flag_field(row_no: usize, row: &RawRow, column: &'static str) -> Result<u8, SchemaError> {
    let value = cell(row_no, row, column)?;
    let flag = match value {
        CellValue::Bool(b) => Some(u8::from(*b)),
        CellValue::Integer(0) => Some(0),
        CellValue::Integer(1) => Some(1),
        CellValue::Float(f) if *f == 0.0 => Some(0),
        CellValue::Float(f) if *f == 1.0 => Some(1),
        CellValue::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "y" | "t" => Some(1),
            "0" | "false" | "no" | "n" | "f" => Some(0),
            _ => None,
        },
        _ => None,
    };
    flag.ok_or_else(|| SchemaError::BadFlag {
        row: row_no,
        column,
        value: value.to_string(),
    })
}
