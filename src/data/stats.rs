//! Aggregate queries over a [`FilteredView`].
//!
//! Every query is pure: it reads the view and returns owned summary values.
//! Means come back as `Option<f64>`; `None` is the "no data" state of an
//! empty subset.

use std::collections::{BTreeMap, BTreeSet};

use super::filter::FilteredView;
use super::model::Facet;

pub const MALE: &str = "Male";
pub const FEMALE: &str = "Female";

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Mean no-show rate of one group.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupRate {
    pub label: String,
    pub rate: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupCount {
    pub label: String,
    pub count: usize,
}

/// Mean age of one (gender, department) pair, rounded to one decimal.
#[derive(Debug, Clone, PartialEq)]
pub struct MeanAge {
    pub gender: String,
    pub department: String,
    pub mean_age: f64,
}

/// Count matrix of two facets. Unobserved combinations hold 0.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrossTab {
    pub row_labels: Vec<String>,
    pub column_labels: Vec<String>,
    /// `counts[row][column]`
    counts: Vec<Vec<usize>>,
}

impl CrossTab {
    pub fn is_empty(&self) -> bool {
        self.row_labels.is_empty()
    }

    pub fn row(&self, index: usize) -> &[usize] {
        &self.counts[index]
    }

    #[cfg(test)]
    pub fn count(&self, row: &str, column: &str) -> usize {
        let r = self.row_labels.iter().position(|l| l == row);
        let c = self.column_labels.iter().position(|l| l == column);
        match (r, c) {
            (Some(r), Some(c)) => self.counts[r][c],
            _ => 0,
        }
    }

    pub fn row_total(&self, index: usize) -> usize {
        self.counts[index].iter().sum()
    }

    /// Row holding the largest count in `column`; the first such row wins ties.
    pub fn column_argmax(&self, column: &str) -> Option<(&str, usize)> {
        let c = self.column_labels.iter().position(|l| l == column)?;
        let mut best: Option<(usize, usize)> = None;
        for (r, counts) in self.counts.iter().enumerate() {
            match best {
                Some((_, n)) if counts[c] <= n => {}
                _ => best = Some((r, counts[c])),
            }
        }
        best.map(|(r, n)| (self.row_labels[r].as_str(), n))
    }
}

/// The headline numbers.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub rows: usize,
    pub no_show_rate: Option<f64>,
    pub mean_waiting_days: Option<f64>,
    pub mean_age: Option<f64>,
    pub departments: usize,
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Arithmetic mean, `None` for no values.
pub fn mean<I: IntoIterator<Item = f64>>(values: I) -> Option<f64> {
    let (sum, n) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}

pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

pub fn no_show_rate(view: &FilteredView) -> Option<f64> {
    mean(view.records().map(|r| r.no_show as f64))
}

pub fn mean_waiting_days(view: &FilteredView) -> Option<f64> {
    mean(view.records().map(|r| r.waiting_days as f64))
}

pub fn mean_age(view: &FilteredView) -> Option<f64> {
    mean(view.records().map(|r| r.age as f64))
}

pub fn department_count(view: &FilteredView) -> usize {
    view.records()
        .map(|r| r.department.as_str())
        .collect::<BTreeSet<_>>()
        .len()
}

pub fn summary(view: &FilteredView) -> Summary {
    Summary {
        rows: view.len(),
        no_show_rate: no_show_rate(view),
        mean_waiting_days: mean_waiting_days(view),
        mean_age: mean_age(view),
        departments: department_count(view),
    }
}

/// Mean no-show rate per value of `facet`.
///
/// Weekday, month and age group come back in calendar / age order; the other
/// facets sort by label.
pub fn no_show_by(view: &FilteredView, facet: Facet) -> Vec<GroupRate> {
    let mut groups: BTreeMap<(u32, &str), (u64, usize)> = BTreeMap::new();
    for record in view.records() {
        let entry = groups.entry(facet.key(record)).or_default();
        entry.0 += record.no_show as u64;
        entry.1 += 1;
    }
    groups
        .into_iter()
        .map(|((_, label), (missed, count))| GroupRate {
            label: label.to_string(),
            rate: missed as f64 / count as f64,
            count,
        })
        .collect()
}

/// Monthly no-show rate in calendar order, for trend display.
pub fn monthly_trend(view: &FilteredView) -> Vec<GroupRate> {
    no_show_by(view, Facet::Month)
}

/// Number of appointments per value of `facet`, in the same order as [`no_show_by`].
pub fn counts_by(view: &FilteredView, facet: Facet) -> Vec<GroupCount> {
    let mut groups: BTreeMap<(u32, &str), usize> = BTreeMap::new();
    for record in view.records() {
        *groups.entry(facet.key(record)).or_default() += 1;
    }
    groups
        .into_iter()
        .map(|((_, label), count)| GroupCount {
            label: label.to_string(),
            count,
        })
        .collect()
}

/// Count matrix with one row per observed `rows` value and one column per
/// observed `columns` value.
pub fn cross_tab(view: &FilteredView, rows: Facet, columns: Facet) -> CrossTab {
    let mut row_keys: BTreeSet<(u32, &str)> = BTreeSet::new();
    let mut column_keys: BTreeSet<(u32, &str)> = BTreeSet::new();
    let mut cells: BTreeMap<((u32, &str), (u32, &str)), usize> = BTreeMap::new();

    for record in view.records() {
        let r = rows.key(record);
        let c = columns.key(record);
        row_keys.insert(r);
        column_keys.insert(c);
        *cells.entry((r, c)).or_default() += 1;
    }

    let counts = row_keys
        .iter()
        .map(|r| {
            column_keys
                .iter()
                .map(|c| cells.get(&(*r, *c)).copied().unwrap_or(0))
                .collect()
        })
        .collect();

    CrossTab {
        row_labels: row_keys.iter().map(|(_, l)| l.to_string()).collect(),
        column_labels: column_keys.iter().map(|(_, l)| l.to_string()).collect(),
        counts,
    }
}

pub fn age_group_by_department(view: &FilteredView) -> CrossTab {
    cross_tab(view, Facet::AgeGroup, Facet::Department)
}

pub fn department_by_gender(view: &FilteredView) -> CrossTab {
    cross_tab(view, Facet::Department, Facet::Gender)
}

/// Department with the most patients of `gender`, with that count.
///
/// `None` when the gender does not occur in the subset.
pub fn top_department_for(table: &CrossTab, gender: &str) -> Option<(String, usize)> {
    table
        .column_argmax(gender)
        .map(|(department, n)| (department.to_string(), n))
}

/// Mean age per (gender, department), sorted by gender then department.
pub fn mean_age_by_gender_department(view: &FilteredView) -> Vec<MeanAge> {
    let mut groups: BTreeMap<(&str, &str), (u64, usize)> = BTreeMap::new();
    for record in view.records() {
        let entry = groups
            .entry((record.gender.as_str(), record.department.as_str()))
            .or_default();
        entry.0 += record.age as u64;
        entry.1 += 1;
    }
    groups
        .into_iter()
        .map(|((gender, department), (total, n))| MeanAge {
            gender: gender.to_string(),
            department: department.to_string(),
            mean_age: round1(total as f64 / n as f64),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::data::filter::FacetSelection;
    use crate::data::test_support::{dataset_from, sample_dataset, RowSpec};

    fn rates(view: &FilteredView, facet: Facet) -> Vec<(String, f64, usize)> {
        no_show_by(view, facet)
            .into_iter()
            .map(|g| (g.label, g.rate, g.count))
            .collect()
    }

    #[test]
    fn no_show_rates_per_categorical_facet() {
        let ds = dataset_from(&[
            RowSpec::new("Lagos", "Cardiology", "Male", 1).insured("No").reminded("No"),
            RowSpec::new("Lagos", "Surgery", "Female", 0).insured("Yes").reminded("Yes"),
            RowSpec::new("Kano", "Cardiology", "Female", 1).insured("No").reminded("Yes"),
            RowSpec::new("Kano", "Surgery", "Male", 0).insured("Yes").reminded("No"),
            RowSpec::new("Kano", "Surgery", "Female", 0).insured("Yes").reminded("Yes"),
        ]);
        let view = FilteredView::new(&ds, &FacetSelection::all(&ds));
        let s = |v: &str| v.to_string();

        assert_eq!(
            rates(&view, Facet::Gender),
            [(s("Female"), 1.0 / 3.0, 3), (s("Male"), 0.5, 2)]
        );
        assert_eq!(
            rates(&view, Facet::Department),
            [(s("Cardiology"), 1.0, 2), (s("Surgery"), 0.0, 3)]
        );
        assert_eq!(
            rates(&view, Facet::HealthInsurance),
            [(s("No"), 1.0, 2), (s("Yes"), 0.0, 3)]
        );
        assert_eq!(
            rates(&view, Facet::SmsReminder),
            [(s("No"), 0.5, 2), (s("Yes"), 1.0 / 3.0, 3)]
        );
        assert_eq!(
            rates(&view, Facet::Location),
            [(s("Kano"), 1.0 / 3.0, 3), (s("Lagos"), 0.5, 2)]
        );
    }

    #[test]
    fn lagos_scenario() {
        let ds = sample_dataset();
        let mut selection = FacetSelection::all(&ds);
        selection.locations = BTreeSet::from(["Lagos".to_string()]);
        let view = FilteredView::new(&ds, &selection);

        let s = summary(&view);
        assert_eq!(s.rows, 2);
        assert_eq!(s.no_show_rate, Some(0.5));
        assert_eq!(s.departments, 1);

        let by_gender = department_by_gender(&view);
        assert_eq!(
            top_department_for(&by_gender, MALE),
            Some(("Cardiology".to_string(), 1))
        );
        assert_eq!(
            top_department_for(&by_gender, FEMALE),
            Some(("Cardiology".to_string(), 1))
        );
    }

    #[test]
    fn empty_subset_reports_no_data() {
        let ds = sample_dataset();
        let selection = FacetSelection {
            locations: BTreeSet::from(["Kano".to_string()]),
            departments: ds.departments.clone(),
        };
        let view = FilteredView::new(&ds, &selection);

        let s = summary(&view);
        assert_eq!(s.rows, 0);
        assert_eq!(s.no_show_rate, None);
        assert_eq!(s.mean_waiting_days, None);
        assert_eq!(s.mean_age, None);
        assert_eq!(s.departments, 0);
        assert!(no_show_by(&view, Facet::Weekday).is_empty());
        assert!(monthly_trend(&view).is_empty());
        assert!(age_group_by_department(&view).is_empty());
        assert_eq!(top_department_for(&department_by_gender(&view), MALE), None);
        assert!(mean_age_by_gender_department(&view).is_empty());
    }

    #[test]
    fn weekdays_come_back_monday_first() {
        // 2024-01-07 is a Sunday, 2024-01-10 a Wednesday, 2024-01-08 a Monday.
        let ds = dataset_from(&[
            RowSpec::new("Lagos", "Cardiology", "Male", 1).on("2024-01-07"),
            RowSpec::new("Lagos", "Cardiology", "Male", 0).on("2024-01-10"),
            RowSpec::new("Lagos", "Cardiology", "Male", 1).on("2024-01-08"),
            RowSpec::new("Lagos", "Cardiology", "Male", 0).on("2024-01-13"),
        ]);
        let view = FilteredView::new(&ds, &FacetSelection::all(&ds));
        let labels: Vec<_> = no_show_by(&view, Facet::Weekday)
            .into_iter()
            .map(|g| g.label)
            .collect();
        assert_eq!(labels, vec!["Monday", "Wednesday", "Saturday", "Sunday"]);
    }

    #[test]
    fn months_follow_calendar_order() {
        let ds = dataset_from(&[
            RowSpec::new("Lagos", "Cardiology", "Male", 1).on("2024-12-02"),
            RowSpec::new("Lagos", "Cardiology", "Male", 0).on("2024-04-02"),
            RowSpec::new("Lagos", "Cardiology", "Male", 1).on("2024-04-03"),
            RowSpec::new("Lagos", "Cardiology", "Male", 0).on("2024-08-02"),
        ]);
        let view = FilteredView::new(&ds, &FacetSelection::all(&ds));
        let trend = monthly_trend(&view);
        let labels: Vec<_> = trend.iter().map(|g| g.label.as_str()).collect();
        assert_eq!(labels, vec!["April", "August", "December"]);
        assert_eq!(trend[0].rate, 0.5);
        assert_eq!(trend[0].count, 2);
    }

    #[test]
    fn age_department_cross_tab_is_zero_filled() {
        let ds = dataset_from(&[
            RowSpec::new("Lagos", "Pediatrics", "Male", 0).aged(5),
            RowSpec::new("Lagos", "Pediatrics", "Female", 0).aged(9),
            RowSpec::new("Abuja", "Cardiology", "Female", 1).aged(67),
        ]);
        let view = FilteredView::new(&ds, &FacetSelection::all(&ds));
        let table = age_group_by_department(&view);

        assert_eq!(table.row_labels, vec!["Children", "Adults"]);
        assert_eq!(table.column_labels, vec!["Cardiology", "Pediatrics"]);
        assert_eq!(table.row(0), &[0, 2]);
        assert_eq!(table.row(1), &[1, 0]);
        assert_eq!(table.count("Adults", "Pediatrics"), 0);
        assert_eq!(table.count("Young Adults", "Cardiology"), 0);
        assert_eq!(table.row_total(0), 2);
    }

    #[test]
    fn gender_argmax_ties_break_on_first_department() {
        let ds = dataset_from(&[
            RowSpec::new("Lagos", "Surgery", "Male", 0),
            RowSpec::new("Lagos", "Orthopedics", "Male", 0),
            RowSpec::new("Lagos", "Orthopedics", "Female", 0),
        ]);
        let view = FilteredView::new(&ds, &FacetSelection::all(&ds));
        let table = department_by_gender(&view);

        assert_eq!(table.count("Surgery", FEMALE), 0);
        assert_eq!(
            top_department_for(&table, MALE),
            Some(("Orthopedics".to_string(), 1))
        );
    }

    #[test]
    fn mean_age_is_rounded_to_one_decimal() {
        let ds = dataset_from(&[
            RowSpec::new("Lagos", "Cardiology", "Male", 0).aged(40),
            RowSpec::new("Lagos", "Cardiology", "Male", 0).aged(41),
            RowSpec::new("Lagos", "Cardiology", "Male", 0).aged(41),
            RowSpec::new("Lagos", "Cardiology", "Female", 0).aged(30),
        ]);
        let view = FilteredView::new(&ds, &FacetSelection::all(&ds));
        let ages = mean_age_by_gender_department(&view);
        assert_eq!(
            ages,
            vec![
                MeanAge {
                    gender: "Female".into(),
                    department: "Cardiology".into(),
                    mean_age: 30.0,
                },
                MeanAge {
                    gender: "Male".into(),
                    department: "Cardiology".into(),
                    mean_age: 40.7,
                },
            ]
        );
    }

    #[test]
    fn headline_means() {
        let ds = dataset_from(&[
            RowSpec::new("Lagos", "Cardiology", "Male", 1)
                .aged(20)
                .booked("2024-01-01", "2024-01-11"),
            RowSpec::new("Lagos", "Surgery", "Female", 0)
                .aged(40)
                .booked("2024-01-05", "2024-01-07"),
        ]);
        let view = FilteredView::new(&ds, &FacetSelection::all(&ds));
        let s = summary(&view);
        assert_eq!(s.mean_age, Some(30.0));
        assert_eq!(s.mean_waiting_days, Some(6.0));
        assert_eq!(s.no_show_rate, Some(0.5));
        assert_eq!(s.departments, 2);
        assert_eq!(
            counts_by(&view, Facet::Gender),
            vec![
                GroupCount { label: "Female".into(), count: 1 },
                GroupCount { label: "Male".into(), count: 1 },
            ]
        );
    }

    #[test]
    fn mean_of_nothing_is_none() {
        assert_eq!(mean(std::iter::empty()), None);
        assert_eq!(mean([1.0, 2.0]), Some(1.5));
        assert_eq!(round1(40.66), 40.7);
    }
}
