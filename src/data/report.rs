use super::filter::FilteredView;
use super::model::{AgeBands, Facet};
use super::stats::{self, CrossTab, GroupCount, GroupRate, MeanAge, Summary, FEMALE, MALE};

/// Facets shown as "no-show rate by ..." charts, in page order.
pub const RATE_FACETS: [Facet; 6] = [
    Facet::Gender,
    Facet::Department,
    Facet::HealthInsurance,
    Facet::SmsReminder,
    Facet::Weekday,
    Facet::Location,
];

/// Everything the dashboard shows for one filter selection.
///
/// Rebuilt from scratch on every selection change.
#[derive(Debug, Clone)]
pub struct DashboardReport {
    pub summary: Summary,
    pub age_bands: AgeBands,
    /// First rows of the subset (dataset indices).
    pub preview: Vec<usize>,
    pub gender_counts: Vec<GroupCount>,
    pub age_group_counts: Vec<GroupCount>,
    pub rates: Vec<(Facet, Vec<GroupRate>)>,
    pub monthly_trend: Vec<GroupRate>,
    pub age_by_department: CrossTab,
    pub department_by_gender: CrossTab,
    pub top_male_department: Option<(String, usize)>,
    pub top_female_department: Option<(String, usize)>,
    pub mean_age: Vec<MeanAge>,
}

impl DashboardReport {
    pub fn build(view: &FilteredView, preview_rows: usize) -> Self {
        let department_by_gender = stats::department_by_gender(view);
        DashboardReport {
            summary: stats::summary(view),
            age_bands: view.dataset().age_bands,
            preview: view.indices().iter().take(preview_rows).copied().collect(),
            gender_counts: stats::counts_by(view, Facet::Gender),
            age_group_counts: stats::counts_by(view, Facet::AgeGroup),
            rates: RATE_FACETS
                .iter()
                .map(|&facet| (facet, stats::no_show_by(view, facet)))
                .collect(),
            monthly_trend: stats::monthly_trend(view),
            age_by_department: stats::age_group_by_department(view),
            top_male_department: stats::top_department_for(&department_by_gender, MALE),
            top_female_department: stats::top_department_for(&department_by_gender, FEMALE),
            department_by_gender,
            mean_age: stats::mean_age_by_gender_department(view),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.summary.rows == 0
    }

    pub fn rates_for(&self, facet: Facet) -> &[GroupRate] {
        self.rates
            .iter()
            .find(|(f, _)| *f == facet)
            .map(|(_, rates)| rates.as_slice())
            .unwrap_or(&[])
    }
}

/// `"12.50"`-style formatting with an explicit "no data" state.
pub fn format_stat(value: Option<f64>, decimals: usize) -> String {
    match value {
        Some(v) => format!("{v:.decimals$}"),
        None => "no data".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::data::filter::FacetSelection;
    use crate::data::test_support::sample_dataset;

    #[test]
    fn builds_full_report() {
        let ds = sample_dataset();
        let view = FilteredView::new(&ds, &FacetSelection::all(&ds));
        let report = DashboardReport::build(&view, 2);

        assert_eq!(report.summary.rows, 3);
        assert_eq!(report.preview, vec![0, 1]);
        assert_eq!(report.rates.len(), RATE_FACETS.len());
        assert_eq!(report.rates_for(Facet::Location).len(), 2);
        assert_eq!(report.rates_for(Facet::Month).len(), 0);
        assert_eq!(report.monthly_trend.len(), 1);
        // Cardiology and Pediatrics each have one male patient.
        assert_eq!(
            report.top_male_department,
            Some(("Cardiology".to_string(), 1))
        );
        assert_eq!(
            report.top_female_department,
            Some(("Cardiology".to_string(), 1))
        );
    }

    #[test]
    fn empty_selection_yields_empty_report() {
        let ds = sample_dataset();
        let selection = FacetSelection {
            locations: BTreeSet::new(),
            departments: ds.departments.clone(),
        };
        let view = FilteredView::new(&ds, &selection);
        let report = DashboardReport::build(&view, 20);

        assert!(report.is_empty());
        assert!(report.preview.is_empty());
        assert!(report.rates.iter().all(|(_, r)| r.is_empty()));
        assert_eq!(report.top_male_department, None);
        assert_eq!(format_stat(report.summary.no_show_rate, 2), "no data");
    }

    #[test]
    fn formats_stats() {
        assert_eq!(format_stat(Some(0.5), 2), "0.50");
        assert_eq!(format_stat(Some(12.34), 1), "12.3");
        assert_eq!(format_stat(None, 1), "no data");
    }
}
