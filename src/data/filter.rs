use std::collections::BTreeSet;

use super::model::{AppointmentDataset, AppointmentRecord};

// ---------------------------------------------------------------------------
// Filter predicate: which facet values are selected
// ---------------------------------------------------------------------------

/// The two facets the analyst can filter on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterColumn {
    Location,
    Department,
}

impl FilterColumn {
    pub const ALL: [FilterColumn; 2] = [FilterColumn::Location, FilterColumn::Department];

    pub fn title(self) -> &'static str {
        match self {
            FilterColumn::Location => "Location",
            FilterColumn::Department => "Department",
        }
    }

    /// All values observed for this column at load time.
    pub fn options(self, dataset: &AppointmentDataset) -> &BTreeSet<String> {
        match self {
            FilterColumn::Location => &dataset.locations,
            FilterColumn::Department => &dataset.departments,
        }
    }
}

/// Selected values per filter column.
///
/// An empty set means nothing is selected, so no row passes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FacetSelection {
    pub locations: BTreeSet<String>,
    pub departments: BTreeSet<String>,
}

impl FacetSelection {
    /// Everything selected (the default view).
    pub fn all(dataset: &AppointmentDataset) -> Self {
        FacetSelection {
            locations: dataset.locations.clone(),
            departments: dataset.departments.clone(),
        }
    }

    pub fn selected(&self, column: FilterColumn) -> &BTreeSet<String> {
        match column {
            FilterColumn::Location => &self.locations,
            FilterColumn::Department => &self.departments,
        }
    }

    pub fn selected_mut(&mut self, column: FilterColumn) -> &mut BTreeSet<String> {
        match column {
            FilterColumn::Location => &mut self.locations,
            FilterColumn::Department => &mut self.departments,
        }
    }

    /// A record passes when both its location AND its department are selected.
    pub fn admits(&self, record: &AppointmentRecord) -> bool {
        self.locations.contains(&record.location) && self.departments.contains(&record.department)
    }
}

/// Return indices of records that pass the selection, in dataset order.
pub fn filtered_indices(dataset: &AppointmentDataset, selection: &FacetSelection) -> Vec<usize> {
    dataset
        .records
        .iter()
        .enumerate()
        .filter(|(_, record)| selection.admits(record))
        .map(|(i, _)| i)
        .collect()
}

// ---------------------------------------------------------------------------
// FilteredView – read-only subset of the dataset
// ---------------------------------------------------------------------------

/// A borrowed subset of the base records. Never mutates the dataset.
#[derive(Debug, Clone)]
pub struct FilteredView<'a> {
    dataset: &'a AppointmentDataset,
    indices: Vec<usize>,
}

impl<'a> FilteredView<'a> {
    pub fn new(dataset: &'a AppointmentDataset, selection: &FacetSelection) -> Self {
        Self::from_indices(dataset, filtered_indices(dataset, selection))
    }

    pub fn from_indices(dataset: &'a AppointmentDataset, indices: Vec<usize>) -> Self {
        FilteredView { dataset, indices }
    }

    pub fn dataset(&self) -> &'a AppointmentDataset {
        self.dataset
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn records(&self) -> impl Iterator<Item = &'a AppointmentRecord> + '_ {
        self.indices.iter().map(|&i| &self.dataset.records[i])
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::test_support::sample_dataset;

    #[test]
    fn default_selection_is_identity() {
        let ds = sample_dataset();
        let view = FilteredView::new(&ds, &FacetSelection::all(&ds));
        assert_eq!(view.len(), ds.len());
        assert_eq!(view.indices(), (0..ds.len()).collect::<Vec<_>>().as_slice());
        assert!(view.records().zip(&ds.records).all(|(a, b)| a == b));
    }

    #[test]
    fn filters_are_combined_with_and() {
        let ds = sample_dataset();
        let mut selection = FacetSelection::all(&ds);
        selection.locations = BTreeSet::from(["Lagos".to_string()]);
        selection.departments = BTreeSet::from(["Pediatrics".to_string()]);

        let view = FilteredView::new(&ds, &selection);
        assert!(view.is_empty());

        selection.departments = ds.departments.clone();
        let view = FilteredView::new(&ds, &selection);
        assert_eq!(view.len(), 2);
        assert!(view.records().all(|r| r.location == "Lagos"));
    }

    #[test]
    fn empty_selection_hides_everything() {
        let ds = sample_dataset();
        let mut selection = FacetSelection::all(&ds);
        selection.selected_mut(FilterColumn::Department).clear();
        assert!(filtered_indices(&ds, &selection).is_empty());
    }

    #[test]
    fn disjoint_selection_is_empty() {
        let ds = sample_dataset();
        let selection = FacetSelection {
            locations: BTreeSet::from(["Enugu".to_string()]),
            departments: BTreeSet::from(["Dermatology".to_string()]),
        };
        assert!(FilteredView::new(&ds, &selection).is_empty());
    }

    #[test]
    fn options_come_from_observed_values() {
        let ds = sample_dataset();
        let locations: Vec<_> = FilterColumn::Location.options(&ds).iter().cloned().collect();
        assert_eq!(locations, vec!["Abuja", "Lagos"]);
    }
}
