use std::path::Path;
use std::sync::Arc;

use anyhow::Result;

use crate::color::ColorMap;
use crate::data::cache::DatasetCache;
use crate::data::filter::{FacetSelection, FilterColumn, FilteredView};
use crate::data::model::AppointmentDataset;
use crate::data::report::DashboardReport;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
#[derive(Debug)]
pub struct AppState {
    /// Enriched datasets already loaded this session.
    pub cache: DatasetCache,

    /// Active dataset (None until a source is loaded).
    pub dataset: Option<Arc<AppointmentDataset>>,

    /// Location / department selections.
    pub selection: FacetSelection,

    /// Aggregates for the current selection (cached).
    pub report: Option<DashboardReport>,

    /// Stable colours per department, shared by all charts.
    pub department_colors: Option<ColorMap>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,

    pub preview_rows: usize,
}

impl AppState {
    pub fn new(preview_rows: usize) -> Self {
        Self {
            cache: DatasetCache::new(),
            dataset: None,
            selection: FacetSelection::default(),
            report: None,
            department_colors: None,
            status_message: None,
            preview_rows,
        }
    }

    /// Load (or reuse) a source and make it the active dataset.
    ///
    /// On failure the previously active dataset stays in place.
    pub fn open_path(&mut self, path: &Path) -> Result<()> {
        let dataset = self.cache.load(path)?;
        self.set_dataset(dataset);
        Ok(())
    }

    /// Ingest a dataset, reset filters to "everything" and rebuild the report.
    pub fn set_dataset(&mut self, dataset: Arc<AppointmentDataset>) {
        self.selection = FacetSelection::all(&dataset);
        self.department_colors = Some(ColorMap::new(&dataset.departments));
        self.dataset = Some(dataset);
        self.status_message = None;
        self.refilter();
    }

    /// Recompute the report after a selection change.
    pub fn refilter(&mut self) {
        if let Some(ds) = &self.dataset {
            let view = FilteredView::new(ds, &self.selection);
            log::debug!("Filter selects {} of {} appointments", view.len(), ds.len());
            self.report = Some(DashboardReport::build(&view, self.preview_rows));
        }
    }

    /// Toggle a single value in a column's selection.
    pub fn toggle_filter_value(&mut self, column: FilterColumn, value: &str) {
        let selected = self.selection.selected_mut(column);
        if !selected.remove(value) {
            selected.insert(value.to_string());
        }
        self.refilter();
    }

    /// Select all values in a column.
    pub fn select_all(&mut self, column: FilterColumn) {
        if let Some(ds) = &self.dataset {
            *self.selection.selected_mut(column) = column.options(ds).clone();
            self.refilter();
        }
    }

    /// Deselect all values in a column.
    pub fn select_none(&mut self, column: FilterColumn) {
        self.selection.selected_mut(column).clear();
        self.refilter();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::test_support::sample_dataset;

    fn loaded_state() -> AppState {
        let mut state = AppState::new(20);
        state.set_dataset(Arc::new(sample_dataset()));
        state
    }

    #[test]
    fn new_dataset_selects_everything() {
        let state = loaded_state();
        let report = state.report.as_ref().unwrap();
        assert_eq!(report.summary.rows, 3);
        assert_eq!(state.selection.locations.len(), 2);
    }

    #[test]
    fn toggling_refilters() {
        let mut state = loaded_state();
        state.toggle_filter_value(FilterColumn::Location, "Abuja");
        assert_eq!(state.report.as_ref().unwrap().summary.rows, 2);

        state.toggle_filter_value(FilterColumn::Location, "Abuja");
        assert_eq!(state.report.as_ref().unwrap().summary.rows, 3);
    }

    #[test]
    fn select_none_then_all() {
        let mut state = loaded_state();
        state.select_none(FilterColumn::Department);
        assert!(state.report.as_ref().unwrap().is_empty());

        state.select_all(FilterColumn::Department);
        assert_eq!(state.report.as_ref().unwrap().summary.rows, 3);
    }

    #[test]
    fn failed_open_keeps_current_dataset() {
        let mut state = loaded_state();
        assert!(state.open_path(Path::new("/no/such/appointments.csv")).is_err());
        assert_eq!(state.dataset.as_ref().unwrap().len(), 3);
    }
}
