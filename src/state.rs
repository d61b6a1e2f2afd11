use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::NaiveDate;

use crate::color::ColorMap;
use crate::data::aggregate::DashboardSummary;
use crate::data::export::save_csv;
use crate::data::filter::{apply_filters, FilterCriteria, FilteredView};
use crate::data::loader::load_file;
use crate::data::model::{Dataset, Dimension};

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state of one session, independent of rendering.
///
/// Every mutation of `filters` goes through a method that ends in
/// [`AppState::refilter`], so `visible_indices` and `summary` always match
/// the current criteria.
pub struct AppState {
    /// Loaded dataset (None until a file is loaded). Shared read-only.
    pub dataset: Option<Arc<Dataset>>,

    /// Path the dataset was loaded from.
    pub source: Option<PathBuf>,

    /// Current filter selections.
    pub filters: FilterCriteria,

    /// Indices of records passing the current filters.
    pub visible_indices: Vec<usize>,

    /// Aggregations for the current filters.
    pub summary: Option<DashboardSummary>,

    /// One colour map per present dimension, stable across filter changes.
    pub color_maps: BTreeMap<Dimension, ColorMap>,

    /// How many countries the top-countries chart shows.
    pub top_n: usize,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(top_n: usize) -> Self {
        Self {
            dataset: None,
            source: None,
            filters: FilterCriteria::default(),
            visible_indices: Vec::new(),
            summary: None,
            color_maps: BTreeMap::new(),
            top_n,
            status_message: None,
        }
    }

    /// Load `path`, replacing the current dataset. On failure the previous
    /// dataset is dropped too: no partial dashboard is shown.
    pub fn load_path(&mut self, path: &Path) {
        match load_file(path) {
            Ok(dataset) => {
                log::info!(
                    "Loaded {} records with columns {:?} from {}",
                    dataset.len(),
                    dataset.headers,
                    path.display()
                );
                self.set_dataset(dataset);
                self.source = Some(path.to_path_buf());
            }
            Err(e) => {
                log::error!("Failed to load {}: {e}", path.display());
                self.clear_dataset();
                self.status_message = Some(format!("Error loading {}: {e}", path.display()));
            }
        }
    }

    /// Ingest a newly loaded dataset, reset filters and colours.
    pub fn set_dataset(&mut self, dataset: Dataset) {
        self.filters = FilterCriteria::for_dataset(&dataset);
        self.color_maps = dataset
            .distinct_values
            .iter()
            .map(|(dim, values)| (*dim, ColorMap::new(values)))
            .collect();
        self.dataset = Some(Arc::new(dataset));
        self.status_message = None;
        self.refilter();
    }

    fn clear_dataset(&mut self) {
        self.dataset = None;
        self.source = None;
        self.filters = FilterCriteria::default();
        self.visible_indices.clear();
        self.summary = None;
        self.color_maps.clear();
    }

    /// The current filtered view, if a dataset is loaded.
    pub fn view(&self) -> Option<FilteredView<'_>> {
        self.dataset
            .as_deref()
            .map(|ds| FilteredView::from_indices(ds, self.visible_indices.clone()))
    }

    /// Recompute the filtered view and every aggregation.
    pub fn refilter(&mut self) {
        let Some(ds) = self.dataset.clone() else {
            return;
        };
        let view = apply_filters(&ds, &self.filters);
        self.summary = Some(DashboardSummary::compute(&view, self.top_n));
        self.visible_indices = view.into_indices();
    }

    /// Toggle a single category value in a dimension's filter.
    pub fn toggle_filter_value(&mut self, dim: Dimension, value: &str) {
        self.filters.toggle(dim, value);
        self.refilter();
    }

    /// Accept every value of a dimension, blanks included. An explicit set
    /// of all options would drop records with no value, so this lifts the
    /// constraint instead.
    pub fn select_all(&mut self, dim: Dimension) {
        self.filters.clear(dim);
        self.refilter();
    }

    pub fn set_date_range(&mut self, start: NaiveDate, end: NaiveDate) {
        self.filters.set_date_range(start, end);
        self.refilter();
    }

    pub fn reset_filters(&mut self) {
        if let Some(ds) = self.dataset.clone() {
            self.filters.reset(&ds);
            self.refilter();
        }
    }

    /// Write the current filtered view to `path` as CSV.
    pub fn export_to(&self, path: &Path) -> Result<usize> {
        let view = self.view().context("no dataset loaded")?;
        save_csv(&view, path).with_context(|| format!("exporting to {}", path.display()))
    }
}
