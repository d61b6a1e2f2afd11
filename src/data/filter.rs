use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;

use super::model::{Dataset, Dimension, Record};

// ---------------------------------------------------------------------------
// Date range
// ---------------------------------------------------------------------------

/// Closed interval `[start, end]`. A reversed interval contains nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn is_empty(&self) -> bool {
        self.start > self.end
    }
}

// ---------------------------------------------------------------------------
// Filter criteria: the selection state owned by one session
// ---------------------------------------------------------------------------

/// Per-dimension selections plus an optional date range.
///
/// A dimension that is absent or has an empty set is unconstrained (shows
/// everything); it never means "matches nothing".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    selections: BTreeMap<Dimension, BTreeSet<String>>,
    date_range: Option<DateRange>,
}

impl FilterCriteria {
    /// Unconstrained categories, date range spanning the whole dataset.
    pub fn for_dataset(dataset: &Dataset) -> Self {
        let mut criteria = Self::default();
        criteria.reset(dataset);
        criteria
    }

    /// Replace the selection for one dimension.
    ///
    /// Values are not checked against the dataset; a stale value simply
    /// matches no record.
    pub fn set<I, S>(&mut self, dim: Dimension, values: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values: BTreeSet<String> = values.into_iter().map(Into::into).collect();
        if values.is_empty() {
            self.selections.remove(&dim);
        } else {
            self.selections.insert(dim, values);
        }
    }

    /// Add or remove a single value from a dimension's selection.
    pub fn toggle(&mut self, dim: Dimension, value: &str) {
        let selected = self.selections.entry(dim).or_default();
        if !selected.remove(value) {
            selected.insert(value.to_string());
        }
        if selected.is_empty() {
            self.selections.remove(&dim);
        }
    }

    /// Drop the selection for one dimension.
    pub fn clear(&mut self, dim: Dimension) {
        self.selections.remove(&dim);
    }

    /// Current selection for a dimension; `None` means unconstrained.
    pub fn selection(&self, dim: Dimension) -> Option<&BTreeSet<String>> {
        self.selections.get(&dim).filter(|s| !s.is_empty())
    }

    pub fn is_selected(&self, dim: Dimension, value: &str) -> bool {
        self.selection(dim).is_some_and(|s| s.contains(value))
    }

    /// Set the inclusive date bounds. `start > end` is accepted and yields an
    /// empty range.
    pub fn set_date_range(&mut self, start: NaiveDate, end: NaiveDate) {
        if start > end {
            log::debug!("date range {start}..={end} is reversed; no dated record will match");
        }
        self.date_range = Some(DateRange::new(start, end));
    }

    pub fn date_range(&self) -> Option<DateRange> {
        self.date_range
    }

    /// Clear every category selection and restore the date range to the
    /// dataset's own `[min, max]` (or none if it has no dates).
    pub fn reset(&mut self, dataset: &Dataset) {
        self.selections.clear();
        self.date_range = dataset
            .date_bounds()
            .map(|(start, end)| DateRange::new(start, end));
    }

    /// Number of dimensions with a non-empty selection.
    pub fn active_dimensions(&self) -> usize {
        self.selections.values().filter(|s| !s.is_empty()).count()
    }
}

// ---------------------------------------------------------------------------
// Filtered view
// ---------------------------------------------------------------------------

/// The records of a dataset that pass a set of criteria, in source order.
#[derive(Debug, Clone)]
pub struct FilteredView<'a> {
    dataset: &'a Dataset,
    indices: Vec<usize>,
}

impl<'a> FilteredView<'a> {
    /// Wrap precomputed row indices (e.g. cached by the UI state).
    pub fn from_indices(dataset: &'a Dataset, indices: Vec<usize>) -> Self {
        Self { dataset, indices }
    }

    /// A view of every record.
    pub fn all(dataset: &'a Dataset) -> Self {
        Self::from_indices(dataset, (0..dataset.len()).collect())
    }

    pub fn dataset(&self) -> &'a Dataset {
        self.dataset
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn into_indices(self) -> Vec<usize> {
        self.indices
    }

    pub fn records(&self) -> impl Iterator<Item = &'a Record> + '_ {
        let dataset = self.dataset;
        self.indices.iter().map(move |&i| &dataset.records[i])
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Return the records of `dataset` that pass all active criteria.
///
/// A record passes when:
/// * for every constrained dimension, its value is one of the selected ones
///   (a null value never passes a constrained dimension);
/// * if a date range is set, its order date lies inside it (a null date
///   never passes an active range).
///
/// Constraints on dimensions or dates the dataset does not have are ignored.
pub fn apply_filters<'a>(dataset: &'a Dataset, criteria: &FilterCriteria) -> FilteredView<'a> {
    let active: Vec<(Dimension, &BTreeSet<String>)> = criteria
        .selections
        .iter()
        .filter(|(_, selected)| !selected.is_empty())
        .filter_map(|(dim, selected)| {
            if dataset.schema.has(*dim) {
                Some((*dim, selected))
            } else {
                log::warn!("ignoring {dim} filter: column not present in dataset");
                None
            }
        })
        .collect();

    let date_range = criteria.date_range.filter(|_| dataset.schema.has_dates());

    let indices: Vec<usize> = dataset
        .records
        .iter()
        .enumerate()
        .filter(|(_, rec)| {
            let categories_pass = active.iter().all(|(dim, selected)| {
                rec.dimension(*dim)
                    .is_some_and(|value| selected.contains(value))
            });
            let date_passes = match date_range {
                Some(range) => rec.order_date.is_some_and(|d| range.contains(d)),
                None => true,
            };
            categories_pass && date_passes
        })
        .map(|(i, _)| i)
        .collect();

    log::debug!(
        "filter: {} of {} records pass {} dimension constraint(s), date range {:?}",
        indices.len(),
        dataset.len(),
        active.len(),
        date_range
    );

    FilteredView::from_indices(dataset, indices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::CellValue;

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// The three-record scenario plus a couple of extra rows.
    fn sample() -> Dataset {
        let headers = vec![
            "Zona".into(),
            "Canal de venta".into(),
            "Fecha pedido".into(),
            "Ingresos".into(),
        ];
        let rows = vec![
            vec![text("North"), text("Online"), text("2024-01-01"), CellValue::Float(100.0)],
            vec![text("South"), text("Offline"), text("2024-01-02"), CellValue::Float(50.0)],
            vec![text("North"), text("Offline"), text("2024-02-01"), CellValue::Float(25.0)],
        ];
        Dataset::from_table(headers, rows).unwrap()
    }

    fn with_nulls() -> Dataset {
        let headers = vec!["Zona".into(), "Fecha pedido".into(), "Ingresos".into()];
        let rows = vec![
            vec![text("North"), text("2024-01-01"), CellValue::Float(1.0)],
            vec![CellValue::Null, text("2024-01-02"), CellValue::Float(2.0)],
            vec![text("South"), CellValue::Null, CellValue::Float(3.0)],
        ];
        Dataset::from_table(headers, rows).unwrap()
    }

    #[test]
    fn reset_criteria_return_full_dataset_in_order() {
        let ds = sample();
        let criteria = FilterCriteria::for_dataset(&ds);
        let view = apply_filters(&ds, &criteria);
        assert_eq!(view.indices(), &[0, 1, 2]);
        assert_eq!(
            criteria.date_range(),
            Some(DateRange::new(date(2024, 1, 1), date(2024, 2, 1)))
        );
    }

    #[test]
    fn zone_and_january_selects_first_record_only() {
        let ds = sample();
        let mut criteria = FilterCriteria::default();
        criteria.set(Dimension::Zone, ["North"]);
        criteria.set_date_range(date(2024, 1, 1), date(2024, 1, 31));

        let view = apply_filters(&ds, &criteria);
        assert_eq!(view.indices(), &[0]);
        let total: f64 = view.records().map(|r| r.revenue).sum();
        assert_eq!(total, 100.0);
    }

    #[test]
    fn empty_selection_means_unconstrained() {
        let ds = sample();
        let mut criteria = FilterCriteria::default();
        criteria.set(Dimension::Zone, Vec::<String>::new());
        assert!(criteria.selection(Dimension::Zone).is_none());
        assert_eq!(apply_filters(&ds, &criteria).len(), 3);
    }

    #[test]
    fn selection_is_or_within_and_across_dimensions() {
        let ds = sample();
        let mut criteria = FilterCriteria::default();
        criteria.set(Dimension::Zone, ["North", "South"]);
        criteria.set(Dimension::Channel, ["Offline"]);

        let view = apply_filters(&ds, &criteria);
        assert_eq!(view.indices(), &[1, 2]);
        for rec in view.records() {
            assert_eq!(rec.channel.as_deref(), Some("Offline"));
        }
    }

    #[test]
    fn stale_value_matches_nothing() {
        let ds = sample();
        let mut criteria = FilterCriteria::default();
        criteria.set(Dimension::Zone, ["Atlantis"]);
        assert!(apply_filters(&ds, &criteria).is_empty());
    }

    #[test]
    fn reversed_range_excludes_all_dated_rows() {
        let ds = sample();
        let mut criteria = FilterCriteria::default();
        criteria.set_date_range(date(2024, 3, 1), date(2024, 1, 1));
        assert!(criteria.date_range().unwrap().is_empty());
        assert!(apply_filters(&ds, &criteria).is_empty());

        criteria.set(Dimension::Zone, ["North"]);
        assert!(apply_filters(&ds, &criteria).is_empty());
    }

    #[test]
    fn range_bounds_are_inclusive() {
        let ds = sample();
        let mut criteria = FilterCriteria::default();
        criteria.set_date_range(date(2024, 1, 2), date(2024, 2, 1));
        assert_eq!(apply_filters(&ds, &criteria).indices(), &[1, 2]);
    }

    #[test]
    fn nulls_fail_active_constraints_only() {
        let ds = with_nulls();

        // No constraints: everything, including null zone and null date.
        assert_eq!(apply_filters(&ds, &FilterCriteria::default()).len(), 3);

        let mut by_zone = FilterCriteria::default();
        by_zone.set(Dimension::Zone, ["North", "South"]);
        assert_eq!(apply_filters(&ds, &by_zone).indices(), &[0, 2]);

        let mut by_date = FilterCriteria::default();
        by_date.set_date_range(date(2000, 1, 1), date(2100, 1, 1));
        assert_eq!(apply_filters(&ds, &by_date).indices(), &[0, 1]);
    }

    #[test]
    fn constraint_on_missing_column_is_ignored() {
        let ds = sample();
        let mut criteria = FilterCriteria::default();
        criteria.set(Dimension::Country, ["Spain"]);
        assert_eq!(apply_filters(&ds, &criteria).len(), 3);
    }

    #[test]
    fn toggle_and_reset() {
        let ds = sample();
        let mut criteria = FilterCriteria::for_dataset(&ds);
        criteria.toggle(Dimension::Zone, "North");
        criteria.toggle(Dimension::Channel, "Online");
        assert!(criteria.is_selected(Dimension::Zone, "North"));
        assert_eq!(criteria.active_dimensions(), 2);

        criteria.toggle(Dimension::Channel, "Online");
        assert!(criteria.selection(Dimension::Channel).is_none());

        criteria.set_date_range(date(2024, 1, 5), date(2024, 1, 6));
        criteria.reset(&ds);
        assert_eq!(criteria, FilterCriteria::for_dataset(&ds));
        assert_eq!(apply_filters(&ds, &criteria).len(), 3);
    }

    #[test]
    fn filtering_is_repeatable() {
        let ds = sample();
        let mut criteria = FilterCriteria::default();
        criteria.set(Dimension::Channel, ["Offline"]);
        let a = apply_filters(&ds, &criteria).into_indices();
        let b = apply_filters(&ds, &criteria).into_indices();
        assert_eq!(a, b);
    }
}
