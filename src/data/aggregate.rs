//! Read-only summaries computed from a [`FilteredView`].
//!
//! Every function here is a pure function of the view; nothing is cached.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use serde::Serialize;

use super::filter::FilteredView;
use super::model::Dimension;

/// Headline KPIs. `total_units` is `None` when the dataset has no units
/// column, which is different from a total of zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Totals {
    pub total_revenue: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_units: Option<i64>,
}

/// Revenue summed over one category; `key == None` is the null group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupTotal {
    pub key: Option<String>,
    pub revenue: f64,
}

impl GroupTotal {
    pub fn label(&self) -> &str {
        self.key.as_deref().unwrap_or("(blank)")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyTotal {
    pub date: NaiveDate,
    pub revenue: f64,
}

pub fn aggregate_totals(view: &FilteredView<'_>) -> Totals {
    let total_revenue = view.records().map(|r| r.revenue).sum();
    let total_units = view
        .dataset()
        .schema
        .has_units()
        .then(|| {
            view.records()
                .filter_map(|r| r.units)
                .fold(0i64, i64::saturating_add)
        });
    Totals {
        total_revenue,
        total_units,
    }
}

/// Revenue per distinct value of `dim`, in first-encountered order.
///
/// Records with no value for `dim` form their own `None` group.
pub fn aggregate_by(view: &FilteredView<'_>, dim: Dimension) -> Vec<GroupTotal> {
    let mut slots: HashMap<Option<&str>, usize> = HashMap::new();
    let mut groups: Vec<GroupTotal> = Vec::new();

    for rec in view.records() {
        let key = rec.dimension(dim);
        let slot = *slots.entry(key).or_insert_with(|| {
            groups.push(GroupTotal {
                key: key.map(str::to_string),
                revenue: 0.0,
            });
            groups.len() - 1
        });
        groups[slot].revenue += rec.revenue;
    }

    groups
}

/// The `n` groups of `dim` with the largest revenue, descending.
///
/// Ties keep first-encountered order.
pub fn top_n(view: &FilteredView<'_>, dim: Dimension, n: usize) -> Vec<GroupTotal> {
    let mut groups = aggregate_by(view, dim);
    // sort_by is stable, so equal revenues stay in encounter order.
    groups.sort_by(|a, b| b.revenue.total_cmp(&a.revenue));
    groups.truncate(n);
    groups
}

/// Revenue per exact order date, ascending. Null dates are skipped.
pub fn aggregate_by_date(view: &FilteredView<'_>) -> Vec<DailyTotal> {
    let mut by_date: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for rec in view.records() {
        if let Some(date) = rec.order_date {
            *by_date.entry(date).or_insert(0.0) += rec.revenue;
        }
    }
    by_date
        .into_iter()
        .map(|(date, revenue)| DailyTotal { date, revenue })
        .collect()
}

// ---------------------------------------------------------------------------
// Dashboard summary: everything the presentation layer consumes
// ---------------------------------------------------------------------------

/// All aggregations for one filter state. A chart whose column is missing
/// from the dataset is `None` and is not drawn.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub records: usize,
    pub totals: Totals,
    pub by_zone: Option<Vec<GroupTotal>>,
    pub by_product_type: Option<Vec<GroupTotal>>,
    pub by_channel: Option<Vec<GroupTotal>>,
    pub top_countries: Option<Vec<GroupTotal>>,
    pub by_date: Option<Vec<DailyTotal>>,
}

impl DashboardSummary {
    pub fn compute(view: &FilteredView<'_>, top_countries: usize) -> Self {
        let schema = &view.dataset().schema;
        let grouped = |dim: Dimension| schema.has(dim).then(|| aggregate_by(view, dim));

        DashboardSummary {
            records: view.len(),
            totals: aggregate_totals(view),
            by_zone: grouped(Dimension::Zone),
            by_product_type: grouped(Dimension::ProductType),
            by_channel: grouped(Dimension::Channel),
            top_countries: schema
                .has(Dimension::Country)
                .then(|| top_n(view, Dimension::Country, top_countries)),
            by_date: schema.has_dates().then(|| aggregate_by_date(view)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.records == 0
    }
}
