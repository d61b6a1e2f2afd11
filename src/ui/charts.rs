use std::f32::consts::{FRAC_PI_2, TAU};

use chrono::{Datelike, NaiveDate};
use eframe::egui::{self, Color32, RichText, ScrollArea, Sense, Shape, Stroke, Ui, Vec2};
use egui_plot::{Bar, BarChart, Line, Plot, PlotPoints};

use crate::color::ColorMap;
use crate::data::aggregate::{DailyTotal, DashboardSummary, GroupTotal};
use crate::data::model::Dimension;
use crate::format::{format_count, format_currency};
use crate::state::AppState;

const CHART_HEIGHT: f32 = 260.0;

// ---------------------------------------------------------------------------
// Central panel: KPIs and charts
// ---------------------------------------------------------------------------

/// Render the dashboard in the central panel.
pub fn dashboard(ui: &mut Ui, state: &AppState) {
    let summary = match &state.summary {
        Some(s) => s,
        None => {
            ui.centered_and_justified(|ui: &mut Ui| {
                ui.heading("Open a sales file to start  (File → Open…)");
            });
            return;
        }
    };

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            kpis(ui, summary);
            ui.separator();

            if summary.is_empty() {
                ui.add_space(40.0);
                ui.vertical_centered(|ui: &mut Ui| {
                    ui.heading("No records match the current filters.");
                    ui.label("Widen the date range or clear some selections.");
                });
                return;
            }

            let colors = move |dim: Dimension| state.color_maps.get(&dim);

            ui.columns(2, |cols| {
                if let Some(groups) = &summary.by_zone {
                    bar_chart(&mut cols[0], "Revenue by zone", "by_zone", groups, colors(Dimension::Zone));
                }
                if let Some(groups) = &summary.by_product_type {
                    pie_chart(&mut cols[1], "Revenue by product type", groups, colors(Dimension::ProductType));
                }
            });

            ui.columns(2, |cols| {
                if let Some(groups) = &summary.by_channel {
                    bar_chart(&mut cols[0], "Revenue by sales channel", "by_channel", groups, colors(Dimension::Channel));
                }
                if let Some(groups) = &summary.top_countries {
                    let title = format!("Top {} countries by revenue", state.top_n);
                    bar_chart(&mut cols[1], &title, "top_countries", groups, colors(Dimension::Country));
                }
            });

            if let Some(series) = &summary.by_date {
                line_chart(ui, series);
            }
        });
}

fn kpis(ui: &mut Ui, summary: &DashboardSummary) {
    ui.horizontal(|ui: &mut Ui| {
        kpi_card(ui, "💰 Total revenue", &format_currency(summary.totals.total_revenue));
        if let Some(units) = summary.totals.total_units {
            kpi_card(ui, "📦 Total units", &format_count(units));
        }
        kpi_card(ui, "🧾 Orders", &format_count(summary.records as i64));
    });
}

fn kpi_card(ui: &mut Ui, label: &str, value: &str) {
    egui::Frame::group(ui.style()).show(ui, |ui: &mut Ui| {
        ui.set_min_width(180.0);
        ui.vertical(|ui: &mut Ui| {
            ui.label(RichText::new(label).weak());
            ui.label(RichText::new(value).size(22.0).strong());
        });
    });
}

// ---------------------------------------------------------------------------
// Bar chart (one bar per category)
// ---------------------------------------------------------------------------

fn bar_chart(ui: &mut Ui, title: &str, id: &str, groups: &[GroupTotal], colors: Option<&ColorMap>) {
    ui.strong(title);

    let bars: Vec<Bar> = groups
        .iter()
        .enumerate()
        .map(|(i, g)| {
            let fill = colors.map_or(Color32::LIGHT_BLUE, |cm| cm.color_for(g.key.as_deref()));
            Bar::new(i as f64, g.revenue).name(g.label()).fill(fill)
        })
        .collect();
    let labels: Vec<String> = groups.iter().map(|g| g.label().to_string()).collect();

    Plot::new(id)
        .height(CHART_HEIGHT)
        .allow_drag(false)
        .allow_scroll(false)
        .allow_zoom(false)
        .allow_boxed_zoom(false)
        .y_axis_label("Revenue")
        .x_axis_formatter(move |mark, _range| {
            let idx = mark.value.round();
            if (mark.value - idx).abs() > 1e-6 || idx < 0.0 {
                return String::new();
            }
            labels.get(idx as usize).cloned().unwrap_or_default()
        })
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars).width(0.7));
        });
}

// ---------------------------------------------------------------------------
// Pie chart (share of revenue per category)
// ---------------------------------------------------------------------------

fn pie_chart(ui: &mut Ui, title: &str, groups: &[GroupTotal], colors: Option<&ColorMap>) {
    ui.strong(title);

    // Negative groups (refunds) cannot be drawn as slices.
    let total: f64 = groups.iter().map(|g| g.revenue.max(0.0)).sum();
    if total <= 0.0 {
        ui.label("No positive revenue to show.");
        return;
    }

    ui.horizontal(|ui: &mut Ui| {
        let (response, painter) =
            ui.allocate_painter(Vec2::splat(CHART_HEIGHT), Sense::hover());
        let center = response.rect.center();
        let radius = response.rect.width().min(response.rect.height()) * 0.45;

        let mut angle = -FRAC_PI_2;
        for g in groups {
            let sweep = (g.revenue.max(0.0) / total) as f32 * TAU;
            if sweep <= 0.0 {
                continue;
            }
            let color = colors.map_or(Color32::LIGHT_BLUE, |cm| cm.color_for(g.key.as_deref()));
            let steps = ((sweep / TAU) * 96.0).ceil().max(1.0) as usize;
            for s in 0..steps {
                let a0 = angle + sweep * s as f32 / steps as f32;
                let a1 = angle + sweep * (s + 1) as f32 / steps as f32;
                painter.add(Shape::convex_polygon(
                    vec![
                        center,
                        center + radius * Vec2::angled(a0),
                        center + radius * Vec2::angled(a1),
                    ],
                    color,
                    Stroke::NONE,
                ));
            }
            angle += sweep;
        }

        ui.vertical(|ui: &mut Ui| {
            for g in groups {
                let color = colors.map_or(Color32::LIGHT_BLUE, |cm| cm.color_for(g.key.as_deref()));
                let share = g.revenue.max(0.0) / total * 100.0;
                ui.horizontal(|ui: &mut Ui| {
                    ui.label(RichText::new("■").color(color));
                    ui.label(format!("{}  {share:.1}%", g.label()));
                });
            }
        });
    });
}

// ---------------------------------------------------------------------------
// Line chart (revenue over time)
// ---------------------------------------------------------------------------

fn line_chart(ui: &mut Ui, series: &[DailyTotal]) {
    ui.separator();
    ui.strong("Revenue over time");

    let points: PlotPoints = series
        .iter()
        .map(|d| [d.date.num_days_from_ce() as f64, d.revenue])
        .collect();

    Plot::new("revenue_by_date")
        .height(CHART_HEIGHT)
        .y_axis_label("Revenue")
        .allow_scroll(false)
        .x_axis_formatter(|mark, _range| day_label(mark.value))
        .label_formatter(|name, value| {
            format!("{name}\n{}\n{}", day_label(value.x), format_currency(value.y))
        })
        .show(ui, |plot_ui| {
            plot_ui.line(Line::new(points).name("Revenue").width(1.5));
        });
}

fn day_label(x: f64) -> String {
    NaiveDate::from_num_days_from_ce_opt(x.round() as i32)
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}
