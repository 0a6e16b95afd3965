use eframe::egui::{Color32, Ui};
use egui_plot::{Bar, BarChart, GridMark, Legend, Plot};

use crate::color::{generate_palette, ColorMap};
use crate::data::stats::{CrossTab, GroupCount, GroupRate, MeanAge};

const CHART_HEIGHT: f32 = 220.0;
const BAR_COLOR: Color32 = Color32::from_rgb(100, 149, 237);
const TREND_COLOR: Color32 = Color32::from_rgb(255, 127, 80);

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// Shown instead of a chart when the filtered subset is empty.
pub fn placeholder(ui: &mut Ui) {
    ui.weak("No data for the current filter selection.");
}

/// Axis formatter that prints category labels at integer positions.
fn category_axis(
    labels: Vec<String>,
) -> impl Fn(GridMark, &std::ops::RangeInclusive<f64>) -> String {
    move |mark, _range| {
        let pos = mark.value;
        if pos < 0.0 || (pos - pos.round()).abs() > 1e-6 {
            return String::new();
        }
        labels.get(pos.round() as usize).cloned().unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// Single-series charts
// ---------------------------------------------------------------------------

/// Vertical bars of mean no-show rate per group.
pub fn rate_chart(ui: &mut Ui, id: &str, title: &str, rates: &[GroupRate], color: Option<Color32>) {
    ui.strong(title);
    if rates.is_empty() {
        placeholder(ui);
        return;
    }

    let bars: Vec<Bar> = rates
        .iter()
        .enumerate()
        .map(|(i, g)| {
            Bar::new(i as f64, g.rate)
                .name(format!("{} ({} appts)", g.label, g.count))
                .fill(color.unwrap_or(BAR_COLOR))
        })
        .collect();
    let labels = rates.iter().map(|g| g.label.clone()).collect();
    let chart = BarChart::new(bars).width(0.6).name("No-show rate");

    Plot::new(id)
        .height(CHART_HEIGHT)
        .allow_drag(false)
        .allow_scroll(false)
        .include_y(0.0)
        .include_y(1.0)
        .y_axis_label("No-show rate")
        .x_axis_formatter(category_axis(labels))
        .show(ui, |plot_ui| plot_ui.bar_chart(chart));
}

/// Monthly trend, in calendar order.
pub fn trend_chart(ui: &mut Ui, trend: &[GroupRate]) {
    rate_chart(
        ui,
        "monthly_trend",
        "Average No-Show Rate by Month",
        trend,
        Some(TREND_COLOR),
    );
}

/// Vertical bars of appointment counts, one colour per category.
pub fn count_chart(ui: &mut Ui, id: &str, title: &str, counts: &[GroupCount]) {
    ui.strong(title);
    if counts.is_empty() {
        placeholder(ui);
        return;
    }

    let total: usize = counts.iter().map(|c| c.count).sum();
    let palette = generate_palette(counts.len());
    let bars: Vec<Bar> = counts
        .iter()
        .zip(palette)
        .enumerate()
        .map(|(i, (c, color))| {
            let share = 100.0 * c.count as f64 / total as f64;
            Bar::new(i as f64, c.count as f64)
                .name(format!("{} ({share:.1}%)", c.label))
                .fill(color)
        })
        .collect();
    let labels = counts.iter().map(|c| c.label.clone()).collect();

    Plot::new(id)
        .height(CHART_HEIGHT)
        .allow_drag(false)
        .allow_scroll(false)
        .include_y(0.0)
        .y_axis_label("Number of Appointments")
        .x_axis_formatter(category_axis(labels))
        .show(ui, |plot_ui| plot_ui.bar_chart(BarChart::new(bars).width(0.6)));
}

// ---------------------------------------------------------------------------
// Cross-tab charts
// ---------------------------------------------------------------------------

/// Age groups on the x axis, one stacked segment per department.
pub fn stacked_age_department(ui: &mut Ui, table: &CrossTab, colors: Option<&ColorMap>) {
    ui.strong("Disease Distribution Across Age Groups");
    if table.is_empty() {
        placeholder(ui);
        return;
    }

    let mut charts: Vec<BarChart> = Vec::with_capacity(table.column_labels.len());
    for (c, department) in table.column_labels.iter().enumerate() {
        let color = colors.map_or(BAR_COLOR, |m| m.color_for(department));
        let bars: Vec<Bar> = (0..table.row_labels.len())
            .map(|r| Bar::new(r as f64, table.row(r)[c] as f64).fill(color))
            .collect();
        let chart = BarChart::new(bars)
            .width(0.6)
            .color(color)
            .name(department);
        let below: Vec<&BarChart> = charts.iter().collect();
        let chart = chart.stack_on(&below);
        charts.push(chart);
    }

    Plot::new("age_department")
        .height(CHART_HEIGHT * 1.4)
        .allow_drag(false)
        .allow_scroll(false)
        .legend(Legend::default())
        .include_y(0.0)
        .x_axis_label("Age Group")
        .y_axis_label("Number of Appointments")
        .x_axis_formatter(category_axis(table.row_labels.clone()))
        .show(ui, |plot_ui| {
            for chart in charts {
                plot_ui.bar_chart(chart);
            }
        });
}

/// Horizontal bars: one row per department, one bar per gender.
pub fn department_gender_bars(ui: &mut Ui, table: &CrossTab) {
    ui.strong("Gender Distribution by Department");
    if table.is_empty() {
        placeholder(ui);
        return;
    }

    let n = table.column_labels.len().max(1) as f64;
    let width = 0.8 / n;
    let palette = generate_palette(table.column_labels.len());
    let charts: Vec<BarChart> = table
        .column_labels
        .iter()
        .zip(palette)
        .enumerate()
        .map(|(c, (gender, color))| {
            let offset = (c as f64 - (n - 1.0) / 2.0) * width;
            let bars: Vec<Bar> = (0..table.row_labels.len())
                .map(|r| Bar::new(r as f64 + offset, table.row(r)[c] as f64).fill(color))
                .collect();
            BarChart::new(bars)
                .horizontal()
                .width(width)
                .color(color)
                .name(gender)
        })
        .collect();

    Plot::new("department_gender")
        .height(CHART_HEIGHT * 1.4)
        .allow_drag(false)
        .allow_scroll(false)
        .legend(Legend::default())
        .include_x(0.0)
        .x_axis_label("Number of Patients")
        .y_axis_formatter(category_axis(table.row_labels.clone()))
        .show(ui, |plot_ui| {
            for chart in charts {
                plot_ui.bar_chart(chart);
            }
        });
}

/// Departments on the x axis, one bar per gender.
pub fn mean_age_chart(ui: &mut Ui, ages: &[MeanAge]) {
    ui.strong("Average Age by Gender and Department");
    if ages.is_empty() {
        placeholder(ui);
        return;
    }

    let mut departments: Vec<String> = ages.iter().map(|a| a.department.clone()).collect();
    departments.sort();
    departments.dedup();
    let mut genders: Vec<String> = ages.iter().map(|a| a.gender.clone()).collect();
    genders.dedup();

    let n = genders.len() as f64;
    let width = 0.8 / n;
    let palette = generate_palette(genders.len());
    let charts: Vec<BarChart> = genders
        .iter()
        .zip(palette)
        .enumerate()
        .map(|(g, (gender, color))| {
            let offset = (g as f64 - (n - 1.0) / 2.0) * width;
            let bars: Vec<Bar> = ages
                .iter()
                .filter(|a| &a.gender == gender)
                .filter_map(|a| {
                    let x = departments.iter().position(|d| *d == a.department)?;
                    Some(Bar::new(x as f64 + offset, a.mean_age).fill(color))
                })
                .collect();
            BarChart::new(bars).width(width).color(color).name(gender)
        })
        .collect();

    Plot::new("mean_age")
        .height(CHART_HEIGHT)
        .allow_drag(false)
        .allow_scroll(false)
        .legend(Legend::default())
        .include_y(0.0)
        .x_axis_label("Department")
        .y_axis_label("Average Age (years)")
        .x_axis_formatter(category_axis(departments))
        .show(ui, |plot_ui| {
            for chart in charts {
                plot_ui.bar_chart(chart);
            }
        });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_axis_labels_integer_ticks_only() {
        let fmt = category_axis(vec!["Monday".into(), "Tuesday".into()]);
        let mark = |value| GridMark { value, step_size: 0.5 };
        assert_eq!(fmt(mark(0.0), &(0.0..=1.0)), "Monday");
        assert_eq!(fmt(mark(1.0), &(0.0..=1.0)), "Tuesday");
        assert_eq!(fmt(mark(0.5), &(0.0..=1.0)), "");
        assert_eq!(fmt(mark(-1.0), &(0.0..=1.0)), "");
        assert_eq!(fmt(mark(7.0), &(0.0..=1.0)), "");
    }
}
