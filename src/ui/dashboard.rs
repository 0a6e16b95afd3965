use eframe::egui::{self, RichText, ScrollArea, Ui};
use egui_extras::{Column, TableBuilder};

use crate::data::model::{AgeGroup, AppointmentDataset, Facet};
use crate::data::report::{format_stat, DashboardReport};
use crate::data::stats::CrossTab;
use crate::state::AppState;
use crate::ui::plot;

// ---------------------------------------------------------------------------
// Central panel
// ---------------------------------------------------------------------------

/// Render the dashboard for the current selection.
pub fn central_panel(ui: &mut Ui, state: &AppState) {
    let (Some(dataset), Some(report)) = (&state.dataset, &state.report) else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open an appointment table to begin  (File → Open…)");
        });
        return;
    };

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            ui.heading("Hospital Appointments – Exploratory Data Analysis");
            age_group_note(ui, report);
            ui.separator();

            overview_section(ui, dataset, report);
            ui.separator();
            demographics_section(ui, report);
            ui.separator();
            no_show_section(ui, report);
            ui.separator();
            geography_section(ui, state, report);
        });
}

fn age_group_note(ui: &mut Ui, report: &DashboardReport) {
    egui::CollapsingHeader::new("Age Group Categorization")
        .default_open(false)
        .show(ui, |ui: &mut Ui| {
            for group in AgeGroup::ALL {
                ui.label(format!(
                    "• {}: {} years",
                    group.label(),
                    report.age_bands.range_label(group)
                ));
            }
        });
}

// ---------------------------------------------------------------------------
// 1. Overview
// ---------------------------------------------------------------------------

fn overview_section(ui: &mut Ui, dataset: &AppointmentDataset, report: &DashboardReport) {
    ui.heading("1. Dataset Overview");

    let s = &report.summary;
    let rate = s.no_show_rate.map(|r| r * 100.0);
    let metrics = [
        ("Total Appointments", s.rows.to_string()),
        ("No-Show Rate (%)", format_stat(rate, 2)),
        ("Avg Waiting Days", format_stat(s.mean_waiting_days, 1)),
        ("Departments", s.departments.to_string()),
        ("Average Age", format_stat(s.mean_age, 1)),
    ];
    ui.columns(metrics.len(), |cols| {
        for (col, (label, value)) in cols.iter_mut().zip(metrics) {
            col.weak(label);
            col.label(RichText::new(value).size(22.0).strong());
        }
    });
    ui.add_space(8.0);

    if report.preview.is_empty() {
        plot::placeholder(ui);
        return;
    }
    preview_table(ui, dataset, &report.preview);
}

fn preview_table(ui: &mut Ui, dataset: &AppointmentDataset, rows: &[usize]) {
    const HEADERS: [&str; 12] = [
        "Appointment",
        "Booking",
        "Waiting",
        "Weekday",
        "Age",
        "Age Group",
        "Gender",
        "Location",
        "Department",
        "Insurance",
        "SMS",
        "No-Show",
    ];

    ui.push_id("preview_table", |ui: &mut Ui| {
        TableBuilder::new(ui)
            .striped(true)
            .vscroll(false)
            .columns(Column::auto().at_least(60.0), HEADERS.len())
            .header(20.0, |mut header| {
                for title in HEADERS {
                    header.col(|ui| {
                        ui.strong(title);
                    });
                }
            })
            .body(|body| {
                body.rows(18.0, rows.len(), |mut row| {
                    let r = &dataset.records[rows[row.index()]];
                    let cells = [
                        r.appointment_date.to_string(),
                        r.booking_date.to_string(),
                        r.waiting_days.to_string(),
                        r.weekday_name().to_string(),
                        r.age.to_string(),
                        r.age_group.to_string(),
                        r.gender.clone(),
                        r.location.clone(),
                        r.department.clone(),
                        r.health_insurance.clone(),
                        r.sms_reminder_sent.clone(),
                        r.no_show.to_string(),
                    ];
                    for cell in cells {
                        row.col(|ui| {
                            ui.label(cell);
                        });
                    }
                });
            });
    });
}

// ---------------------------------------------------------------------------
// 2. Demographics
// ---------------------------------------------------------------------------

fn demographics_section(ui: &mut Ui, report: &DashboardReport) {
    ui.heading("2. Demographic Insights");
    ui.columns(2, |cols| {
        plot::count_chart(
            &mut cols[0],
            "gender_counts",
            "Gender Distribution",
            &report.gender_counts,
        );
        plot::count_chart(
            &mut cols[1],
            "age_group_counts",
            "Age Group Distribution",
            &report.age_group_counts,
        );
    });
}

// ---------------------------------------------------------------------------
// 3. No-show analysis / 4. Temporal trends
// ---------------------------------------------------------------------------

fn rate_title(facet: Facet) -> String {
    match facet {
        Facet::HealthInsurance => "Impact of Health Insurance on No-Show".to_string(),
        Facet::SmsReminder => "Impact of SMS Reminders on No-Show".to_string(),
        Facet::Weekday => "No-Show by Day of the Week".to_string(),
        other => format!("No-Show Rate by {}", other.title()),
    }
}

fn no_show_section(ui: &mut Ui, report: &DashboardReport) {
    ui.heading("3. No-Show Analysis");
    let pairs = [
        [Facet::Gender, Facet::Department],
        [Facet::HealthInsurance, Facet::SmsReminder],
    ];
    for pair in pairs {
        ui.columns(2, |cols| {
            for (col, facet) in cols.iter_mut().zip(pair) {
                plot::rate_chart(
                    col,
                    facet.title(),
                    &rate_title(facet),
                    report.rates_for(facet),
                    None,
                );
            }
        });
    }

    ui.separator();
    ui.heading("4. Temporal Trends");
    ui.columns(2, |cols| {
        plot::rate_chart(
            &mut cols[0],
            "weekday_rates",
            &rate_title(Facet::Weekday),
            report.rates_for(Facet::Weekday),
            None,
        );
        plot::trend_chart(&mut cols[1], &report.monthly_trend);
    });
}

// ---------------------------------------------------------------------------
// 5. Geography and departments
// ---------------------------------------------------------------------------

fn geography_section(ui: &mut Ui, state: &AppState, report: &DashboardReport) {
    ui.heading("5. Geographic Trends");
    plot::rate_chart(
        ui,
        "location_rates",
        &rate_title(Facet::Location),
        report.rates_for(Facet::Location),
        None,
    );

    ui.add_space(8.0);
    ui.strong("Age Group × Department");
    cross_tab_grid(ui, "age_department_grid", &report.age_by_department);
    plot::stacked_age_department(ui, &report.age_by_department, state.department_colors.as_ref());

    ui.add_space(8.0);
    ui.heading("Departmental Gender Distribution");
    gender_summary(ui, report);
    plot::department_gender_bars(ui, &report.department_by_gender);

    ui.add_space(8.0);
    ui.heading("Average Age by Gender and Department");
    egui::CollapsingHeader::new("See Data Table")
        .default_open(false)
        .show(ui, |ui: &mut Ui| {
            egui::Grid::new("mean_age_grid").striped(true).show(ui, |ui: &mut Ui| {
                ui.strong("Gender");
                ui.strong("Department");
                ui.strong("Age");
                ui.end_row();
                for row in &report.mean_age {
                    ui.label(&row.gender);
                    ui.label(&row.department);
                    ui.label(format!("{:.1}", row.mean_age));
                    ui.end_row();
                }
            });
        });
    plot::mean_age_chart(ui, &report.mean_age);
}

fn gender_summary(ui: &mut Ui, report: &DashboardReport) {
    let line = |top: &Option<(String, usize)>, noun: &str| match top {
        Some((department, n)) => format!("{department} ({n} {noun})"),
        None => "no data".to_string(),
    };
    ui.label(format!(
        "• Department with the most Male patients: {}",
        line(&report.top_male_department, "males")
    ));
    ui.label(format!(
        "• Department with the most Female patients: {}",
        line(&report.top_female_department, "females")
    ));
}

fn cross_tab_grid(ui: &mut Ui, id: &str, table: &CrossTab) {
    if table.is_empty() {
        plot::placeholder(ui);
        return;
    }
    egui::Grid::new(id).striped(true).show(ui, |ui: &mut Ui| {
        ui.label("");
        for column in &table.column_labels {
            ui.strong(column);
        }
        ui.strong("Total");
        ui.end_row();

        for (r, label) in table.row_labels.iter().enumerate() {
            ui.strong(label);
            for count in table.row(r) {
                ui.label(count.to_string());
            }
            ui.label(table.row_total(r).to_string());
            ui.end_row();
        }
    });
}
