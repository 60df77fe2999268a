// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2024 Jonathan Lee
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License version 3
// as published by the Free Software Foundation.
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.
// See the GNU Affero General Public License for more details.
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see https://www.gnu.org/licenses/.

use datenkarte::catalog::OverlayOption;
use datenkarte::{ChartSpec, DashboardContext, ProtView, Selection, Trace};
use eframe::egui;
use log::info;
use std::path::PathBuf;

fn main() -> std::result::Result<(), eframe::Error> {
    env_logger::init();
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_title("Interaktive Datenkarte"),
        ..Default::default()
    };
    eframe::run_native(
        "Interaktive Datenkarte",
        options,
        Box::new(|_cc| Ok(Box::new(DatenkarteApp::new()))),
    )
}

struct DatenkarteApp {
    context: Option<DashboardContext>,
    workbook_path: Option<PathBuf>,
    selection: Selection,
    chart: Option<ChartSpec>,
    chart_json: String,
    error_message: Option<String>,
}

impl DatenkarteApp {
    fn new() -> Self {
        let mut app = Self {
            context: None,
            workbook_path: None,
            selection: Selection::default(),
            chart: None,
            chart_json: String::new(),
            error_message: None,
        };

        let candidate_paths = ["datamap", "bin/demos/datenkarte-demo/datamap"];
        if let Some(path) = candidate_paths
            .iter()
            .map(PathBuf::from)
            .find(|p| p.is_dir())
        {
            app.open_workbook(path);
        }
        app
    }

    fn open_workbook(&mut self, path: PathBuf) {
        match DashboardContext::from_workbook(&path) {
            Ok(context) => {
                info!("workbook loaded from {}", path.display());
                self.selection = context.default_selection();
                self.context = Some(context);
                self.workbook_path = Some(path);
                self.error_message = None;
                self.refresh_chart();
            }
            Err(e) => {
                self.context = None;
                self.chart = None;
                self.error_message = Some(format!("[{}] {e}", e.category()));
            }
        }
    }

    fn refresh_chart(&mut self) {
        let Some(context) = self.context.as_ref() else {
            return;
        };
        let chart = context.render(&self.selection);
        self.chart_json = chart
            .to_json()
            .unwrap_or_else(|e| format!("Serialisierung fehlgeschlagen: {e}"));
        self.chart = Some(chart);
    }

    fn option_label(option: &OverlayOption) -> String {
        if option.tag == "ph" {
            return "pH (vor/nach)".to_string();
        }
        option
            .series
            .first()
            .map(|series| series.label.clone())
            .unwrap_or_else(|| option.tag.clone())
    }

    fn controls_panel(&mut self, ui: &mut egui::Ui) {
        let Some(context) = self.context.as_ref() else {
            ui.label("Bitte ein Workbook-Verzeichnis öffnen.");
            return;
        };

        let datasets: Vec<(String, String)> = context
            .catalog()
            .datasets()
            .iter()
            .map(|spec| (spec.key.key().to_string(), spec.label.clone()))
            .collect();
        let state = context.controls(&self.selection.dataset, self.selection.prot_view);
        let carb_options: Vec<(String, String)> = context
            .catalog()
            .spec(datenkarte::DatasetKind::Carb)
            .map(|spec| {
                spec.overlay_options
                    .iter()
                    .map(|o| (o.tag.clone(), Self::option_label(o)))
                    .collect()
            })
            .unwrap_or_default();
        let prot_options: Vec<(String, String)> = context
            .catalog()
            .spec(datenkarte::DatasetKind::Prot)
            .map(|spec| {
                spec.overlay_options
                    .iter()
                    .map(|o| (o.tag.clone(), Self::option_label(o)))
                    .collect()
            })
            .unwrap_or_default();

        let mut changed = false;

        ui.heading("Datensatz");
        for (key, label) in &datasets {
            if ui
                .selectable_value(&mut self.selection.dataset, key.clone(), label)
                .clicked()
            {
                changed = true;
            }
        }
        ui.separator();

        ui.heading("Material");
        for material in &state.materials {
            let mut checked = self.selection.materials.iter().any(|m| m == material);
            if ui.checkbox(&mut checked, material).changed() {
                toggle(&mut self.selection.materials, material, checked);
                changed = true;
            }
        }
        ui.separator();

        if !state.enzymes.is_empty() {
            ui.heading("Enzym");
            for enzyme in &state.enzymes {
                let mut checked = self.selection.enzymes.iter().any(|e| e == enzyme);
                if ui.checkbox(&mut checked, enzyme).changed() {
                    toggle(&mut self.selection.enzymes, enzyme, checked);
                    changed = true;
                }
            }
            ui.separator();
        }

        if state.show_carb_options {
            ui.heading("Zusatzdaten (Carbohydratasen)");
            for (tag, label) in &carb_options {
                let mut checked = self.selection.carb_options.iter().any(|t| t == tag);
                if ui.checkbox(&mut checked, label).changed() {
                    toggle(&mut self.selection.carb_options, tag, checked);
                    changed = true;
                }
            }
        }

        if state.show_prot_options {
            ui.heading("Ansicht (Proteasen)");
            if ui
                .selectable_value(
                    &mut self.selection.prot_view,
                    ProtView::Distribution,
                    "Verteilung TS",
                )
                .clicked()
            {
                changed = true;
            }
            if ui
                .selectable_value(
                    &mut self.selection.prot_view,
                    ProtView::Heatmap,
                    "Heatmap MM-Fraktionen",
                )
                .clicked()
            {
                changed = true;
            }

            if state.show_prot_ts_options {
                ui.label("Zusatzdaten für TS-Verteilung");
                for (tag, label) in &prot_options {
                    let mut checked = self.selection.prot_options.iter().any(|t| t == tag);
                    if ui.checkbox(&mut checked, label).changed() {
                        toggle(&mut self.selection.prot_options, tag, checked);
                        changed = true;
                    }
                }
            }

            if state.show_mm_checklist {
                ui.label("MM-Fraktionen für Heatmap");
                for fraction in &state.mm_fractions {
                    let mut checked = self.selection.mm_fractions.iter().any(|f| f == fraction);
                    if ui.checkbox(&mut checked, fraction).changed() {
                        toggle(&mut self.selection.mm_fractions, fraction, checked);
                        changed = true;
                    }
                }
            }
        }

        if changed {
            self.refresh_chart();
        }
    }

    fn chart_panel(&self, ui: &mut egui::Ui) {
        if let Some(ref error) = self.error_message {
            ui.colored_label(egui::Color32::RED, "Fehler:");
            ui.separator();
            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.monospace(error);
            });
            return;
        }

        let Some(chart) = self.chart.as_ref() else {
            ui.centered_and_justified(|ui| {
                ui.heading("Interaktive Datenkarte");
                ui.label("Workbook-Verzeichnis öffnen, um zu beginnen.");
            });
            return;
        };

        ui.heading(chart.title());
        if chart.is_placeholder() {
            for annotation in &chart.layout.annotations {
                ui.label(&annotation.text);
            }
        } else {
            ui.label(format!("{} Serien", chart.traces.len()));
            for trace in &chart.traces {
                let kind = match trace {
                    Trace::Bar(_) => "Balken",
                    Trace::Scatter(_) => "Linie+Marker",
                    Trace::Heatmap(_) => "Heatmap",
                };
                ui.label(format!("• {kind}: {}", trace.name()));
            }
        }
        ui.separator();

        egui::CollapsingHeader::new("Rohes Chart-JSON")
            .default_open(false)
            .show(ui, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    ui.monospace(&self.chart_json);
                });
            });
    }
}

fn toggle(list: &mut Vec<String>, value: &str, on: bool) {
    if on {
        if !list.iter().any(|v| v == value) {
            list.push(value.to_string());
        }
    } else {
        list.retain(|v| v != value);
    }
}

impl eframe::App for DatenkarteApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("Interaktive Datenkarte");
                ui.separator();
                if ui.button("Workbook öffnen").clicked() {
                    if let Some(path) = rfd::FileDialog::new().pick_folder() {
                        self.open_workbook(path);
                    }
                }
                if let Some(ref path) = self.workbook_path {
                    ui.label(format!("Workbook: {}", path.display()));
                }
            });
        });

        egui::SidePanel::left("controls_panel").show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                self.controls_panel(ui);
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.chart_panel(ui);
        });
    }
}
