use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_extras::{Column, TableBuilder};

use crate::data::filter::filter_options;
use crate::data::model::Category;
use crate::data::normalize::coordinate_preview;
use crate::state::{AppState, MapStyle};

// ---------------------------------------------------------------------------
// Left side panel – data source and filter widgets
// ---------------------------------------------------------------------------

/// Render the left panel: link input, map style, colour and filters.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Load data");
    ui.label("Google Drive link:");
    ui.text_edit_singleline(&mut state.link);
    ui.horizontal(|ui: &mut Ui| {
        if ui.button("Load data").clicked() {
            state.load_link();
        }
        if ui.button("Open file…").clicked() {
            open_file_dialog(state);
        }
    });
    ui.separator();

    if state.session.is_none() {
        ui.label(
            "1. Make sure the Drive file is shared publicly\n\
             2. Copy the share link\n\
             3. Paste it above\n\
             4. Click 'Load data'",
        );
        ui.label(RichText::new("Format: https://drive.google.com/uc?id=FILE_ID").weak());
        return;
    }

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            map_style_selector(ui, state);
            color_selector(ui, state);
            ui.separator();
            ui.heading("Filters");
            filter_widgets(ui, state);
            ui.separator();
            coordinate_examples(ui, state);
            dataset_info(ui, state);
        });
}

fn map_style_selector(ui: &mut Ui, state: &mut AppState) {
    ui.strong("Map style");
    ui.horizontal_wrapped(|ui: &mut Ui| {
        for style in MapStyle::ALL {
            ui.selectable_value(&mut state.map_style, style, style.label());
        }
    });
}

fn color_selector(ui: &mut Ui, state: &mut AppState) {
    let Some(session) = &state.session else {
        return;
    };
    let resolved: Vec<Category> = session.dataset.resolved.keys().copied().collect();
    if resolved.is_empty() {
        return;
    }

    ui.strong("Color by");
    let current = state.color_category;
    let selected_text = current.map(Category::label).unwrap_or("None");
    egui::ComboBox::from_id_salt("color_by")
        .selected_text(selected_text)
        .show_ui(ui, |ui: &mut Ui| {
            if ui.selectable_label(current.is_none(), "None").clicked() {
                state.set_color_category(None);
            }
            for cat in resolved {
                if ui.selectable_label(current == Some(cat), cat.label()).clicked() {
                    state.set_color_category(Some(cat));
                }
            }
        });

    if let Some(cm) = &state.color_map {
        egui::CollapsingHeader::new(format!("Legend: {}", cm.category.label()))
            .id_salt("legend")
            .default_open(false)
            .show(ui, |ui: &mut Ui| {
                for (label, color) in cm.legend_entries() {
                    ui.label(RichText::new(format!("● {label}")).color(color));
                }
            });
    }
}

fn filter_widgets(ui: &mut Ui, state: &mut AppState) {
    let color_category = state.color_category;
    let color_map = state.color_map.clone();
    let Some(session) = state.session.as_mut() else {
        return;
    };

    if ui.small_button("Clear all filters").clicked() {
        session.clear_filters();
    }

    for cat in Category::ALL {
        if !session.dataset.resolved.contains_key(&cat) {
            continue;
        }
        let options = filter_options(&session.dataset, cat);
        let n_selected = options
            .iter()
            .filter(|v| session.is_selected(cat, v))
            .count();
        let header_text = format!("{}  ({n_selected}/{})", cat.label(), options.len());

        egui::CollapsingHeader::new(RichText::new(header_text).strong())
            .id_salt(cat.name())
            .default_open(false)
            .show(ui, |ui: &mut Ui| {
                ui.horizontal(|ui: &mut Ui| {
                    if ui.small_button("All").clicked() {
                        session.select_all(cat);
                    }
                    if ui.small_button("None").clicked() {
                        session.select_none(cat);
                    }
                });

                for value in &options {
                    let mut text = RichText::new(value);
                    if color_category == Some(cat) {
                        if let Some(cm) = &color_map {
                            text = text.color(cm.color_for(value));
                        }
                    }

                    let mut checked = session.is_selected(cat, value);
                    if ui.checkbox(&mut checked, text).changed() {
                        session.toggle_filter_value(cat, value);
                    }
                }
            });
    }
}

fn coordinate_examples(ui: &mut Ui, state: &AppState) {
    let Some(session) = &state.session else {
        return;
    };
    egui::CollapsingHeader::new("Coordinate examples")
        .default_open(false)
        .show(ui, |ui: &mut Ui| {
            for line in coordinate_preview(&session.dataset, 5) {
                ui.monospace(line);
            }
        });
}

/// Source columns and the first rows as they were read.
fn dataset_info(ui: &mut Ui, state: &AppState) {
    let Some(session) = &state.session else {
        return;
    };
    let preview = &session.preview;
    egui::CollapsingHeader::new("Dataset info")
        .default_open(false)
        .show(ui, |ui: &mut Ui| {
            ui.label(format!(
                "{} rows, {} columns",
                preview.total_rows,
                preview.columns.len()
            ));
            ui.label(RichText::new(preview.columns.join(", ")).weak());
            if preview.columns.is_empty() {
                return;
            }

            ui.label(format!("First {} rows:", preview.rows.len()));
            ScrollArea::horizontal().show(ui, |ui: &mut Ui| {
                ui.push_id("raw_preview", |ui: &mut Ui| {
                    TableBuilder::new(ui)
                        .striped(true)
                        .vscroll(false)
                        .columns(Column::auto().at_least(40.0), preview.columns.len())
                        .header(18.0, |mut header| {
                            for name in &preview.columns {
                                header.col(|ui: &mut Ui| {
                                    ui.strong(name);
                                });
                            }
                        })
                        .body(|mut body| {
                            for cells in &preview.rows {
                                body.row(16.0, |mut row| {
                                    for text in cells {
                                        row.col(|ui: &mut Ui| {
                                            ui.label(text);
                                        });
                                    }
                                });
                            }
                        });
                });
            });
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            if ui.button("Reload").clicked() {
                if let Some(source) = state.session.as_ref().map(|s| s.source.clone()) {
                    state.load(source);
                }
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(session) = &state.session {
            let ds = &session.dataset;
            ui.label(format!(
                "{} accidents, {} visible, {} invalid coordinates skipped ({:.1}% valid)",
                ds.len(),
                session.visible.len(),
                ds.rejected,
                ds.valid_percentage()
            ));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open accident data")
        .add_filter("Supported files", &["csv", "txt", "json"])
        .add_filter("CSV", &["csv", "txt"])
        .add_filter("JSON", &["json"])
        .pick_file();

    if let Some(path) = file {
        state.load_path(&path);
    }
}
