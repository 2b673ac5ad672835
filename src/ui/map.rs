use std::collections::BTreeMap;

use eframe::egui::{Color32, RichText, Stroke, Ui};
use egui_extras::{Column, TableBuilder};
use egui_plot::{Legend, Plot, PlotPoint, PlotPoints, PlotUi, Points, Polygon, Text};

use crate::color::heat_color;
use crate::data::model::{Category, Coordinate};
use crate::data::view::{self, GridCell};
use crate::state::{AppState, MapStyle, Session};

const MARKER_COLOR: Color32 = Color32::from_rgb(220, 40, 40);

/// Hover reach for naming a marker, in degrees.
const HOVER_DEG: f64 = 0.002;

// ---------------------------------------------------------------------------
// Central panel
// ---------------------------------------------------------------------------

/// Render the map (or table) for the visible accidents.
pub fn accident_view(ui: &mut Ui, state: &AppState) {
    let Some(session) = &state.session else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Load a link or open a file to map accidents");
        });
        return;
    };

    if session.dataset.is_empty() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("No valid coordinates to show on the map");
        });
        return;
    }

    if state.map_style == MapStyle::Table {
        accident_table(ui, session);
        return;
    }

    let marker_cap = view::cap(session.visible.len(), state.settings.max_markers);
    if state.map_style == MapStyle::Markers && marker_cap.hidden > 0 {
        ui.label(
            RichText::new(format!(
                "Showing the first {} of {} points ({} hidden)",
                marker_cap.shown,
                session.visible.len(),
                marker_cap.hidden
            ))
            .weak(),
        );
    }

    let bbox = state.settings.bounding_box();
    let center = state.settings.center();

    // Markers are labelled with their source row on hover.
    let hover_targets: Vec<(Coordinate, usize)> = if state.map_style == MapStyle::Markers {
        session
            .visible_records()
            .take(marker_cap.shown)
            .map(|r| (r.coordinate(), r.row))
            .collect()
    } else {
        Vec::new()
    };

    Plot::new("accident_map")
        .legend(Legend::default())
        .data_aspect(1.0)
        .x_axis_label("Longitude")
        .y_axis_label("Latitude")
        .include_x(bbox.min_lon.max(center.lon - 0.1))
        .include_x(bbox.max_lon.min(center.lon + 0.1))
        .include_y(bbox.min_lat.max(center.lat - 0.1))
        .include_y(bbox.max_lat.min(center.lat + 0.1))
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .label_formatter(move |_name, value: &PlotPoint| {
            let at = Coordinate {
                lat: value.y,
                lon: value.x,
            };
            let position = format!("Lat {:.6}, Lon {:.6}", value.y, value.x);
            match view::nearest(&hover_targets, at, HOVER_DEG) {
                Some(row) => format!("Accidente {row}\n{position}"),
                None => position,
            }
        })
        .show(ui, |plot_ui| match state.map_style {
            MapStyle::Markers => markers(plot_ui, state, session, marker_cap.shown),
            MapStyle::Clusters => clusters(plot_ui, session, state.settings.cluster_cell_deg),
            MapStyle::HeatMap => heat_map(plot_ui, session, state.settings.heat_cell_deg),
            MapStyle::Table => {}
        });
}

fn visible_coordinates(session: &Session) -> Vec<Coordinate> {
    session.visible_records().map(|r| r.coordinate()).collect()
}

// ---------------------------------------------------------------------------
// Markers
// ---------------------------------------------------------------------------

fn markers(plot_ui: &mut PlotUi, state: &AppState, session: &Session, shown: usize) {
    let color_category: Option<Category> = state.color_category;

    // One series per colour value so the legend lists them.
    let mut series: BTreeMap<String, Vec<[f64; 2]>> = BTreeMap::new();
    for rec in session.visible_records().take(shown) {
        let key = color_category
            .map(|cat| rec.field(cat).to_string())
            .unwrap_or_default();
        series.entry(key).or_default().push([rec.lon, rec.lat]);
    }

    for (value, points) in series {
        let color = match (&state.color_map, color_category) {
            (Some(cm), Some(_)) => cm.color_for(&value),
            _ => MARKER_COLOR,
        };
        let name = match color_category {
            Some(_) if value.is_empty() => "(blank)".to_string(),
            Some(_) => value,
            None => "Accidents".to_string(),
        };
        plot_ui.points(
            Points::new(PlotPoints::new(points))
                .radius(3.0)
                .color(color)
                .name(name),
        );
    }
}

// ---------------------------------------------------------------------------
// Clusters
// ---------------------------------------------------------------------------

fn clusters(plot_ui: &mut PlotUi, session: &Session, cell_deg: f64) {
    let coords = visible_coordinates(session);
    let cells = view::bin(&coords, cell_deg);
    let max = view::max_count(&cells);

    for cell in &cells {
        let radius = 4.0 + 16.0 * cell.intensity(max).sqrt() as f32;
        plot_ui.points(
            Points::new(PlotPoints::new(vec![[cell.lon, cell.lat]]))
                .radius(radius)
                .color(Color32::from_rgba_unmultiplied(30, 120, 220, 160)),
        );
        if cell.count > 1 {
            plot_ui.text(Text::new(
                PlotPoint::new(cell.lon, cell.lat),
                RichText::new(cell.count.to_string()).strong().color(Color32::WHITE),
            ));
        }
    }
}

// ---------------------------------------------------------------------------
// Heat map
// ---------------------------------------------------------------------------

fn heat_map(plot_ui: &mut PlotUi, session: &Session, cell_deg: f64) {
    let coords = visible_coordinates(session);
    let cells = view::bin(&coords, cell_deg);
    let max = view::max_count(&cells);

    // Densest last so they draw on top.
    for cell in cells.iter().rev() {
        let color = heat_color(cell.intensity(max));
        plot_ui.polygon(
            Polygon::new(PlotPoints::new(cell_square(cell, cell_deg)))
                .fill_color(color)
                .stroke(Stroke::NONE),
        );
    }
}

fn cell_square(cell: &GridCell, size: f64) -> Vec<[f64; 2]> {
    let (x, y) = (cell.min_lon, cell.min_lat);
    vec![[x, y], [x + size, y], [x + size, y + size], [x, y + size]]
}

// ---------------------------------------------------------------------------
// Table
// ---------------------------------------------------------------------------

fn accident_table(ui: &mut Ui, session: &Session) {
    let headers = ["row", "lat", "lon", "clase", "gravedad", "barrio", "comuna", "año"];

    TableBuilder::new(ui)
        .striped(true)
        .resizable(true)
        .column(Column::auto())
        .columns(Column::auto().at_least(80.0), headers.len() - 1)
        .header(20.0, |mut header| {
            for h in headers {
                header.col(|ui: &mut Ui| {
                    ui.strong(h);
                });
            }
        })
        .body(|body| {
            body.rows(18.0, session.visible.len(), |mut row| {
                let rec = &session.dataset.records[session.visible[row.index()]];
                let cells = [
                    rec.row.to_string(),
                    format!("{:.6}", rec.lat),
                    format!("{:.6}", rec.lon),
                    rec.clase.clone(),
                    rec.gravedad.clone(),
                    rec.barrio.clone(),
                    rec.comuna.clone(),
                    rec.anio.clone(),
                ];
                for text in cells {
                    row.col(|ui: &mut Ui| {
                        ui.label(text);
                    });
                }
            });
        });
}
