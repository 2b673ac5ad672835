mod app;
mod color;
mod config;
mod data;
mod state;
mod ui;

use std::path::PathBuf;

use anyhow::{Context, Result};
use app::AccidentMapApp;
use clap::Parser;
use eframe::egui;

use config::Settings;
use data::filter::{FilterSelection, apply_filters};
use data::model::Category;
use data::normalize::coordinate_preview;
use data::view;
use state::{AppState, LoadedData, Source, load_dataset};

#[derive(Parser, Debug)]
#[command(name = "accident-map")]
#[command(about = "Map and filter Medellín traffic-accident records")]
struct Args {
    /// Settings file (defaults to ./accident-map.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Google Drive share link to load on start-up
    #[arg(short, long, conflicts_with = "file")]
    link: Option<String>,

    /// Local CSV or JSON file to load on start-up
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Print the normalization summary and exit without opening a window
    #[arg(long)]
    summary: bool,

    /// Filter applied to the summary, as `category=value` (repeatable,
    /// e.g. `--filter clase=Choque --filter año=2019`)
    #[arg(long = "filter", value_name = "CATEGORY=VALUE", requires = "summary")]
    filters: Vec<String>,
}

impl Args {
    fn source(&self) -> Option<Source> {
        match (&self.link, &self.file) {
            (Some(link), _) => Some(Source::Link(link.clone())),
            (None, Some(path)) => Some(Source::File(path.clone())),
            (None, None) => None,
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();
    let settings = Settings::resolve(args.config.as_deref())?;

    if args.summary {
        let source = args
            .source()
            .unwrap_or_else(|| Source::Link(settings.default_link.clone()));
        let selection = parse_filters(&args.filters)?;
        return print_summary(&source, &settings, &selection);
    }

    let mut state = AppState::new(settings);
    if let Some(source) = args.source() {
        if let Source::Link(link) = &source {
            state.link = link.clone();
        }
        state.load(source);
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Accident Map – Medellín",
        options,
        Box::new(|_cc| Ok(Box::new(AccidentMapApp::new(state)))),
    )
    .map_err(|e| anyhow::anyhow!("running UI: {e}"))
}

/// Group `category=value` pairs into a selection.
fn parse_filters(raw: &[String]) -> Result<FilterSelection> {
    let mut selection = FilterSelection::new();
    for item in raw {
        let (category, value) = item
            .split_once('=')
            .with_context(|| format!("filter '{item}' is not CATEGORY=VALUE"))?;
        let category: Category = category.parse()?;
        selection
            .entry(category)
            .or_default()
            .insert(value.trim().to_string());
    }
    Ok(selection)
}

fn print_summary(source: &Source, settings: &Settings, selection: &FilterSelection) -> Result<()> {
    let LoadedData { dataset, preview } = load_dataset(source, settings)?;

    println!("Source:              {source}");
    println!("Rows read:           {}", preview.total_rows);
    println!("Columns:             {}", preview.columns.join(", "));
    println!("Location column:     {}", dataset.location_column);
    for (category, column) in &dataset.resolved {
        println!(
            "{:<20} {column} ({} values)",
            format!("{category}:"),
            dataset.options.get(category).map_or(0, |o| o.len())
        );
    }
    println!("Valid coordinates:   {}", dataset.len());
    println!("Invalid coordinates: {}", dataset.rejected);
    for (reason, count) in &dataset.rejections {
        println!("  {reason}: {count}");
    }
    println!("Valid percentage:    {:.1}%", dataset.valid_percentage());
    if !selection.is_empty() {
        let filtered = apply_filters(&dataset, selection);
        let marker_cap = view::cap(filtered.len(), settings.max_markers);
        println!(
            "Matching filters:    {} ({} beyond the {}-marker cap)",
            filtered.len(),
            marker_cap.hidden,
            settings.max_markers
        );
    }
    for line in coordinate_preview(&dataset, 5) {
        println!("{line}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filters_group_by_category() {
        let raw = vec![
            "clase=Choque".to_string(),
            "CLASE=Caída".to_string(),
            "año=2019".to_string(),
        ];
        let sel = parse_filters(&raw).unwrap();
        assert_eq!(sel[&Category::Clase].len(), 2);
        assert!(sel[&Category::Anio].contains("2019"));
    }

    #[test]
    fn malformed_filters_fail() {
        assert!(parse_filters(&["clase".to_string()]).is_err());
        assert!(parse_filters(&["weather=rain".to_string()]).is_err());
    }

    #[test]
    fn args_prefer_link_source() {
        let args = Args::parse_from(["accident-map", "--link", "https://drive.google.com/uc?id=x"]);
        assert_eq!(args.source(), Some(Source::Link("https://drive.google.com/uc?id=x".into())));
        let args = Args::parse_from(["accident-map", "--summary", "--file", "a.csv", "--filter", "clase=Choque"]);
        assert_eq!(args.source(), Some(Source::File(PathBuf::from("a.csv"))));
        assert_eq!(args.filters, vec!["clase=Choque".to_string()]);
    }
}
