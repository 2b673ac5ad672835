use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};

use crate::color::ColorMap;
use crate::config::Settings;
use crate::data::filter::{FilterSelection, filter_options, filtered_indices};
use crate::data::ingest::DriveClient;
use crate::data::loader;
use crate::data::model::{AccidentDataset, Category, EnrichedRecord, RawPreview};
use crate::data::normalize::normalize;

// ---------------------------------------------------------------------------
// Data sources
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Link(String),
    File(PathBuf),
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Source::Link(link) => write!(f, "{link}"),
            Source::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Source rows kept for the "Dataset info" section.
pub const PREVIEW_ROWS: usize = 10;

/// A normalized dataset plus a glimpse of the table it came from.
#[derive(Debug, Clone)]
pub struct LoadedData {
    pub dataset: AccidentDataset,
    pub preview: RawPreview,
}

/// Fetch or read the raw table, then normalize it with the configured box.
pub fn load_dataset(source: &Source, settings: &Settings) -> Result<LoadedData> {
    let table = match source {
        Source::Link(link) => {
            let client = DriveClient::new(Duration::from_secs(settings.timeout_secs))?;
            client.fetch_table(link).context("loading data")?
        }
        Source::File(path) => loader::load_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
    };
    let dataset = normalize(&table, &settings.bounding_box())?;
    Ok(LoadedData {
        dataset,
        preview: table.preview(PREVIEW_ROWS),
    })
}

// ---------------------------------------------------------------------------
// Session – one loaded dataset and its filters
// ---------------------------------------------------------------------------

/// Everything tied to the currently loaded dataset. Replaced whole on reload.
#[derive(Debug, Clone)]
pub struct Session {
    pub source: Source,
    pub dataset: AccidentDataset,
    pub preview: RawPreview,
    pub filters: FilterSelection,
    /// Indices of records passing the current filters (cached).
    pub visible: Vec<usize>,
}

impl Session {
    pub fn new(source: Source, loaded: LoadedData) -> Self {
        let LoadedData { dataset, preview } = loaded;
        let visible = (0..dataset.len()).collect();
        Self {
            source,
            dataset,
            preview,
            filters: FilterSelection::new(),
            visible,
        }
    }

    /// Recompute `visible` after a filter change.
    pub fn refilter(&mut self) {
        self.visible = filtered_indices(&self.dataset, &self.filters);
    }

    pub fn visible_records(&self) -> impl Iterator<Item = &EnrichedRecord> {
        self.visible.iter().map(|&i| &self.dataset.records[i])
    }

    /// Whether a value's checkbox is ticked. Unconstrained categories show all ticked.
    pub fn is_selected(&self, category: Category, value: &str) -> bool {
        self.filters
            .get(&category)
            .map_or(true, |selected| selected.contains(value))
    }

    /// Toggle a single value in a category's filter.
    ///
    /// Ticking the last unticked value lifts the constraint entirely.
    pub fn toggle_filter_value(&mut self, category: Category, value: &str) {
        let all = filter_options(&self.dataset, category);
        let selected = self.filters.entry(category).or_insert_with(|| all.clone());
        if !selected.remove(value) {
            selected.insert(value.to_string());
        }
        if *selected == all {
            self.filters.remove(&category);
        }
        self.refilter();
    }

    /// Select all values in a category (no constraint).
    pub fn select_all(&mut self, category: Category) {
        self.filters.remove(&category);
        self.refilter();
    }

    /// Deselect all values in a category (matches nothing).
    pub fn select_none(&mut self, category: Category) {
        self.filters.insert(category, BTreeSet::new());
        self.refilter();
    }

    pub fn clear_filters(&mut self) {
        self.filters.clear();
        self.refilter();
    }
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapStyle {
    Markers,
    Clusters,
    HeatMap,
    Table,
}

impl MapStyle {
    pub const ALL: [MapStyle; 4] = [
        MapStyle::Markers,
        MapStyle::Clusters,
        MapStyle::HeatMap,
        MapStyle::Table,
    ];

    pub fn label(self) -> &'static str {
        match self {
            MapStyle::Markers => "Markers",
            MapStyle::Clusters => "Clusters",
            MapStyle::HeatMap => "Heat map",
            MapStyle::Table => "Table",
        }
    }
}

/// The full UI state, independent of rendering.
pub struct AppState {
    pub settings: Settings,

    /// Share link typed in the side panel.
    pub link: String,

    /// Loaded dataset (None until the user loads one).
    pub session: Option<Session>,

    pub map_style: MapStyle,

    /// Which category is used for colouring markers.
    pub color_category: Option<Category>,

    /// Active colour map.
    pub color_map: Option<ColorMap>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(settings: Settings) -> Self {
        Self {
            link: settings.default_link.clone(),
            settings,
            session: None,
            map_style: MapStyle::Markers,
            color_category: None,
            color_map: None,
            status_message: None,
        }
    }

    /// Load from `source`, replacing any current session. Failures leave
    /// the previous session untouched and set the status message.
    pub fn load(&mut self, source: Source) {
        match load_dataset(&source, &self.settings) {
            Ok(loaded) => {
                log::info!(
                    "Loaded {} accidents ({} rejected) from {source}",
                    loaded.dataset.len(),
                    loaded.dataset.rejected
                );
                self.set_session(Session::new(source, loaded));
            }
            Err(e) => {
                log::error!("Failed to load {source}: {e:#}");
                self.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }

    /// Load the link currently typed in the side panel.
    pub fn load_link(&mut self) {
        let link = self.link.trim().to_string();
        if link.is_empty() {
            self.status_message = Some("Please enter a link".to_string());
            return;
        }
        self.load(Source::Link(link));
    }

    pub fn load_path(&mut self, path: &Path) {
        self.load(Source::File(path.to_path_buf()));
    }

    /// Install a freshly loaded session and pick a default colour category.
    pub fn set_session(&mut self, session: Session) {
        let resolved = &session.dataset.resolved;
        self.color_category = if resolved.contains_key(&Category::Clase) {
            Some(Category::Clase)
        } else {
            resolved.keys().next().copied()
        };
        self.session = Some(session);
        self.rebuild_color_map();
        self.status_message = None;
    }

    /// Rebuild the colour map from the current `color_category`.
    pub fn rebuild_color_map(&mut self) {
        self.color_map = match (&self.session, self.color_category) {
            (Some(session), Some(cat)) => {
                Some(ColorMap::new(cat, &filter_options(&session.dataset, cat)))
            }
            _ => None,
        };
    }

    pub fn set_color_category(&mut self, category: Option<Category>) {
        self.color_category = category;
        self.rebuild_color_map();
    }
}
