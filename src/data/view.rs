use std::collections::HashMap;

use super::model::Coordinate;

// ---------------------------------------------------------------------------
// Marker cap
// ---------------------------------------------------------------------------

/// How many of the filtered points get drawn as individual markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderCap {
    pub shown: usize,
    pub hidden: usize,
}

pub fn cap(total: usize, max: usize) -> RenderCap {
    let shown = total.min(max);
    RenderCap {
        shown,
        hidden: total - shown,
    }
}

// ---------------------------------------------------------------------------
// Grid aggregation (clusters and heat-map)
// ---------------------------------------------------------------------------

/// Points falling into one square lon/lat cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridCell {
    /// Centroid of the member points.
    pub lat: f64,
    pub lon: f64,
    /// Cell origin (south-west corner).
    pub min_lat: f64,
    pub min_lon: f64,
    pub count: usize,
}

impl GridCell {
    /// Count relative to the densest cell, in `0.0..=1.0`.
    pub fn intensity(&self, max_count: usize) -> f64 {
        if max_count == 0 {
            0.0
        } else {
            self.count as f64 / max_count as f64
        }
    }
}

/// Bin points into `cell_deg`-sized cells, densest first.
pub fn bin<'a, I>(points: I, cell_deg: f64) -> Vec<GridCell>
where
    I: IntoIterator<Item = &'a Coordinate>,
{
    if !(cell_deg > 0.0) {
        return Vec::new();
    }

    // key → (sum_lat, sum_lon, count)
    let mut acc: HashMap<(i64, i64), (f64, f64, usize)> = HashMap::new();
    for p in points {
        let key = (
            (p.lat / cell_deg).floor() as i64,
            (p.lon / cell_deg).floor() as i64,
        );
        let e = acc.entry(key).or_insert((0.0, 0.0, 0));
        e.0 += p.lat;
        e.1 += p.lon;
        e.2 += 1;
    }

    let mut cells: Vec<GridCell> = acc
        .into_iter()
        .map(|((ky, kx), (sum_lat, sum_lon, count))| GridCell {
            lat: sum_lat / count as f64,
            lon: sum_lon / count as f64,
            min_lat: ky as f64 * cell_deg,
            min_lon: kx as f64 * cell_deg,
            count,
        })
        .collect();

    cells.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then(a.min_lat.total_cmp(&b.min_lat))
            .then(a.min_lon.total_cmp(&b.min_lon))
    });
    cells
}

/// Largest cell count, 0 when empty.
pub fn max_count(cells: &[GridCell]) -> usize {
    cells.iter().map(|c| c.count).max().unwrap_or(0)
}

// ---------------------------------------------------------------------------
// Hover lookup
// ---------------------------------------------------------------------------

/// The entry closest to `target` within `max_deg` (Euclidean, in degrees).
pub fn nearest<T: Copy>(points: &[(Coordinate, T)], target: Coordinate, max_deg: f64) -> Option<T> {
    points
        .iter()
        .map(|(p, item)| ((p.lat - target.lat).hypot(p.lon - target.lon), *item))
        .filter(|(dist, _)| *dist <= max_deg)
        .min_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, item)| item)
}
