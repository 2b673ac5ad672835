use std::collections::{BTreeMap, BTreeSet};

use super::model::{AccidentDataset, Category, EnrichedRecord};

// ---------------------------------------------------------------------------
// Filter predicate: which values are accepted per category
// ---------------------------------------------------------------------------

/// Per-category selection: maps category → set of accepted values.
/// An absent category means "no filter"; a present but empty set matches nothing.
pub type FilterSelection = BTreeMap<Category, BTreeSet<String>>;

/// Distinct selectable values for a category, sorted.
pub fn filter_options(dataset: &AccidentDataset, category: Category) -> BTreeSet<String> {
    dataset.options.get(&category).cloned().unwrap_or_default()
}

/// Return indices of records that pass all active filters, in source order.
///
/// A record passes a category filter when:
/// * The category is not present in `selection` → passes (no constraint)
/// * The category was not found in the source table → passes (no-op filter)
/// * The accepted set is empty → nothing selected → fails
/// * The record's value for that category is in the accepted set → passes
pub fn filtered_indices(dataset: &AccidentDataset, selection: &FilterSelection) -> Vec<usize> {
    let active: Vec<(&Category, &BTreeSet<String>)> = selection
        .iter()
        .filter(|(cat, _)| dataset.resolved.contains_key(*cat))
        .collect();

    dataset
        .records
        .iter()
        .enumerate()
        .filter(|(_, rec)| {
            active
                .iter()
                .all(|(cat, accepted)| accepted.contains(rec.field(**cat)))
        })
        .map(|(i, _)| i)
        .collect()
}

/// The filtered records themselves.
pub fn apply_filters(dataset: &AccidentDataset, selection: &FilterSelection) -> Vec<EnrichedRecord> {
    filtered_indices(dataset, selection)
        .into_iter()
        .map(|i| dataset.records[i].clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(row: usize, clase: &str, anio: &str) -> EnrichedRecord {
        EnrichedRecord {
            row,
            lat: 6.25,
            lon: -75.58,
            clase: clase.into(),
            anio: anio.into(),
            ..Default::default()
        }
    }

    fn dataset() -> AccidentDataset {
        let records = vec![
            rec(0, "Choque", "2019"),
            rec(1, "Caída", "2019"),
            rec(2, "Choque", "2020"),
            rec(3, "Caída", "2020"),
            rec(4, "Choque", ""),
        ];
        let resolved = BTreeMap::from([
            (Category::Clase, "CLASE".to_string()),
            (Category::Anio, "AÑO".to_string()),
        ]);
        AccidentDataset::from_parts(records, BTreeMap::new(), "LOCATION".into(), resolved)
    }

    fn set(values: &[&str]) -> BTreeSet<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn empty_selection_returns_everything() {
        let ds = dataset();
        assert_eq!(apply_filters(&ds, &FilterSelection::new()), ds.records);
    }

    #[test]
    fn single_category_keeps_order() {
        let ds = dataset();
        let sel = FilterSelection::from([(Category::Clase, set(&["Choque"]))]);
        let rows: Vec<usize> = apply_filters(&ds, &sel).iter().map(|r| r.row).collect();
        assert_eq!(rows, vec![0, 2, 4]);
    }

    #[test]
    fn categories_combine_with_and() {
        let ds = dataset();
        let sel = FilterSelection::from([
            (Category::Clase, set(&["Choque"])),
            (Category::Anio, set(&["2020"])),
        ]);
        assert_eq!(filtered_indices(&ds, &sel), vec![2]);
    }

    #[test]
    fn present_but_empty_set_matches_nothing() {
        let ds = dataset();
        let sel = FilterSelection::from([(Category::Clase, BTreeSet::new())]);
        assert!(filtered_indices(&ds, &sel).is_empty());
    }

    #[test]
    fn unresolved_category_is_a_no_op() {
        let ds = dataset();
        let sel = FilterSelection::from([(Category::Barrio, set(&["Laureles"]))]);
        assert_eq!(filtered_indices(&ds, &sel).len(), ds.len());
        let sel = FilterSelection::from([(Category::Barrio, BTreeSet::new())]);
        assert_eq!(filtered_indices(&ds, &sel).len(), ds.len());
    }

    #[test]
    fn selecting_all_options_still_drops_blank_values() {
        let ds = dataset();
        let sel = FilterSelection::from([(Category::Anio, filter_options(&ds, Category::Anio))]);
        assert_eq!(filtered_indices(&ds, &sel), vec![0, 1, 2, 3]);
    }
}
