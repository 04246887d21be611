//! Grouping helpers shared by the viewer and producer aggregators.
//!
//! Every grouped result keeps keys in first-appearance order; rankings then
//! sort descending by metric with a stable sort, so ties preserve that
//! first-appearance order.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::hash::Hash;

/// Counts distinct `value`s per `key`. Keys come back in the order they
/// first occur in the input.
pub fn distinct_count_by<K, V, I>(pairs: I) -> Vec<(K, usize)>
where
    K: Eq + Hash + Clone,
    V: Eq + Hash,
    I: IntoIterator<Item = (K, V)>,
{
    let mut order: Vec<K> = Vec::new();
    let mut sets: HashMap<K, HashSet<V>> = HashMap::new();

    for (key, value) in pairs {
        let set = match sets.entry(key) {
            Entry::Vacant(e) => {
                order.push(e.key().clone());
                e.insert(HashSet::new())
            }
            Entry::Occupied(e) => e.into_mut(),
        };
        set.insert(value);
    }

    order
        .into_iter()
        .map(|key| {
            let count = sets[&key].len();
            (key, count)
        })
        .collect()
}

/// Counts rows per `key`, keys in first-appearance order.
pub fn row_count_by<K, I>(keys: I) -> Vec<(K, usize)>
where
    K: Eq + Hash + Clone,
    I: IntoIterator<Item = K>,
{
    let mut order: Vec<K> = Vec::new();
    let mut counts: HashMap<K, usize> = HashMap::new();

    for key in keys {
        match counts.entry(key) {
            Entry::Vacant(e) => {
                order.push(e.key().clone());
                e.insert(1);
            }
            Entry::Occupied(mut e) => *e.get_mut() += 1,
        }
    }

    order
        .into_iter()
        .map(|key| {
            let count = counts[&key];
            (key, count)
        })
        .collect()
}

/// Collects the distinct `value`s per `key`, both in first-appearance order.
pub fn distinct_values_by<K, I>(pairs: I) -> Vec<(K, Vec<String>)>
where
    K: Eq + Hash + Clone,
    I: IntoIterator<Item = (K, String)>,
{
    let mut order: Vec<K> = Vec::new();
    let mut groups: HashMap<K, (Vec<String>, HashSet<String>)> = HashMap::new();

    for (key, value) in pairs {
        let (list, seen) = match groups.entry(key) {
            Entry::Vacant(e) => {
                order.push(e.key().clone());
                e.insert((Vec::new(), HashSet::new()))
            }
            Entry::Occupied(e) => e.into_mut(),
        };
        if seen.insert(value.clone()) {
            list.push(value);
        }
    }

    order
        .into_iter()
        .map(|key| {
            let list = groups[&key].0.clone();
            (key, list)
        })
        .collect()
}

/// Sorts ranking entries descending by count. `sort_by` is stable, so ties
/// keep their first-appearance order.
pub fn sort_desc<K>(entries: &mut [(K, usize)]) {
    entries.sort_by(|a, b| b.1.cmp(&a.1));
}

/// Joins a title list into its display form.
pub fn join_titles(titles: &[String]) -> String {
    titles.join(", ")
}

/// `log10(v + 1)` — bounded size metric for chart scaling.
pub fn log_scale(v: f64) -> f64 {
    (v + 1.0).log10()
}
