//! Constrained shortlist selection.
//!
//! A greedy constrained top-k, not a combinatorial optimum: records are
//! visited once in score order and skipped records are never retried.
//! Callers tune the caps when they need more global diversity.

use std::cmp::Reverse;
use std::collections::HashMap;

use ordered_float::OrderedFloat;

use crate::criteria::SelectionConfig;
use crate::model::{Table, SCORE_COLUMN};

/// Filter by minimum score, sort score-descending (ties keep original
/// order), then greedily accept under the per-station and per-event caps
/// until `num_records` are taken or the list runs out. An empty result is
/// a valid outcome, not an error.
pub fn apply_selection_rules(scored: &Table, config: &SelectionConfig) -> Table {
    let score_of = |row: usize| scored.number(row, SCORE_COLUMN).unwrap_or(0.0);

    let mut order: Vec<usize> = (0..scored.n_rows())
        .filter(|&row| score_of(row) >= config.min_score)
        .collect();
    order.sort_by_key(|&row| Reverse(OrderedFloat(score_of(row))));

    let mut station_counts: HashMap<String, usize> = HashMap::new();
    let mut event_counts: HashMap<String, usize> = HashMap::new();
    let mut picked: Vec<usize> = Vec::new();

    for row in order {
        if picked.len() >= config.num_records {
            break;
        }

        let station = scored.key(row, "STATION");
        let event = scored.key(row, "EVENT");

        if station_counts.get(&station).copied().unwrap_or(0) >= config.max_per_station
            || event_counts.get(&event).copied().unwrap_or(0) >= config.max_per_event
        {
            continue;
        }

        *station_counts.entry(station).or_insert(0) += 1;
        *event_counts.entry(event).or_insert(0) += 1;
        picked.push(row);
    }

    scored.select_rows(&picked)
}
