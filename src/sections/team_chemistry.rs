//! Team Chemistry - passing network, combinations, cohesion

use super::common::is_successful_pass;
use super::{Section, SectionError};
use crate::config::defaults::{LEADERBOARD_SIZE, TOP_COMBINATIONS};
use crate::dataset::{self, Table, View};
use crate::types::{MetricMap, SectionMetrics};
use std::collections::BTreeMap;

pub struct TeamChemistry;

impl Section for TeamChemistry {
    fn id(&self) -> &str {
        "team_chemistry"
    }

    fn name(&self) -> &str {
        "Team Chemistry"
    }

    fn icon(&self) -> &str {
        "🤝"
    }

    fn compute(
        &self,
        events: &Table,
        _phases: Option<&Table>,
    ) -> Result<SectionMetrics, SectionError> {
        let view = events.view();
        Ok(SectionMetrics::new("Team Chemistry")
            .with_group("passing_networks", passing_networks(&view))
            .with_group("player_clusters", player_clusters(&view))
            .with_group("team_cohesion", team_cohesion(&view)))
    }
}

/// Sort `(key, count)` pairs by count descending; ties keep key order.
fn by_count_desc<K: Ord>(counts: BTreeMap<K, usize>) -> Vec<(K, usize)> {
    let mut sorted: Vec<(K, usize)> = counts.into_iter().collect();
    sorted.sort_by(|a, b| b.1.cmp(&a.1));
    sorted
}

fn passing_networks(view: &View<'_>) -> MetricMap {
    let mut m = MetricMap::new();
    if !view.has_all(&["pass_outcome", "player_id", "player_targeted_id"]) {
        return m;
    }

    let passes = view.filter(is_successful_pass);
    let mut combinations: BTreeMap<(String, String), usize> = BTreeMap::new();
    for r in passes.rows() {
        if let (Some(passer), Some(receiver)) = (r.key("player_id"), r.key("player_targeted_id")) {
            *combinations.entry((passer, receiver)).or_insert(0) += 1;
        }
    }
    if combinations.is_empty() {
        return m;
    }

    m.insert("total_unique_combinations", combinations.len());

    if passes.has("player_name") {
        let by_player = passes.group_by("player_id");
        let name_of = |id: &str| {
            by_player
                .get(id)
                .and_then(|rows| rows.first_str("player_name"))
                .unwrap_or_else(|| "Unknown".to_string())
        };
        let top: Vec<MetricMap> = by_count_desc(combinations)
            .into_iter()
            .take(TOP_COMBINATIONS)
            .map(|((passer, receiver), count)| {
                let mut combo = MetricMap::new();
                combo.insert("passer", name_of(&passer));
                combo.insert("receiver", name_of(&receiver));
                combo.insert("passes", count);
                combo
            })
            .collect();
        m.insert("top_passing_combinations", top);
    }
    m
}

fn player_clusters(view: &View<'_>) -> MetricMap {
    let mut m = MetricMap::new();

    m.insert_opt(
        "avg_simultaneous_options",
        view.mean("n_simultaneous_passing_options"),
    );

    if view.has("give_and_go") {
        let give_and_gos = view.where_set("give_and_go");
        m.insert("total_give_and_gos", give_and_gos.len());
        if !give_and_gos.is_empty() && give_and_gos.has("player_id") {
            let top: BTreeMap<String, usize> =
                by_count_desc(give_and_gos.value_counts("player_id"))
                    .into_iter()
                    .take(LEADERBOARD_SIZE)
                    .collect();
            m.insert("top_give_and_go_players", top);
        }
    }
    m
}

fn team_cohesion(view: &View<'_>) -> MetricMap {
    let mut m = MetricMap::new();
    if !view.has("player_id") {
        return m;
    }

    if view.has("phase_index") {
        let per_phase: Vec<f64> = view
            .group_by("phase_index")
            .values()
            .map(|phase| phase.nunique("player_id") as f64)
            .collect();
        m.insert_opt("avg_players_per_phase", dataset::mean(&per_phase));
    }

    // Coefficient of variation of touches, folded into 0..1 (1 = perfectly even)
    let touches: Vec<f64> = view
        .value_counts("player_id")
        .into_values()
        .map(|n| n as f64)
        .collect();
    if let (Some(std), Some(mean)) = (dataset::std_dev(&touches), dataset::mean(&touches)) {
        let cv = std / mean;
        m.insert("touch_distribution_balance", 1.0 / (1.0 + cv));
    }
    m
}
