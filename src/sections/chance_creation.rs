//! Chance Creation - final-third entries, shot creation, passing decisions

use super::{Section, SectionError};
use crate::dataset::{Table, View};
use crate::types::{MetricMap, SectionMetrics};

const ATTACKING_THIRD: &str = "attacking_third";

pub struct ChanceCreation;

impl Section for ChanceCreation {
    fn id(&self) -> &str {
        "chance_creation"
    }

    fn name(&self) -> &str {
        "Chance Creation"
    }

    fn icon(&self) -> &str {
        "⚡"
    }

    fn compute(
        &self,
        events: &Table,
        _phases: Option<&Table>,
    ) -> Result<SectionMetrics, SectionError> {
        let view = events.view();
        Ok(SectionMetrics::new("Chance Creation")
            .with_group("final_third_entry", final_third_entry(&view))
            .with_group("shot_creation", shot_creation(&view))
            .with_group("passing_decisions", passing_decisions(&view)))
    }
}

fn final_third_entry(view: &View<'_>) -> MetricMap {
    let mut m = MetricMap::new();
    if !view.has_all(&["third_start", "third_end"]) {
        return m;
    }

    let entries = view.filter(|r| {
        r.str("third_start") != Some(ATTACKING_THIRD) && r.str("third_end") == Some(ATTACKING_THIRD)
    });
    if entries.is_empty() {
        return m;
    }

    m.insert("total_final_third_entries", entries.len());
    if entries.has("event_type") {
        m.insert("pass_entries", entries.where_eq("event_type", "pass").len());
        m.insert("carry_entries", entries.where_eq("event_type", "carry").len());
    }
    if entries.has("channel_end") {
        m.insert("entry_channels", entries.value_shares("channel_end"));
    }
    if entries.has("lead_to_shot") {
        m.insert_opt("entry_to_shot_rate", entries.flag_mean("lead_to_shot"));
    }
    m
}

fn shot_creation(view: &View<'_>) -> MetricMap {
    let mut m = MetricMap::new();
    let shots = view.where_set("lead_to_shot");
    if shots.is_empty() {
        return m;
    }

    m.insert("total_shots", shots.len());
    if shots.has("penalty_area_start") {
        m.insert("shots_from_penalty_area", shots.set_count("penalty_area_start"));
    }
    if shots.has("xthreat") {
        m.insert_opt("avg_xthreat_shot", shots.mean("xthreat"));
        m.insert("total_xthreat", shots.sum("xthreat"));
    }
    if shots.has("dangerous") {
        m.insert("dangerous_situations", shots.set_count("dangerous"));
        m.insert_opt("dangerous_rate", shots.flag_mean("dangerous"));
    }
    m
}

fn passing_decisions(view: &View<'_>) -> MetricMap {
    let mut m = MetricMap::new();
    let possessions = view.where_eq("event_type", "player_possession");
    if possessions.is_empty() {
        return m;
    }

    m.insert_opt("avg_passing_options", possessions.mean("n_passing_options"));

    if possessions.has("n_passing_options_dangerous_not_difficult") {
        let available = possessions.filter(|r| {
            r.f64("n_passing_options_dangerous_not_difficult")
                .is_some_and(|n| n > 0.0)
        });
        if !available.is_empty() {
            let chosen = available.set_count("player_targeted_dangerous");
            m.insert(
                "dangerous_option_utilization",
                chosen as f64 / available.len() as f64,
            );
        }
    }

    m.insert_opt("avg_line_break_options", possessions.mean("n_passing_options_line_break"));
    m
}
