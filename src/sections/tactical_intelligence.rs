//! Tactical Intelligence - line breaking, decision quality, spatial awareness

use super::common::success_share;
use super::{Section, SectionError};
use crate::dataset::{Table, View};
use crate::types::{MetricMap, SectionMetrics};

pub struct TacticalIntelligence;

impl Section for TacticalIntelligence {
    fn id(&self) -> &str {
        "tactical_intelligence"
    }

    fn name(&self) -> &str {
        "Tactical Intelligence"
    }

    fn icon(&self) -> &str {
        "🧠"
    }

    fn compute(
        &self,
        events: &Table,
        _phases: Option<&Table>,
    ) -> Result<SectionMetrics, SectionError> {
        let view = events.view();
        Ok(SectionMetrics::new("Tactical Intelligence")
            .with_group("line_breaking", line_breaking(&view))
            .with_group("decision_quality", decision_quality(&view))
            .with_group("spatial_awareness", spatial_awareness(&view)))
    }
}

fn line_breaking(view: &View<'_>) -> MetricMap {
    let mut m = MetricMap::new();
    if !view.has_all(&["first_line_break", "last_line_break"]) {
        return m;
    }

    let breaks = view.filter(|r| r.is_set("first_line_break") || r.is_set("last_line_break"));
    if breaks.is_empty() {
        return m;
    }

    m.insert("total_line_breaks", breaks.len());
    m.insert("first_line_breaks", breaks.set_count("first_line_break"));
    m.insert("last_line_breaks", breaks.set_count("last_line_break"));
    if breaks.has("furthest_line_break_type") {
        m.insert("line_break_methods", breaks.value_shares("furthest_line_break_type"));
    }
    if breaks.has("player_position") {
        m.insert("line_breaks_by_position", breaks.value_counts("player_position"));
    }
    m
}

fn decision_quality(view: &View<'_>) -> MetricMap {
    let mut m = MetricMap::new();
    let possessions = view.where_eq("event_type", "player_possession");
    if possessions.is_empty() {
        return m;
    }

    if possessions.has_all(&[
        "n_passing_options_dangerous_not_difficult",
        "player_targeted_dangerous",
    ]) {
        let available = possessions.filter(|r| {
            r.f64("n_passing_options_dangerous_not_difficult")
                .is_some_and(|n| n > 0.0)
        });
        m.insert_opt(
            "dangerous_option_chosen_rate",
            available.set_share("player_targeted_dangerous"),
        );
    }

    if possessions.has_all(&["n_passing_options_ahead", "pass_ahead"]) {
        let available =
            possessions.filter(|r| r.f64("n_passing_options_ahead").is_some_and(|n| n > 0.0));
        m.insert_opt("progressive_option_chosen_rate", available.set_share("pass_ahead"));
    }

    m.insert_opt("decision_success_rate", success_share(&possessions));
    m
}

fn spatial_awareness(view: &View<'_>) -> MetricMap {
    let mut m = MetricMap::new();

    m.insert_opt(
        "avg_positioning_vs_defensive_line",
        view.mean("delta_to_last_defensive_line_start"),
    );

    if view.has("event_subtype") {
        let runs_behind = view.where_eq("event_subtype", "behind");
        m.insert("total_runs_behind", runs_behind.len());
        if runs_behind.has("targeted") {
            m.insert_opt("runs_behind_targeted_rate", runs_behind.set_share("targeted"));
        }
    }
    m
}
