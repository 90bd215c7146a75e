//! Efficiency - shot conversion, possession efficiency, final-third output

use super::common::success_share;
use super::{Section, SectionError};
use crate::dataset::{Table, View};
use crate::types::{MetricMap, SectionMetrics};

pub struct Efficiency;

impl Section for Efficiency {
    fn id(&self) -> &str {
        "efficiency"
    }

    fn name(&self) -> &str {
        "Efficiency"
    }

    fn icon(&self) -> &str {
        "📊"
    }

    fn compute(
        &self,
        events: &Table,
        phases: Option<&Table>,
    ) -> Result<SectionMetrics, SectionError> {
        let view = events.view();
        let possession = match phases.filter(|p| !p.is_empty()) {
            Some(phases) => possession_from_phases(&phases.view()),
            None => possession_from_events(&view),
        };

        Ok(SectionMetrics::new("Efficiency")
            .with_group("conversion", conversion(&view))
            .with_group("possession", possession)
            .with_group("final_third", final_third(&view)))
    }
}

fn conversion(view: &View<'_>) -> MetricMap {
    let mut m = MetricMap::new();
    if !view.has("lead_to_shot") {
        return m;
    }

    let shots = view.where_set("lead_to_shot");
    m.insert("total_shots", shots.len());

    if shots.has("lead_to_goal") {
        let goals = shots.set_count("lead_to_goal");
        m.insert("total_goals", goals);
        m.insert(
            "conversion_rate",
            if shots.is_empty() {
                0.0
            } else {
                goals as f64 / shots.len() as f64
            },
        );
    }
    if shots.has("xshot_player_possession_max") {
        m.insert("total_xg", shots.sum("xshot_player_possession_max"));
        m.insert_opt("avg_xg_per_shot", shots.mean("xshot_player_possession_max"));
    }
    m
}

fn possession_from_phases(phases: &View<'_>) -> MetricMap {
    let mut m = MetricMap::new();
    m.insert("total_possessions", phases.len());
    if phases.has("team_possession_lead_to_shot") {
        m.insert_opt(
            "possession_to_shot_rate",
            phases.flag_mean("team_possession_lead_to_shot"),
        );
    }
    if phases.has("team_possession_lead_to_goal") {
        m.insert_opt(
            "possession_to_goal_rate",
            phases.flag_mean("team_possession_lead_to_goal"),
        );
    }
    m.insert_opt("avg_possession_duration", phases.mean("duration"));
    m
}

/// Phase-level figures reconstructed from `phase_index` on the events.
fn possession_from_events(view: &View<'_>) -> MetricMap {
    let mut m = MetricMap::new();
    if !view.has("phase_index") {
        return m;
    }

    let total = view.nunique("phase_index");
    m.insert("total_possessions", total);
    if view.has("lead_to_shot") {
        let with_shot = view.where_set("lead_to_shot").nunique("phase_index");
        m.insert(
            "possession_to_shot_rate",
            if total > 0 {
                with_shot as f64 / total as f64
            } else {
                0.0
            },
        );
    }
    m
}

fn final_third(view: &View<'_>) -> MetricMap {
    let mut m = MetricMap::new();
    let final_third = view.where_eq("third_start", "attacking_third");
    if final_third.is_empty() {
        return m;
    }

    m.insert("final_third_actions", final_third.len());
    if final_third.has("lead_to_shot") {
        m.insert_opt("final_third_to_shot_rate", final_third.flag_mean("lead_to_shot"));
    }
    m.insert_opt("final_third_pass_accuracy", success_share(&final_third));
    if final_third.has("team_possession_loss_in_phase") {
        m.insert_opt(
            "final_third_retention_rate",
            final_third
                .flag_mean("team_possession_loss_in_phase")
                .map(|loss| 1.0 - loss),
        );
    }
    m
}
