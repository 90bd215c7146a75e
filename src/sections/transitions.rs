//! Transitions - counter attacks, transition speed, reaction to possession loss

use super::{Section, SectionError};
use crate::dataset::{Table, View};
use crate::types::{MetricMap, SectionMetrics};

pub struct Transitions;

impl Section for Transitions {
    fn id(&self) -> &str {
        "transitions"
    }

    fn name(&self) -> &str {
        "Transitions"
    }

    fn icon(&self) -> &str {
        "🔄"
    }

    fn compute(
        &self,
        events: &Table,
        _phases: Option<&Table>,
    ) -> Result<SectionMetrics, SectionError> {
        let view = events.view();
        Ok(SectionMetrics::new("Transitions")
            .with_group("counter_attacks", counter_attacks(&view))
            .with_group("transition_speed", transition_speed(&view))
            .with_group("defensive_transitions", defensive_transitions(&view)))
    }
}

/// Direct play straight after winning the ball.
fn counter_attacks(view: &View<'_>) -> MetricMap {
    let mut m = MetricMap::new();
    if !view.has_all(&[
        "current_team_in_possession_previous_phase_type",
        "team_in_possession_phase_type",
    ]) {
        return m;
    }

    let counters = view.filter(|r| {
        matches!(
            r.str("current_team_in_possession_previous_phase_type"),
            Some("regain" | "turnover")
        ) && r.str("team_in_possession_phase_type") == Some("direct")
    });
    if counters.is_empty() {
        return m;
    }

    let total = if counters.has("phase_index") {
        counters.nunique("phase_index")
    } else {
        counters.len()
    };
    m.insert("total_counter_attacks", total);
    m.insert_opt("avg_counter_duration", counters.mean("duration"));
    if counters.has("lead_to_shot") {
        m.insert_opt("counter_to_shot_rate", counters.flag_mean("lead_to_shot"));
    }
    if counters.has("lead_to_goal") {
        m.insert_opt("counter_to_goal_rate", counters.flag_mean("lead_to_goal"));
    }
    if counters.has("distance_covered") && total > 0 {
        m.insert(
            "avg_counter_distance",
            counters.sum("distance_covered") / total as f64,
        );
    }
    m
}

fn transition_speed(view: &View<'_>) -> MetricMap {
    let mut m = MetricMap::new();
    let transitions = view.where_set("lead_to_different_phase");
    if transitions.is_empty() {
        return m;
    }

    m.insert("total_transitions", transitions.len());
    m.insert_opt("avg_transition_duration", transitions.mean("duration"));
    if transitions.has("forward_momentum") {
        m.insert_opt("forward_momentum_rate", transitions.set_share("forward_momentum"));
    }
    if transitions.has("speed_avg_band") {
        m.insert(
            "transition_speed_distribution",
            transitions.value_shares("speed_avg_band"),
        );
    }
    m
}

fn defensive_transitions(view: &View<'_>) -> MetricMap {
    let mut m = MetricMap::new();
    let losses = view.where_set("team_possession_loss_in_phase");
    if losses.is_empty() {
        return m;
    }

    m.insert("total_defensive_transitions", losses.len());

    // Phases with a loss that also contain a pressing action
    if view.has_all(&["pressing_chain", "phase_index"]) {
        let phases = view.group_by("phase_index");
        let with_loss: Vec<&View<'_>> = phases
            .values()
            .filter(|phase| phase.set_count("team_possession_loss_in_phase") > 0)
            .collect();
        if !with_loss.is_empty() {
            let pressed = with_loss
                .iter()
                .filter(|phase| phase.set_count("pressing_chain") > 0)
                .count();
            m.insert(
                "immediate_press_rate",
                pressed as f64 / with_loss.len() as f64,
            );
        }
    }
    m
}
