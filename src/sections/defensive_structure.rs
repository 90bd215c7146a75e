//! Defensive Structure - pressing chains, line height, engagements

use super::{Section, SectionError};
use crate::config::defaults::DEFENSIVE_BLOCKS;
use crate::dataset::{Table, View};
use crate::types::{MetricMap, SectionMetrics};

const DEFENSIVE_EVENTS: [&str; 3] = ["defensive_engagement", "tackle", "interception"];

pub struct DefensiveStructure;

impl Section for DefensiveStructure {
    fn id(&self) -> &str {
        "defensive_structure"
    }

    fn name(&self) -> &str {
        "Defensive Structure"
    }

    fn icon(&self) -> &str {
        "🛡️"
    }

    fn compute(
        &self,
        events: &Table,
        _phases: Option<&Table>,
    ) -> Result<SectionMetrics, SectionError> {
        let view = events.view();
        Ok(SectionMetrics::new("Defensive Structure")
            .with_group("pressing", pressing(&view))
            .with_group("defensive_line", defensive_line(&view))
            .with_group("engagements", engagements(&view)))
    }
}

fn pressing(view: &View<'_>) -> MetricMap {
    let mut m = MetricMap::new();
    let pressing = view.where_set("pressing_chain");
    if pressing.is_empty() {
        return m;
    }

    m.insert("total_pressing_actions", pressing.len());
    if pressing.has("pressing_chain_index") {
        m.insert("total_chains", pressing.nunique("pressing_chain_index"));
    }
    m.insert_opt("avg_chain_length", pressing.mean("pressing_chain_length"));
    if pressing.has("pressing_chain_end_type") {
        m.insert_opt("regain_rate", pressing.eq_share("pressing_chain_end_type", "regain"));
        m.insert_opt(
            "disruption_rate",
            pressing.eq_share("pressing_chain_end_type", "disruption"),
        );
    }
    if pressing.has("stop_possession_danger") {
        m.insert_opt("danger_stopped_rate", pressing.flag_mean("stop_possession_danger"));
    }
    m
}

fn defensive_line(view: &View<'_>) -> MetricMap {
    let mut m = MetricMap::new();

    m.insert_opt("avg_defensive_line_height", view.mean("last_defensive_line_x_start"));
    m.insert_opt("defensive_line_std", view.std("last_defensive_line_x_start"));
    m.insert_opt("avg_line_height", view.mean("last_defensive_line_height_start"));

    if view.has("team_out_of_possession_phase_type") {
        for block in DEFENSIVE_BLOCKS {
            m.insert_opt(
                format!("defensive_line_height_{}", block),
                view.where_eq("team_out_of_possession_phase_type", block)
                    .mean("last_defensive_line_x_start"),
            );
        }
    }
    m
}

fn engagements(view: &View<'_>) -> MetricMap {
    let mut m = MetricMap::new();
    let defensive = view.filter(|r| {
        r.str("event_type")
            .is_some_and(|t| DEFENSIVE_EVENTS.contains(&t))
    });
    if defensive.is_empty() {
        return m;
    }

    m.insert("total_defensive_actions", defensive.len());
    if defensive.has("end_type") {
        m.insert_opt("defensive_success_rate", defensive.eq_share("end_type", "successful"));
    }
    if defensive.has("third_start") {
        m.insert("defensive_actions_by_third", defensive.value_shares("third_start"));
    }
    m
}
