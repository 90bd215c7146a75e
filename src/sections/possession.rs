//! Possession & Build-Up - progression method, build-up roles, pressure resistance

use super::common::{player_identity, success_share};
use super::{Section, SectionError};
use crate::config::defaults::HIGH_PRESSURE_XLOSS;
use crate::dataset::{Record, Table, View};
use crate::types::{MetricMap, SectionMetrics};

pub struct Possession;

impl Section for Possession {
    fn id(&self) -> &str {
        "possession"
    }

    fn name(&self) -> &str {
        "Possession & Build-Up"
    }

    fn icon(&self) -> &str {
        "⚙️"
    }

    fn compute(
        &self,
        events: &Table,
        _phases: Option<&Table>,
    ) -> Result<SectionMetrics, SectionError> {
        let view = events.view();
        let buildup = view.where_eq("team_in_possession_phase_type", "build_up");

        Ok(SectionMetrics::new("Possession & Build-Up Play")
            .with_group("buildup", buildup_patterns(&buildup))
            .with_group("player_roles", buildup_roles(&buildup))
            .with_group("pressure_resistance", pressure_resistance(&view)))
    }
}

fn buildup_patterns(buildup: &View<'_>) -> MetricMap {
    let mut m = MetricMap::new();
    if buildup.is_empty() {
        return m;
    }

    if buildup.has("pass_range") {
        m.insert_opt("short_pass_buildup_rate", buildup.eq_share("pass_range", "short"));
        m.insert_opt("long_ball_rate", buildup.eq_share("pass_range", "long"));
    }
    if buildup.has("current_team_in_possession_next_phase_type") {
        m.insert_opt(
            "bypass_to_direct_phase",
            buildup.eq_share("current_team_in_possession_next_phase_type", "direct"),
        );
    }
    m.insert_opt("avg_buildup_duration", buildup.mean("duration"));

    if buildup.has("carry") {
        m.insert_opt("carry_progression_rate", buildup.set_share("carry"));
        m.insert_opt(
            "carry_distance_avg",
            buildup.where_set("carry").mean("distance_covered"),
        );
    }
    if buildup.has("team_possession_loss_in_phase") {
        m.insert_opt(
            "buildup_success_rate",
            buildup.flag_mean("team_possession_loss_in_phase").map(|loss| 1.0 - loss),
        );
    }
    if buildup.has("lead_to_shot") {
        m.insert_opt("buildup_to_shot_rate", buildup.flag_mean("lead_to_shot"));
    }
    if buildup.has("phase_index") {
        m.insert("total_buildup_phases", buildup.nunique("phase_index"));
    }
    if buildup.has("channel_start") {
        m.insert("buildup_channel_usage", buildup.value_shares("channel_start"));
    }

    m
}

fn buildup_roles(buildup: &View<'_>) -> Vec<MetricMap> {
    let phase_count = buildup.nunique("phase_index");

    buildup
        .group_by("player_id")
        .iter()
        .map(|(player_id, actions)| {
            let mut row = player_identity(player_id, actions);
            row.insert("buildup_involvements", actions.len());
            row.insert(
                "buildup_involvements_per_phase",
                if phase_count > 0 {
                    actions.len() as f64 / phase_count as f64
                } else {
                    0.0
                },
            );
            if actions.has("pass_ahead") {
                row.insert("progressive_passes", actions.set_count("pass_ahead"));
            }
            if actions.has("carry") {
                row.insert("progressive_carries", actions.set_count("carry"));
            }
            row.insert_opt("pass_success_rate", success_share(actions));
            row
        })
        .collect()
}

/// Possession-loss probability above the threshold, or facing a high block.
pub(crate) fn under_high_pressure(r: &Record) -> bool {
    r.f64("xloss_player_possession_start")
        .is_some_and(|x| x > HIGH_PRESSURE_XLOSS)
        || r.str("team_out_of_possession_phase_type") == Some("high_block")
}

fn under_normal_pressure(r: &Record) -> bool {
    r.f64("xloss_player_possession_start")
        .is_some_and(|x| x <= HIGH_PRESSURE_XLOSS)
        && r.str("team_out_of_possession_phase_type") != Some("high_block")
}

fn pressure_resistance(view: &View<'_>) -> MetricMap {
    let mut m = MetricMap::new();
    if !view.has_all(&["xloss_player_possession_start", "team_out_of_possession_phase_type"]) {
        return m;
    }

    let high = view.filter(under_high_pressure);
    let normal = view.filter(under_normal_pressure);
    if high.is_empty() || normal.is_empty() {
        return m;
    }

    if let (Some(h), Some(n)) = (success_share(&high), success_share(&normal)) {
        m.insert("pass_success_high_pressure", h);
        m.insert("pass_success_normal_pressure", n);
        m.insert("pressure_impact", n - h);
    }
    if view.has("pass_range") {
        m.insert_opt("long_ball_under_pressure_rate", high.eq_share("pass_range", "long"));
        m.insert_opt("long_ball_normal_rate", normal.eq_share("pass_range", "long"));
    }
    if view.has("team_possession_loss_in_phase") {
        m.insert_opt("turnover_under_pressure", high.flag_mean("team_possession_loss_in_phase"));
        m.insert_opt("turnover_normal", normal.flag_mean("team_possession_loss_in_phase"));
    }

    m
}
