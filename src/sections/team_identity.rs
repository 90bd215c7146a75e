//! Team Identity & Setup - shape by phase, fullback asymmetry, role clarity

use super::common::{player_identity, spatial_consistency};
use super::{Section, SectionError};
use crate::config::defaults::{CHANNEL_COUNT, IN_POSSESSION_PHASES, THIRD_COUNT};
use crate::dataset::{self, Table, View};
use crate::types::{MetricMap, SectionMetrics};

pub struct TeamIdentity;

impl Section for TeamIdentity {
    fn id(&self) -> &str {
        "team_identity"
    }

    fn name(&self) -> &str {
        "Team Identity & Setup"
    }

    fn icon(&self) -> &str {
        "🧩"
    }

    fn compute(
        &self,
        events: &Table,
        _phases: Option<&Table>,
    ) -> Result<SectionMetrics, SectionError> {
        let view = events.view();

        let mut summary = MetricMap::new();
        summary.insert("total_players", view.nunique("player_id"));
        summary.insert("total_actions", view.len());
        summary.insert("unique_positions", view.nunique("player_position"));

        Ok(SectionMetrics::new("Team Identity & Setup")
            .with_group("formation", formation(&view))
            .with_group("player_roles", player_roles(&view))
            .with_group("summary", summary))
    }
}

fn formation(view: &View<'_>) -> MetricMap {
    let mut m = MetricMap::new();

    for phase_type in IN_POSSESSION_PHASES {
        let phase = view.where_eq("team_in_possession_phase_type", phase_type);
        if phase.is_empty() {
            continue;
        }
        m.insert_opt(
            format!("team_length_avg_{}", phase_type),
            phase.mean("team_in_possession_length_start"),
        );
        m.insert_opt(
            format!("team_width_avg_{}", phase_type),
            phase.mean("team_in_possession_width_start"),
        );
    }

    // Mean within-phase spread of team length
    if view.has_all(&["phase_index", "team_in_possession_length_start"]) {
        let spreads: Vec<f64> = view
            .group_by("phase_index")
            .values()
            .filter_map(|phase| phase.std("team_in_possession_length_start"))
            .collect();
        m.insert_opt("length_change_per_phase", dataset::mean(&spreads));
    }

    if view.has_all(&["player_position", "channel_start"]) {
        let wide_rate = |position: &str, channel: &str| {
            view.where_eq("player_position", position)
                .filter(|r| r.get("channel_start").is_some())
                .eq_share("channel_start", channel)
                .unwrap_or(0.0)
        };
        let lb = wide_rate("LB", "wide_left");
        let rb = wide_rate("RB", "wide_right");
        m.insert("lb_wide_rate", lb);
        m.insert("rb_wide_rate", rb);
        m.insert("fullback_asymmetry", (lb - rb).abs());
    }

    m
}

fn player_roles(view: &View<'_>) -> Vec<MetricMap> {
    view.group_by("player_id")
        .iter()
        .map(|(player_id, actions)| {
            let mut row = player_identity(player_id, actions);
            let total = actions.len() as f64;

            for phase_type in IN_POSSESSION_PHASES {
                let rate = if actions.has("team_in_possession_phase_type") {
                    actions
                        .where_eq("team_in_possession_phase_type", phase_type)
                        .len() as f64
                        / total
                } else {
                    0.0
                };
                row.insert(format!("{}_rate", phase_type), rate);
            }

            row.insert(
                "channel_consistency",
                spatial_consistency(actions, "channel_start", CHANNEL_COUNT),
            );
            row.insert(
                "third_consistency",
                spatial_consistency(actions, "third_start", THIRD_COUNT),
            );
            row.insert("total_actions", actions.len());
            row
        })
        .collect()
}
