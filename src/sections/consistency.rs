//! Consistency - variability across time windows, phases and players

use super::common::{player_identity, success_share};
use super::momentum::{time_window, windows};
use super::{Section, SectionError};
use crate::config::defaults::IN_POSSESSION_PHASES;
use crate::dataset::{self, Table, View};
use crate::types::{MetricMap, SectionMetrics};

pub struct Consistency {
    /// Players with fewer actions are left out of the player table
    pub min_player_actions: usize,
}

impl Section for Consistency {
    fn id(&self) -> &str {
        "consistency"
    }

    fn name(&self) -> &str {
        "Consistency"
    }

    fn icon(&self) -> &str {
        "🎯"
    }

    fn compute(
        &self,
        events: &Table,
        _phases: Option<&Table>,
    ) -> Result<SectionMetrics, SectionError> {
        let view = events.view();
        Ok(SectionMetrics::new("Consistency")
            .with_group("passing", passing(events))
            .with_group("by_phase", by_phase(&view))
            .with_group("players", self.players(&view)))
    }
}

/// Spread of pass accuracy across 15-minute windows.
fn passing(events: &Table) -> MetricMap {
    let mut m = MetricMap::new();
    if !events.has_all(&["pass_outcome", "minute_start"]) {
        return m;
    }

    let windowed = events.with_column("time_window", time_window);
    let accuracies: Vec<f64> = windows(&windowed)
        .iter()
        .filter_map(|(_, rows)| success_share(rows))
        .collect();
    if accuracies.len() < 2 {
        return m;
    }

    if let (Some(std), Some(mean)) = (dataset::pop_std_dev(&accuracies), dataset::mean(&accuracies)) {
        m.insert("pass_accuracy_std", std);
        m.insert(
            "pass_accuracy_consistency",
            if mean > 0.0 { 1.0 - std / mean } else { 0.0 },
        );
    }
    m
}

fn by_phase(view: &View<'_>) -> MetricMap {
    let mut m = MetricMap::new();
    if !view.has("team_in_possession_phase_type") {
        return m;
    }

    for phase_type in IN_POSSESSION_PHASES {
        let rows = view.where_eq("team_in_possession_phase_type", phase_type);
        if rows.is_empty() {
            continue;
        }
        let mut p = MetricMap::new();
        p.insert_opt("pass_accuracy", success_share(&rows));
        if rows.has("team_possession_loss_in_phase") {
            p.insert_opt(
                "retention_rate",
                rows.flag_mean("team_possession_loss_in_phase")
                    .map(|loss| 1.0 - loss),
            );
        }
        m.insert(format!("{}_consistency", phase_type), p);
    }
    m
}

impl Consistency {
    fn players(&self, view: &View<'_>) -> Vec<MetricMap> {
        let compare_halves = view.has_all(&["pass_outcome", "minute_start", "period"]);

        view.group_by("player_id")
            .iter()
            .filter(|(_, actions)| actions.len() >= self.min_player_actions)
            .map(|(player_id, actions)| {
                let mut row = player_identity(player_id, actions);
                row.insert("total_actions", actions.len());

                if compare_halves {
                    let first = actions.filter(|r| r.i64("period") == Some(1));
                    let second = actions.filter(|r| r.i64("period") == Some(2));
                    if let (Some(a), Some(b)) = (success_share(&first), success_share(&second)) {
                        row.insert("first_half_pass_accuracy", a);
                        row.insert("second_half_pass_accuracy", b);
                        row.insert("pass_accuracy_consistency", 1.0 - (a - b).abs());
                    }
                }
                row
            })
            .collect()
    }
}
