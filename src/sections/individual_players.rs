//! Individual Players - per-player output and leaderboards

use super::common::{is_pass, player_identity, success_share, top_by};
use super::{Section, SectionError};
use crate::config::defaults::LEADERBOARD_SIZE;
use crate::dataset::{Table, View};
use crate::types::{MetricMap, MetricValue, SectionMetrics};

/// Needs `player_id`; every other column is optional.
pub struct IndividualPlayers {
    /// Passes a player needs before entering the accuracy leaderboard
    pub accurate_passer_min_passes: usize,
}

impl Section for IndividualPlayers {
    fn id(&self) -> &str {
        "individual_players"
    }

    fn name(&self) -> &str {
        "Individual Players"
    }

    fn icon(&self) -> &str {
        "👤"
    }

    fn compute(
        &self,
        events: &Table,
        _phases: Option<&Table>,
    ) -> Result<SectionMetrics, SectionError> {
        if !events.has("player_id") {
            return Err(SectionError::MissingColumn("player_id".to_string()));
        }

        let players = player_performance(&events.view());
        let key = self.key_players(&players);

        Ok(SectionMetrics::new("Individual Players")
            .with_group("all_players", players)
            .with_group("key_players", key))
    }
}

fn player_performance(view: &View<'_>) -> Vec<MetricMap> {
    view.group_by("player_id")
        .iter()
        .map(|(player_id, actions)| {
            let mut stats = player_identity(player_id, actions);
            stats.insert("total_actions", actions.len());

            if actions.has("pass_outcome") {
                let passes = actions.filter(is_pass);
                if !passes.is_empty() {
                    stats.insert("total_passes", passes.len());
                    stats.insert_opt("pass_completion_rate", success_share(&passes));
                }
            }
            if actions.has("pass_ahead") {
                stats.insert("progressive_passes", actions.set_count("pass_ahead"));
            }
            if actions.has("carry") {
                stats.insert("progressive_carries", actions.set_count("carry"));
            }
            if actions.has_all(&["first_line_break", "last_line_break"]) {
                stats.insert(
                    "line_breaks",
                    actions.count(|r| r.is_set("first_line_break") || r.is_set("last_line_break")),
                );
            }
            if actions.has("xthreat") {
                stats.insert("total_xthreat", actions.sum("xthreat"));
                stats.insert_opt("avg_xthreat_per_action", actions.mean("xthreat"));
            }
            if actions.has("lead_to_shot") {
                stats.insert("shot_assists", actions.set_count("lead_to_shot"));
            }
            if actions.has("pressing_chain") {
                stats.insert("pressing_actions", actions.set_count("pressing_chain"));
            }
            stats
        })
        .collect()
}

/// Keep only the player name and the ranked metric.
fn leaderboard(rows: &[MetricMap], metric: &str) -> Vec<MetricMap> {
    top_by(rows, metric, LEADERBOARD_SIZE)
        .into_iter()
        .map(|row| {
            let mut entry = MetricMap::new();
            if let Some(name) = row.get("player_name") {
                entry.insert("player_name", name.clone());
            }
            if let Some(value) = row.get(metric) {
                entry.insert(metric, value.clone());
            }
            entry
        })
        .collect()
}

impl IndividualPlayers {
    fn key_players(&self, players: &[MetricMap]) -> MetricMap {
        let mut key = MetricMap::new();
        if players.is_empty() {
            return key;
        }

        let ranked_on = |metric: &str| players.iter().any(|p| p.contains_key(metric));

        if ranked_on("total_xthreat") {
            key.insert("top_threat_creators", leaderboard(players, "total_xthreat"));
        }
        if ranked_on("progressive_passes") {
            key.insert(
                "top_progressive_players",
                leaderboard(players, "progressive_passes"),
            );
        }
        if ranked_on("pass_completion_rate") {
            let min_passes = i64::try_from(self.accurate_passer_min_passes).unwrap_or(i64::MAX);
            let qualified: Vec<MetricMap> = players
                .iter()
                .filter(|p| {
                    p.get("total_passes")
                        .and_then(MetricValue::as_i64)
                        .is_some_and(|n| n >= min_passes)
                })
                .cloned()
                .collect();
            if !qualified.is_empty() {
                key.insert(
                    "most_accurate_passers",
                    leaderboard(&qualified, "pass_completion_rate"),
                );
            }
        }
        key
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Record;
    use crate::sections::fixtures;

    fn section() -> IndividualPlayers {
        IndividualPlayers {
            accurate_passer_min_passes: 20,
        }
    }

    #[test]
    fn test_missing_player_id_is_an_error() {
        let events = fixtures::without(&fixtures::events(20), "player_id");
        let err = section().compute(&events, None).unwrap_err();
        assert!(matches!(err, SectionError::MissingColumn(ref c) if c == "player_id"));
    }

    #[test]
    fn test_all_players_and_leaderboards() {
        let metrics = section()
            .compute(&fixtures::events(100), None)
            .expect("compute");
        let players = metrics
            .metrics
            .get("all_players")
            .and_then(MetricValue::as_list)
            .expect("players");
        assert_eq!(players.len(), 4);

        let key = metrics.group("key_players").expect("key players");
        let threat = key
            .get("top_threat_creators")
            .and_then(MetricValue::as_list)
            .expect("threat");
        assert_eq!(threat.len(), 4);
        let first = threat[0].as_map().expect("entry");
        assert_eq!(first.len(), 2);
        assert!(first.contains_key("total_xthreat"));

        // 25 passes each, so everyone qualifies
        assert!(key.contains_key("most_accurate_passers"));
    }

    #[test]
    fn test_accuracy_leaderboard_needs_minimum_passes() {
        let events = Table::from_records(
            (0..10)
                .map(|i| {
                    Record::new()
                        .with("player_id", i % 2)
                        .with("pass_outcome", "successful")
                })
                .collect(),
        );
        let metrics = section().compute(&events, None).expect("compute");
        let key = metrics.group("key_players").expect("key players");
        assert!(!key.contains_key("most_accurate_passers"));

        let lenient = IndividualPlayers {
            accurate_passer_min_passes: 5,
        };
        let metrics = lenient.compute(&events, None).expect("compute");
        let key = metrics.group("key_players").expect("key players");
        assert!(key.contains_key("most_accurate_passers"));
    }
}
