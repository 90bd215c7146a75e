//! Training Focus - weaknesses, strengths and ranked training priorities

use super::common::success_share;
use super::{Section, SectionError};
use crate::config::defaults::{
    HIGH_PRESSURE_XLOSS, LOW_DANGEROUS_OPTION_UTILISATION, STRONG_BUILDUP_RETENTION,
    STRONG_LINE_BREAK_RATE, STRUGGLING_PLAYER_PASS_ACCURACY, WEAK_FINAL_THIRD_SHOT_RATE,
    WEAK_PASS_ACCURACY, WEAK_PRESSURE_PASS_ACCURACY, WEAK_TURNOVER_RATE,
};
use crate::dataset::{Table, View};
use crate::types::{MetricMap, SectionMetrics};

pub struct TrainingFocus;

impl Section for TrainingFocus {
    fn id(&self) -> &str {
        "training_focus"
    }

    fn name(&self) -> &str {
        "Training Focus"
    }

    fn icon(&self) -> &str {
        "💪"
    }

    fn compute(
        &self,
        events: &Table,
        _phases: Option<&Table>,
    ) -> Result<SectionMetrics, SectionError> {
        let view = events.view();
        let weaknesses = weaknesses(&view);

        let mut weakness_group = MetricMap::new();
        weakness_group.insert(
            "weaknesses",
            weaknesses.iter().map(Finding::to_metrics).collect::<Vec<_>>(),
        );
        let mut strength_group = MetricMap::new();
        strength_group.insert(
            "strengths",
            strengths(&view).iter().map(Finding::to_metrics).collect::<Vec<_>>(),
        );

        Ok(SectionMetrics::new("Training Focus")
            .with_group("weaknesses", weakness_group)
            .with_group("strengths", strength_group)
            .with_group("priorities", priorities(&view, &weaknesses)))
    }
}

/// One area flagged for training.
#[derive(Debug, Clone)]
struct Finding {
    area: &'static str,
    value: f64,
    recommendation: &'static str,
}

impl Finding {
    fn to_metrics(&self) -> MetricMap {
        let mut m = MetricMap::new();
        m.insert("area", self.area);
        m.insert("value", self.value);
        m.insert("recommendation", self.recommendation);
        m
    }
}

fn weaknesses(view: &View<'_>) -> Vec<Finding> {
    let mut found = Vec::new();

    if let Some(accuracy) = success_share(view) {
        if accuracy < WEAK_PASS_ACCURACY {
            found.push(Finding {
                area: "Passing Accuracy",
                value: accuracy,
                recommendation: "Focus on passing drills and ball retention exercises",
            });
        }
    }

    if view.has_all(&["xloss_player_possession_start", "pass_outcome"]) {
        let pressured = view.filter(|r| {
            r.f64("xloss_player_possession_start")
                .is_some_and(|x| x > HIGH_PRESSURE_XLOSS)
        });
        if let Some(success) = success_share(&pressured) {
            if success < WEAK_PRESSURE_PASS_ACCURACY {
                found.push(Finding {
                    area: "Pressure Resistance",
                    value: success,
                    recommendation: "Implement high-pressure situational training",
                });
            }
        }
    }

    if view.has_all(&["third_start", "lead_to_shot"]) {
        let final_third = view.where_eq("third_start", "attacking_third");
        if let Some(rate) = final_third.flag_mean("lead_to_shot") {
            if rate < WEAK_FINAL_THIRD_SHOT_RATE {
                found.push(Finding {
                    area: "Final Third Efficiency",
                    value: rate,
                    recommendation: "Work on finishing and final third decision-making",
                });
            }
        }
    }

    if let Some(turnover) = view.flag_mean("team_possession_loss_in_phase") {
        if turnover > WEAK_TURNOVER_RATE {
            found.push(Finding {
                area: "Ball Retention",
                value: 1.0 - turnover,
                recommendation: "Practice ball retention and defensive transition drills",
            });
        }
    }

    found
}

fn strengths(view: &View<'_>) -> Vec<Finding> {
    let mut found = Vec::new();

    if view.has_all(&["first_line_break", "last_line_break"]) && !view.is_empty() {
        let breaks = view.count(|r| r.is_set("first_line_break") || r.is_set("last_line_break"));
        let rate = breaks as f64 / view.len() as f64;
        if rate > STRONG_LINE_BREAK_RATE {
            found.push(Finding {
                area: "Line-Breaking",
                value: rate,
                recommendation: "Continue developing progressive passing patterns",
            });
        }
    }

    let buildup = view.where_eq("team_in_possession_phase_type", "build_up");
    if let Some(loss) = buildup.flag_mean("team_possession_loss_in_phase") {
        let retention = 1.0 - loss;
        if retention > STRONG_BUILDUP_RETENTION {
            found.push(Finding {
                area: "Build-Up Play",
                value: retention,
                recommendation: "Maintain build-up patterns in training sessions",
            });
        }
    }

    found
}

fn priority(rank: usize, focus: &str, reason: String, action: &str) -> MetricMap {
    let mut m = MetricMap::new();
    m.insert("priority", rank);
    m.insert("focus", focus);
    m.insert("reason", reason);
    m.insert("action", action);
    m
}

fn priorities(view: &View<'_>, weaknesses: &[Finding]) -> Vec<MetricMap> {
    let mut ranked = Vec::new();

    // Lowest value is the most severe; ties keep detection order
    let mut sorted = weaknesses.to_vec();
    sorted.sort_by(|a, b| a.value.total_cmp(&b.value));
    if let Some(worst) = sorted.first() {
        ranked.push(priority(
            1,
            worst.area,
            format!("Current level: {:.2}%", worst.value * 100.0),
            worst.recommendation,
        ));
    }

    if view.has_all(&["player_id", "pass_outcome"]) {
        let struggling = view
            .group_by("player_id")
            .values()
            .filter_map(success_share)
            .filter(|accuracy| *accuracy < STRUGGLING_PLAYER_PASS_ACCURACY)
            .count();
        if struggling > 0 {
            ranked.push(priority(
                2,
                "Individual Player Development",
                format!(
                    "{} players below {:.0}% pass accuracy",
                    struggling,
                    STRUGGLING_PLAYER_PASS_ACCURACY * 100.0
                ),
                "Implement individual technical training programs",
            ));
        }
    }

    if view.has_all(&[
        "n_passing_options_dangerous_not_difficult",
        "player_targeted_dangerous",
    ]) {
        let available = view.filter(|r| {
            r.f64("n_passing_options_dangerous_not_difficult")
                .is_some_and(|n| n > 0.0)
        });
        if let Some(utilisation) = available.set_share("player_targeted_dangerous") {
            if utilisation < LOW_DANGEROUS_OPTION_UTILISATION {
                ranked.push(priority(
                    3,
                    "Tactical Decision Making",
                    format!(
                        "Only {:.1}% utilization of dangerous passing options",
                        utilisation * 100.0
                    ),
                    "Focus on game intelligence and decision-making drills",
                ));
            }
        }
    }

    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Record;
    use crate::types::MetricValue;

    fn list<'a>(metrics: &'a SectionMetrics, group: &str, key: &str) -> Vec<&'a MetricMap> {
        metrics
            .group(group)
            .and_then(|g| g.get(key))
            .and_then(MetricValue::as_list)
            .map(|l| l.iter().filter_map(MetricValue::as_map).collect())
            .unwrap_or_default()
    }

    #[test]
    fn test_weak_passing_becomes_top_priority() {
        let events = Table::from_records(
            (0..10)
                .map(|i| {
                    Record::new()
                        .with("player_id", 1)
                        .with("pass_outcome", if i < 5 { "successful" } else { "unsuccessful" })
                        .with("team_possession_loss_in_phase", i < 2)
                })
                .collect(),
        );
        let metrics = TrainingFocus.compute(&events, None).expect("compute");

        let weaknesses = list(&metrics, "weaknesses", "weaknesses");
        assert_eq!(weaknesses.len(), 1);
        assert_eq!(weaknesses[0].get("area").and_then(MetricValue::as_str), Some("Passing Accuracy"));

        let priorities = metrics
            .metrics
            .get("priorities")
            .and_then(MetricValue::as_list)
            .expect("priorities");
        assert_eq!(priorities.len(), 2);
        let first = priorities[0].as_map().expect("priority");
        assert_eq!(first.get("reason").and_then(MetricValue::as_str), Some("Current level: 50.00%"));
        let second = priorities[1].as_map().expect("priority");
        assert_eq!(
            second.get("reason").and_then(MetricValue::as_str),
            Some("1 players below 70% pass accuracy")
        );
    }

    #[test]
    fn test_strong_buildup_is_a_strength() {
        let events = Table::from_records(
            (0..10)
                .map(|i| {
                    Record::new()
                        .with("team_in_possession_phase_type", "build_up")
                        .with("team_possession_loss_in_phase", i == 0)
                })
                .collect(),
        );
        let metrics = TrainingFocus.compute(&events, None).expect("compute");
        let strengths = list(&metrics, "strengths", "strengths");
        assert_eq!(strengths.len(), 1);
        assert_eq!(strengths[0].get("value").and_then(MetricValue::as_f64), Some(0.9));
    }
}
