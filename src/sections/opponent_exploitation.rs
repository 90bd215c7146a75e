//! Opponent Exploitation - vulnerabilities, productive patterns, adjustments

use super::common::{max_entry, success_share};
use super::{Section, SectionError};
use crate::config::defaults::{
    AGGRESSIVE_PRESS_RATE, DEFENSIVE_BLOCKS, EFFECTIVE_RETENTION_VS_BLOCK, HIGH_LINE_METRES,
    LOW_LINE_METRES, PASSIVE_PRESS_RATE, SIGNIFICANT_PATTERN_SHARE, WIDE_SUCCESS_RATE,
};
use crate::dataset::{Table, View};
use crate::types::{MetricMap, SectionMetrics};
use std::collections::BTreeMap;

pub struct OpponentExploitation;

impl Section for OpponentExploitation {
    fn id(&self) -> &str {
        "opponent_exploitation"
    }

    fn name(&self) -> &str {
        "Opponent Exploitation"
    }

    fn icon(&self) -> &str {
        "🎲"
    }

    fn compute(
        &self,
        events: &Table,
        _phases: Option<&Table>,
    ) -> Result<SectionMetrics, SectionError> {
        let view = events.view();

        let mut vulnerabilities = MetricMap::new();
        vulnerabilities.insert("vulnerabilities", find_vulnerabilities(&view));
        let mut patterns = MetricMap::new();
        patterns.insert("patterns", successful_patterns(&view));

        Ok(SectionMetrics::new("Opponent Exploitation")
            .with_group("vulnerabilities", vulnerabilities)
            .with_group("successful_patterns", patterns)
            .with_group("tactical_adjustments", tactical_adjustments(&view)))
    }
}

fn entry(fields: [(&str, &str); 2], (metric, value): (&str, f64)) -> MetricMap {
    let mut m = MetricMap::new();
    for (k, v) in fields {
        m.insert(k, v);
    }
    m.insert(metric, value);
    m
}

fn find_vulnerabilities(view: &View<'_>) -> Vec<MetricMap> {
    let mut found = Vec::new();

    if view.has_all(&["channel_start", "lead_to_shot"]) {
        let rates: BTreeMap<String, f64> = view
            .group_by("channel_start")
            .into_iter()
            .filter_map(|(channel, rows)| rows.flag_mean("lead_to_shot").map(|r| (channel, r)))
            .collect();
        if let Some((channel, rate)) = max_entry(&rates).filter(|(_, rate)| *rate > 0.0) {
            found.push(entry(
                [
                    ("area", &format!("Vulnerable Channel: {}", channel)),
                    (
                        "recommendation",
                        &format!("Target {} channel with increased frequency", channel),
                    ),
                ],
                ("success_rate", rate),
            ));
        }
    }

    if view.has_all(&["team_out_of_possession_phase_type", "team_possession_loss_in_phase"]) {
        for block in DEFENSIVE_BLOCKS {
            let rows = view.where_eq("team_out_of_possession_phase_type", block);
            let Some(loss) = rows.flag_mean("team_possession_loss_in_phase") else {
                continue;
            };
            let retention = 1.0 - loss;
            if retention > EFFECTIVE_RETENTION_VS_BLOCK {
                found.push(entry(
                    [
                        ("area", &format!("Effective vs {}", block)),
                        (
                            "recommendation",
                            &format!("Continue exploiting opponent {} with current tactics", block),
                        ),
                    ],
                    ("success_rate", retention),
                ));
            }
        }
    }

    found
}

fn successful_patterns(view: &View<'_>) -> Vec<MetricMap> {
    let mut found = Vec::new();
    let shots = view.where_set("lead_to_shot");
    if shots.is_empty() {
        return found;
    }

    if shots.has("team_in_possession_phase_type") {
        for (phase, share) in shots.value_shares("team_in_possession_phase_type") {
            if share > SIGNIFICANT_PATTERN_SHARE {
                found.push(entry(
                    [
                        ("pattern", &format!("Success through {}", phase)),
                        ("recommendation", &format!("Emphasize {} phase in attack", phase)),
                    ],
                    ("frequency", share),
                ));
            }
        }
    }

    if shots.has("pass_range") {
        let shares = shots.value_shares("pass_range");
        if let Some((range, share)) = max_entry(&shares) {
            found.push(entry(
                [
                    ("pattern", &format!("Shots via {} passes", range)),
                    (
                        "recommendation",
                        &format!("Continue using {} passes to create chances", range),
                    ),
                ],
                ("frequency", share),
            ));
        }
    }

    found
}

fn adjustment(name: &str, reason: String, tactic: &str) -> MetricMap {
    let mut m = MetricMap::new();
    m.insert("adjustment", name);
    m.insert("reason", reason);
    m.insert("tactic", tactic);
    m
}

fn tactical_adjustments(view: &View<'_>) -> Vec<MetricMap> {
    let mut found = Vec::new();

    if let Some(height) = view.mean("last_defensive_line_height_start") {
        if height > HIGH_LINE_METRES {
            found.push(adjustment(
                "Exploit High Defensive Line",
                format!("Opponent average defensive line at {:.1}m", height),
                "Increase through balls and runs in behind",
            ));
        } else if height < LOW_LINE_METRES {
            found.push(adjustment(
                "Break Down Low Block",
                format!("Opponent sits deep at {:.1}m", height),
                "Use width and patient build-up to create openings",
            ));
        }
    }

    if view.has("pressing_chain") {
        let rate = view.set_share("pressing_chain").unwrap_or(0.0);
        if rate > AGGRESSIVE_PRESS_RATE {
            found.push(adjustment(
                "Counter Aggressive Press",
                format!("Opponent pressing {:.1}% of possessions", rate * 100.0),
                "Quick one-touch passing and long balls to bypass press",
            ));
        } else if rate < PASSIVE_PRESS_RATE {
            found.push(adjustment(
                "Exploit Passive Defense",
                format!("Opponent rarely presses ({:.1}%)", rate * 100.0),
                "Build patiently and create overloads in advanced areas",
            ));
        }
    }

    if view.has("channel_start") {
        let wide = view.filter(|r| matches!(r.str("channel_start"), Some("wide_left" | "wide_right")));
        if let Some(success) = success_share(&wide) {
            if success > WIDE_SUCCESS_RATE {
                found.push(adjustment(
                    "Increase Width",
                    format!("{:.1}% success rate in wide areas", success * 100.0),
                    "Utilize wingers and fullbacks more frequently",
                ));
            }
        }
    }

    found
}
