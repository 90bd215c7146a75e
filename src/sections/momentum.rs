//! Momentum - output by period, 15-minute windows, game state

use super::common::success_share;
use super::{Section, SectionError};
use crate::config::defaults::TIME_WINDOW_MINUTES;
use crate::dataset::{Record, Table, View};
use crate::types::{MetricMap, MetricValue, SectionMetrics};
use serde_json::json;

pub struct Momentum;

impl Section for Momentum {
    fn id(&self) -> &str {
        "momentum"
    }

    fn name(&self) -> &str {
        "Momentum"
    }

    fn icon(&self) -> &str {
        "📈"
    }

    fn compute(
        &self,
        events: &Table,
        _phases: Option<&Table>,
    ) -> Result<SectionMetrics, SectionError> {
        let view = events.view();
        Ok(SectionMetrics::new("Momentum")
            .with_group("by_period", by_period(&view))
            .with_group("shifts", shifts(events))
            .with_group("by_game_state", by_game_state(&view)))
    }
}

fn by_period(view: &View<'_>) -> MetricMap {
    let mut m = MetricMap::new();
    for (period, rows) in view.group_by("period") {
        let mut p = MetricMap::new();
        p.insert("total_actions", rows.len());
        if rows.has("lead_to_shot") {
            p.insert("shots", rows.set_count("lead_to_shot"));
        }
        if rows.has("xthreat") {
            p.insert("total_xthreat", rows.sum("xthreat"));
        }
        if rows.has("team_possession_loss_in_phase") {
            p.insert_opt(
                "possession_loss_rate",
                rows.flag_mean("team_possession_loss_in_phase"),
            );
        }
        m.insert(format!("period_{}", period), p);
    }
    m
}

/// Start minute of the window containing `r`.
pub(crate) fn time_window(r: &Record) -> Option<serde_json::Value> {
    r.f64("minute_start")
        .map(|minute| json!(((minute / TIME_WINDOW_MINUTES).floor() * TIME_WINDOW_MINUTES) as i64))
}

/// Window start -> rows, in chronological order.
pub(crate) fn windows(windowed: &Table) -> Vec<(i64, View<'_>)> {
    let mut windows: Vec<(i64, View<'_>)> = windowed
        .view()
        .group_by("time_window")
        .into_iter()
        .filter_map(|(start, rows)| start.parse::<i64>().ok().map(|s| (s, rows)))
        .collect();
    windows.sort_by_key(|(start, _)| *start);
    windows
}

fn shifts(events: &Table) -> MetricMap {
    let mut m = MetricMap::new();
    if !events.has("minute_start") {
        return m;
    }

    let windowed = events.with_column("time_window", time_window);
    let has_xthreat = events.has("xthreat");

    let mut summaries: Vec<(String, Option<f64>, MetricMap)> = Vec::new();
    for (start, rows) in windows(&windowed) {
        let label = format!("{}-{} min", start, start + TIME_WINDOW_MINUTES as i64);
        let mut w = MetricMap::new();
        w.insert("time_window", label.as_str());
        w.insert("actions", rows.len());
        let xthreat = has_xthreat.then(|| rows.sum("xthreat"));
        w.insert_opt("xthreat", xthreat);
        if rows.has("lead_to_shot") {
            w.insert("shots", rows.set_count("lead_to_shot"));
        }
        summaries.push((label, xthreat, w));
    }

    if has_xthreat {
        // First window wins ties in both directions
        let mut strongest: Option<(&str, f64)> = None;
        let mut weakest: Option<(&str, f64)> = None;
        for (label, xthreat, _) in &summaries {
            let x = xthreat.unwrap_or(0.0);
            if strongest.map_or(true, |(_, best)| x > best) {
                strongest = Some((label.as_str(), x));
            }
            if weakest.map_or(true, |(_, worst)| x < worst) {
                weakest = Some((label.as_str(), x));
            }
        }
        if let (Some((best, _)), Some((worst, _))) = (strongest, weakest) {
            m.insert("strongest_period", best);
            m.insert("weakest_period", worst);
        }
    }

    let windows: Vec<MetricValue> = summaries
        .into_iter()
        .map(|(_, _, w)| MetricValue::Map(w))
        .collect();
    m.insert("time_windows", windows);
    m
}

fn game_state(r: &Record) -> Option<&'static str> {
    let (team, opponent) = (r.f64("team_score")?, r.f64("opponent_team_score")?);
    Some(if team > opponent {
        "winning"
    } else if team < opponent {
        "losing"
    } else {
        "drawing"
    })
}

fn by_game_state(view: &View<'_>) -> MetricMap {
    let mut m = MetricMap::new();
    if !view.has_all(&["team_score", "opponent_team_score"]) {
        return m;
    }

    for state in ["winning", "drawing", "losing"] {
        let rows = view.filter(|r| game_state(r) == Some(state));
        if rows.is_empty() {
            continue;
        }
        let mut s = MetricMap::new();
        s.insert("actions", rows.len());
        if rows.has("lead_to_shot") {
            s.insert("shots", rows.set_count("lead_to_shot"));
        }
        s.insert_opt("pass_accuracy", success_share(&rows));
        m.insert(state, s);
    }
    m
}
