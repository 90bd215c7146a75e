//! Set-Pieces - restarts overall, corners, free kicks

use super::{Section, SectionError};
use crate::config::defaults::SET_PIECE_RESTARTS;
use crate::dataset::{Table, View};
use crate::types::{MetricMap, SectionMetrics};

const RESTART: &str = "game_interruption_before";

pub struct SetPieces;

impl Section for SetPieces {
    fn id(&self) -> &str {
        "set_pieces"
    }

    fn name(&self) -> &str {
        "Set-Pieces"
    }

    fn icon(&self) -> &str {
        "⚽"
    }

    fn compute(
        &self,
        events: &Table,
        _phases: Option<&Table>,
    ) -> Result<SectionMetrics, SectionError> {
        let view = events.view();
        Ok(SectionMetrics::new("Set-Pieces")
            .with_group("overall", overall(&view))
            .with_group("corners", corners(&view.where_eq(RESTART, "corner_kick")))
            .with_group("free_kicks", free_kicks(&view.where_eq(RESTART, "free_kick"))))
    }
}

fn overall(view: &View<'_>) -> MetricMap {
    let mut m = MetricMap::new();
    let set_pieces = view.filter(|r| {
        r.str(RESTART)
            .is_some_and(|t| SET_PIECE_RESTARTS.contains(&t))
    });
    if set_pieces.is_empty() {
        return m;
    }

    m.insert("total_set_pieces", set_pieces.len());
    m.insert("set_piece_types", set_pieces.value_counts(RESTART));
    if set_pieces.has("lead_to_shot") {
        m.insert_opt("set_piece_to_shot_rate", set_pieces.flag_mean("lead_to_shot"));
    }
    if set_pieces.has("lead_to_goal") {
        m.insert_opt("set_piece_to_goal_rate", set_pieces.flag_mean("lead_to_goal"));
    }
    if set_pieces.has("pass_range") {
        m.insert("delivery_types", set_pieces.value_shares("pass_range"));
    }
    m
}

fn corners(corners: &View<'_>) -> MetricMap {
    let mut m = MetricMap::new();
    if corners.is_empty() {
        return m;
    }

    m.insert("total_corners", corners.len());
    if corners.has("lead_to_shot") {
        m.insert("corners_to_shot", corners.set_count("lead_to_shot"));
        m.insert_opt("corners_to_shot_rate", corners.flag_mean("lead_to_shot"));
    }
    if corners.has("lead_to_goal") {
        m.insert("corners_to_goal", corners.set_count("lead_to_goal"));
    }
    if corners.has("channel_end") {
        m.insert("corner_delivery_zones", corners.value_counts("channel_end"));
    }
    m
}

fn free_kicks(free_kicks: &View<'_>) -> MetricMap {
    let mut m = MetricMap::new();
    if free_kicks.is_empty() {
        return m;
    }

    m.insert("total_free_kicks", free_kicks.len());
    if free_kicks.has("third_start") {
        m.insert("free_kick_locations", free_kicks.value_counts("third_start"));

        let dangerous = free_kicks.where_eq("third_start", "attacking_third");
        if !dangerous.is_empty() {
            m.insert("dangerous_free_kicks", dangerous.len());
            if dangerous.has("lead_to_shot") {
                m.insert_opt("dangerous_fk_to_shot_rate", dangerous.flag_mean("lead_to_shot"));
            }
        }
    }
    m
}
