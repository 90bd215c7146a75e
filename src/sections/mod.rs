//! Analytic sections
//!
//! Each section derives one group of tactical metrics from the shared,
//! read-only event table (and the phase table when present). Sections are
//! independent of each other and of execution order, so the engine may run
//! them concurrently.
//!
//! ## Sections
//!
//! 1. **team_identity** - shape by phase, fullback asymmetry, role clarity
//! 2. **possession** - build-up patterns and pressure resistance
//! 3. **chance_creation** - final-third entries, shot creation, option use
//! 4. **defensive_structure** - pressing chains, line height, engagements
//! 5. **transitions** - counter attacks and reaction to possession loss
//! 6. **tactical_intelligence** - line breaking, decision quality, space
//! 7. **individual_players** - per-player output and leaderboards
//! 8. **team_chemistry** - passing network and cohesion
//! 9. **efficiency** - conversion and possession efficiency
//! 10. **set_pieces** - restarts by type
//! 11. **momentum** - 15-minute windows, game state
//! 12. **consistency** - variability across windows, phases, players
//! 13. **training_focus** - weaknesses, strengths, priorities
//! 14. **opponent_exploitation** - vulnerabilities and adjustments
//!
//! Sections degrade gracefully: a metric whose columns are absent is omitted
//! from its group rather than failing the section. Only a column a section
//! cannot do without at all produces [`SectionError::MissingColumn`].

mod common;

pub mod chance_creation;
pub mod consistency;
pub mod defensive_structure;
pub mod efficiency;
pub mod individual_players;
pub mod momentum;
pub mod opponent_exploitation;
pub mod possession;
pub mod set_pieces;
pub mod tactical_intelligence;
pub mod team_chemistry;
pub mod team_identity;
pub mod training_focus;
pub mod transitions;

pub use chance_creation::ChanceCreation;
pub use consistency::Consistency;
pub use defensive_structure::DefensiveStructure;
pub use efficiency::Efficiency;
pub use individual_players::IndividualPlayers;
pub use momentum::Momentum;
pub use opponent_exploitation::OpponentExploitation;
pub use possession::Possession;
pub use set_pieces::SetPieces;
pub use tactical_intelligence::TacticalIntelligence;
pub use team_chemistry::TeamChemistry;
pub use team_identity::TeamIdentity;
pub use training_focus::TrainingFocus;
pub use transitions::Transitions;

use crate::config::ExecutionConfig;
use crate::dataset::Table;
use crate::types::SectionMetrics;
use thiserror::Error;

/// A section computation failure. Recorded in the bundle, never fatal.
#[derive(Debug, Error)]
pub enum SectionError {
    /// A column the section cannot work without is absent
    #[error("required column `{0}` is missing")]
    MissingColumn(String),

    #[error("{0}")]
    Failed(String),
}

/// Trait for analytic sections
///
/// Implementations must be pure functions of their inputs: no shared mutable
/// state, no mutation of the tables. Derived columns go on a private copy
/// (see [`Table::with_column`]).
pub trait Section: Send + Sync {
    /// Stable identifier used as the bundle key (e.g. "set_pieces")
    fn id(&self) -> &str;

    /// Display name (e.g. "Set-Pieces")
    fn name(&self) -> &str;

    /// Display icon
    fn icon(&self) -> &str;

    /// Compute the section's metric groups.
    fn compute(&self, events: &Table, phases: Option<&Table>)
        -> Result<SectionMetrics, SectionError>;
}

type ComputeFn =
    dyn Fn(&Table, Option<&Table>) -> Result<SectionMetrics, SectionError> + Send + Sync;

/// Adapts a closure into a [`Section`].
pub struct FnSection {
    id: String,
    name: String,
    icon: String,
    compute: Box<ComputeFn>,
}

impl FnSection {
    pub fn new<F>(id: &str, name: &str, icon: &str, compute: F) -> Self
    where
        F: Fn(&Table, Option<&Table>) -> Result<SectionMetrics, SectionError>
            + Send
            + Sync
            + 'static,
    {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            icon: icon.to_string(),
            compute: Box::new(compute),
        }
    }
}

impl Section for FnSection {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn icon(&self) -> &str {
        &self.icon
    }

    fn compute(
        &self,
        events: &Table,
        phases: Option<&Table>,
    ) -> Result<SectionMetrics, SectionError> {
        (self.compute)(events, phases)
    }
}

/// Create the 14 standard sections in canonical order.
pub fn standard_sections(config: &ExecutionConfig) -> Vec<Box<dyn Section>> {
    vec![
        Box::new(TeamIdentity),
        Box::new(Possession),
        Box::new(ChanceCreation),
        Box::new(DefensiveStructure),
        Box::new(Transitions),
        Box::new(TacticalIntelligence),
        Box::new(IndividualPlayers {
            accurate_passer_min_passes: config.accurate_passer_min_passes,
        }),
        Box::new(TeamChemistry),
        Box::new(Efficiency),
        Box::new(SetPieces),
        Box::new(Momentum),
        Box::new(Consistency {
            min_player_actions: config.min_player_actions,
        }),
        Box::new(TrainingFocus),
        Box::new(OpponentExploitation),
    ]
}
