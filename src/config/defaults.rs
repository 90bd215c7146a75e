//! System-wide default constants.
//!
//! Centralises the analytic thresholds used across sections so the numbers
//! behind each recommendation are discoverable in one place.

// ============================================================================
// Engine
// ============================================================================

/// Worker slots in the section pool.
pub const DEFAULT_WORKERS: usize = 4;

/// Upper bound accepted by config validation for `engine.workers`.
pub const MAX_WORKERS: usize = 64;

/// Cache entries older than this are ignored (seconds).
pub const DEFAULT_CACHE_TTL_SECS: u64 = 3_600;

/// Default cache directory, relative to the working directory.
pub const DEFAULT_CACHE_DIR: &str = "data/cache";

// ============================================================================
// Pitch vocabulary
// ============================================================================

/// In-possession phase types reported per phase.
pub const IN_POSSESSION_PHASES: [&str; 3] = ["build_up", "create", "finish"];

/// Out-of-possession block types.
pub const DEFENSIVE_BLOCKS: [&str; 3] = ["high_block", "mid_block", "low_block"];

/// Set-piece restarts recognised in `game_interruption_before`.
pub const SET_PIECE_RESTARTS: [&str; 4] = ["corner_kick", "free_kick", "throw_in", "penalty"];

/// Number of pitch channels (used to normalise channel entropy).
pub const CHANNEL_COUNT: f64 = 5.0;

/// Number of pitch thirds (used to normalise third entropy).
pub const THIRD_COUNT: f64 = 3.0;

/// Window width for momentum and consistency time series (minutes).
pub const TIME_WINDOW_MINUTES: f64 = 15.0;

// ============================================================================
// Pressure and sample sizes
// ============================================================================

/// Possession-loss probability above which a player is considered under pressure.
pub const HIGH_PRESSURE_XLOSS: f64 = 0.3;

/// Minimum actions before a player's consistency is reported.
pub const MIN_PLAYER_ACTIONS: usize = 10;

/// Minimum passes before a player qualifies as an accurate passer.
pub const ACCURATE_PASSER_MIN_PASSES: usize = 20;

/// Entries kept in each top-N leaderboard.
pub const LEADERBOARD_SIZE: usize = 5;

/// Passing combinations kept in the network summary.
pub const TOP_COMBINATIONS: usize = 10;

// ============================================================================
// Training focus thresholds
// ============================================================================

pub const WEAK_PASS_ACCURACY: f64 = 0.75;
pub const WEAK_PRESSURE_PASS_ACCURACY: f64 = 0.65;
pub const WEAK_FINAL_THIRD_SHOT_RATE: f64 = 0.15;
pub const WEAK_TURNOVER_RATE: f64 = 0.3;
pub const STRONG_LINE_BREAK_RATE: f64 = 0.2;
pub const STRONG_BUILDUP_RETENTION: f64 = 0.8;
pub const STRUGGLING_PLAYER_PASS_ACCURACY: f64 = 0.7;
pub const LOW_DANGEROUS_OPTION_UTILISATION: f64 = 0.6;

// ============================================================================
// Opponent exploitation thresholds
// ============================================================================

/// Retention above which play against a block type is flagged as effective.
pub const EFFECTIVE_RETENTION_VS_BLOCK: f64 = 0.75;

/// Share of shot-leading actions for a phase type to count as a pattern.
pub const SIGNIFICANT_PATTERN_SHARE: f64 = 0.3;

/// Opponent defensive line heights (metres) for line-height adjustments.
pub const HIGH_LINE_METRES: f64 = 60.0;
pub const LOW_LINE_METRES: f64 = 40.0;

/// Pressing-rate bands for press adjustments.
pub const AGGRESSIVE_PRESS_RATE: f64 = 0.2;
pub const PASSIVE_PRESS_RATE: f64 = 0.1;

/// Wide-area pass success above which width is recommended.
pub const WIDE_SUCCESS_RATE: f64 = 0.75;
