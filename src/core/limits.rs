/*!
 * Scheduler Limits and Defaults
 *
 * Centralized location for scheduler-wide limits and default timing values.
 * Ticks are interpreted as microseconds by the defaults below, but the
 * scheduler itself only compares and subtracts them.
 */

use super::types::Tick;

// =============================================================================
// TIMING
// =============================================================================

/// Default super-period (1s)
/// Every claim is refilled to its quota once per super-period
pub const DEFAULT_SUPER_PERIOD: Tick = 1_000_000;

/// Default fill quantum (10ms)
/// Round-robin slice granted to ready shares without outstanding claim
pub const DEFAULT_FILL_QUANTUM: Tick = 10_000;

// =============================================================================
// PRIORITIES
// =============================================================================

/// Default number of priority levels
pub const DEFAULT_PRIORITY_LEVELS: u8 = 4;

/// Upper bound for configurable priority levels
/// [PERF] Selection scans every level, so this bounds update cost
pub const MAX_PRIORITY_LEVELS: u8 = 128;

// =============================================================================
// CAPACITY
// =============================================================================

/// Initial share arena capacity
/// Inserting beyond this grows the arena
pub const DEFAULT_SHARE_CAPACITY: usize = 64;
