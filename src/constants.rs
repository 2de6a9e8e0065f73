//! Global constants used throughout the panel engine.
//!
//! Worker-pool sizing and cascade limits live here so the defaults used by
//! [`crate::config::PanelConfig`] and the ad-hoc constructors agree.

/// Minimum number of workers used when sizing the default pool.
///
/// Keeps batches that mostly wait on data-store I/O moving even on
/// single-core machines.
pub const MIN_PARALLELISM: usize = 4;

/// Multiplier applied to the CPU core count for the default worker cap.
pub const PARALLELISM_CORE_MULTIPLIER: usize = 2;

/// Default CPU core count when detection fails.
///
/// Used as a fallback when `std::thread::available_parallelism()` returns an error.
pub const FALLBACK_CORE_COUNT: usize = 4;

/// Default minimum round limit for one cascade resolve call.
///
/// Field-sets larger than this get one round per field, so a chain of any
/// depth settles.
pub const DEFAULT_MAX_CASCADE_ROUNDS: usize = 64;

/// Environment variable that overrides the configured worker cap.
pub const MAX_WORKERS_ENV: &str = "PANEL_MAX_WORKERS";

/// Default worker cap: `cores * PARALLELISM_CORE_MULTIPLIER`, never below
/// [`MIN_PARALLELISM`].
pub fn default_max_workers() -> usize {
    let cores = std::thread::available_parallelism()
        .map(std::num::NonZeroUsize::get)
        .unwrap_or(FALLBACK_CORE_COUNT);
    (cores * PARALLELISM_CORE_MULTIPLIER).max(MIN_PARALLELISM)
}
