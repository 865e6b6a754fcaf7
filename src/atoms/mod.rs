// ── tutorchat Atoms Layer ──────────────────────────────────────────────────
// Pure constants, error types and wire formats. No I/O.
// Dependency rule: atoms may only depend on std and external pure crates.
// Nothing here may import from engine/ or config.rs.

pub mod constants;
pub mod error;
pub mod types;
