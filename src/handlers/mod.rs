// handlers/mod.rs - two-tier handler layout
//
// Public (no auth) → Protected (JWT auth + per-route role gates)

pub mod protected;
pub mod public;

pub use protected::*;
pub use public::*;
