//! Route handlers.
//!
//! - [`coins`]: coin lookups and the current snapshot
//! - [`clock`]: simulated date and publication generation
//! - [`health`]: liveness check

pub mod clock;
pub mod coins;
pub mod health;
