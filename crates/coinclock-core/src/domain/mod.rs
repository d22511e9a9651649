//! # Domain Models
//!
//! Types shared by the clock, fetcher, and catalog.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`CoinId`] | Validated upstream coin identifier |
//! | [`Coin`] | Identifier plus opaque upstream payload |
//! | [`SimDate`] | UTC instant on the simulated timeline |
//!
//! Identifiers and dates validate at construction, so a `CoinId` or
//! `SimDate` in hand is always well-formed:
//!
//! ```rust
//! use coinclock_core::{CoinId, SimDate, ValidationError};
//!
//! let id = CoinId::parse("bitcoin")?;
//! assert_eq!(id.as_str(), "bitcoin");
//!
//! let day = SimDate::parse("2014-01-01")?;
//! assert_eq!(day.unix_millis(), 1_388_534_400_000);
//! # Ok::<(), ValidationError>(())
//! ```

mod coin;
mod coin_id;
mod sim_date;

pub use coin::Coin;
pub use coin_id::CoinId;
pub use sim_date::SimDate;
