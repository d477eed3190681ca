//! Domain types for the NS departure board.
//!
//! These are the stable records the rest of the system works with. They are
//! rebuilt from scratch on every fetch and never mutated in place; the
//! normalizer is the only code that constructs them from upstream data.

mod code;
mod departure;
mod station;
mod vehicle;

pub use code::{InvalidStationCode, StationCode};
pub use departure::Departure;
pub use station::{FALLBACK_LATITUDE, FALLBACK_LONGITUDE, Station};
pub use vehicle::Vehicle;
