//! Core of an NS (Dutch Railways) departure board.
//!
//! Fetches stations, departure and arrival boards and live train positions
//! from the NS API, normalizes them into domain records, keeps boards fresh
//! with per-view polling subscriptions, and caches the station catalog for
//! the life of the process.

pub mod config;
pub mod domain;
pub mod normalize;
pub mod polling;
pub mod stations;
pub mod transit;
