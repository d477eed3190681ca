//! Live, periodically refreshed feeds.
//!
//! A [`Subscription`] owns a background task that polls one [`Feed`] and
//! publishes [`Snapshot`]s on a watch channel. View layers read snapshots;
//! they never talk to the transit API themselves.

mod feed;
mod snapshot;
mod subscription;

pub use feed::{BoardFeed, BoardMode, Feed, VehicleFeed};
pub use snapshot::{LoadState, Snapshot};
pub use subscription::{DEFAULT_REFRESH_INTERVAL, PollConfig, Subscription};
