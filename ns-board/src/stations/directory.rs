//! Process-wide station cache.
//!
//! The catalog is fetched lazily on first use and then kept for the life of
//! the process. There is no TTL; a restart picks up catalog changes.

use std::sync::Arc;

use moka::future::Cache as MokaCache;
use tracing::info;

use crate::domain::{Station, StationCode};
use crate::transit::{TransitApi, TransitError};

/// Station shown when nothing has been selected yet (Amsterdam Centraal).
pub const DEFAULT_STATION_CODE: &str = "ASD";

/// The cache holds a single entry: the filtered catalog.
type CatalogKey = ();

/// Cached station list, in upstream order.
type CatalogEntry = Arc<Vec<Station>>;

/// Lazily populated station directory.
///
/// Cloning is cheap and clones share the cache. Concurrent first lookups
/// share one upstream fetch; a failed fetch is not cached, so the next
/// lookup tries again.
pub struct StationDirectory<A> {
    api: Arc<A>,
    catalog: MokaCache<CatalogKey, CatalogEntry>,
}

impl<A> Clone for StationDirectory<A> {
    fn clone(&self) -> Self {
        Self {
            api: Arc::clone(&self.api),
            catalog: self.catalog.clone(),
        }
    }
}

impl<A: TransitApi> StationDirectory<A> {
    /// Create an empty directory backed by the given API.
    pub fn new(api: Arc<A>) -> Self {
        let catalog = MokaCache::builder().max_capacity(1).build();
        Self { api, catalog }
    }

    /// All stations, fetching the catalog on first use.
    pub async fn stations(&self) -> Result<Arc<Vec<Station>>, TransitError> {
        let api = Arc::clone(&self.api);

        self.catalog
            .try_get_with((), async move {
                let stations = api.list_stations().await?;
                info!(count = stations.len(), "loaded station directory");
                Ok::<_, TransitError>(Arc::new(stations))
            })
            .await
            .map_err(TransitError::from_shared)
    }

    /// Whether the catalog has been fetched.
    pub fn is_loaded(&self) -> bool {
        self.catalog.contains_key(&())
    }

    /// Look up a station by code.
    pub async fn get(&self, code: &StationCode) -> Result<Option<Station>, TransitError> {
        let stations = self.stations().await?;
        Ok(stations.iter().find(|s| &s.code == code).cloned())
    }

    /// Search by name or code.
    ///
    /// Case-insensitive substring match; results sorted by display name and
    /// truncated to `limit`.
    pub async fn search(&self, query: &str, limit: usize) -> Result<Vec<Station>, TransitError> {
        let stations = self.stations().await?;

        let mut matches: Vec<Station> = stations
            .iter()
            .filter(|s| s.matches(query))
            .cloned()
            .collect();
        matches.sort_by(|a, b| a.display_name.cmp(&b.display_name));
        matches.truncate(limit);

        Ok(matches)
    }

    /// Pick the station to show at startup.
    ///
    /// The previously selected station if it still exists, else Amsterdam
    /// Centraal, else the first station in the catalog. `None` only when the
    /// catalog is empty.
    pub async fn default_station(
        &self,
        last_selected: Option<&StationCode>,
    ) -> Result<Option<Station>, TransitError> {
        let stations = self.stations().await?;

        let find = |code: &str| stations.iter().find(|s| s.code.as_str() == code);

        Ok(last_selected
            .and_then(|code| find(code.as_str()))
            .or_else(|| find(DEFAULT_STATION_CODE))
            .or_else(|| stations.first())
            .cloned())
    }
}
