//! Load-once, query-many storage for parsed road networks.
//!
//! The system this replaces kept a hidden process-wide mutable cache
//! keyed by dataset name. Here the cache is an explicit object the
//! caller constructs and injects, which keeps the "parse the national
//! dataset once per session" property without hidden global state.
//! Handles are `Arc`s; the network behind them is read-only, so the
//! lookup path never takes a lock.

use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::{NetworkError, RoadNetwork, parse};

/// Session-scoped cache of parsed road networks, keyed by dataset id.
#[derive(Debug, Default)]
pub struct NetworkCache {
    loaded: RwLock<BTreeMap<String, Arc<RoadNetwork>>>,
}

impl NetworkCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses `geojson_text` and caches the result under `dataset_id`.
    ///
    /// If the dataset is already cached the stored handle is returned
    /// and the text is not parsed again.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError`] when the dataset cannot be parsed.
    pub fn load(
        &self,
        dataset_id: &str,
        geojson_text: &str,
    ) -> Result<Arc<RoadNetwork>, NetworkError> {
        if let Some(handle) = self.get(dataset_id) {
            log::debug!("Road network '{dataset_id}' already cached");
            return Ok(handle);
        }

        let network = Arc::new(parse::parse_network(geojson_text)?);
        log::info!(
            "Loaded road network '{dataset_id}': {} feature(s)",
            network.len()
        );

        let mut loaded = self
            .loaded
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        // A concurrent load of the same dataset may have won the race;
        // keep whichever handle is already stored.
        let handle = loaded
            .entry(dataset_id.to_string())
            .or_insert(network);
        Ok(Arc::clone(handle))
    }

    /// Returns the cached handle for `dataset_id`, if any.
    #[must_use]
    pub fn get(&self, dataset_id: &str) -> Option<Arc<RoadNetwork>> {
        self.loaded
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(dataset_id)
            .map(Arc::clone)
    }

    /// Ids of all cached datasets.
    #[must_use]
    pub fn dataset_ids(&self) -> Vec<String> {
        self.loaded
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }
}
