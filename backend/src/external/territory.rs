//! Process-lifetime cache of carrier territory resolutions
//!
//! Territory sets change rarely, so entries are populated lazily on first
//! resolution and never invalidated. Safe to rebuild from zero on restart.

use dashmap::DashMap;
use shared::{normalize_territory_name, DeliveryProvider, TerritoryRef};

/// Maps `(provider, normalized name)` to the provider's territory identifier
#[derive(Debug, Default)]
pub struct TerritoryCache {
    entries: DashMap<(DeliveryProvider, String), TerritoryRef>,
}

impl TerritoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, provider: DeliveryProvider, name: &str) -> Option<TerritoryRef> {
        let key = (provider, normalize_territory_name(name));
        self.entries.get(&key).map(|entry| entry.value().clone())
    }

    pub fn insert(&self, provider: DeliveryProvider, name: &str, territory: TerritoryRef) {
        self.entries
            .insert((provider, normalize_territory_name(name)), territory);
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
