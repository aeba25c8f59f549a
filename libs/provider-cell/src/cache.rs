use std::collections::HashMap;
use std::sync::RwLock;

use swarm_domain::Provider;

/// Process-wide cache of every provider ever returned by any search, keyed
/// by id. Lets a later campaign reuse an allow-listed id without
/// re-searching, which avoids the drift that occurs when an upstream
/// search source (e.g. nearby vs text search) returns different results
/// for an equivalent query.
#[derive(Default)]
pub struct ProviderCache {
    by_id: RwLock<HashMap<String, Provider>>,
}

impl ProviderCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_all(&self, providers: &[Provider]) {
        let mut guard = self.by_id.write().unwrap();
        for p in providers {
            guard.insert(p.id.clone(), p.clone());
        }
    }

    /// Returns providers for every id, in the same order as `ids`, or
    /// `None` if any id is missing — signalling the caller to fall back to
    /// a fresh search instead of returning a partial snapshot.
    pub fn get_cached(&self, ids: &[String]) -> Option<Vec<Provider>> {
        let guard = self.by_id.read().unwrap();
        let mut result = Vec::with_capacity(ids.len());
        for id in ids {
            result.push(guard.get(id)?.clone());
        }
        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(id: &str) -> Provider {
        Provider {
            id: id.to_string(),
            name: id.to_string(),
            phone: String::new(),
            address: String::new(),
            rating: 4.0,
            lat: 0.0,
            lng: 0.0,
            services: vec![],
        }
    }

    #[test]
    fn miss_on_any_unknown_id_falls_back_to_search() {
        let cache = ProviderCache::new();
        cache.insert_all(&[provider("a")]);
        assert!(cache.get_cached(&["a".to_string(), "b".to_string()]).is_none());
        assert!(cache.get_cached(&["a".to_string()]).is_some());
    }
}
