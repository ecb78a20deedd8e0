/// Resolved-flag cache with optimistic toggles
///
/// Caches effective flag values keyed by (tenant, flag key). Admin toggles
/// apply optimistically: the cache changes first, the database write
/// follows, and a failed write reverts the cache from the snapshot taken at
/// toggle time. Invalidation is per tenant (override changed, tenant
/// switched) or whole-cache (flag definition changed).

use std::collections::HashMap;
use uuid::Uuid;

/// Cache key: one tenant's view of one flag
type Key = (Uuid, String);

/// Snapshot taken before an optimistic toggle, used to revert
#[derive(Debug, Clone)]
pub struct FlagSnapshot {
    key: Key,

    /// Value before the toggle; None when the key was not cached
    prior: Option<bool>,
}

/// In-memory cache of resolved flag values
#[derive(Debug, Clone, Default)]
pub struct FlagCache {
    resolved: HashMap<Key, bool>,
}

impl FlagCache {
    /// Creates an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached effective value, when present
    pub fn get(&self, tenant_id: Uuid, key: &str) -> Option<bool> {
        self.resolved.get(&(tenant_id, key.to_string())).copied()
    }

    /// Stores a resolved value
    pub fn insert(&mut self, tenant_id: Uuid, key: impl Into<String>, enabled: bool) {
        self.resolved.insert((tenant_id, key.into()), enabled);
    }

    /// Applies an optimistic toggle, returning the snapshot to revert with
    ///
    /// The cache reflects the new value immediately; the caller performs the
    /// backing write and calls [`FlagCache::revert`] if it fails.
    pub fn set_optimistic(
        &mut self,
        tenant_id: Uuid,
        key: impl Into<String>,
        enabled: bool,
    ) -> FlagSnapshot {
        let key = (tenant_id, key.into());
        let prior = self.resolved.insert(key.clone(), enabled);

        FlagSnapshot { key, prior }
    }

    /// Reverts an optimistic toggle to its snapshot
    pub fn revert(&mut self, snapshot: FlagSnapshot) {
        match snapshot.prior {
            Some(value) => {
                self.resolved.insert(snapshot.key, value);
            }
            None => {
                self.resolved.remove(&snapshot.key);
            }
        }
    }

    /// Drops every cached value for a tenant
    pub fn invalidate_tenant(&mut self, tenant_id: Uuid) {
        self.resolved.retain(|(t, _), _| *t != tenant_id);
    }

    /// Drops everything
    pub fn invalidate_all(&mut self) {
        self.resolved.clear();
    }

    /// Number of cached entries
    pub fn len(&self) -> usize {
        self.resolved.len()
    }

    /// Whether the cache is empty
    pub fn is_empty(&self) -> bool {
        self.resolved.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_get() {
        let tenant = Uuid::new_v4();
        let mut cache = FlagCache::new();

        assert_eq!(cache.get(tenant, "load_hunter"), None);
        cache.insert(tenant, "load_hunter", true);
        assert_eq!(cache.get(tenant, "load_hunter"), Some(true));
    }

    #[test]
    fn test_optimistic_toggle_then_revert_restores_prior_value() {
        let tenant = Uuid::new_v4();
        let mut cache = FlagCache::new();
        cache.insert(tenant, "billing_v2", false);

        let snapshot = cache.set_optimistic(tenant, "billing_v2", true);
        assert_eq!(cache.get(tenant, "billing_v2"), Some(true));

        // Simulated write failure: revert to the snapshot
        cache.revert(snapshot);
        assert_eq!(cache.get(tenant, "billing_v2"), Some(false));
    }

    #[test]
    fn test_revert_of_previously_uncached_key_removes_it() {
        let tenant = Uuid::new_v4();
        let mut cache = FlagCache::new();

        let snapshot = cache.set_optimistic(tenant, "billing_v2", true);
        assert_eq!(cache.get(tenant, "billing_v2"), Some(true));

        cache.revert(snapshot);
        assert_eq!(cache.get(tenant, "billing_v2"), None);
    }

    #[test]
    fn test_invalidate_tenant_is_scoped() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let mut cache = FlagCache::new();
        cache.insert(a, "x", true);
        cache.insert(b, "x", true);

        cache.invalidate_tenant(a);

        assert_eq!(cache.get(a, "x"), None);
        assert_eq!(cache.get(b, "x"), Some(true));
    }
}
