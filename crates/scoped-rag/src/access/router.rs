//! Role to store resolution
//!
//! Tiers, first match wins:
//! 1. role covers every configured department and every department held by
//!    the global store: global store, unfiltered
//! 2. role covers a single department that has a dedicated store:
//!    that store, unfiltered
//! 3. a global store exists: global store filtered to the role's departments
//! 4. otherwise no store

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::index::{ChunkStore, IndexRegistry};

use super::policy::AccessPolicy;

/// Where a query for a role is sent
#[derive(Debug, Clone)]
pub enum Route {
    /// Global store, no filter
    Global(Arc<ChunkStore>),
    /// Dedicated department store
    Department(Arc<ChunkStore>),
    /// Global store restricted to these departments
    FilteredGlobal {
        store: Arc<ChunkStore>,
        departments: BTreeSet<String>,
    },
    /// Nothing to search
    NoStore,
}

impl Route {
    /// Store to search, if any
    pub fn store(&self) -> Option<&Arc<ChunkStore>> {
        match self {
            Route::Global(store) | Route::Department(store) => Some(store),
            Route::FilteredGlobal { store, .. } => Some(store),
            Route::NoStore => None,
        }
    }

    /// Department filter to apply, if any
    pub fn filter(&self) -> Option<&BTreeSet<String>> {
        match self {
            Route::FilteredGlobal { departments, .. } => Some(departments),
            _ => None,
        }
    }

    /// Short label for logs
    pub fn label(&self) -> String {
        match self {
            Route::Global(store) => format!("global:{}", store.collection()),
            Route::Department(store) => format!("department:{}", store.collection()),
            Route::FilteredGlobal { store, departments } => format!(
                "filtered:{}[{}]",
                store.collection(),
                departments.iter().cloned().collect::<Vec<_>>().join(",")
            ),
            Route::NoStore => "none".to_string(),
        }
    }
}

/// Resolves roles to stores of a registry
#[derive(Debug, Clone)]
pub struct AccessRouter {
    policy: Arc<AccessPolicy>,
}

impl AccessRouter {
    /// Create a router over a validated policy
    pub fn new(policy: Arc<AccessPolicy>) -> Self {
        Self { policy }
    }

    /// Policy used for resolution
    pub fn policy(&self) -> &AccessPolicy {
        &self.policy
    }

    /// Pick the store a role's query runs against
    pub fn resolve(&self, role: &str, registry: &IndexRegistry) -> Route {
        let permitted = self.policy.departments_for(role);

        if let Some(global) = registry.global() {
            if permitted == self.policy.all_departments()
                && global.departments().is_subset(permitted)
            {
                return Route::Global(Arc::clone(global));
            }
        }

        if permitted.len() == 1 {
            if let Some(store) = permitted.iter().next().and_then(|d| registry.department(d)) {
                return Route::Department(Arc::clone(store));
            }
        }

        match registry.global() {
            Some(global) => Route::FilteredGlobal {
                store: Arc::clone(global),
                departments: permitted.clone(),
            },
            None => {
                tracing::warn!("No store available for role '{}'", role);
                Route::NoStore
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{collection_name, GLOBAL_COLLECTION};
    use crate::providers::{FlatIndex, VectorIndex};
    use std::collections::BTreeMap;

    fn store(collection: &str, departments: &[&str]) -> Arc<ChunkStore> {
        let index: Arc<dyn VectorIndex> = Arc::new(FlatIndex::new(collection, 4));
        Arc::new(ChunkStore::new(
            collection,
            index,
            0,
            departments.iter().map(|d| d.to_string()).collect(),
        ))
    }

    fn registry(departments: &[&str], with_global: bool) -> IndexRegistry {
        let stores: BTreeMap<String, Arc<ChunkStore>> = departments
            .iter()
            .map(|d| (d.to_string(), store(&collection_name(d), &[d])))
            .collect();
        let global = with_global.then(|| store(GLOBAL_COLLECTION, departments));
        IndexRegistry::new(stores, global, 1)
    }

    fn policy() -> Arc<AccessPolicy> {
        let mut roles = BTreeMap::new();
        for dept in ["finance", "marketing", "hr"] {
            roles.insert(dept.to_string(), BTreeSet::from([dept.to_string()]));
        }
        roles.insert(
            "ops".to_string(),
            BTreeSet::from(["finance".to_string(), "hr".to_string()]),
        );
        roles.insert(
            "admin".to_string(),
            ["finance", "marketing", "hr"].iter().map(|d| d.to_string()).collect(),
        );
        Arc::new(AccessPolicy::new(roles, "hr").unwrap())
    }

    #[test]
    fn test_full_access_uses_global() {
        let router = AccessRouter::new(policy());
        let route = router.resolve("admin", &registry(&["finance", "marketing", "hr"], true));
        assert!(matches!(route, Route::Global(_)));
        assert!(route.filter().is_none());
    }

    #[test]
    fn test_single_department_uses_its_store() {
        let router = AccessRouter::new(policy());
        let route = router.resolve("finance", &registry(&["finance", "marketing", "hr"], true));
        match route {
            Route::Department(store) => assert_eq!(store.collection(), "dept_finance"),
            other => panic!("unexpected route {}", other.label()),
        }
    }

    #[test]
    fn test_missing_department_store_filters_global() {
        let router = AccessRouter::new(policy());
        let route = router.resolve("marketing", &registry(&["finance", "hr"], true));
        assert_eq!(route.filter(), Some(&BTreeSet::from(["marketing".to_string()])));
    }

    #[test]
    fn test_multiple_departments_filter_global() {
        let router = AccessRouter::new(policy());
        let route = router.resolve("ops", &registry(&["finance", "marketing", "hr"], true));
        assert!(matches!(route, Route::FilteredGlobal { .. }));
        assert_eq!(route.filter().unwrap().len(), 2);
        assert!(route.label().starts_with("filtered:global_company_data"));
    }

    #[test]
    fn test_full_access_filters_unconfigured_department() {
        let router = AccessRouter::new(policy());
        let route = router.resolve("admin", &registry(&["finance", "marketing", "hr", "legal"], true));
        match &route {
            Route::FilteredGlobal { departments, .. } => {
                assert!(!departments.contains("legal"));
                assert_eq!(departments.len(), 3);
            }
            other => panic!("unexpected route {}", other.label()),
        }
    }

    #[test]
    fn test_full_access_without_global() {
        let router = AccessRouter::new(policy());
        let route = router.resolve("admin", &registry(&["finance"], false));
        assert!(matches!(route, Route::NoStore));
    }

    #[test]
    fn test_unknown_role_uses_fallback() {
        let router = AccessRouter::new(policy());
        let route = router.resolve("visitor", &registry(&["finance", "marketing", "hr"], true));
        match route {
            Route::Department(store) => assert_eq!(store.collection(), "dept_hr"),
            other => panic!("unexpected route {}", other.label()),
        }
    }

    #[test]
    fn test_nothing_built() {
        let router = AccessRouter::new(policy());
        let route = router.resolve("finance", &registry(&[], false));
        assert!(route.store().is_none());
        assert_eq!(route.label(), "none");
    }
}
