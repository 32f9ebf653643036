//! Static role to department policy

use std::collections::{BTreeMap, BTreeSet};

use crate::config::AccessConfig;
use crate::error::{Error, Result};

/// Validated role to department mapping
#[derive(Debug, Clone)]
pub struct AccessPolicy {
    roles: BTreeMap<String, BTreeSet<String>>,
    fallback_role: String,
    fallback_departments: BTreeSet<String>,
    all_departments: BTreeSet<String>,
}

impl AccessPolicy {
    /// Build a policy, rejecting mappings that break the access invariants
    pub fn new(roles: BTreeMap<String, BTreeSet<String>>, fallback_role: impl Into<String>) -> Result<Self> {
        let fallback_role = fallback_role.into();
        let all_departments: BTreeSet<String> = roles.values().flatten().cloned().collect();
        let fallback_departments = roles.get(&fallback_role).cloned().ok_or_else(|| {
            Error::Config(format!("fallback role '{}' is not configured", fallback_role))
        })?;

        let policy = Self {
            roles,
            fallback_role,
            fallback_departments,
            all_departments,
        };
        policy.validate()?;
        Ok(policy)
    }

    /// Build from the `[access]` config section
    pub fn from_config(config: &AccessConfig) -> Result<Self> {
        Self::new(config.roles.clone(), config.fallback_role.clone())
    }

    /// Every role maps to a non-empty set, the fallback role exists and some
    /// role covers every configured department
    pub fn validate(&self) -> Result<()> {
        if self.roles.is_empty() {
            return Err(Error::Config("access.roles must not be empty".to_string()));
        }
        if let Some((role, _)) = self.roles.iter().find(|(_, depts)| depts.is_empty()) {
            return Err(Error::Config(format!(
                "role '{}' has no permitted departments",
                role
            )));
        }
        if !self.roles.contains_key(&self.fallback_role) {
            return Err(Error::Config(format!(
                "fallback role '{}' is not configured",
                self.fallback_role
            )));
        }
        if !self.roles.values().any(|depts| *depts == self.all_departments) {
            return Err(Error::Config(
                "no role is permitted every configured department".to_string(),
            ));
        }
        Ok(())
    }

    /// Departments a role may read. Unknown roles get the fallback role's set.
    pub fn departments_for(&self, role: &str) -> &BTreeSet<String> {
        match self.roles.get(role) {
            Some(depts) => depts,
            None => {
                tracing::warn!(
                    "Unknown role '{}', using departments of '{}'",
                    role,
                    self.fallback_role
                );
                &self.fallback_departments
            }
        }
    }

    /// Union of every role's departments
    pub fn all_departments(&self) -> &BTreeSet<String> {
        &self.all_departments
    }

    /// Whether the role may read every configured department
    pub fn has_full_access(&self, role: &str) -> bool {
        self.roles
            .get(role)
            .is_some_and(|depts| *depts == self.all_departments)
    }

    /// Whether the role is configured
    pub fn is_known_role(&self, role: &str) -> bool {
        self.roles.contains_key(role)
    }

    /// Configured roles
    pub fn roles(&self) -> impl Iterator<Item = &str> {
        self.roles.keys().map(String::as_str)
    }

    /// Role used for unknown roles
    pub fn fallback_role(&self) -> &str {
        &self.fallback_role
    }
}

impl Default for AccessPolicy {
    fn default() -> Self {
        let config = AccessConfig::default();
        let all_departments = config.roles.values().flatten().cloned().collect();
        let fallback_departments = config
            .roles
            .get(&config.fallback_role)
            .cloned()
            .unwrap_or_default();
        Self {
            roles: config.roles,
            fallback_role: config.fallback_role,
            fallback_departments,
            all_departments,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_default_policy() {
        let policy = AccessPolicy::default();
        assert!(policy.validate().is_ok());
        assert_eq!(policy.departments_for("finance"), &set(&["finance"]));
        assert_eq!(policy.departments_for("employee"), &set(&["general"]));
        assert!(policy.has_full_access("c-level"));
        assert!(!policy.has_full_access("hr"));
        assert_eq!(policy.all_departments().len(), 5);
    }

    #[test]
    fn test_unknown_role_falls_back() {
        let policy = AccessPolicy::default();
        assert!(!policy.is_known_role("intern"));
        assert_eq!(policy.departments_for("intern"), &set(&["general"]));
        assert!(!policy.has_full_access("intern"));
    }

    #[test]
    fn test_invalid_policies() {
        let mut roles = BTreeMap::new();
        roles.insert("a".to_string(), set(&["x"]));
        roles.insert("b".to_string(), set(&["y"]));
        assert!(AccessPolicy::new(roles.clone(), "a").is_err());

        roles.insert("admin".to_string(), set(&["x", "y"]));
        assert!(AccessPolicy::new(roles.clone(), "a").is_ok());
        assert!(AccessPolicy::new(roles.clone(), "missing").is_err());

        roles.insert("empty".to_string(), BTreeSet::new());
        assert!(AccessPolicy::new(roles, "a").is_err());

        assert!(AccessPolicy::new(BTreeMap::new(), "a").is_err());
    }
}
