//! Freeze configuration registry.
//!
//! The evaluator consumes only the narrow read contract; the in-memory
//! implementation additionally carries the configuration lifecycle
//! (create/get/update/delete) used by embedding hosts and tests. Stored
//! YAML documents are returned byte-for-byte unchanged.

use super::errors::FreezeError;
use super::types::{FreezeConfig, FreezeStatus, FreezeSummary, FreezeType, FreezeWindow};
use crate::constants::GLOBAL_FREEZE_IDENTIFIER;
use async_trait::async_trait;
use dashmap::DashMap;
use tracing::debug;

/// Read contract consumed by the freeze evaluator.
///
/// Account, org, and project are independent lookups: a query names exactly
/// one scope level via its id triple.
#[async_trait]
pub trait FreezeRegistry: Send + Sync {
    /// Manual freeze summaries at one scope level, filtered by status
    async fn list_active_manual(
        &self,
        account_id: &str,
        org_id: Option<&str>,
        project_id: Option<&str>,
        status: FreezeStatus,
    ) -> Result<Vec<FreezeSummary>, FreezeError>;

    /// The scope level's global freeze, when one has been configured
    async fn global_summary(
        &self,
        account_id: &str,
        org_id: Option<&str>,
        project_id: Option<&str>,
    ) -> Result<Option<FreezeSummary>, FreezeError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct FreezeKey {
    account_id: String,
    org_id: Option<String>,
    project_id: Option<String>,
    identifier: String,
}

impl FreezeKey {
    fn new(
        account_id: &str,
        org_id: Option<&str>,
        project_id: Option<&str>,
        identifier: &str,
    ) -> Self {
        Self {
            account_id: account_id.to_string(),
            org_id: org_id.map(str::to_string),
            project_id: project_id.map(str::to_string),
            identifier: identifier.to_string(),
        }
    }

    fn of(config: &FreezeConfig) -> Self {
        Self::new(
            &config.account_id,
            config.org_id.as_deref(),
            config.project_id.as_deref(),
            &config.identifier,
        )
    }
}

#[derive(Debug, Clone)]
struct StoredFreeze {
    config: FreezeConfig,
    yaml: String,
}

/// Thread-safe in-memory registry keyed by `(account, org, project,
/// identifier)`
#[derive(Debug, Default)]
pub struct InMemoryFreezeRegistry {
    entries: DashMap<FreezeKey, StoredFreeze>,
}

impl InMemoryFreezeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a validated config. The identifier must be unique within its
    /// `(account, org, project)` triple.
    pub fn create(&self, config: FreezeConfig) -> Result<(), FreezeError> {
        config.validate()?;
        let yaml = serde_yaml::to_string(&config)?;
        self.insert(config, yaml)
    }

    /// Parse, validate, and store a YAML freeze document. The raw document
    /// is preserved and returned unchanged by [`Self::get_yaml`].
    pub fn create_from_yaml(&self, yaml: &str) -> Result<FreezeConfig, FreezeError> {
        let config: FreezeConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        self.insert(config.clone(), yaml.to_string())?;
        Ok(config)
    }

    fn insert(&self, config: FreezeConfig, yaml: String) -> Result<(), FreezeError> {
        let key = FreezeKey::of(&config);
        match self.entries.entry(key) {
            dashmap::mapref::entry::Entry::Occupied(_) => Err(FreezeError::AlreadyExists {
                identifier: config.identifier,
            }),
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                debug!(
                    identifier = %config.identifier,
                    scope = %config.scope,
                    "Freeze config stored"
                );
                slot.insert(StoredFreeze { config, yaml });
                Ok(())
            }
        }
    }

    /// Fetch a stored config
    pub fn get(
        &self,
        account_id: &str,
        org_id: Option<&str>,
        project_id: Option<&str>,
        identifier: &str,
    ) -> Result<FreezeConfig, FreezeError> {
        self.entries
            .get(&FreezeKey::new(account_id, org_id, project_id, identifier))
            .map(|entry| entry.config.clone())
            .ok_or_else(|| FreezeError::not_found(identifier))
    }

    /// Fetch the stored YAML document, unchanged
    pub fn get_yaml(
        &self,
        account_id: &str,
        org_id: Option<&str>,
        project_id: Option<&str>,
        identifier: &str,
    ) -> Result<String, FreezeError> {
        self.entries
            .get(&FreezeKey::new(account_id, org_id, project_id, identifier))
            .map(|entry| entry.yaml.clone())
            .ok_or_else(|| FreezeError::not_found(identifier))
    }

    /// Replace an existing config; absent configs are a distinct error
    pub fn update(&self, config: FreezeConfig) -> Result<(), FreezeError> {
        config.validate()?;
        let yaml = serde_yaml::to_string(&config)?;
        let key = FreezeKey::of(&config);
        match self.entries.entry(key) {
            dashmap::mapref::entry::Entry::Occupied(mut slot) => {
                slot.insert(StoredFreeze { config, yaml });
                Ok(())
            }
            dashmap::mapref::entry::Entry::Vacant(_) => Err(FreezeError::NotFound {
                identifier: config.identifier,
            }),
        }
    }

    /// Delete a config; absent configs are a distinct error
    pub fn delete(
        &self,
        account_id: &str,
        org_id: Option<&str>,
        project_id: Option<&str>,
        identifier: &str,
    ) -> Result<(), FreezeError> {
        self.entries
            .remove(&FreezeKey::new(account_id, org_id, project_id, identifier))
            .map(|_| ())
            .ok_or_else(|| FreezeError::not_found(identifier))
    }

    /// Toggle the scope level's global freeze, creating it on first use
    pub fn set_global_status(
        &self,
        account_id: &str,
        org_id: Option<&str>,
        project_id: Option<&str>,
        status: FreezeStatus,
        windows: Vec<FreezeWindow>,
    ) -> Result<(), FreezeError> {
        let config = FreezeConfig::build_global(
            account_id,
            org_id.map(str::to_string),
            project_id.map(str::to_string),
            status,
            windows,
        )?;
        let yaml = serde_yaml::to_string(&config)?;
        self.entries
            .insert(FreezeKey::of(&config), StoredFreeze { config, yaml });
        Ok(())
    }

    /// Number of stored configs
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl FreezeRegistry for InMemoryFreezeRegistry {
    async fn list_active_manual(
        &self,
        account_id: &str,
        org_id: Option<&str>,
        project_id: Option<&str>,
        status: FreezeStatus,
    ) -> Result<Vec<FreezeSummary>, FreezeError> {
        let summaries = self
            .entries
            .iter()
            .filter(|entry| {
                let config = &entry.config;
                config.freeze_type == FreezeType::Manual
                    && config.status == status
                    && config.account_id == account_id
                    && config.org_id.as_deref() == org_id
                    && config.project_id.as_deref() == project_id
            })
            .map(|entry| FreezeSummary::from(&entry.config))
            .collect();
        Ok(summaries)
    }

    async fn global_summary(
        &self,
        account_id: &str,
        org_id: Option<&str>,
        project_id: Option<&str>,
    ) -> Result<Option<FreezeSummary>, FreezeError> {
        Ok(self
            .entries
            .get(&FreezeKey::new(
                account_id,
                org_id,
                project_id,
                GLOBAL_FREEZE_IDENTIFIER,
            ))
            .map(|entry| FreezeSummary::from(&entry.config)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::freeze::types::{
        EntityConfig, FilterType, FreezeEntityRule, FreezeEntityType, WindowEnd,
    };
    use chrono::NaiveDate;

    fn window() -> FreezeWindow {
        FreezeWindow::build(
            "UTC",
            NaiveDate::from_ymd_opt(2023, 5, 1)
                .unwrap()
                .and_hms_opt(9, 0, 0)
                .unwrap(),
            WindowEnd::DurationMinutes(120),
            None,
        )
        .unwrap()
    }

    fn manual(identifier: &str) -> FreezeConfig {
        FreezeConfig::build_manual(
            "acct",
            None,
            None,
            identifier,
            "Freeze",
            FreezeStatus::Enabled,
            vec![window()],
            vec![FreezeEntityRule {
                name: "all".to_string(),
                entity_configs: vec![EntityConfig {
                    freeze_entity_type: FreezeEntityType::Service,
                    filter_type: FilterType::All,
                    entity_references: vec![],
                }],
            }],
        )
        .unwrap()
    }

    #[test]
    fn test_duplicate_identifier_rejected() {
        let registry = InMemoryFreezeRegistry::new();
        registry.create(manual("fr1")).unwrap();
        let err = registry.create(manual("fr1")).unwrap_err();
        assert!(matches!(err, FreezeError::AlreadyExists { .. }));
    }

    #[test]
    fn test_get_and_delete_distinguish_not_found() {
        let registry = InMemoryFreezeRegistry::new();
        let err = registry.get("acct", None, None, "fr1").unwrap_err();
        assert_eq!(err, FreezeError::not_found("fr1"));

        registry.create(manual("fr1")).unwrap();
        registry.delete("acct", None, None, "fr1").unwrap();
        let err = registry.delete("acct", None, None, "fr1").unwrap_err();
        assert_eq!(err, FreezeError::not_found("fr1"));
    }

    #[test]
    fn test_update_requires_existing_config() {
        let registry = InMemoryFreezeRegistry::new();
        let err = registry.update(manual("fr1")).unwrap_err();
        assert!(matches!(err, FreezeError::NotFound { .. }));
    }

    #[test]
    fn test_yaml_round_trip_is_unchanged() {
        let registry = InMemoryFreezeRegistry::new();
        let yaml = serde_yaml::to_string(&manual("fr1")).unwrap();
        registry.create_from_yaml(&yaml).unwrap();

        let stored = registry.get_yaml("acct", None, None, "fr1").unwrap();
        assert_eq!(stored, yaml);
    }

    #[tokio::test]
    async fn test_scope_levels_are_independent() {
        let registry = InMemoryFreezeRegistry::new();
        registry.create(manual("fr1")).unwrap();

        let account = registry
            .list_active_manual("acct", None, None, FreezeStatus::Enabled)
            .await
            .unwrap();
        assert_eq!(account.len(), 1);

        let org = registry
            .list_active_manual("acct", Some("org"), None, FreezeStatus::Enabled)
            .await
            .unwrap();
        assert!(org.is_empty());
    }

    #[tokio::test]
    async fn test_global_toggle_upserts() {
        let registry = InMemoryFreezeRegistry::new();
        assert!(registry
            .global_summary("acct", None, None)
            .await
            .unwrap()
            .is_none());

        registry
            .set_global_status("acct", None, None, FreezeStatus::Enabled, vec![])
            .unwrap();
        let summary = registry
            .global_summary("acct", None, None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(summary.status, FreezeStatus::Enabled);

        // toggling again replaces rather than duplicating
        registry
            .set_global_status("acct", None, None, FreezeStatus::Disabled, vec![])
            .unwrap();
        assert_eq!(registry.len(), 1);
    }
}
