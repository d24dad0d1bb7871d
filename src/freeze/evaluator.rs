//! Pure freeze evaluation logic.
//!
//! Entity matching, temporal matching, and hierarchy aggregation over the
//! registry's read contract. The evaluator never short-circuits on the
//! first active freeze: callers report every concurrently-active block for
//! operator visibility. Any scope level's lookup failure fails the whole
//! evaluation — a safety gate must never report "clear" because one query
//! was skipped.

use super::errors::FreezeError;
use super::registry::FreezeRegistry;
use super::types::{
    EntityConfig, EntityMap, FilterType, FreezeEntityRule, FreezeEntityType, FreezeStatus,
    FreezeSummary,
};
use super::window;
use crate::logging::log_freeze_evaluation;
use chrono::{DateTime, Utc};
use futures::future::try_join3;
use std::sync::Arc;

/// Check one entity config against an execution's entity map
pub fn entity_config_matches(config: &EntityConfig, entity_map: &EntityMap) -> bool {
    match config.filter_type {
        FilterType::All => true,
        FilterType::Equals => entity_map
            .get(&config.freeze_entity_type)
            .map_or(false, |ids| {
                ids.iter().any(|id| config.entity_references.contains(id))
            }),
        FilterType::NotEquals => entity_map
            .get(&config.freeze_entity_type)
            .map_or(true, |ids| {
                !ids.iter().any(|id| config.entity_references.contains(id))
            }),
    }
}

/// All entity configs of a rule must match
pub fn rule_matches(rule: &FreezeEntityRule, entity_map: &EntityMap) -> bool {
    rule.entity_configs
        .iter()
        .all(|config| entity_config_matches(config, entity_map))
}

/// A freeze matches the execution when any of its rules matches. A freeze
/// with no rules (the global switch) matches everything.
pub fn freeze_matches(summary: &FreezeSummary, entity_map: &EntityMap) -> bool {
    summary.rules.is_empty() || summary.rules.iter().any(|rule| rule_matches(rule, entity_map))
}

/// Hierarchical freeze evaluation over a registry's read contract
pub struct FreezeEvaluator {
    registry: Arc<dyn FreezeRegistry>,
}

impl FreezeEvaluator {
    pub fn new(registry: Arc<dyn FreezeRegistry>) -> Self {
        Self { registry }
    }

    /// Everything blocking the execution right now: the union of active
    /// manual and global freezes across all applicable scope levels. An
    /// empty result means "not blocked".
    pub async fn is_blocked(
        &self,
        account_id: &str,
        org_id: Option<&str>,
        project_id: Option<&str>,
        pipeline_id: Option<&str>,
        entity_map: &EntityMap,
    ) -> Result<Vec<FreezeSummary>, FreezeError> {
        self.is_blocked_at(
            account_id,
            org_id,
            project_id,
            pipeline_id,
            entity_map,
            Utc::now(),
        )
        .await
    }

    /// [`Self::is_blocked`] evaluated at an explicit instant
    pub async fn is_blocked_at(
        &self,
        account_id: &str,
        org_id: Option<&str>,
        project_id: Option<&str>,
        pipeline_id: Option<&str>,
        entity_map: &EntityMap,
        now: DateTime<Utc>,
    ) -> Result<Vec<FreezeSummary>, FreezeError> {
        let mut effective = entity_map.clone();
        if let Some(pipeline) = pipeline_id {
            effective
                .entry(FreezeEntityType::Pipeline)
                .or_default()
                .push(pipeline.to_string());
        }

        let mut blocking = self
            .active_manual_freezes_at(account_id, org_id, project_id, &effective, now)
            .await?;
        blocking.extend(
            self.active_global_freezes_at(account_id, org_id, project_id, now)
                .await?,
        );

        log_freeze_evaluation(
            account_id,
            org_id,
            project_id,
            blocking.len(),
            pipeline_id,
        );
        Ok(blocking)
    }

    /// Active manual freezes across the applicable scope levels.
    ///
    /// Account is always queried; org iff an org id is supplied; project
    /// iff both org and project ids are supplied. The three lookups run
    /// concurrently and their union is order-independent.
    pub async fn active_manual_freezes_at(
        &self,
        account_id: &str,
        org_id: Option<&str>,
        project_id: Option<&str>,
        entity_map: &EntityMap,
        now: DateTime<Utc>,
    ) -> Result<Vec<FreezeSummary>, FreezeError> {
        let account_level =
            self.registry
                .list_active_manual(account_id, None, None, FreezeStatus::Enabled);
        let org_level = async {
            match org_id {
                Some(org) => {
                    self.registry
                        .list_active_manual(account_id, Some(org), None, FreezeStatus::Enabled)
                        .await
                }
                None => Ok(Vec::new()),
            }
        };
        let project_level = async {
            match (org_id, project_id) {
                (Some(org), Some(project)) => {
                    self.registry
                        .list_active_manual(
                            account_id,
                            Some(org),
                            Some(project),
                            FreezeStatus::Enabled,
                        )
                        .await
                }
                _ => Ok(Vec::new()),
            }
        };

        let (account, org, project) = try_join3(account_level, org_level, project_level).await?;

        let mut active = Vec::new();
        for summary in account.into_iter().chain(org).chain(project) {
            if !freeze_matches(&summary, entity_map) {
                continue;
            }
            if self.currently_active(&summary, now)? {
                active.push(with_next_iteration(summary, now)?);
            }
        }
        Ok(active)
    }

    /// Active global freezes across the applicable scope levels
    pub async fn active_global_freezes_at(
        &self,
        account_id: &str,
        org_id: Option<&str>,
        project_id: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Vec<FreezeSummary>, FreezeError> {
        let account_level = self.registry.global_summary(account_id, None, None);
        let org_level = async {
            match org_id {
                Some(org) => self.registry.global_summary(account_id, Some(org), None).await,
                None => Ok(None),
            }
        };
        let project_level = async {
            match (org_id, project_id) {
                (Some(org), Some(project)) => {
                    self.registry
                        .global_summary(account_id, Some(org), Some(project))
                        .await
                }
                _ => Ok(None),
            }
        };

        let (account, org, project) = try_join3(account_level, org_level, project_level).await?;

        let mut active = Vec::new();
        for summary in [account, org, project].into_iter().flatten() {
            if summary.status != FreezeStatus::Enabled {
                continue;
            }
            if self.currently_active(&summary, now)? {
                active.push(with_next_iteration(summary, now)?);
            }
        }
        Ok(active)
    }

    /// Enabled, and inside a window right now. A freeze without windows is
    /// active whenever enabled (the global switch case).
    fn currently_active(
        &self,
        summary: &FreezeSummary,
        now: DateTime<Utc>,
    ) -> Result<bool, FreezeError> {
        if summary.status != FreezeStatus::Enabled {
            return Ok(false);
        }
        if summary.windows.is_empty() {
            return Ok(true);
        }
        for w in &summary.windows {
            if window::window_active_at(w, now)? {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

/// Resolve the summary's next upcoming occurrence across its windows
fn with_next_iteration(
    mut summary: FreezeSummary,
    now: DateTime<Utc>,
) -> Result<FreezeSummary, FreezeError> {
    let mut earliest: Option<i64> = None;
    for w in &summary.windows {
        if let Some(next) = window::next_iteration(w, now)? {
            earliest = Some(earliest.map_or(next, |current| current.min(next)));
        }
    }
    summary.next_iteration = earliest;
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn entity_map(pairs: &[(FreezeEntityType, &[&str])]) -> EntityMap {
        pairs
            .iter()
            .map(|(ty, ids)| (*ty, ids.iter().map(|s| s.to_string()).collect()))
            .collect()
    }

    fn config(
        ty: FreezeEntityType,
        filter: FilterType,
        references: &[&str],
    ) -> EntityConfig {
        EntityConfig {
            freeze_entity_type: ty,
            filter_type: filter,
            entity_references: references.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_all_filter_always_matches() {
        let c = config(FreezeEntityType::Service, FilterType::All, &[]);
        assert!(entity_config_matches(&c, &entity_map(&[])));
        assert!(entity_config_matches(
            &c,
            &entity_map(&[(FreezeEntityType::Service, &["svc1"])])
        ));
    }

    #[test]
    fn test_equals_requires_intersection() {
        let c = config(FreezeEntityType::Service, FilterType::Equals, &["svc1", "svc2"]);
        assert!(entity_config_matches(
            &c,
            &entity_map(&[(FreezeEntityType::Service, &["svc2"])])
        ));
        assert!(!entity_config_matches(
            &c,
            &entity_map(&[(FreezeEntityType::Service, &["svc9"])])
        ));
        // key absent: no intersection possible
        assert!(!entity_config_matches(&c, &entity_map(&[])));
    }

    #[test]
    fn test_not_equals_matches_absent_key_or_empty_intersection() {
        let c = config(FreezeEntityType::Environment, FilterType::NotEquals, &["prod"]);
        assert!(entity_config_matches(&c, &entity_map(&[])));
        assert!(entity_config_matches(
            &c,
            &entity_map(&[(FreezeEntityType::Environment, &["dev"])])
        ));
        assert!(!entity_config_matches(
            &c,
            &entity_map(&[(FreezeEntityType::Environment, &["prod"])])
        ));
    }

    #[test]
    fn test_rule_is_a_conjunction() {
        let rule = FreezeEntityRule {
            name: "prod services".to_string(),
            entity_configs: vec![
                config(FreezeEntityType::Service, FilterType::Equals, &["svc1"]),
                config(FreezeEntityType::Environment, FilterType::Equals, &["prod"]),
            ],
        };

        assert!(rule_matches(
            &rule,
            &entity_map(&[
                (FreezeEntityType::Service, &["svc1"]),
                (FreezeEntityType::Environment, &["prod"]),
            ])
        ));
        assert!(!rule_matches(
            &rule,
            &entity_map(&[
                (FreezeEntityType::Service, &["svc1"]),
                (FreezeEntityType::Environment, &["dev"]),
            ])
        ));
    }
}
