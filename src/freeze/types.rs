//! Freeze configuration value types.
//!
//! Configurations are immutable once built: the constructors validate and
//! return fully-formed values, preserving the write-once invariants the
//! registry and recorder rely on.

use super::errors::FreezeError;
use crate::constants::{system, GLOBAL_FREEZE_IDENTIFIER};
use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Manual freezes are explicitly authored rules; the global freeze is a
/// single scope-wide switch per level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FreezeType {
    Manual,
    Global,
}

/// Organizational level a freeze config applies at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FreezeScope {
    Account,
    Org,
    Project,
}

impl fmt::Display for FreezeScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Account => write!(f, "account"),
            Self::Org => write!(f, "org"),
            Self::Project => write!(f, "project"),
        }
    }
}

/// Whether a freeze config participates in evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FreezeStatus {
    Enabled,
    Disabled,
}

/// Kinds of entities a freeze rule can target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FreezeEntityType {
    Service,
    Environment,
    EnvironmentType,
    Org,
    Project,
    Pipeline,
}

/// How an entity config filters the execution's entities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterType {
    All,
    Equals,
    NotEquals,
}

/// Entities of an execution, keyed by type
pub type EntityMap = HashMap<FreezeEntityType, Vec<String>>;

/// One filter within a freeze rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityConfig {
    pub freeze_entity_type: FreezeEntityType,
    pub filter_type: FilterType,
    #[serde(default)]
    pub entity_references: Vec<String>,
}

/// A named conjunction of entity configs; a freeze matches an execution
/// when any of its rules matches
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FreezeEntityRule {
    pub name: String,
    pub entity_configs: Vec<EntityConfig>,
}

/// Recurrence cadence for a freeze window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecurrencePattern {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

/// Rule generating an infinite, lazily-produced sequence of future window
/// occurrences from one base window
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Recurrence {
    pub pattern: RecurrencePattern,
    /// Last instant an occurrence may start; unbounded when absent
    pub until: Option<NaiveDateTime>,
    /// Repeat every N units of the pattern; defaults to 1
    pub every: Option<u32>,
}

/// How a window's end is specified at build time
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WindowEnd {
    DurationMinutes(i64),
    EndTime(NaiveDateTime),
}

/// A validated freeze time window.
///
/// `duration_minutes` and `end_time` are mutually derivable; both are kept
/// so either view is available without recomputation. Times are local to
/// the window's own timezone, a fixed UTC offset such as `"UTC"` or
/// `"+05:30"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FreezeWindow {
    pub timezone: String,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub duration_minutes: i64,
    pub recurrence: Option<Recurrence>,
}

impl FreezeWindow {
    /// Build a validated window
    pub fn build(
        timezone: impl Into<String>,
        start_time: NaiveDateTime,
        end: WindowEnd,
        recurrence: Option<Recurrence>,
    ) -> Result<Self, FreezeError> {
        let timezone = timezone.into();
        super::window::parse_timezone(&timezone)?;

        let (end_time, duration_minutes) = match end {
            WindowEnd::DurationMinutes(minutes) => {
                let end_time = start_time
                    .checked_add_signed(Duration::minutes(minutes))
                    .ok_or_else(|| FreezeError::invalid_window("duration overflows"))?;
                (end_time, minutes)
            }
            WindowEnd::EndTime(end_time) => {
                let duration = end_time.signed_duration_since(start_time);
                (end_time, duration.num_minutes())
            }
        };

        if duration_minutes < system::MIN_FREEZE_WINDOW_MINUTES {
            return Err(FreezeError::invalid_window(format!(
                "window must last at least {} minutes",
                system::MIN_FREEZE_WINDOW_MINUTES
            )));
        }
        if duration_minutes > system::MAX_FREEZE_WINDOW_DAYS * 24 * 60 {
            return Err(FreezeError::invalid_window(format!(
                "window must not exceed {} days",
                system::MAX_FREEZE_WINDOW_DAYS
            )));
        }
        if let Some(recurrence) = &recurrence {
            if let Some(until) = recurrence.until {
                if until < start_time {
                    return Err(FreezeError::invalid_window(
                        "recurrence ends before the window starts",
                    ));
                }
            }
            if recurrence.every == Some(0) {
                return Err(FreezeError::invalid_window(
                    "recurrence interval must be at least 1",
                ));
            }
        }

        Ok(Self {
            timezone,
            start_time,
            end_time,
            duration_minutes,
            recurrence,
        })
    }
}

/// A freeze configuration scoped to an account, org, or project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FreezeConfig {
    pub account_id: String,
    pub org_id: Option<String>,
    pub project_id: Option<String>,
    pub identifier: String,
    pub name: String,
    pub description: Option<String>,
    pub freeze_type: FreezeType,
    pub scope: FreezeScope,
    pub status: FreezeStatus,
    #[serde(default)]
    pub windows: Vec<FreezeWindow>,
    #[serde(default)]
    pub rules: Vec<FreezeEntityRule>,
}

impl FreezeConfig {
    /// Build a validated manual freeze
    #[allow(clippy::too_many_arguments)]
    pub fn build_manual(
        account_id: impl Into<String>,
        org_id: Option<String>,
        project_id: Option<String>,
        identifier: impl Into<String>,
        name: impl Into<String>,
        status: FreezeStatus,
        windows: Vec<FreezeWindow>,
        rules: Vec<FreezeEntityRule>,
    ) -> Result<Self, FreezeError> {
        let scope = scope_for(org_id.as_deref(), project_id.as_deref());
        let config = Self {
            account_id: account_id.into(),
            org_id,
            project_id,
            identifier: identifier.into(),
            name: name.into(),
            description: None,
            freeze_type: FreezeType::Manual,
            scope,
            status,
            windows,
            rules,
        };
        config.validate()?;
        Ok(config)
    }

    /// Build the global freeze for a scope level. The identifier is always
    /// the reserved one.
    pub fn build_global(
        account_id: impl Into<String>,
        org_id: Option<String>,
        project_id: Option<String>,
        status: FreezeStatus,
        windows: Vec<FreezeWindow>,
    ) -> Result<Self, FreezeError> {
        let scope = scope_for(org_id.as_deref(), project_id.as_deref());
        let config = Self {
            account_id: account_id.into(),
            org_id,
            project_id,
            identifier: GLOBAL_FREEZE_IDENTIFIER.to_string(),
            name: "Global Freeze".to_string(),
            description: None,
            freeze_type: FreezeType::Global,
            scope,
            status,
            windows,
            rules: Vec::new(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate invariants, also applied to deserialized configs
    pub fn validate(&self) -> Result<(), FreezeError> {
        if self.account_id.is_empty() {
            return Err(FreezeError::invalid_config("account id is required"));
        }
        if self.identifier.is_empty() {
            return Err(FreezeError::invalid_config("identifier is required"));
        }
        if self.project_id.is_some() && self.org_id.is_none() {
            return Err(FreezeError::invalid_config(
                "a project-scoped freeze requires an org id",
            ));
        }
        if self.scope != scope_for(self.org_id.as_deref(), self.project_id.as_deref()) {
            return Err(FreezeError::invalid_config(
                "scope does not match the supplied org/project ids",
            ));
        }
        match self.freeze_type {
            FreezeType::Manual => {
                if self.identifier == GLOBAL_FREEZE_IDENTIFIER {
                    return Err(FreezeError::invalid_config(
                        "the global identifier is reserved",
                    ));
                }
                if self.windows.is_empty() {
                    return Err(FreezeError::invalid_config(
                        "a manual freeze requires at least one window",
                    ));
                }
                if self.rules.is_empty() {
                    return Err(FreezeError::invalid_config(
                        "a manual freeze requires at least one entity rule",
                    ));
                }
            }
            FreezeType::Global => {
                if self.identifier != GLOBAL_FREEZE_IDENTIFIER {
                    return Err(FreezeError::invalid_config(
                        "a global freeze must use the reserved identifier",
                    ));
                }
                if !self.rules.is_empty() {
                    return Err(FreezeError::invalid_config(
                        "a global freeze carries no entity rules",
                    ));
                }
            }
        }
        Ok(())
    }
}

fn scope_for(org_id: Option<&str>, project_id: Option<&str>) -> FreezeScope {
    match (org_id, project_id) {
        (Some(_), Some(_)) => FreezeScope::Project,
        (Some(_), None) => FreezeScope::Org,
        _ => FreezeScope::Account,
    }
}

/// Evaluation-facing view of a freeze config, with the next upcoming
/// occurrence resolved at query time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FreezeSummary {
    pub account_id: String,
    pub org_id: Option<String>,
    pub project_id: Option<String>,
    pub identifier: String,
    pub name: String,
    pub freeze_type: FreezeType,
    pub scope: FreezeScope,
    pub status: FreezeStatus,
    pub windows: Vec<FreezeWindow>,
    pub rules: Vec<FreezeEntityRule>,
    /// Epoch millis of the first future occurrence, unset when exhausted
    pub next_iteration: Option<i64>,
}

impl From<&FreezeConfig> for FreezeSummary {
    fn from(config: &FreezeConfig) -> Self {
        Self {
            account_id: config.account_id.clone(),
            org_id: config.org_id.clone(),
            project_id: config.project_id.clone(),
            identifier: config.identifier.clone(),
            name: config.name.clone(),
            freeze_type: config.freeze_type,
            scope: config.scope,
            status: config.status,
            windows: config.windows.clone(),
            rules: config.rules.clone(),
            next_iteration: None,
        }
    }
}

/// Audit snapshot of the freezes that were active for one execution.
/// Written once, immutable thereafter; schema changes are additive only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrozenExecution {
    pub account_id: String,
    pub org_id: Option<String>,
    pub project_id: Option<String>,
    pub plan_execution_id: String,
    pub stage_execution_id: String,
    pub pipeline_id: String,
    pub manual_freeze_list: Vec<FreezeSummary>,
    pub global_freeze_list: Vec<FreezeSummary>,
    pub created_at: DateTime<Utc>,
}
