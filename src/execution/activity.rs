//! Append-only activity audit records.
//!
//! One record is created when a step starts and updated exactly once when
//! the step reaches a terminal status. A second terminal update is an error,
//! never a silent overwrite.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Status of an activity record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityStatus {
    Running,
    Success,
    Failed,
}

impl ActivityStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success | Self::Failed)
    }
}

impl fmt::Display for ActivityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Running => write!(f, "running"),
            Self::Success => write!(f, "success"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Audit entry for one step execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub id: Uuid,
    pub step_id: String,
    pub name: String,
    pub status: ActivityStatus,
    pub command_units: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub last_updated_at: DateTime<Utc>,
}

/// Errors raised by the activity store
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ActivityError {
    #[error("Activity not found: {id}")]
    NotFound { id: Uuid },

    #[error("Activity {id} is already terminal ({status})")]
    AlreadyTerminal { id: Uuid, status: ActivityStatus },

    #[error("Activity {id} cannot be completed with non-terminal status {status}")]
    NonTerminalStatus { id: Uuid, status: ActivityStatus },
}

/// Thread-safe activity record store
#[derive(Debug, Default)]
pub struct ActivityStore {
    records: DashMap<Uuid, ActivityRecord>,
}

impl ActivityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the record for a starting step
    pub fn create(
        &self,
        step_id: impl Into<String>,
        name: impl Into<String>,
        command_units: Vec<String>,
    ) -> ActivityRecord {
        let now = Utc::now();
        let record = ActivityRecord {
            id: Uuid::new_v4(),
            step_id: step_id.into(),
            name: name.into(),
            status: ActivityStatus::Running,
            command_units,
            created_at: now,
            last_updated_at: now,
        };
        self.records.insert(record.id, record.clone());
        record
    }

    /// Move a record to its terminal status, exactly once
    pub fn complete(&self, id: Uuid, status: ActivityStatus) -> Result<ActivityRecord, ActivityError> {
        if !status.is_terminal() {
            return Err(ActivityError::NonTerminalStatus { id, status });
        }
        let mut entry = self
            .records
            .get_mut(&id)
            .ok_or(ActivityError::NotFound { id })?;
        if entry.status.is_terminal() {
            return Err(ActivityError::AlreadyTerminal {
                id,
                status: entry.status,
            });
        }
        entry.status = status;
        entry.last_updated_at = Utc::now();
        Ok(entry.clone())
    }

    /// Fetch a record by id
    pub fn get(&self, id: Uuid) -> Option<ActivityRecord> {
        self.records.get(&id).map(|entry| entry.clone())
    }

    /// Number of records held
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_starts_running() {
        let store = ActivityStore::new();
        let record = store.create("step-1", "Setup", vec!["setup".to_string()]);
        assert_eq!(record.status, ActivityStatus::Running);
        assert_eq!(store.get(record.id).unwrap().step_id, "step-1");
    }

    #[test]
    fn test_complete_exactly_once() {
        let store = ActivityStore::new();
        let record = store.create("step-1", "Setup", vec![]);

        let updated = store.complete(record.id, ActivityStatus::Success).unwrap();
        assert_eq!(updated.status, ActivityStatus::Success);

        let err = store.complete(record.id, ActivityStatus::Failed).unwrap_err();
        assert_eq!(
            err,
            ActivityError::AlreadyTerminal {
                id: record.id,
                status: ActivityStatus::Success
            }
        );
    }

    #[test]
    fn test_complete_requires_terminal_status() {
        let store = ActivityStore::new();
        let record = store.create("step-1", "Setup", vec![]);
        let err = store.complete(record.id, ActivityStatus::Running).unwrap_err();
        assert!(matches!(err, ActivityError::NonTerminalStatus { .. }));
    }

    #[test]
    fn test_unknown_id_is_not_found() {
        let store = ActivityStore::new();
        let err = store.complete(Uuid::new_v4(), ActivityStatus::Failed).unwrap_err();
        assert!(matches!(err, ActivityError::NotFound { .. }));
    }
}
