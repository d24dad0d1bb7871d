//! Cross-step artifact store ("sweeping output").
//!
//! Write-once, scope-bound key/value records read by later forward steps and
//! by paired rollback steps. Writes are create-if-absent: a second write for
//! the same `(scope, instance, name)` is a programming error, not a retried
//! operation. Reads never mutate.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Scope an artifact is bound to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SweepingScope {
    /// Visible to every step of one workflow run
    WorkflowRun,
    /// Visible within one stage execution
    Stage,
    /// Visible across the whole pipeline
    Pipeline,
}

impl fmt::Display for SweepingScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WorkflowRun => write!(f, "workflow_run"),
            Self::Stage => write!(f, "stage"),
            Self::Pipeline => write!(f, "pipeline"),
        }
    }
}

/// Immutable artifact record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepingOutput {
    pub scope: SweepingScope,
    pub name: String,
    pub payload: serde_json::Value,
    pub recorded_at: DateTime<Utc>,
}

/// Errors raised by the artifact store
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SweepingOutputError {
    #[error("Sweeping output already exists: {scope} '{name}' in instance '{instance}'")]
    AlreadyExists {
        scope: SweepingScope,
        instance: String,
        name: String,
    },

    #[error("Sweeping output payload error for '{name}': {message}")]
    Payload { name: String, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct OutputKey {
    scope: SweepingScope,
    instance: String,
    name: String,
}

/// Thread-safe write-once store shared by concurrent runs.
///
/// `instance` identifies the scope instance: the plan execution id for
/// workflow-run scope, the stage execution id for stage scope, the pipeline
/// id for pipeline scope. Distinct runs never observe each other's records.
#[derive(Debug, Default)]
pub struct SweepingOutputStore {
    entries: DashMap<OutputKey, SweepingOutput>,
}

impl SweepingOutputStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an artifact, failing if one already exists under the key
    pub fn write(
        &self,
        scope: SweepingScope,
        instance: &str,
        name: &str,
        payload: serde_json::Value,
    ) -> Result<(), SweepingOutputError> {
        let key = OutputKey {
            scope,
            instance: instance.to_string(),
            name: name.to_string(),
        };
        match self.entries.entry(key) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                Err(SweepingOutputError::AlreadyExists {
                    scope,
                    instance: instance.to_string(),
                    name: name.to_string(),
                })
            }
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(SweepingOutput {
                    scope,
                    name: name.to_string(),
                    payload,
                    recorded_at: Utc::now(),
                });
                Ok(())
            }
        }
    }

    /// Read an artifact's payload; absent keys are not an error
    pub fn find(
        &self,
        scope: SweepingScope,
        instance: &str,
        name: &str,
    ) -> Option<serde_json::Value> {
        let key = OutputKey {
            scope,
            instance: instance.to_string(),
            name: name.to_string(),
        };
        self.entries.get(&key).map(|entry| entry.payload.clone())
    }

    /// Read and deserialize an artifact's payload
    pub fn find_typed<T: serde::de::DeserializeOwned>(
        &self,
        scope: SweepingScope,
        instance: &str,
        name: &str,
    ) -> Result<Option<T>, SweepingOutputError> {
        match self.find(scope, instance, name) {
            None => Ok(None),
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|e| SweepingOutputError::Payload {
                    name: name.to_string(),
                    message: e.to_string(),
                }),
        }
    }

    /// Number of recorded artifacts, across all scopes
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
