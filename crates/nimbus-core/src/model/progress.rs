//! Progress log — the sibling mutable-state store for a `Plan` (§3, §4.G
//! step 4). Indexed by `PhaseId` so it can be persisted independently of
//! the immutable plan and replayed on resume.

use super::phase::{PhaseId, PhaseState};
use crate::error::ErrorClass;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressEntry {
    pub state: PhaseState,
    pub error_class: Option<ErrorClassDto>,
    pub message: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// Serialisable mirror of `ErrorClass` (which itself carries no data and
/// derives no serde impls, living in the error-handling module instead).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorClassDto {
    Transient,
    PreconditionFailed,
    PermanentOperational,
    Cancelled,
}

impl From<ErrorClass> for ErrorClassDto {
    fn from(c: ErrorClass) -> Self {
        match c {
            ErrorClass::Transient => ErrorClassDto::Transient,
            ErrorClass::PreconditionFailed => ErrorClassDto::PreconditionFailed,
            ErrorClass::PermanentOperational => ErrorClassDto::PermanentOperational,
            ErrorClass::Cancelled => ErrorClassDto::Cancelled,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProgressLog {
    entries: HashMap<PhaseId, ProgressEntry>,
}

impl ProgressLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state_of(&self, id: &PhaseId) -> PhaseState {
        self.entries
            .get(id)
            .map(|e| e.state)
            .unwrap_or(PhaseState::Unstarted)
    }

    pub fn set_state(&mut self, id: &PhaseId, state: PhaseState) {
        let entry = self.entries.entry(id.clone()).or_insert_with(|| ProgressEntry {
            state: PhaseState::Unstarted,
            error_class: None,
            message: None,
            updated_at: Utc::now(),
        });
        entry.state = state;
        entry.updated_at = Utc::now();
    }

    pub fn set_failed(&mut self, id: &PhaseId, class: ErrorClass, message: impl Into<String>) {
        self.entries.insert(
            id.clone(),
            ProgressEntry {
                state: PhaseState::Failed,
                error_class: Some(class.into()),
                message: Some(message.into()),
                updated_at: Utc::now(),
            },
        );
    }

    pub fn is_completed(&self, id: &PhaseId) -> bool {
        self.state_of(id) == PhaseState::Completed
    }

    pub fn entries(&self) -> impl Iterator<Item = (&PhaseId, &ProgressEntry)> {
        self.entries.iter()
    }

    pub fn any_failed(&self) -> bool {
        self.entries.values().any(|e| e.state == PhaseState::Failed)
    }
}
