//! Scan ingestion lifecycle
//!
//! Each submitted media item moves forward through a fixed sequence of
//! states. `Failed` is reachable from every non-terminal state and there are
//! no transitions back.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::models::InfestationLevel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanState {
    Selected,
    Uploading,
    Uploaded,
    Detecting,
    Classified,
    Persisted,
    AlertEvaluated,
    Done,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("illegal scan transition from {from:?} to {to:?}")]
pub struct ScanTransitionError {
    pub from: ScanState,
    pub to: ScanState,
}

impl ScanState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ScanState::Done | ScanState::Failed)
    }

    /// The single forward successor, if any
    pub fn next(&self) -> Option<ScanState> {
        match self {
            ScanState::Selected => Some(ScanState::Uploading),
            ScanState::Uploading => Some(ScanState::Uploaded),
            ScanState::Uploaded => Some(ScanState::Detecting),
            ScanState::Detecting => Some(ScanState::Classified),
            ScanState::Classified => Some(ScanState::Persisted),
            ScanState::Persisted => Some(ScanState::AlertEvaluated),
            ScanState::AlertEvaluated => Some(ScanState::Done),
            ScanState::Done | ScanState::Failed => None,
        }
    }

    pub fn can_transition_to(&self, to: ScanState) -> bool {
        if self.is_terminal() {
            return false;
        }
        to == ScanState::Failed || self.next() == Some(to)
    }

    pub fn transition(self, to: ScanState) -> Result<ScanState, ScanTransitionError> {
        if self.can_transition_to(to) {
            Ok(to)
        } else {
            Err(ScanTransitionError { from: self, to })
        }
    }

    /// Move to the forward successor
    pub fn advance(self) -> Result<ScanState, ScanTransitionError> {
        match self.next() {
            Some(next) => Ok(next),
            None => Err(ScanTransitionError {
                from: self,
                to: self,
            }),
        }
    }

    pub fn fail(self) -> Result<ScanState, ScanTransitionError> {
        self.transition(ScanState::Failed)
    }
}

/// What happens to the rest of a batch once one item fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchPolicy {
    /// Stop at the first failure; items already persisted stay persisted
    #[default]
    AbortOnFirstError,
    /// Attempt every item and report each outcome
    ContinueOnError,
}

/// Result of one item in a batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ScanOutcome {
    Completed {
        file_name: String,
        report_id: Uuid,
        infestation_level: InfestationLevel,
        alert_raised: bool,
    },
    Failed {
        file_name: String,
        /// State the item was in when it failed
        failed_at: ScanState,
        error: String,
    },
    /// Not attempted because an earlier item failed
    Skipped { file_name: String },
}

impl ScanOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, ScanOutcome::Completed { .. })
    }

    pub fn file_name(&self) -> &str {
        match self {
            ScanOutcome::Completed { file_name, .. }
            | ScanOutcome::Failed { file_name, .. }
            | ScanOutcome::Skipped { file_name } => file_name,
        }
    }
}

/// Outcome of a whole batch, in submission order
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BatchReport {
    pub outcomes: Vec<ScanOutcome>,
}

impl BatchReport {
    pub fn completed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_completed()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, ScanOutcome::Failed { .. }))
            .count()
    }

    pub fn first_error(&self) -> Option<&str> {
        self.outcomes.iter().find_map(|o| match o {
            ScanOutcome::Failed { error, .. } => Some(error.as_str()),
            _ => None,
        })
    }
}
