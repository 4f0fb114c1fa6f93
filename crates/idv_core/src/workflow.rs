//! Stage state machine of the verification pipeline.
//!
//! Both topologies follow the same sequencing contract:
//! ingest -> write details -> verify face -> verify document -> submit license.
//! A stage that succeeds advances the run; any failure (including a mismatch)
//! aborts it. Outcomes already written by earlier stages stay in place.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::contract::StageResponse;
use crate::error::VerificationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Ingest,
    WriteDetails,
    VerifyFace,
    VerifyDocument,
    SubmitLicense,
}

impl Stage {
    pub const ORDER: [Stage; 5] = [
        Stage::Ingest,
        Stage::WriteDetails,
        Stage::VerifyFace,
        Stage::VerifyDocument,
        Stage::SubmitLicense,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ingest => "ingest",
            Self::WriteDetails => "write_details",
            Self::VerifyFace => "verify_face",
            Self::VerifyDocument => "verify_document",
            Self::SubmitLicense => "submit_license",
        }
    }

    pub fn next(self) -> Option<Stage> {
        let position = Self::ORDER.iter().position(|stage| *stage == self)?;
        Self::ORDER.get(position + 1).copied()
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    Advance(Stage),
    Complete,
    Abort {
        stage: Stage,
        error: VerificationError,
    },
}

/// Transition table: advance on success, abort on failure.
pub fn transition(stage: Stage, outcome: &Result<(), VerificationError>) -> Transition {
    match outcome {
        Ok(()) => match stage.next() {
            Some(next) => Transition::Advance(next),
            None => Transition::Complete,
        },
        Err(error) => Transition::Abort {
            stage,
            error: error.clone(),
        },
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowState {
    Pending(Stage),
    Completed,
    Aborted {
        stage: Stage,
        error: VerificationError,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageRecord {
    pub stage: Stage,
    pub outcome: Result<(), VerificationError>,
}

/// Progress of one application through the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowRun {
    state: WorkflowState,
    history: Vec<StageRecord>,
}

impl Default for WorkflowRun {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkflowRun {
    pub fn new() -> Self {
        Self {
            state: WorkflowState::Pending(Stage::Ingest),
            history: Vec::with_capacity(Stage::ORDER.len()),
        }
    }

    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    pub fn history(&self) -> &[StageRecord] {
        &self.history
    }

    /// Stage waiting to run, `None` once the run is terminal.
    pub fn current_stage(&self) -> Option<Stage> {
        match self.state {
            WorkflowState::Pending(stage) => Some(stage),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.current_stage().is_none()
    }

    /// Applies the outcome of the current stage. Terminal runs ignore further
    /// outcomes.
    pub fn finish_stage(&mut self, outcome: Result<(), VerificationError>) -> &WorkflowState {
        let Some(stage) = self.current_stage() else {
            return &self.state;
        };

        self.state = match transition(stage, &outcome) {
            Transition::Advance(next) => WorkflowState::Pending(next),
            Transition::Complete => WorkflowState::Completed,
            Transition::Abort { stage, error } => WorkflowState::Aborted { stage, error },
        };
        self.history.push(StageRecord { stage, outcome });
        &self.state
    }

    pub fn response(&self) -> StageResponse {
        match &self.state {
            WorkflowState::Completed => {
                StageResponse::success("Customer verification pipeline completed")
            }
            WorkflowState::Aborted { stage, error } => {
                StageResponse::failure(format!("Error in {stage}: {error}"))
            }
            WorkflowState::Pending(stage) => {
                StageResponse::failure(format!("Pipeline stopped before {stage}"))
            }
        }
    }
}
