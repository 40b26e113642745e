use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};

use super::DocumentId;

/// Append-only record of one pipeline stage attempt. Never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessingLogEntry {
    pub document_id: DocumentId,
    pub step: ProcessingStep,
    pub outcome: StepOutcome,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl ProcessingLogEntry {
    pub fn new(
        document_id: DocumentId,
        step: ProcessingStep,
        outcome: StepOutcome,
        message: impl Into<String>,
    ) -> Self {
        Self {
            document_id,
            step,
            outcome,
            message: message.into(),
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProcessingStep {
    Upload,
    ProcessingStart,
    ProcessingComplete,
    ProcessingError,
    Analysis,
}

impl ProcessingStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessingStep::Upload => "UPLOAD",
            ProcessingStep::ProcessingStart => "PROCESSING_START",
            ProcessingStep::ProcessingComplete => "PROCESSING_COMPLETE",
            ProcessingStep::ProcessingError => "PROCESSING_ERROR",
            ProcessingStep::Analysis => "ANALYSIS",
        }
    }
}

impl FromStr for ProcessingStep {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "UPLOAD" => Ok(ProcessingStep::Upload),
            "PROCESSING_START" => Ok(ProcessingStep::ProcessingStart),
            "PROCESSING_COMPLETE" => Ok(ProcessingStep::ProcessingComplete),
            "PROCESSING_ERROR" => Ok(ProcessingStep::ProcessingError),
            "ANALYSIS" => Ok(ProcessingStep::Analysis),
            _ => Err(format!("Invalid processing step: {}", s)),
        }
    }
}

impl fmt::Display for ProcessingStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepOutcome {
    Started,
    Completed,
    Failed,
}

impl StepOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepOutcome::Started => "STARTED",
            StepOutcome::Completed => "COMPLETED",
            StepOutcome::Failed => "FAILED",
        }
    }
}

impl FromStr for StepOutcome {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "STARTED" => Ok(StepOutcome::Started),
            "COMPLETED" => Ok(StepOutcome::Completed),
            "FAILED" => Ok(StepOutcome::Failed),
            _ => Err(format!("Invalid step outcome: {}", s)),
        }
    }
}

impl fmt::Display for StepOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
