pub mod keys;

use bytes::Bytes;
use std::fmt;

/// A single document received in an ingest request.
#[derive(Debug, Clone)]
pub struct FileDescriptor {
    pub name: String,
    pub bytes: Bytes,
}

impl FileDescriptor {
    pub fn new(name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeStatus {
    Success,
    ValidationError,
    ProcessingError,
}

impl OutcomeStatus {
    pub fn is_success(self) -> bool {
        matches!(self, OutcomeStatus::Success)
    }
}

/// Terminal result for one submitted file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessingOutcome {
    pub filename: String,
    pub status: OutcomeStatus,
    pub message: Option<String>,
}

impl ProcessingOutcome {
    pub fn success(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            status: OutcomeStatus::Success,
            message: None,
        }
    }

    pub fn validation_error(filename: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            status: OutcomeStatus::ValidationError,
            message: Some(message.into()),
        }
    }

    pub fn processing_error(filename: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            status: OutcomeStatus::ProcessingError,
            message: Some(message.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

/// Aggregated result of one ingest call.
///
/// `processed + failed` always equals the number of submitted files once the
/// batch has completed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub processed: usize,
    pub failed: usize,
    pub results: Vec<ProcessingOutcome>,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.processed + self.failed
    }
}

/// Per-file pipeline state. The first five are progress stages; the last
/// three are terminal and mirror `OutcomeStatus`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStage {
    Received,
    Validated,
    OriginalStored,
    Transcribed,
    TextStored,
    Succeeded,
    Rejected,
    Failed,
}

impl FileStage {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            FileStage::Succeeded | FileStage::Rejected | FileStage::Failed
        )
    }
}

impl From<OutcomeStatus> for FileStage {
    fn from(status: OutcomeStatus) -> Self {
        match status {
            OutcomeStatus::Success => FileStage::Succeeded,
            OutcomeStatus::ValidationError => FileStage::Rejected,
            OutcomeStatus::ProcessingError => FileStage::Failed,
        }
    }
}

impl fmt::Display for FileStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FileStage::Received => "received",
            FileStage::Validated => "validated",
            FileStage::OriginalStored => "original_stored",
            FileStage::Transcribed => "transcribed",
            FileStage::TextStored => "text_stored",
            FileStage::Succeeded => "succeeded",
            FileStage::Rejected => "rejected",
            FileStage::Failed => "failed",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_stage_follows_outcome() {
        assert_eq!(FileStage::from(OutcomeStatus::Success), FileStage::Succeeded);
        assert_eq!(FileStage::from(OutcomeStatus::ValidationError), FileStage::Rejected);
        assert_eq!(FileStage::from(OutcomeStatus::ProcessingError), FileStage::Failed);
        assert!(FileStage::Failed.is_terminal());
        assert!(!FileStage::TextStored.is_terminal());
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(FileStage::OriginalStored.to_string(), "original_stored");
        assert_eq!(FileStage::TextStored.to_string(), "text_stored");
        assert_eq!(FileStage::Rejected.to_string(), "rejected");
    }
}
