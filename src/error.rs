use std::fmt;

/// Result type for agent operations
pub type Result<T> = std::result::Result<T, DdqnError>;

/// Main error type for the crate
#[derive(Debug, Clone, PartialEq)]
pub enum DdqnError {
    /// Batch or tensor dimensions do not line up
    ShapeMismatch {
        expected: String,
        actual: String,
    },

    /// The experience store cannot supply a full batch yet
    InsufficientData {
        requested: usize,
        available: usize,
    },

    /// Online and target networks are not structurally identical
    Configuration(String),

    /// Invalid hyperparameter value
    InvalidParameter {
        name: String,
        reason: String,
    },

    /// Action index outside the network's output range
    InvalidAction {
        action: usize,
        max_actions: usize,
    },

    /// Training error (e.g. backward without a tracked forward pass)
    TrainingError(String),

    /// IO errors (file operations)
    IoError(String),

    /// Serialization/deserialization errors
    SerializationError(String),

    /// A persisted checkpoint lacks an expected field
    MissingField(String),
}

impl fmt::Display for DdqnError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DdqnError::ShapeMismatch { expected, actual } => {
                write!(f, "Shape mismatch: expected {}, got {}", expected, actual)
            }
            DdqnError::InsufficientData { requested, available } => {
                write!(f, "Insufficient data: requested {} samples, {} available", requested, available)
            }
            DdqnError::Configuration(msg) => write!(f, "Configuration error: {}", msg),
            DdqnError::InvalidParameter { name, reason } => {
                write!(f, "Invalid parameter '{}': {}", name, reason)
            }
            DdqnError::InvalidAction { action, max_actions } => {
                write!(f, "Invalid action {}: must be less than {}", action, max_actions)
            }
            DdqnError::TrainingError(msg) => write!(f, "Training error: {}", msg),
            DdqnError::IoError(msg) => write!(f, "IO error: {}", msg),
            DdqnError::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
            DdqnError::MissingField(field) => write!(f, "Missing field in persisted state: {}", field),
        }
    }
}

impl std::error::Error for DdqnError {}

impl From<std::io::Error> for DdqnError {
    fn from(err: std::io::Error) -> Self {
        DdqnError::IoError(err.to_string())
    }
}

impl From<bincode::Error> for DdqnError {
    fn from(err: bincode::Error) -> Self {
        DdqnError::SerializationError(err.to_string())
    }
}

impl From<serde_json::Error> for DdqnError {
    fn from(err: serde_json::Error) -> Self {
        DdqnError::SerializationError(err.to_string())
    }
}

impl From<tempfile::PersistError> for DdqnError {
    fn from(err: tempfile::PersistError) -> Self {
        DdqnError::IoError(err.error.to_string())
    }
}

// Helper functions for common error patterns
impl DdqnError {
    pub fn shape_mismatch<S: Into<String>>(expected: S, actual: S) -> Self {
        DdqnError::ShapeMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    pub fn invalid_parameter<S: Into<String>>(name: S, reason: S) -> Self {
        DdqnError::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Expected early in training; the orchestrator skips the step.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, DdqnError::InsufficientData { .. })
    }

    /// Raised while saving or restoring a checkpoint.
    pub fn is_persistence(&self) -> bool {
        matches!(
            self,
            DdqnError::IoError(_) | DdqnError::SerializationError(_) | DdqnError::MissingField(_)
        )
    }
}
