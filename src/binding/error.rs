use thiserror::Error;

use crate::runner::ds::error::JErrorType;

/// A failure of one data binding. Never returned to the caller of a compiled
/// binding; it only ends up in the caller's error accumulator.
#[derive(Debug, Clone, Error)]
pub enum BindingError {
    /// The source text could not be turned into a callable at all.
    #[error("Function compile error in {source_text}: {message}")]
    Synthesis { source_text: String, message: String },
    /// The binding failed while running, including running out of time.
    #[error("{cause}")]
    Evaluation { source_text: String, cause: JErrorType },
}

impl BindingError {
    pub fn synthesis(source_text: &str, cause: &JErrorType) -> Self {
        BindingError::Synthesis {
            source_text: source_text.to_string(),
            message: cause.message(),
        }
    }

    pub fn evaluation(source_text: &str, cause: JErrorType) -> Self {
        BindingError::Evaluation {
            source_text: source_text.to_string(),
            cause,
        }
    }

    /// The error message without its kind, as `error.message` would read.
    pub fn message(&self) -> String {
        match self {
            BindingError::Synthesis { message, .. } => message.to_string(),
            BindingError::Evaluation { cause, .. } => cause.message(),
        }
    }

    pub fn source_text(&self) -> &str {
        match self {
            BindingError::Synthesis { source_text, .. }
            | BindingError::Evaluation { source_text, .. } => source_text,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            BindingError::Evaluation {
                cause: JErrorType::Timeout(_),
                ..
            }
        )
    }
}
