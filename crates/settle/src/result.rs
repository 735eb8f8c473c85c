//! Result and error types for Settle.
//!
//! Only infrastructure failures are errors. A condition that is still false
//! when a wait ends is reported through [`crate::WaitResult`], never here.

use crate::interaction::StepRecord;
use thiserror::Error;

/// Result type for Settle operations
pub type HarnessResult<T> = Result<T, HarnessError>;

/// Errors that can occur while driving or observing the target page
#[derive(Debug, Error)]
pub enum HarnessError {
    /// Browser launch error
    #[error("Failed to launch browser: {message}")]
    BrowserLaunch {
        /// Error message
        message: String,
    },

    /// Target could not be loaded
    #[error("Navigation to {url} failed: {message}")]
    Navigation {
        /// URL that failed
        url: String,
        /// Error message
        message: String,
    },

    /// In-page expression threw
    #[error("Evaluation failed: {message}")]
    Evaluation {
        /// Exception text reported by the page
        message: String,
    },

    /// Selector matched nothing where one element was required
    #[error("No element matches {selector}")]
    ElementNotFound {
        /// Selector description
        selector: String,
    },

    /// A sequence step's settle condition never held
    #[error("Step {step_index} did not settle ({waited_for}); last observed {last_observed}")]
    StepTimeout {
        /// Zero-based index of the step that timed out
        step_index: usize,
        /// Description of the settle condition
        waited_for: String,
        /// Last value observed before the deadline
        last_observed: serde_json::Value,
        /// Records of the steps that settled before this one
        completed: Vec<StepRecord>,
    },

    /// Overlay still blocking after every dismiss attempt
    #[error("Cutscene not cleared after {attempts} dismiss attempts")]
    CutsceneNotCleared {
        /// Dismiss actions performed
        attempts: u32,
    },

    /// Observed value differs from the expected one
    #[error("Assertion '{probe}' failed: expected {expected}, got {actual}")]
    AssertionMismatch {
        /// Observation name
        probe: String,
        /// Expected value
        expected: serde_json::Value,
        /// Actual value
        actual: serde_json::Value,
    },

    /// A required wait ran out of time
    #[error("Timed out after {ms}ms waiting for {waited_for}")]
    Timeout {
        /// What was waited for
        waited_for: String,
        /// Timeout in milliseconds
        ms: u64,
    },

    /// Input simulation error
    #[error("Input simulation failed: {message}")]
    Input {
        /// Error message
        message: String,
    },

    /// Screenshot error
    #[error("Screenshot failed: {message}")]
    Screenshot {
        /// Error message
        message: String,
    },

    /// Invalid configuration (zero poll interval, unknown scenario, bad pattern)
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// Error message
        message: String,
    },

    /// Operation attempted on a closed session
    #[error("Session already closed")]
    SessionClosed,

    /// External cancellation aborted the scenario
    #[error("Cancelled")]
    Cancelled,

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl HarnessError {
    /// Create an invalid configuration error
    #[must_use]
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create an evaluation error
    #[must_use]
    pub fn evaluation(message: impl Into<String>) -> Self {
        Self::Evaluation {
            message: message.into(),
        }
    }

    /// Create an input error
    #[must_use]
    pub fn input(message: impl Into<String>) -> Self {
        Self::Input {
            message: message.into(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_step_timeout_display_names_index() {
        let err = HarnessError::StepTimeout {
            step_index: 2,
            waited_for: "visible(.focused)".to_string(),
            last_observed: json!(false),
            completed: Vec::new(),
        };
        let text = err.to_string();
        assert!(text.contains("Step 2"));
        assert!(text.contains(".focused"));
    }

    #[test]
    fn test_assertion_mismatch_display_quotes_values() {
        let err = HarnessError::AssertionMismatch {
            probe: "menu.label".to_string(),
            expected: json!("ATTACK"),
            actual: json!("ITEM"),
        };
        assert!(err.to_string().contains("\"ATTACK\""));
    }

    #[test]
    fn test_io_error_from() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: HarnessError = io_err.into();
        assert!(err.to_string().contains("I/O"));
    }
}
