//! Result and error types for taskprobe.

use thiserror::Error;

/// Result type for taskprobe operations
pub type ProbeResult<T> = Result<T, ProbeError>;

/// Coarse classification of a failure.
///
/// Setup failures abort a test before its body runs, interaction failures
/// abort the current step, assertion failures are the test's verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Configuration or session launch failed
    Setup,
    /// A UI step could not be completed
    Interaction,
    /// Observed state did not match the expectation
    Assertion,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Setup => write!(f, "setup"),
            Self::Interaction => write!(f, "interaction"),
            Self::Assertion => write!(f, "assertion"),
        }
    }
}

/// Errors that can occur in taskprobe
#[derive(Debug, Error)]
pub enum ProbeError {
    /// A required configuration key is absent
    #[error("Missing configuration key: {key}")]
    MissingConfig {
        /// The key that was not found
        key: String,
    },

    /// A configuration value could not be interpreted
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidConfig {
        /// The offending key
        key: String,
        /// Error message
        message: String,
    },

    /// The automation server refused or failed to create a session
    #[error("Failed to create automation session: {message}")]
    SessionLaunch {
        /// Error message
        message: String,
    },

    /// Operation attempted on a session that was never opened or already quit
    #[error("Session is not initialized")]
    SessionNotInitialized,

    /// A bounded wait expired before its condition held
    #[error("Timed out after {ms}ms waiting for {locator} to be {condition}")]
    Timeout {
        /// Condition that was polled (e.g. "visible")
        condition: String,
        /// Description of the locator
        locator: String,
        /// Timeout in milliseconds
        ms: u64,
    },

    /// A wait was asked for something it cannot deliver
    #[error("Invalid wait: {message}")]
    InvalidWait {
        /// Error message
        message: String,
    },

    /// No element matched the locator
    #[error("No element found for {locator}")]
    NoSuchElement {
        /// Description of the locator
        locator: String,
    },

    /// The element reference no longer points at a live element
    #[error("Stale element reference: {element}")]
    StaleElement {
        /// Element id
        element: String,
    },

    /// The automation server returned an error for a command
    #[error("WebDriver error '{error}' on {command}: {message}")]
    WebDriver {
        /// Command that failed (e.g. "find element")
        command: String,
        /// Error code
        error: String,
        /// Error message
        message: String,
    },

    /// Assertion failed
    #[error("Assertion failed: {message}")]
    AssertionFailed {
        /// Error message
        message: String,
    },

    /// Fixture error (setup/teardown failed)
    #[error("Fixture error: {message}")]
    FixtureError {
        /// Error message
        message: String,
    },

    /// HTTP transport error talking to the server outside a session
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ProbeError {
    /// Create an assertion failure
    #[must_use]
    pub fn assertion(message: impl Into<String>) -> Self {
        Self::AssertionFailed {
            message: message.into(),
        }
    }

    /// Classify the error
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingConfig { .. }
            | Self::InvalidConfig { .. }
            | Self::SessionLaunch { .. }
            | Self::SessionNotInitialized
            | Self::FixtureError { .. }
            | Self::Io(_) => ErrorKind::Setup,
            Self::AssertionFailed { .. } => ErrorKind::Assertion,
            Self::Timeout { .. }
            | Self::InvalidWait { .. }
            | Self::NoSuchElement { .. }
            | Self::StaleElement { .. }
            | Self::WebDriver { .. }
            | Self::Http(_)
            | Self::Json(_) => ErrorKind::Interaction,
        }
    }

    /// True when a bounded wait expired
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// True for errors a polling loop treats as "not yet"
    #[must_use]
    pub const fn is_transient_lookup(&self) -> bool {
        matches!(self, Self::NoSuchElement { .. } | Self::StaleElement { .. })
    }
}
