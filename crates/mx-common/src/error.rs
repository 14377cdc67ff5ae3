//! Error types for mortyx.
//!
//! Every failure carries:
//! - a stable numeric code for machine parsing
//! - a category for grouping
//! - a recoverability hint
//! - a remediation line for humans
//!
//! Two conditions that look like errors are deliberately absent here: an
//! empty action table at exploit time (the policy falls back to a random
//! action) and a step that sent zero units (its reward is 0). Neither ever
//! reaches this type.
//!
//! # Human-Facing Output
//!
//! ```text
//! ✗ Portal Unreachable
//!   Reason: transport error: POST /api/mortys/portal/: connection refused
//!   Fix: Check network connectivity and --base-url, then rerun.
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for mortyx operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error categories for grouping related errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Configuration and credential errors.
    Config,
    /// Portal API failures: network, auth, undecodable responses.
    Transport,
    /// Episode control flow (cancellation).
    Episode,
    /// Local file I/O and serialization errors.
    Io,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Config => write!(f, "config"),
            ErrorCategory::Transport => write!(f, "transport"),
            ErrorCategory::Episode => write!(f, "episode"),
            ErrorCategory::Io => write!(f, "io"),
        }
    }
}

/// Unified error type for mortyx.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors (10-19)
    #[error("configuration error: {0}")]
    Config(String),

    #[error("no portal credential supplied (set AUTH_HEADER or pass --token)")]
    MissingCredential,

    // Transport errors (20-29)
    #[error("transport error: {0}")]
    Transport(String),

    #[error("portal rejected credential (HTTP {status})")]
    Auth { status: u16 },

    #[error("malformed portal response from {endpoint}: {message}")]
    MalformedResponse { endpoint: String, message: String },

    #[error("portal call timed out after {seconds}s")]
    Timeout { seconds: u64 },

    // Episode errors (30-39)
    #[error("episode cancelled after {steps} steps")]
    Cancelled { steps: u64 },

    // I/O errors (60-69)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Returns the stable error code for this error.
    ///
    /// - 10-19: configuration
    /// - 20-29: transport
    /// - 30-39: episode
    /// - 60-69: I/O
    pub fn code(&self) -> u32 {
        match self {
            Error::Config(_) => 10,
            Error::MissingCredential => 11,
            Error::Transport(_) => 20,
            Error::Auth { .. } => 21,
            Error::MalformedResponse { .. } => 22,
            Error::Timeout { .. } => 23,
            Error::Cancelled { .. } => 30,
            Error::Io(_) => 60,
            Error::Json(_) => 61,
        }
    }

    /// Returns the error category for grouping and filtering.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Config(_) | Error::MissingCredential => ErrorCategory::Config,

            // Undecodable responses are handled exactly like a failed call.
            Error::Transport(_)
            | Error::Auth { .. }
            | Error::MalformedResponse { .. }
            | Error::Timeout { .. } => ErrorCategory::Transport,

            Error::Cancelled { .. } => ErrorCategory::Episode,

            Error::Io(_) | Error::Json(_) => ErrorCategory::Io,
        }
    }

    /// Whether rerunning (possibly after fixing input) may succeed.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Error::Config(_) => true,
            Error::MissingCredential => true,
            Error::Transport(_) => true,
            Error::Auth { .. } => false,
            Error::MalformedResponse { .. } => false,
            Error::Timeout { .. } => true,
            Error::Cancelled { .. } => true,
            Error::Io(_) => true,
            Error::Json(_) => false,
        }
    }

    /// Short headline for human-readable output.
    pub fn headline(&self) -> &'static str {
        match self {
            Error::Config(_) => "Configuration Error",
            Error::MissingCredential => "Missing Credential",
            Error::Transport(_) => "Portal Unreachable",
            Error::Auth { .. } => "Credential Rejected",
            Error::MalformedResponse { .. } => "Unexpected Portal Response",
            Error::Timeout { .. } => "Portal Timeout",
            Error::Cancelled { .. } => "Episode Cancelled",
            Error::Io(_) => "I/O Error",
            Error::Json(_) => "Serialization Error",
        }
    }

    /// Human-readable remediation hint.
    pub fn remediation(&self) -> &'static str {
        match self {
            Error::Config(_) => "Fix the reported field in the config file or CLI flags.",
            Error::MissingCredential => {
                "Export AUTH_HEADER with the portal token, or run with --simulate."
            }
            Error::Transport(_) => "Check network connectivity and --base-url, then rerun.",
            Error::Auth { .. } => "The token was refused. Request a fresh token and rerun.",
            Error::MalformedResponse { .. } => {
                "The portal API returned an unexpected shape. Check --base-url points at the portal."
            }
            Error::Timeout { .. } => "Rerun, or raise --timeout if the portal is slow.",
            Error::Cancelled { .. } => "The episode was interrupted. Start a new one to continue.",
            Error::Io(_) => "Check file permissions and paths, then rerun.",
            Error::Json(_) => "Check the JSON syntax of the input file.",
        }
    }
}

/// Format an error for human-readable stderr output.
pub fn format_error_human(err: &Error, use_color: bool) -> String {
    let (red, cyan, reset) = if use_color {
        ("\x1b[31m", "\x1b[36m", "\x1b[0m")
    } else {
        ("", "", "")
    };

    format!(
        "{red}✗{reset} {headline}\n  Reason: {message}\n  {cyan}Fix:{reset} {remediation}",
        headline = err.headline(),
        message = err,
        remediation = err.remediation()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code() {
        assert_eq!(Error::Config("x".into()).code(), 10);
        assert_eq!(Error::Auth { status: 401 }.code(), 21);
        assert_eq!(Error::Cancelled { steps: 3 }.code(), 30);
    }

    #[test]
    fn test_malformed_response_is_transport() {
        let err = Error::MalformedResponse {
            endpoint: "/api/mortys/status/".into(),
            message: "missing field".into(),
        };
        assert_eq!(err.category(), ErrorCategory::Transport);
        assert_eq!(Error::Transport("down".into()).category(), ErrorCategory::Transport);
    }

    #[test]
    fn test_recoverability() {
        assert!(Error::Timeout { seconds: 5 }.is_recoverable());
        assert!(!Error::Auth { status: 403 }.is_recoverable());
    }

    #[test]
    fn test_format_error_human_no_color() {
        let out = format_error_human(&Error::MissingCredential, false);
        assert!(out.starts_with("✗ Missing Credential"));
        assert!(out.contains("Reason: no portal credential"));
        assert!(out.contains("Fix: Export AUTH_HEADER"));
        assert!(!out.contains("\x1b["));
    }

    #[test]
    fn test_category_display() {
        assert_eq!(ErrorCategory::Transport.to_string(), "transport");
        assert_eq!(
            serde_json::to_string(&ErrorCategory::Episode).unwrap(),
            "\"episode\""
        );
    }
}
