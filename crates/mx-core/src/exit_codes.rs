//! Exit codes for the mortyx CLI.
//!
//! Exit codes communicate the episode outcome without requiring output
//! parsing.
//!
//! Exit code ranges:
//! - 0-6: Operational outcomes (parse outcome from code, not output)
//! - 10-19: User/environment errors (recoverable by user action)
//! - 20-29: Internal and protocol errors

use mx_common::Error;

/// Exit codes for mortyx runs.
///
/// These codes are a stable contract for automation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    // ========================================================================
    // Operational Outcomes (0-6)
    // ========================================================================
    /// Episode ran until the pool was empty
    Clean = 0,

    /// Episode stopped at the configured step cap with units remaining
    StepCapReached = 1,

    /// Interrupted by SIGINT/SIGTERM
    Interrupted = 6,

    // ========================================================================
    // User / Environment Errors (10-19)
    // ========================================================================
    /// Invalid arguments or missing credential
    ArgsError = 10,

    /// Config file unreadable or invalid
    ConfigError = 11,

    /// Portal rejected the credential
    AuthError = 12,

    /// Portal unreachable or answered with an error status
    NetworkError = 14,

    // ========================================================================
    // Internal Errors (20-29)
    // ========================================================================
    /// Internal error (bug - please report)
    InternalError = 20,

    /// I/O error
    IoError = 21,

    /// Portal call timed out
    TimeoutError = 22,

    /// Portal answered with a body we could not decode
    ProtocolError = 23,
}

impl ExitCode {
    /// Convert to i32 for process exit.
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Check if this exit code indicates success (codes 0-1).
    pub fn is_success(self) -> bool {
        matches!(self, ExitCode::Clean | ExitCode::StepCapReached)
    }

    /// Check if this exit code indicates operational outcome (codes 0-6).
    pub fn is_operational(self) -> bool {
        (self as i32) < 10
    }

    /// Check if this exit code is a user/environment error (codes 10-19).
    pub fn is_user_error(self) -> bool {
        let code = self as i32;
        (10..20).contains(&code)
    }

    /// Check if this exit code is an internal error (codes 20-29).
    pub fn is_internal_error(self) -> bool {
        let code = self as i32;
        code >= 20
    }

    /// Check if this exit code indicates any error requiring attention.
    pub fn is_error(self) -> bool {
        (self as i32) >= 10
    }

    /// Get the error code name as a string constant (for JSON output).
    pub fn code_name(&self) -> &'static str {
        match self {
            ExitCode::Clean => "OK_CLEAN",
            ExitCode::StepCapReached => "OK_STEP_CAP",
            ExitCode::Interrupted => "ERR_INTERRUPTED",
            ExitCode::ArgsError => "ERR_ARGS",
            ExitCode::ConfigError => "ERR_CONFIG",
            ExitCode::AuthError => "ERR_AUTH",
            ExitCode::NetworkError => "ERR_NETWORK",
            ExitCode::InternalError => "ERR_INTERNAL",
            ExitCode::IoError => "ERR_IO",
            ExitCode::TimeoutError => "ERR_TIMEOUT",
            ExitCode::ProtocolError => "ERR_PROTOCOL",
        }
    }
}

impl From<&Error> for ExitCode {
    fn from(err: &Error) -> Self {
        match err {
            Error::Config(_) => ExitCode::ConfigError,
            Error::MissingCredential => ExitCode::ArgsError,
            Error::Auth { .. } => ExitCode::AuthError,
            Error::Transport(_) => ExitCode::NetworkError,
            Error::MalformedResponse { .. } => ExitCode::ProtocolError,
            Error::Timeout { .. } => ExitCode::TimeoutError,
            Error::Cancelled { .. } => ExitCode::Interrupted,
            Error::Io(_) => ExitCode::IoError,
            Error::Json(_) => ExitCode::InternalError,
        }
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.code_name(), self.as_i32())
    }
}
