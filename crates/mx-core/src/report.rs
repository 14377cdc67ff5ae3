//! Rendering of the episode report and of fatal errors on stdout.

use crate::episode::{EpisodeOutcome, EpisodeReport};
use crate::exit_codes::ExitCode;
use mx_common::{Error, OutputFormat, Result};
use serde::Serialize;

/// Structured error detail, printed in place of a report when a run fails.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorReport {
    pub run_id: String,
    /// Stable `mx_common::Error` code.
    pub code: u32,
    /// Exit code name, e.g. `ERR_AUTH`.
    pub exit_code: &'static str,
    pub category: String,
    pub recoverable: bool,
    pub message: String,
    pub remediation: &'static str,
}

impl ErrorReport {
    pub fn new(run_id: impl Into<String>, err: &Error) -> Self {
        ErrorReport {
            run_id: run_id.into(),
            code: err.code(),
            exit_code: ExitCode::from(err).code_name(),
            category: err.category().to_string(),
            recoverable: err.is_recoverable(),
            message: err.to_string(),
            remediation: err.remediation(),
        }
    }
}

/// Text to print for a finished episode, or `None` when nothing goes to stdout.
pub fn render_report(report: &EpisodeReport, format: OutputFormat) -> Result<Option<String>> {
    match format {
        OutputFormat::Json => Ok(Some(serde_json::to_string_pretty(report)?)),
        OutputFormat::Summary => Ok(Some(summary_line(report))),
        OutputFormat::Exitcode => Ok(None),
    }
}

/// Text to print for a failed run.
///
/// Summary mode prints nothing here; the human-readable error goes to stderr.
pub fn render_error(run_id: &str, err: &Error, format: OutputFormat) -> Result<Option<String>> {
    match format {
        OutputFormat::Json => {
            let body = serde_json::json!({ "error": ErrorReport::new(run_id, err) });
            Ok(Some(serde_json::to_string_pretty(&body)?))
        }
        OutputFormat::Summary | OutputFormat::Exitcode => Ok(None),
    }
}

fn summary_line(report: &EpisodeReport) -> String {
    let outcome = match report.outcome {
        EpisodeOutcome::Completed => "completed",
        EpisodeOutcome::StepCapReached => "step cap reached",
    };
    let best = match &report.best_action {
        Some(best) => format!(
            "best {} avg {:.3} over {} pulls",
            best.action, best.avg_reward, best.pulls
        ),
        None => "no best action".to_string(),
    };
    format!(
        "{}: delivered {}/{} ({:.1}%), lost {}, {} steps; {}",
        outcome,
        report.delivered,
        report.initial_pool,
        report.delivery_rate * 100.0,
        report.lost,
        report.steps,
        best
    )
}
