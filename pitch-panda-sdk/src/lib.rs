//! Event types and logging macros shared by pitch-panda analysis runs.
//!
//! Two kinds of output live here:
//!
//! - [`AnalysisLog`] events, serialized as JSON on stderr behind the
//!   `__PP_EVENT__:` prefix so a wrapping process can follow a run stage by stage.
//!   Emission is enabled by setting `PITCH_PANDA_EVENTS=1`.
//! - Console macros (`log_info!`, `log_warning!`, ...) that print colored,
//!   human-readable progress to stdout.

use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Prefix written before every serialized event line.
pub const EVENT_PREFIX: &str = "__PP_EVENT__:";

/// Environment variable that turns structured event emission on.
pub const EVENTS_ENV: &str = "PITCH_PANDA_EVENTS";

/// Overall status of an analysis run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStatus {
    NotStarted,
    Running,
    Completed,
    /// Finished, but one or more stages recorded errors
    CompletedWithErrors,
    Failed,
}

impl AnalysisStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisStatus::NotStarted => "not_started",
            AnalysisStatus::Running => "running",
            AnalysisStatus::Completed => "completed",
            AnalysisStatus::CompletedWithErrors => "completed_with_errors",
            AnalysisStatus::Failed => "failed",
        }
    }
}

/// Structured events emitted while an analysis runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnalysisLog {
    /// Stage started
    StageStarted {
        stage: usize,
        name: String,
        total_stages: usize,
    },
    /// Stage completed
    StageCompleted { stage: usize, name: String },
    /// Stage skipped because its inputs were absent
    StageSkipped {
        stage: usize,
        name: String,
        reason: String,
    },
    /// Node started (a single unit of work inside a stage)
    NodeStarted { node: String, description: String },
    /// Node progress update
    NodeProgress { node: String, message: String },
    /// Node completed
    NodeCompleted {
        node: String,
        result: Option<String>,
    },
    /// Node failed; the run continues
    NodeFailed { node: String, error: String },
    /// Report or state file written
    StateFileCreated { file_path: String, description: String },
    /// Run finished
    RunFinished {
        startup_id: String,
        status: AnalysisStatus,
        error_count: usize,
    },
}

fn events_enabled() -> bool {
    static ENABLED: OnceLock<bool> = OnceLock::new();
    *ENABLED.get_or_init(|| {
        std::env::var(EVENTS_ENV)
            .map(|v| matches!(v.as_str(), "1" | "true" | "yes"))
            .unwrap_or(false)
    })
}

impl AnalysisLog {
    /// Serialize to the single-line wire form (`__PP_EVENT__:{json}`)
    pub fn to_line(&self) -> Option<String> {
        serde_json::to_string(self)
            .ok()
            .map(|json| format!("{}{}", EVENT_PREFIX, json))
    }

    /// Parse a line produced by [`AnalysisLog::to_line`]
    pub fn from_line(line: &str) -> Option<Self> {
        let json = line.strip_prefix(EVENT_PREFIX)?;
        serde_json::from_str(json).ok()
    }

    /// Emit this event to stderr when event output is enabled
    pub fn emit(&self) {
        if !events_enabled() {
            return;
        }
        if let Some(line) = self.to_line() {
            use std::io::Write;
            eprintln!("{}", line);
            // Force flush stderr in async/concurrent contexts
            let _ = std::io::stderr().flush();
        }
    }
}

#[macro_export]
macro_rules! log_stage_start {
    ($stage:expr, $name:expr, $total:expr) => {
        $crate::AnalysisLog::StageStarted {
            stage: $stage,
            name: $name.to_string(),
            total_stages: $total,
        }
        .emit();
    };
}

#[macro_export]
macro_rules! log_stage_complete {
    ($stage:expr, $name:expr) => {
        $crate::AnalysisLog::StageCompleted {
            stage: $stage,
            name: $name.to_string(),
        }
        .emit();
    };
}

#[macro_export]
macro_rules! log_stage_skipped {
    ($stage:expr, $name:expr, $reason:expr) => {
        $crate::AnalysisLog::StageSkipped {
            stage: $stage,
            name: $name.to_string(),
            reason: $reason.to_string(),
        }
        .emit();
    };
}

#[macro_export]
macro_rules! log_node_start {
    ($node:expr, $desc:expr) => {
        $crate::AnalysisLog::NodeStarted {
            node: $node.to_string(),
            description: $desc.to_string(),
        }
        .emit();
    };
}

#[macro_export]
macro_rules! log_node_progress {
    ($node:expr, $msg:expr) => {
        $crate::AnalysisLog::NodeProgress {
            node: $node.to_string(),
            message: $msg.to_string(),
        }
        .emit();
    };
}

#[macro_export]
macro_rules! log_node_complete {
    ($node:expr) => {
        $crate::AnalysisLog::NodeCompleted {
            node: $node.to_string(),
            result: None,
        }
        .emit();
    };
    ($node:expr, $result:expr) => {
        $crate::AnalysisLog::NodeCompleted {
            node: $node.to_string(),
            result: Some($result.to_string()),
        }
        .emit();
    };
}

#[macro_export]
macro_rules! log_node_failed {
    ($node:expr, $error:expr) => {
        $crate::AnalysisLog::NodeFailed {
            node: $node.to_string(),
            error: $error.to_string(),
        }
        .emit();
    };
}

#[macro_export]
macro_rules! log_state_file {
    ($path:expr, $desc:expr) => {
        $crate::AnalysisLog::StateFileCreated {
            file_path: $path.to_string(),
            description: $desc.to_string(),
        }
        .emit();
    };
}

// ============================================================================
// Console Logging Macros
// ============================================================================
// Colored console output for human-readable logs, complementing the
// structured AnalysisLog events.
// ============================================================================

/// Logs the completion of a pipeline stage.
///
/// # Example
/// ```
/// use pitch_panda_sdk::log_stage_complete_console;
/// log_stage_complete_console!(1);
/// ```
#[macro_export]
macro_rules! log_stage_complete_console {
    ($stage:expr) => {
        println!("\x1b[32m✓ Stage {} complete\x1b[0m", $stage);
    };
}

/// Logs progress of an operation.
///
/// # Example
/// ```
/// use pitch_panda_sdk::log_progress;
/// log_progress!(3, 12, "slides");
/// ```
///
/// Outputs:
/// ```text
/// Progress: 3/12 slides
/// ```
#[macro_export]
macro_rules! log_progress {
    ($current:expr, $total:expr, $item_type:expr) => {
        println!(
            "\x1b[36mProgress: {}/{} {}\x1b[0m",
            $current, $total, $item_type
        );
    };
}

/// Logs an informational message.
///
/// # Example
/// ```
/// use pitch_panda_sdk::log_info;
/// log_info!("Fetching website: {}", "https://example.com");
/// ```
#[macro_export]
macro_rules! log_info {
    ($message:expr) => {
        println!("\x1b[36mℹ {}\x1b[0m", $message);
    };
    ($fmt:expr, $($arg:tt)*) => {
        println!("\x1b[36mℹ {}\x1b[0m", format!($fmt, $($arg)*));
    };
}

/// Logs a warning message.
///
/// # Example
/// ```
/// use pitch_panda_sdk::log_warning;
/// log_warning!("No deck slides provided");
/// ```
///
/// Outputs:
/// ```text
/// ⚠ Warning: No deck slides provided
/// ```
#[macro_export]
macro_rules! log_warning {
    ($message:expr) => {
        println!("\x1b[33m⚠ Warning: {}\x1b[0m", $message);
    };
    ($fmt:expr, $($arg:tt)*) => {
        println!("\x1b[33m⚠ Warning: {}\x1b[0m", format!($fmt, $($arg)*));
    };
}

/// Logs a failed stage or run to the console. Fatal CLI errors go to stderr instead.
#[macro_export]
macro_rules! log_error {
    ($message:expr) => {
        println!("\x1b[31m✗ {}\x1b[0m", $message);
    };
    ($fmt:expr, $($arg:tt)*) => {
        println!("\x1b[31m✗ {}\x1b[0m", format!($fmt, $($arg)*));
    };
}

/// Logs that a file has been saved.
///
/// # Example
/// ```
/// use pitch_panda_sdk::log_file_saved;
/// log_file_saved!("./output/stripe-com.md");
/// ```
///
/// Outputs:
/// ```text
/// ✓ Saved: ./output/stripe-com.md
/// ```
#[macro_export]
macro_rules! log_file_saved {
    ($path:expr) => {
        println!("\x1b[32m✓ Saved: {}\x1b[0m", $path);
    };
}

// ============================================================================
// End of Console Logging Macros
// ============================================================================
