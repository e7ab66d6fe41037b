//! External tool invocation with a wall-clock budget.

use std::ffi::OsStr;
use std::process::{Output, Stdio};
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Invalid executable path: {0}")]
    InvalidPath(String),

    #[error("Failed to execute {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} timed out after {}s", .timeout.as_secs())]
    TimedOut { program: String, timeout: Duration },
}

/// Reject executable paths carrying shell metacharacters or traversal.
pub fn validate_tool_path(path: &str) -> Result<(), ToolError> {
    let dangerous_chars = [';', '|', '&', '$', '`', '(', ')', '<', '>', '\n', '\r'];
    if path.is_empty() || path.chars().any(|c| dangerous_chars.contains(&c)) {
        return Err(ToolError::InvalidPath(path.to_string()));
    }
    if path.contains("..") {
        return Err(ToolError::InvalidPath(path.to_string()));
    }
    Ok(())
}

/// Run `program` to completion, capturing stdout and stderr.
///
/// The child is killed if it outlives `timeout` or if the returned future is
/// dropped. A non-zero exit is not an error here; callers inspect the status.
pub async fn run_tool<I, S>(program: &str, args: I, timeout: Duration) -> Result<Output, ToolError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut command = Command::new(program);
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    match tokio::time::timeout(timeout, command.output()).await {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(source)) => Err(ToolError::Spawn {
            program: program.to_string(),
            source,
        }),
        Err(_) => Err(ToolError::TimedOut {
            program: program.to_string(),
            timeout,
        }),
    }
}
