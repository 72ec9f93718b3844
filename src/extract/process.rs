use std::process::{Command, Output};

use super::ExtractError;

/// Turns a finished command into its stdout, or the matching extraction error.
pub(crate) fn command_stdout(
    result: std::io::Result<Output>,
    tool: &str,
    on_failure: impl FnOnce(String) -> ExtractError,
) -> Result<String, ExtractError> {
    match result {
        Ok(output) if output.status.success() => {
            Ok(String::from_utf8_lossy(&output.stdout).into_owned())
        }
        Ok(output) => {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(on_failure(format!("{} exited with {}: {}", tool, output.status, stderr.trim())))
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            Err(ExtractError::ToolNotFound(tool.to_string()))
        }
        Err(err) => Err(ExtractError::Io(err)),
    }
}

pub(crate) fn check_binary(name: &str) -> bool {
    Command::new("which")
        .arg(name)
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}
