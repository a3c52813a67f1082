//! Helpers for running external commands from async code.

use crate::prelude::*;

/// Report any command failures, and include any error output.
///
/// The output of standard error and standard output will be logged at
/// appropriate levels. Only the exit status decides whether the command
/// failed, since some tools print "Error" lines for problems they recover from.
pub fn check_for_command_failure(
    command_name: &str,
    output: &std::process::Output,
) -> Result<()> {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    trace!(
        command_name = command_name,
        output = %stdout,
        "Standard output from command"
    );
    if !stderr.trim().is_empty() {
        debug!(
            command_name = command_name,
            output = %stderr,
            "Standard error from command",
        );
    }

    if output.status.success() {
        Ok(())
    } else if let Some(exit_code) = output.status.code() {
        Err(anyhow!(
            "{} failed with exit code {} and error output:\n{}",
            command_name,
            exit_code,
            stderr.trim_end(),
        ))
    } else {
        Err(anyhow!(
            "{} failed with error output:\n{}",
            command_name,
            stderr.trim_end(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use std::process::{Command, Output};

    use super::*;

    /// Run a tiny shell script and capture its output.
    fn sh(script: &str) -> Output {
        Command::new("sh")
            .arg("-c")
            .arg(script)
            .output()
            .expect("failed to run sh")
    }

    #[test]
    fn successful_command_passes() {
        let output = sh("echo hello");
        assert!(check_for_command_failure("sh", &output).is_ok());
    }

    #[test]
    fn exit_code_is_reported_with_stderr() {
        let output = sh("echo 'cannot read image' >&2; exit 3");
        let err = check_for_command_failure("sh", &output).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("exit code 3"), "{msg}");
        assert!(msg.contains("cannot read image"), "{msg}");
    }

    #[test]
    fn error_lines_from_successful_commands_are_not_failures() {
        let output = sh("echo 'Error in boxClipToRectangle: box outside rectangle' >&2");
        assert!(check_for_command_failure("sh", &output).is_ok());
    }
}
