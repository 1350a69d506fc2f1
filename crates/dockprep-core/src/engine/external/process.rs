use super::error::EngineError;
use std::ffi::OsStr;
use std::path::Path;
use std::process::{Command, Stdio};
use tracing::{debug, error, warn};

/// Captured output of a finished tool run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Runs an external tool to completion in `working_dir`.
///
/// Anything the tool prints is diagnostic: stdout is logged at WARN and stderr at ERROR, and
/// neither fails the run. Only a non-zero exit status does.
pub fn run_tool<I, S>(
    tool: &str,
    program: &Path,
    args: I,
    working_dir: &Path,
) -> Result<ToolOutput, EngineError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut command = Command::new(program);
    command
        .args(args)
        .current_dir(working_dir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    debug!(tool, command = ?command, "Running external tool");

    let output = command.output().map_err(|e| EngineError::Unavailable {
        tool: tool.to_string(),
        source: e,
    })?;

    let captured = ToolOutput {
        stdout: String::from_utf8_lossy(&output.stdout).trim().to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
    };
    if !captured.stdout.is_empty() {
        warn!("{}: {}", tool, captured.stdout);
    }
    if !captured.stderr.is_empty() {
        error!("{}: {}", tool, captured.stderr);
    }

    if !output.status.success() {
        return Err(EngineError::ToolFailed {
            tool: tool.to_string(),
            status: output.status.to_string(),
            stderr: captured.stderr,
        });
    }
    Ok(captured)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn sh() -> PathBuf {
        PathBuf::from("sh")
    }

    #[test]
    fn captures_both_streams() {
        let dir = tempdir().unwrap();
        let output = run_tool(
            "echo",
            &sh(),
            ["-c", "echo informational; echo diagnostic >&2"],
            dir.path(),
        )
        .unwrap();
        assert_eq!(output.stdout, "informational");
        assert_eq!(output.stderr, "diagnostic");
    }

    #[test]
    fn runs_in_the_working_directory() {
        let dir = tempdir().unwrap();
        run_tool("touch", &sh(), ["-c", "touch marker"], dir.path()).unwrap();
        assert!(dir.path().join("marker").exists());
    }

    #[test]
    fn non_zero_exit_is_a_failure() {
        let dir = tempdir().unwrap();
        let err = run_tool("fail", &sh(), ["-c", "echo broken >&2; exit 3"], dir.path())
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::ToolFailed { ref stderr, .. } if stderr == "broken"
        ));
    }

    #[test]
    fn missing_executable_is_unavailable() {
        let dir = tempdir().unwrap();
        let err = run_tool(
            "ghost",
            Path::new("/nonexistent/dockprep-ghost-tool"),
            Vec::<String>::new(),
            dir.path(),
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::Unavailable { ref tool, .. } if tool == "ghost"));
    }
}
