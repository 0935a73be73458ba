use crate::error::AppError;
use std::path::Path;
use std::process::{Command, Stdio};

/// Whether `program` resolves to a file on `PATH`.
pub fn on_path(program: &str) -> bool {
    std::env::var_os("PATH")
        .map(|paths| std::env::split_paths(&paths).any(|dir| is_file(&dir.join(program))))
        .unwrap_or(false)
}

fn is_file(path: &Path) -> bool {
    path.metadata().map(|m| m.is_file()).unwrap_or(false)
}

/// Run a notification helper to completion, mapping a non-zero exit to an error.
///
/// The helper never sees the host's stdin or stdout, which carry framed
/// messages; its stderr is collected and logged.
pub fn run(mut command: Command, program: &str) -> Result<(), AppError> {
    let output = command
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()?;

    let stderr = String::from_utf8_lossy(&output.stderr);
    let stderr = stderr.trim();
    if !stderr.is_empty() {
        log::warn!("{program}: {stderr}");
    }

    if output.status.success() {
        Ok(())
    } else {
        Err(AppError::Internal(format!("{program} exited with {}", output.status)))
    }
}
