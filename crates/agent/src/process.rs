//! Process Runner (§4.B): scoped external-command execution with an
//! exit-code policy and captured streams. No shell expansion — argv is
//! passed straight to `tokio::process::Command`, exactly the way the
//! teacher spawns the compiler and the candidate executable
//! (`handler/cpp.rs`), minus the cgroup/seccomp sandboxing those child
//! processes needed and these trusted admin tools do not.

use crate::error::AgentError;
use std::process::Stdio;
use tokio::process::Command;

#[derive(Debug, Clone)]
pub struct Output {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl Output {
    pub fn stdout_string(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    pub fn stderr_string(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }
}

/// Runs `argv[0] argv[1..]`, accepting only exit codes in `accepted_exit_codes`.
/// `run_as_root` prefixes the argv with `sudo -n` when the current process
/// is not already uid 0 — there is no rootwrap layer here, unlike the
/// `ironic_python_agent` original this was distilled from.
pub async fn run(
    argv: &[&str],
    run_as_root: bool,
    accepted_exit_codes: &[i32],
) -> Result<Output, AgentError> {
    let mut full_argv: Vec<String> = Vec::new();
    if run_as_root && !running_as_root() {
        full_argv.push("sudo".to_string());
        full_argv.push("-n".to_string());
    }
    full_argv.extend(argv.iter().map(|s| s.to_string()));

    let Some((program, rest)) = full_argv.split_first() else {
        return Err(AgentError::InvalidCommandParams(
            "empty command argv".into(),
        ));
    };

    tracing::debug!(argv = ?full_argv, "spawning process");

    let output = Command::new(program)
        .args(rest)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|err| AgentError::CommandExecution {
            argv: full_argv.clone(),
            exit_code: None,
            stdout: String::new(),
            stderr: err.to_string(),
        })?;

    let exit_code = output.status.code();
    let accepted = exit_code.is_some_and(|code| accepted_exit_codes.contains(&code));
    if !accepted {
        return Err(AgentError::CommandExecution {
            argv: full_argv,
            exit_code,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }

    Ok(Output {
        stdout: output.stdout,
        stderr: output.stderr,
    })
}

/// Convenience wrapper for the overwhelmingly common case of requiring
/// exit code 0.
pub async fn run_ok(argv: &[&str], run_as_root: bool) -> Result<Output, AgentError> {
    run(argv, run_as_root, &[0]).await
}

fn running_as_root() -> bool {
    #[cfg(unix)]
    {
        // SAFETY: getuid takes no arguments and cannot fail.
        unsafe { libc::getuid() == 0 }
    }
    #[cfg(not(unix))]
    {
        false
    }
}
