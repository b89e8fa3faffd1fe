// src/compile/command.rs

//! Running external tool commands (bundlers, style compilers) through the
//! platform shell and capturing their output.

use std::path::Path;
use std::process::Stdio;

use anyhow::{Context, Result, bail};
use tokio::process::Command;
use tracing::{debug, info};

/// Number of trailing stderr lines kept in the error of a failed command.
const STDERR_TAIL: usize = 20;

/// Replace every `{name}` placeholder in `template` with its shell-quoted
/// value.
pub fn expand(template: &str, vars: &[(&str, &str)]) -> String {
    let mut line = template.to_string();
    for (name, value) in vars {
        line = line.replace(&format!("{{{name}}}"), &shell_quote(value));
    }
    line
}

/// Quote a single argument for `sh -c` / `cmd /C`. Plain arguments are
/// passed through untouched.
pub fn shell_quote(arg: &str) -> String {
    let plain = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '/' | ':' | '\\' | '='));
    if plain {
        return arg.to_string();
    }

    if cfg!(windows) {
        format!("\"{}\"", arg.replace('"', "\\\""))
    } else {
        format!("'{}'", arg.replace('\'', "'\\''"))
    }
}

/// Run `cmd_line` in `cwd` and return its stdout.
///
/// stderr is logged line by line at debug level. A non-zero exit turns into
/// an error carrying the exit code and the tail of stderr.
pub async fn run_capture(label: &str, cmd_line: &str, cwd: &Path) -> Result<String> {
    info!(tool = %label, cmd = %cmd_line, "running external command");

    let mut cmd = if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(cmd_line);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(cmd_line);
        c
    };

    cmd.current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let output = cmd
        .output()
        .await
        .with_context(|| format!("spawning process for {label}"))?;

    let stderr = String::from_utf8_lossy(&output.stderr);
    for line in stderr.lines() {
        debug!(tool = %label, "stderr: {}", line);
    }

    let code = output.status.code().unwrap_or(-1);
    if !output.status.success() {
        let lines: Vec<&str> = stderr.lines().collect();
        let tail = lines[lines.len().saturating_sub(STDERR_TAIL)..].join("\n");
        bail!("{label} exited with code {code}\n{tail}");
    }

    debug!(tool = %label, exit_code = code, bytes = output.stdout.len(), "command finished");

    String::from_utf8(output.stdout).with_context(|| format!("{label} produced non UTF-8 output"))
}
