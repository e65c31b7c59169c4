use std::ffi::OsStr;
use std::io::ErrorKind;
use std::process::{Command, Output};

use scribe_core::BackendError;

/// First line of a tool's `--version` output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolVersion(pub String);

/// Run `program` with `args`, mapping a missing binary to
/// [`BackendError::NotInstalled`] and a non-zero exit to an error carrying
/// stderr.
pub(crate) fn run<I, S>(program: &str, args: I) -> Result<Output, BackendError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let output = Command::new(program).args(args).output().map_err(|e| {
        if e.kind() == ErrorKind::NotFound {
            BackendError::NotInstalled(program.to_string())
        } else {
            BackendError::Io(e)
        }
    })?;
    check_for_command_failure(program, &output)?;
    Ok(output)
}

fn check_for_command_failure(program: &str, output: &Output) -> Result<(), BackendError> {
    if output.status.success() {
        return Ok(());
    }
    let stderr = String::from_utf8_lossy(&output.stderr);
    let detail = stderr.trim();
    Err(BackendError::Extraction(format!(
        "{program} exited with {}{}{}",
        output.status,
        if detail.is_empty() { "" } else { ": " },
        detail
    )))
}

/// Check that `program` runs. Returns the first line of its version banner.
pub fn probe_tool(program: &str, version_flag: &str) -> Result<ToolVersion, BackendError> {
    let output = run(program, [version_flag])?;
    let banner = banner_line(&output.stdout, &output.stderr).unwrap_or_else(|| program.to_string());
    Ok(ToolVersion(banner))
}

/// Some tools print the banner on stderr (`pdftoppm -v`), so stdout is
/// searched first, then stderr.
fn banner_line(stdout: &[u8], stderr: &[u8]) -> Option<String> {
    [stdout, stderr].into_iter().find_map(|bytes| {
        String::from_utf8_lossy(bytes)
            .lines()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .map(String::from)
    })
}
