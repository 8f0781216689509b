//! Small process-related helpers shared across the workspace.
//!
//! Media tools are spawned in their own process group on Unix so that a
//! timeout or cancellation can take down the tool together with any helper
//! processes it forked, instead of only the direct child.

use std::ffi::OsStr;
use std::io;

#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

/// Apply the Windows `CREATE_NO_WINDOW` flag to child processes.
///
/// On non-Windows targets this is a no-op.
pub trait NoWindowExt {
    fn no_window(&mut self);
}

impl NoWindowExt for std::process::Command {
    fn no_window(&mut self) {
        #[cfg(windows)]
        {
            use std::os::windows::process::CommandExt;
            self.creation_flags(CREATE_NO_WINDOW);
        }
    }
}

#[cfg(feature = "tokio")]
impl NoWindowExt for tokio::process::Command {
    fn no_window(&mut self) {
        #[cfg(windows)]
        {
            use std::os::windows::process::CommandExt;
            self.as_std_mut().creation_flags(CREATE_NO_WINDOW);
        }
    }
}

/// Place the child in a fresh process group led by itself.
///
/// The group id of the spawned child equals its pid, which is what
/// [`kill_process_group`] expects. No-op outside Unix.
pub trait ProcessGroupExt {
    fn isolate_group(&mut self);
}

impl ProcessGroupExt for std::process::Command {
    fn isolate_group(&mut self) {
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            self.process_group(0);
        }
    }
}

#[cfg(feature = "tokio")]
impl ProcessGroupExt for tokio::process::Command {
    fn isolate_group(&mut self) {
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            self.as_std_mut().process_group(0);
        }
    }
}

/// Send `SIGKILL` to every process in the group led by `pid`.
///
/// A group that has already exited (`ESRCH`) is not an error.
#[cfg(unix)]
pub fn kill_process_group(pid: u32) -> io::Result<()> {
    let pgid = libc::pid_t::try_from(pid)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "pid out of range"))?;
    // SAFETY: killpg has no memory-safety preconditions.
    let rc = unsafe { libc::killpg(pgid, libc::SIGKILL) };
    if rc == 0 {
        return Ok(());
    }
    let err = io::Error::last_os_error();
    if err.raw_os_error() == Some(libc::ESRCH) {
        Ok(())
    } else {
        Err(err)
    }
}

/// Process groups are a Unix concept; elsewhere callers fall back to
/// killing the direct child.
#[cfg(not(unix))]
pub fn kill_process_group(_pid: u32) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "process groups are not supported on this platform",
    ))
}

/// Create a `std::process::Command` with `CREATE_NO_WINDOW` applied on Windows.
pub fn std_command(program: impl AsRef<OsStr>) -> std::process::Command {
    let mut cmd = std::process::Command::new(program);
    cmd.no_window();
    cmd
}

/// Create a `tokio::process::Command` with `CREATE_NO_WINDOW` applied on Windows.
#[cfg(feature = "tokio")]
pub fn tokio_command(program: impl AsRef<OsStr>) -> tokio::process::Command {
    let mut cmd = tokio::process::Command::new(program);
    cmd.no_window();
    cmd
}

/// Create a `tokio::process::Command` running in its own process group.
#[cfg(feature = "tokio")]
pub fn tokio_group_command(program: impl AsRef<OsStr>) -> tokio::process::Command {
    let mut cmd = tokio_command(program);
    cmd.isolate_group();
    cmd
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn kill_missing_group_is_ok() {
        // Spawn and reap a short-lived child; its group no longer exists.
        let mut child = std_command("true").spawn().unwrap();
        let pid = child.id();
        child.wait().unwrap();
        assert!(kill_process_group(pid).is_ok());
    }

    #[test]
    fn kill_group_terminates_sleeping_child() {
        let mut cmd = std_command("sleep");
        cmd.arg("30").isolate_group();
        let mut child = cmd.spawn().unwrap();

        kill_process_group(child.id()).unwrap();
        let status = child.wait().unwrap();
        assert!(!status.success());
    }

    #[cfg(feature = "tokio")]
    #[tokio::test]
    async fn tokio_group_command_runs() {
        let status = tokio_group_command("true").status().await.unwrap();
        assert!(status.success());
    }
}
