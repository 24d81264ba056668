//! # Permission Module
//!
//! Makes sure the current process can read and write a device node before it
//! is opened. When it cannot, a privileged helper shell is asked to
//! `chmod 666` the node.

use std::ffi::OsString;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};

use log::{debug, error, warn};
use nix::unistd::{AccessFlags, access};

use crate::error::{Result, SerialDeviceError};

/// Read/write access check.
#[cfg_attr(test, mockall::automock)]
pub trait AccessCheck {
    /// Whether the current process may both read and write `path`.
    fn can_read_write(&self, path: &Path) -> bool;
}

/// Privilege escalation strategy.
#[cfg_attr(test, mockall::automock)]
pub trait Escalation {
    /// Try to make `path` readable and writable for this process.
    fn grant_read_write(&self, path: &Path) -> io::Result<()>;
}

/// `access(2)` with `R_OK | W_OK`.
#[derive(Clone, Copy, Debug, Default)]
pub struct OsAccess;

impl AccessCheck for OsAccess {
    fn can_read_write(&self, path: &Path) -> bool {
        access(path, AccessFlags::R_OK | AccessFlags::W_OK).is_ok()
    }
}

/// Superuser shell helper.
///
/// Writes `chmod 666 <path>\nexit\n` to the helper's stdin and waits for it
/// to exit. Only a zero exit status counts as success.
#[derive(Clone, Debug)]
pub struct SuEscalation {
    helper: PathBuf,
}

impl SuEscalation {
    /// helper used when none is given
    pub const DEFAULT_HELPER: &'static str = if cfg!(target_os = "android") {
        "/system/bin/su"
    } else {
        "su"
    };

    pub fn new(helper: impl Into<PathBuf>) -> Self {
        SuEscalation {
            helper: helper.into(),
        }
    }

    /// get helper program
    pub fn helper(&self) -> &Path {
        &self.helper
    }

    /// Command text sent to the helper for `path`.
    pub fn command_for(path: &Path) -> io::Result<String> {
        let path = std::path::absolute(path)?;
        Ok(format!("chmod 666 {}\nexit\n", shell_quote(path.into_os_string())))
    }

    fn feed(child: &mut Child, cmd: &str) -> io::Result<()> {
        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| io::Error::other("helper stdin unavailable"))?;
        stdin.write_all(cmd.as_bytes())?;
        stdin.flush()
        // stdin dropped here, helper sees EOF after `exit`
    }
}

impl Default for SuEscalation {
    fn default() -> Self {
        SuEscalation::new(Self::DEFAULT_HELPER)
    }
}

impl Escalation for SuEscalation {
    fn grant_read_write(&self, path: &Path) -> io::Result<()> {
        let cmd = Self::command_for(path)?;
        let mut child = Command::new(&self.helper)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;

        if let Err(e) = Self::feed(&mut child, &cmd) {
            let _ = child.kill();
            let _ = child.wait();
            return Err(e);
        }

        let status = child.wait()?;
        if !status.success() {
            return Err(io::Error::other(format!(
                "{} exited with {status}",
                self.helper.display()
            )));
        }
        Ok(())
    }
}

/// Quote `arg` for a POSIX shell unless it only holds safe characters.
fn shell_quote(arg: OsString) -> String {
    let arg = arg.to_string_lossy();
    let safe = !arg.is_empty()
        && arg
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b"/._-+:@%,".contains(&b));
    if safe {
        arg.into_owned()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}

/// Pre-check, escalate, post-check.
#[derive(Clone, Debug, Default)]
pub struct PermissionNegotiator<A = OsAccess, E = SuEscalation> {
    access: A,
    escalation: E,
}

impl<A: AccessCheck, E: Escalation> PermissionNegotiator<A, E> {
    pub fn new(access: A, escalation: E) -> Self {
        PermissionNegotiator { access, escalation }
    }

    /// Ensure `path` is readable and writable, escalating if needed.
    ///
    /// No helper is started when access already holds. Every failure of the
    /// escalation path is reported as [`SerialDeviceError::Permission`].
    pub fn ensure_accessible(&self, path: &Path) -> Result<()> {
        if self.access.can_read_write(path) {
            debug!("{} already readable and writable", path.display());
            return Ok(());
        }

        warn!(
            "No read/write access to {}, requesting escalation",
            path.display()
        );
        if let Err(e) = self.escalation.grant_read_write(path) {
            error!("Escalation for {} failed: {e}", path.display());
            return Err(SerialDeviceError::permission(path));
        }
        if !self.access.can_read_write(path) {
            error!(
                "Escalation for {} succeeded but access is still denied",
                path.display()
            );
            return Err(SerialDeviceError::permission(path));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::Sequence;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;

    #[test]
    fn test_accessible_path_skips_helper() {
        let mut access = MockAccessCheck::new();
        access.expect_can_read_write().times(1).return_const(true);
        let mut escalation = MockEscalation::new();
        escalation.expect_grant_read_write().never();

        let negotiator = PermissionNegotiator::new(access, escalation);
        assert!(negotiator.ensure_accessible(Path::new("/dev/ttyS0")).is_ok());
    }

    #[test]
    fn test_escalation_then_post_check() {
        let mut seq = Sequence::new();
        let mut access = MockAccessCheck::new();
        let mut escalation = MockEscalation::new();
        access
            .expect_can_read_write()
            .times(1)
            .in_sequence(&mut seq)
            .return_const(false);
        escalation
            .expect_grant_read_write()
            .withf(|p: &Path| p == Path::new("/dev/ttyS1"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        access
            .expect_can_read_write()
            .times(1)
            .in_sequence(&mut seq)
            .return_const(true);

        let negotiator = PermissionNegotiator::new(access, escalation);
        assert!(negotiator.ensure_accessible(Path::new("/dev/ttyS1")).is_ok());
    }

    #[test]
    fn test_helper_failure_is_permission_error() {
        let mut access = MockAccessCheck::new();
        access.expect_can_read_write().times(1).return_const(false);
        let mut escalation = MockEscalation::new();
        escalation
            .expect_grant_read_write()
            .times(1)
            .returning(|_| Err(io::Error::from(io::ErrorKind::NotFound)));

        let negotiator = PermissionNegotiator::new(access, escalation);
        let err = negotiator
            .ensure_accessible(Path::new("/dev/ttyS1"))
            .unwrap_err();
        assert!(err.is_permission());
    }

    #[test]
    fn test_failed_post_check_is_permission_error() {
        let mut access = MockAccessCheck::new();
        access.expect_can_read_write().times(2).return_const(false);
        let mut escalation = MockEscalation::new();
        escalation
            .expect_grant_read_write()
            .times(1)
            .returning(|_| Ok(()));

        let negotiator = PermissionNegotiator::new(access, escalation);
        let err = negotiator
            .ensure_accessible(Path::new("/dev/ttyS1"))
            .unwrap_err();
        assert!(err.is_permission());
    }

    #[test]
    fn test_failed_escalation_leaves_mode_untouched() {
        let file = tempfile::NamedTempFile::new().unwrap();
        fs::set_permissions(file.path(), fs::Permissions::from_mode(0o600)).unwrap();
        let before = fs::metadata(file.path()).unwrap().permissions().mode();

        let mut access = MockAccessCheck::new();
        access.expect_can_read_write().return_const(false);
        let mut escalation = MockEscalation::new();
        escalation
            .expect_grant_read_write()
            .returning(|_| Err(io::Error::other("su: not found")));

        let negotiator = PermissionNegotiator::new(access, escalation);
        assert!(negotiator.ensure_accessible(file.path()).is_err());

        let after = fs::metadata(file.path()).unwrap().permissions().mode();
        assert_eq!(before, after);
    }

    #[test]
    fn test_os_access_on_temp_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        assert!(OsAccess.can_read_write(file.path()));
        assert!(!OsAccess.can_read_write(Path::new("/nonexistent/ttyS9")));
    }

    #[test]
    fn test_command_text() {
        let cmd = SuEscalation::command_for(Path::new("/dev/ttyS1")).unwrap();
        assert_eq!(cmd, "chmod 666 /dev/ttyS1\nexit\n");
    }

    #[test]
    fn test_command_uses_absolute_path() {
        let cmd = SuEscalation::command_for(Path::new("ttyS1")).unwrap();
        let target = cmd
            .strip_prefix("chmod 666 ")
            .and_then(|rest| rest.strip_suffix("\nexit\n"))
            .unwrap();
        assert!(target.trim_start_matches('\'').starts_with('/'));
        assert!(target.trim_end_matches('\'').ends_with("/ttyS1"));
    }

    #[test]
    fn test_shell_quote() {
        assert_eq!(shell_quote("/dev/ttyUSB0".into()), "/dev/ttyUSB0");
        assert_eq!(shell_quote("/dev/my port".into()), "'/dev/my port'");
        assert_eq!(shell_quote("/dev/a'b".into()), r"'/dev/a'\''b'");
        assert_eq!(shell_quote("".into()), "''");
    }

    #[test]
    fn test_missing_helper_fails() {
        let escalation = SuEscalation::new("/nonexistent/bin/su");
        assert!(
            escalation
                .grant_read_write(Path::new("/dev/ttyS1"))
                .is_err()
        );
    }

    #[test]
    fn test_nonzero_helper_exit_fails() {
        let escalation = SuEscalation::new("false");
        assert!(
            escalation
                .grant_read_write(Path::new("/dev/ttyS1"))
                .is_err()
        );
    }

    #[test]
    fn test_helper_receives_command() {
        // `sh` stands in for su: it runs the chmod on a file we own.
        let file = tempfile::NamedTempFile::new().unwrap();
        fs::set_permissions(file.path(), fs::Permissions::from_mode(0o600)).unwrap();

        SuEscalation::new("sh")
            .grant_read_write(file.path())
            .unwrap();

        let mode = fs::metadata(file.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o666);
    }
}
