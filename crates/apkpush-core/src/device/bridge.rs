//! The channel to the device.
//!
//! Everything the core does on the device goes through [`DeviceBridge`]:
//! shell commands and file pushes. [`AdbBridge`] implements it by spawning
//! the `adb` executable; tests substitute an in-memory fake.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use thiserror::Error;

/// Errors talking to the device.
#[derive(Error, Debug)]
pub enum BridgeError {
    /// The tool is neither configured nor on `PATH`.
    #[error("'{tool}' not found. Install the Android SDK platform-tools or set its path with --{tool}")]
    ToolNotFound {
        /// Executable name
        tool: &'static str,
    },

    /// The tool exists but could not be started.
    #[error("Failed to spawn {tool}: {source}")]
    Spawn {
        /// Executable name
        tool: &'static str,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// A host-side command (not a device shell command) failed.
    #[error("{tool} {command} failed: {detail}")]
    Failed {
        /// Executable name
        tool: &'static str,
        /// Subcommand that failed
        command: String,
        /// Exit status and output
        detail: String,
    },
}

/// Captured result of a device command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` if the process was killed by a signal
    pub code: Option<i32>,
    /// Standard output, lossily decoded
    pub stdout: String,
    /// Standard error, lossily decoded
    pub stderr: String,
}

impl CommandOutput {
    /// Successful output with the given stdout.
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// Failed output with the given exit code and stderr.
    pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// Whether the command exited with status 0.
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Stdout and stderr combined, trimmed, for error messages.
    pub fn combined(&self) -> String {
        let mut text = self.stdout.trim().to_string();
        let stderr = self.stderr.trim();
        if !stderr.is_empty() {
            if !text.is_empty() {
                text.push('\n');
            }
            text.push_str(stderr);
        }
        text
    }

    /// Describe a failed command: exit status plus whatever it printed.
    pub fn failure_detail(&self) -> String {
        let status = self
            .code
            .map_or_else(|| "killed by signal".to_string(), |c| format!("exit code {c}"));
        let output = self.combined();
        if output.is_empty() {
            status
        } else {
            format!("{status}, output: {output}")
        }
    }
}

impl From<Output> for CommandOutput {
    fn from(output: Output) -> Self {
        Self {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }
}

/// Shell commands and file transfers against a single connected device.
///
/// Commands are blocking; each is fully awaited before returning. An `Err`
/// means the command could not be issued at all; a command that ran and
/// failed comes back as `Ok` with a non-zero [`CommandOutput::code`].
pub trait DeviceBridge {
    /// Run `argv` in the device shell.
    fn shell(&self, argv: &[&str]) -> Result<CommandOutput, BridgeError>;

    /// Copy a local file to `remote_path` on the device.
    fn push(&self, local_path: &Path, remote_path: &str) -> Result<CommandOutput, BridgeError>;
}

impl<T: DeviceBridge + ?Sized> DeviceBridge for &T {
    fn shell(&self, argv: &[&str]) -> Result<CommandOutput, BridgeError> {
        (**self).shell(argv)
    }

    fn push(&self, local_path: &Path, remote_path: &str) -> Result<CommandOutput, BridgeError> {
        (**self).push(local_path, remote_path)
    }
}

/// Quote an argument for the device's `/system/bin/sh`.
///
/// `adb shell` joins its arguments with spaces and hands the result to the
/// remote shell, so anything beyond a plain word must be quoted.
pub fn shell_quote(arg: &str) -> String {
    let plain = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:=@%+,".contains(c));
    if plain {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}

/// [`DeviceBridge`] over the `adb` command-line tool.
#[derive(Debug, Clone)]
pub struct AdbBridge {
    adb: PathBuf,
    serial: Option<String>,
}

impl AdbBridge {
    /// Use an explicit `adb` binary.
    pub fn new(adb: impl Into<PathBuf>, serial: Option<String>) -> Self {
        Self {
            adb: adb.into(),
            serial,
        }
    }

    /// Use `adb` from `explicit`, or from `PATH`.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::ToolNotFound`] if no path was given and `adb`
    /// is not on `PATH`.
    pub fn locate(explicit: Option<&Path>, serial: Option<String>) -> Result<Self, BridgeError> {
        let adb = match explicit {
            Some(path) => path.to_path_buf(),
            None => which::which("adb").map_err(|_| BridgeError::ToolNotFound { tool: "adb" })?,
        };
        tracing::debug!(adb = %adb.display(), serial = ?serial, "Using adb");
        Ok(Self::new(adb, serial))
    }

    /// Path of the `adb` executable in use.
    pub fn adb_path(&self) -> &Path {
        &self.adb
    }

    /// Device serial this bridge targets, if pinned.
    pub fn serial(&self) -> Option<&str> {
        self.serial.as_deref()
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.adb);
        if let Some(serial) = &self.serial {
            cmd.arg("-s").arg(serial);
        }
        cmd
    }

    fn run(&self, mut cmd: Command, what: &str) -> Result<CommandOutput, BridgeError> {
        tracing::debug!(command = what, "adb");
        let output = match cmd.output() {
            Ok(o) => o,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(BridgeError::ToolNotFound { tool: "adb" });
            }
            Err(e) => return Err(BridgeError::Spawn { tool: "adb", source: e }),
        };
        let output = CommandOutput::from(output);
        if !output.success() {
            tracing::debug!(command = what, detail = %output.failure_detail(), "adb command failed");
        }
        Ok(output)
    }

    /// List attached devices (`adb devices`).
    ///
    /// # Errors
    ///
    /// Returns an error if `adb` cannot be run or exits unsuccessfully.
    pub fn devices(&self) -> Result<Vec<super::DeviceInfo>, BridgeError> {
        let mut cmd = Command::new(&self.adb);
        cmd.arg("devices");
        let output = self.run(cmd, "devices")?;
        if !output.success() {
            return Err(BridgeError::Failed {
                tool: "adb",
                command: "devices".to_string(),
                detail: output.failure_detail(),
            });
        }
        Ok(super::parse_devices(&output.stdout))
    }

    /// First line of `adb version`.
    ///
    /// # Errors
    ///
    /// Returns an error if `adb` cannot be run.
    pub fn version(&self) -> Result<String, BridgeError> {
        let mut cmd = Command::new(&self.adb);
        cmd.arg("version");
        let output = self.run(cmd, "version")?;
        Ok(output.stdout.lines().next().unwrap_or("").trim().to_string())
    }

    /// Back up the package's data and APK to `dest` (`adb backup`).
    ///
    /// The device asks its user to confirm; this call blocks until they do.
    ///
    /// # Errors
    ///
    /// Returns an error if `adb` cannot be run or the backup fails.
    pub fn backup(&self, package: &str, dest: &Path) -> Result<(), BridgeError> {
        let mut cmd = self.command();
        cmd.args(["backup", "-apk", "-shared", "-nosystem", "-f"])
            .arg(dest)
            .arg(package);
        let output = self.run(cmd, "backup")?;
        if output.success() {
            Ok(())
        } else {
            Err(BridgeError::Failed {
                tool: "adb",
                command: format!("backup {package}"),
                detail: output.failure_detail(),
            })
        }
    }
}

impl DeviceBridge for AdbBridge {
    fn shell(&self, argv: &[&str]) -> Result<CommandOutput, BridgeError> {
        let remote = argv
            .iter()
            .map(|a| shell_quote(a))
            .collect::<Vec<_>>()
            .join(" ");
        let mut cmd = self.command();
        cmd.arg("shell").arg(&remote);
        self.run(cmd, &format!("shell {remote}"))
    }

    fn push(&self, local_path: &Path, remote_path: &str) -> Result<CommandOutput, BridgeError> {
        let mut cmd = self.command();
        cmd.arg("push").arg(local_path).arg(remote_path);
        self.run(
            cmd,
            &format!("push {} {remote_path}", local_path.display()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shell_quote_plain_words() {
        assert_eq!(shell_quote("rm"), "rm");
        assert_eq!(shell_quote("-rf"), "-rf");
        assert_eq!(
            shell_quote("/data/app/com.example-1/lib"),
            "/data/app/com.example-1/lib"
        );
    }

    #[test]
    fn test_shell_quote_special() {
        assert_eq!(shell_quote("my dir"), "'my dir'");
        assert_eq!(shell_quote("a;reboot"), "'a;reboot'");
        assert_eq!(shell_quote("it's"), r"'it'\''s'");
        assert_eq!(shell_quote(""), "''");
    }

    #[test]
    fn test_command_output_detail() {
        let out = CommandOutput::failed(1, "rm: /data/app/x/lib: Permission denied\n");
        assert!(!out.success());
        assert_eq!(
            out.failure_detail(),
            "exit code 1, output: rm: /data/app/x/lib: Permission denied"
        );
        assert_eq!(CommandOutput::failed(255, "").failure_detail(), "exit code 255");
    }

    #[test]
    fn test_missing_adb_binary_is_tool_not_found() {
        let bridge = AdbBridge::new("/nonexistent/path/to/adb", None);
        let err = bridge.shell(&["getprop", "ro.product.cpu.abi"]).unwrap_err();
        assert!(matches!(err, BridgeError::ToolNotFound { tool: "adb" }));
    }
}
