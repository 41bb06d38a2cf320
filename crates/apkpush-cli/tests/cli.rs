//! End-to-end tests for the `apkpush` binary.

use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};
use tempfile::TempDir;

/// Test context with an isolated apkpush home and, on unix, fake
/// `adb`/`aapt` scripts that log every invocation.
struct TestContext {
    temp_dir: TempDir,
    home: PathBuf,
}

impl TestContext {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let home = temp_dir.path().join(".apkpush");
        fs::create_dir_all(&home).expect("failed to create apkpush home");
        Self { temp_dir, home }
    }

    fn cmd(&self) -> Command {
        let bin_path = env!("CARGO_BIN_EXE_apkpush");
        let mut cmd = Command::new(bin_path);
        cmd.env("HOME", self.temp_dir.path())
            .env("APKPUSH_HOME", &self.home)
            .env_remove("ANDROID_SERIAL")
            .env_remove("APKPUSH_ADB")
            .env_remove("APKPUSH_AAPT")
            .env_remove("RUST_LOG");
        cmd
    }

    fn path(&self, name: &str) -> PathBuf {
        self.temp_dir.path().join(name)
    }

    fn write_apk(&self, entries: &[(&str, &[u8])]) -> PathBuf {
        let apk = self.path("app.apk");
        let mut writer = zip::ZipWriter::new(fs::File::create(&apk).unwrap());
        for (name, data) in entries {
            writer
                .start_file(*name, zip::write::SimpleFileOptions::default())
                .unwrap();
            writer.write_all(data).unwrap();
        }
        writer.finish().unwrap();
        apk
    }
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn test_help_command() {
    let ctx = TestContext::new();
    let output = ctx.cmd().arg("--help").output().expect("failed to run apkpush");
    assert!(output.status.success());
    let out = stdout(&output);
    assert!(out.contains("Usage:"));
    assert!(out.contains("push"));
    assert!(out.contains("libs"));
}

#[test]
fn test_version_command() {
    let ctx = TestContext::new();
    let output = ctx.cmd().arg("--version").output().expect("failed to run apkpush");
    assert!(output.status.success());
    assert!(stdout(&output).contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_completions_command() {
    let ctx = TestContext::new();
    let output = ctx
        .cmd()
        .args(["completions", "bash"])
        .output()
        .expect("failed to run apkpush");
    assert!(output.status.success());
    assert!(stdout(&output).contains("apkpush"));
}

#[test]
fn test_missing_apk_fails() {
    let ctx = TestContext::new();
    let output = ctx
        .cmd()
        .args(["libs", "does-not-exist.apk", "--target", "/data/app/x"])
        .output()
        .expect("failed to run apkpush");
    assert!(!output.status.success());
    assert!(stderr(&output).contains("APK not found"));
}

#[test]
fn test_invalid_config_fails() {
    let ctx = TestContext::new();
    fs::write(ctx.home.join("config.toml"), "adbb = \"/typo\"\n").unwrap();
    let output = ctx.cmd().arg("info").output().expect("failed to run apkpush");
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Failed to load configuration"));
}

#[cfg(unix)]
mod fake_device {
    use super::*;
    use std::os::unix::fs::PermissionsExt;

    const FAKE_ADB: &str = r#"#!/bin/sh
echo "$@" >> "$APKPUSH_TEST_LOG"
case "$1" in
  devices) printf 'List of devices attached\nemulator-5554\tdevice\n' ;;
  version) echo "Android Debug Bridge version 1.0.41" ;;
  shell)
    case "$2" in
      getprop*) echo "arm64-v8a" ;;
      pm*) echo "package:/data/app/com.example-1/base.apk" ;;
    esac ;;
  push) echo "1 file pushed" ;;
esac
exit 0
"#;

    const FAKE_AAPT: &str = r#"#!/bin/sh
case "$1" in
  dump) echo "package: name='com.example' versionCode='3' versionName='1.2'" ;;
  version) echo "Android Asset Packaging Tool, v0.2" ;;
esac
exit 0
"#;

    fn script(ctx: &TestContext, name: &str, body: &str) -> PathBuf {
        let path = ctx.path(name);
        fs::write(&path, body).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    fn device_cmd(ctx: &TestContext) -> Command {
        let adb = script(ctx, "adb", FAKE_ADB);
        let aapt = script(ctx, "aapt", FAKE_AAPT);
        let mut cmd = ctx.cmd();
        cmd.arg("--adb")
            .arg(adb)
            .arg("--aapt")
            .arg(aapt)
            .env("APKPUSH_TEST_LOG", ctx.path("adb.log"));
        cmd
    }

    fn adb_log(ctx: &TestContext) -> Vec<String> {
        fs::read_to_string(ctx.path("adb.log"))
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }

    fn sample_apk(ctx: &TestContext) -> PathBuf {
        ctx.write_apk(&[
            ("AndroidManifest.xml", b"<manifest/>"),
            ("lib/arm64-v8a/liba.so", b"a"),
            ("lib/arm64-v8a/libb.so", b"b"),
            ("lib/x86/libc.so", b"c"),
        ])
    }

    fn json(output: &Output) -> serde_json::Value {
        serde_json::from_str(&stdout(output)).expect("stdout is not JSON")
    }

    #[test]
    fn test_push_dry_run_changes_nothing() {
        let ctx = TestContext::new();
        let apk = sample_apk(&ctx);

        let output = device_cmd(&ctx)
            .args(["push", "--dry-run", "--json"])
            .arg(&apk)
            .output()
            .expect("failed to run apkpush");
        assert!(output.status.success(), "stderr: {}", stderr(&output));

        let summary = json(&output);
        assert_eq!(summary["package"], "com.example");
        assert_eq!(summary["location"]["target_dir"], "/data/app/com.example-1");
        assert_eq!(summary["apk_pushed"], false);
        assert_eq!(summary["libraries"]["mode"], "planned");
        assert_eq!(summary["libraries"]["files"].as_array().unwrap().len(), 2);

        let log = adb_log(&ctx);
        assert!(log.iter().all(|l| !l.starts_with("push") && !l.contains("rm -rf")));
    }

    #[test]
    fn test_libs_deploys_matching_abi() {
        let ctx = TestContext::new();
        let apk = sample_apk(&ctx);

        let output = device_cmd(&ctx)
            .args(["libs", "--yes", "--json", "--target", "/data/local/tmp/app"])
            .arg(&apk)
            .output()
            .expect("failed to run apkpush");
        assert!(output.status.success(), "stderr: {}", stderr(&output));

        let report = json(&output);
        assert_eq!(report["mode"], "deployed");
        assert_eq!(report["outcomes"].as_array().unwrap().len(), 2);

        let log = adb_log(&ctx);
        let rm = log
            .iter()
            .position(|l| l == "shell rm -rf /data/local/tmp/app/lib")
            .expect("library directory not wiped");
        let pushes: Vec<_> = log
            .iter()
            .enumerate()
            .filter(|(_, l)| l.starts_with("push "))
            .collect();
        assert_eq!(pushes.len(), 2);
        assert!(pushes.iter().all(|(i, _)| *i > rm));
        assert!(pushes[0].1.ends_with("/data/local/tmp/app/lib/arm64-v8a/liba.so"));
        assert!(log.iter().all(|l| !l.contains("/x86/")));
    }

    #[test]
    fn test_libs_without_native_code_skips_device() {
        let ctx = TestContext::new();
        let apk = ctx.write_apk(&[("classes.dex", b"dex")]);

        let output = device_cmd(&ctx)
            .args(["libs", "--yes", "--target", "/data/local/tmp/app"])
            .arg(&apk)
            .output()
            .expect("failed to run apkpush");
        assert!(output.status.success(), "stderr: {}", stderr(&output));
        assert!(stdout(&output).contains("No native libraries found"));

        // Only the connection check reaches adb
        assert_eq!(adb_log(&ctx), vec!["devices"]);
    }

    #[test]
    fn test_libs_rejects_blank_target() {
        let ctx = TestContext::new();
        let apk = sample_apk(&ctx);

        for target in ["", "/"] {
            let output = device_cmd(&ctx)
                .args(["libs", "--yes", "--target", target])
                .arg(&apk)
                .output()
                .expect("failed to run apkpush");
            assert!(!output.status.success());
            assert!(stderr(&output).contains("Invalid target directory"));
        }

        let log = adb_log(&ctx);
        assert!(log.iter().all(|l| !l.contains("rm ") && !l.starts_with("push")));
    }

    #[test]
    fn test_push_backup_asks_first() {
        let ctx = TestContext::new();
        let apk = sample_apk(&ctx);

        // Decline the backup, then decline the replacement
        let mut child = device_cmd(&ctx)
            .args(["push", "--backup"])
            .arg(&apk)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .expect("failed to run apkpush");
        child.stdin.take().unwrap().write_all(b"n\nn\n").unwrap();
        let output = child.wait_with_output().unwrap();
        assert!(output.status.success(), "stderr: {}", stderr(&output));
        assert!(stderr(&output).contains("Create a data backup of com.example?"));

        let log = adb_log(&ctx);
        assert!(log.iter().all(|l| !l.starts_with("backup") && !l.starts_with("push")));
    }

    #[test]
    fn test_push_backup_with_yes_skips_prompt() {
        let ctx = TestContext::new();
        let apk = sample_apk(&ctx);

        let output = device_cmd(&ctx)
            .args(["push", "--backup", "--yes", "--skip-so"])
            .arg(&apk)
            .stdin(Stdio::null())
            .output()
            .expect("failed to run apkpush");
        assert!(output.status.success(), "stderr: {}", stderr(&output));
        assert!(!stderr(&output).contains("Create a data backup"));

        let log = adb_log(&ctx);
        let backup = log
            .iter()
            .position(|l| l.starts_with("backup -apk"))
            .expect("backup not run");
        assert!(log[backup].ends_with("com.example"));
        let push = log
            .iter()
            .position(|l| l.starts_with("push "))
            .expect("apk not pushed");
        assert!(backup < push);
    }

    #[test]
    fn test_info_lists_device() {
        let ctx = TestContext::new();
        let output = device_cmd(&ctx).arg("info").output().expect("failed to run apkpush");
        assert!(output.status.success(), "stderr: {}", stderr(&output));
        let out = stdout(&output);
        assert!(out.contains("Android Debug Bridge version 1.0.41"));
        assert!(out.contains("emulator-5554"));
    }
}
