//! Push command

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result, bail};
use apkpush_core::device::soft_restart;
use apkpush_core::{AdbBridge, DeviceBridge, NullReporter, PackageInspector, Reporter};
use serde::Serialize;

use super::info::print_system_info;
use super::libs::{Deployment, deploy_libraries, ensure_apk, print_deployment};
use crate::ops::device::ensure_device;
use crate::ops::{Context, InstallLocation};
use crate::ui::theme::format_size;
use crate::ui::{Output, confirm};

/// Options of `apkpush push`.
#[derive(Debug, Clone)]
pub struct PushOptions {
    pub apk: PathBuf,
    pub target: Option<String>,
    pub backup: bool,
    pub skip_so: bool,
    pub restart: bool,
    pub json: bool,
}

/// What `push --json` prints.
#[derive(Debug, Serialize)]
struct PushSummary {
    package: String,
    location: InstallLocation,
    dry_run: bool,
    backup: Option<PathBuf>,
    apk_pushed: bool,
    libraries: Option<Deployment>,
    restarted: bool,
}

/// Replace an installed APK and redeploy its native libraries.
pub fn push(ctx: &Context, opts: &PushOptions) -> Result<()> {
    let out = Output::new();
    let reporter: &dyn Reporter = if opts.json { &NullReporter } else { &out };

    if ctx.verbose && !opts.json {
        print_system_info(ctx, &out);
    }

    let bridge = ctx.bridge()?;
    ensure_device(&bridge)?;
    ensure_apk(&opts.apk)?;

    let package = ctx.inspector()?.package_id(&opts.apk)?;
    reporter.section(&format!("Pushing {package}"));

    let location = match &opts.target {
        Some(dir) => InstallLocation::explicit(dir)?,
        None => InstallLocation::resolve(&bridge, &package)?,
    };
    reporter.info(&format!("Target: {}", location.target_dir));

    let backup = if opts.backup {
        backup(ctx, &bridge, reporter, package.as_str())?
    } else {
        None
    };

    if !ctx.dry_run
        && !ctx.yes
        && !confirm(&format!("Replace {}?", location.apk_path))?
    {
        reporter.error("Operation cancelled");
        return Ok(());
    }

    let apk_pushed = push_apk(ctx, &bridge, reporter, &opts.apk, &location.apk_path)?;

    let libraries = if opts.skip_so {
        reporter.info("Skipping native libraries");
        None
    } else {
        let deployment = deploy_libraries(ctx, &bridge, reporter, &opts.apk, &location.target_dir)?;
        if !opts.json {
            print_deployment(&out, &deployment);
        }
        Some(deployment)
    };

    let restarted = restart(ctx, opts, &bridge, reporter)?;

    if opts.json {
        let summary = PushSummary {
            package: package.to_string(),
            location,
            dry_run: ctx.dry_run,
            backup,
            apk_pushed,
            libraries,
            restarted,
        };
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else if !ctx.dry_run {
        out.success("Push complete");
    }
    Ok(())
}

/// Back up the app before replacing it, once the user agrees (or `--yes`).
/// Backup failures only warn.
fn backup(
    ctx: &Context,
    bridge: &AdbBridge,
    reporter: &dyn Reporter,
    package: &str,
) -> Result<Option<PathBuf>> {
    let dest = ctx.backup_file(package);
    if ctx.dry_run {
        reporter.info(&format!("Would back up to {}", dest.display()));
        return Ok(None);
    }

    if !ctx.yes && !confirm(&format!("Create a data backup of {package}?"))? {
        reporter.info("Backup skipped");
        return Ok(None);
    }

    if let Err(e) = std::fs::create_dir_all(&ctx.backup_dir) {
        reporter.warning(&format!(
            "Backup skipped, cannot create {}: {e}",
            ctx.backup_dir.display()
        ));
        return Ok(None);
    }

    reporter.info(&format!("Backing up to {}", dest.display()));
    reporter.info("Confirm the backup on the device");
    match bridge.backup(package, &dest) {
        Ok(()) => {
            reporter.success("Backup created");
            Ok(Some(dest))
        }
        Err(e) => {
            tracing::warn!(error = %e, "Backup failed");
            reporter.warning(&format!("Backup failed, continuing: {e}"));
            Ok(None)
        }
    }
}

fn push_apk(
    ctx: &Context,
    bridge: &AdbBridge,
    reporter: &dyn Reporter,
    apk: &Path,
    remote_path: &str,
) -> Result<bool> {
    let size = std::fs::metadata(apk)
        .with_context(|| format!("Failed to read {}", apk.display()))?
        .len();

    if ctx.dry_run {
        reporter.info(&format!("Would push {} ({}) to {remote_path}", apk.display(), format_size(size)));
        return Ok(false);
    }

    reporter.info(&format!("Pushing {} ({})", apk.display(), format_size(size)));
    let output = bridge.push(apk, remote_path)?;
    if !output.success() {
        bail!("Failed to push APK to {remote_path}: {}", output.failure_detail());
    }
    tracing::info!(remote = remote_path, "Pushed APK");
    reporter.success(&format!("APK pushed to {remote_path}"));
    Ok(true)
}

/// Restart the framework if asked to (or if the user agrees).
fn restart(
    ctx: &Context,
    opts: &PushOptions,
    bridge: &AdbBridge,
    reporter: &dyn Reporter,
) -> Result<bool> {
    if ctx.dry_run {
        if opts.restart {
            reporter.info("Would restart the Android framework");
        }
        return Ok(false);
    }

    let wanted = if opts.restart || ctx.yes {
        true
    } else if opts.json {
        false
    } else {
        confirm("Restart the Android framework now?")?
    };
    if !wanted {
        reporter.info("Restart the device to load the new APK");
        return Ok(false);
    }

    reporter.info("Restarting the Android framework");
    soft_restart(bridge).context("Framework restart failed")?;
    reporter.success("Framework restarted");
    Ok(true)
}
