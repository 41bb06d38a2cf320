//! Libs command

use std::path::Path;

use anyhow::{Context as _, Result, bail};
use apkpush_core::{AdbBridge, Deployer, NullReporter, PackageInspector, Reporter};
use apkpush_schema::{DeploymentPlan, DeploymentReport};
use serde::Serialize;

use crate::ops::device::ensure_device;
use crate::ops::{Context, InstallLocation};
use crate::ui::{Output, confirm};

/// Result of the native library step.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Deployment {
    /// `--dry-run`: nothing was changed
    Planned(DeploymentPlan),
    Deployed(DeploymentReport),
}

/// Deploy (or plan) the native libraries of `apk` into `<target_dir>/lib`.
pub fn deploy_libraries(
    ctx: &Context,
    bridge: &AdbBridge,
    reporter: &dyn Reporter,
    apk: &Path,
    target_dir: &str,
) -> Result<Deployment> {
    let deployer =
        Deployer::new(bridge, reporter).with_staging_dir(ctx.staging_dir().map(Path::to_path_buf));

    if ctx.dry_run {
        let plan = deployer
            .plan(apk, target_dir)
            .context("Failed to plan native library deployment")?;
        return Ok(Deployment::Planned(plan));
    }

    let report = deployer
        .deploy_native_libraries(apk, target_dir)
        .context("Native library deployment failed")?;
    Ok(Deployment::Deployed(report))
}

/// Print the human-readable result of [`deploy_libraries`].
pub fn print_deployment(out: &Output, deployment: &Deployment) {
    match deployment {
        Deployment::Planned(plan) => out.plan(plan),
        Deployment::Deployed(report) => out.deployment_summary(report),
    }
}

/// Fail early with a clear message instead of an archive error.
pub fn ensure_apk(apk: &Path) -> Result<()> {
    if !apk.is_file() {
        bail!("APK not found: {}", apk.display());
    }
    Ok(())
}

/// Deploy only the native libraries of an APK.
pub fn libs(ctx: &Context, apk: &Path, target: Option<&str>, json: bool) -> Result<()> {
    ensure_apk(apk)?;
    let out = Output::new();
    let reporter: &dyn Reporter = if json { &NullReporter } else { &out };

    let bridge = ctx.bridge()?;
    ensure_device(&bridge)?;

    let location = match target {
        Some(dir) => InstallLocation::explicit(dir)?,
        None => {
            let package = ctx.inspector()?.package_id(apk)?;
            reporter.info(&format!("Package: {package}"));
            InstallLocation::resolve(&bridge, &package)?
        }
    };

    if !ctx.dry_run
        && !ctx.yes
        && !confirm(&format!("Replace native libraries in {}/lib?", location.target_dir))?
    {
        reporter.error("Operation cancelled");
        return Ok(());
    }

    let deployment = deploy_libraries(ctx, &bridge, reporter, apk, &location.target_dir)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&deployment)?);
    } else {
        print_deployment(&out, &deployment);
    }
    Ok(())
}
