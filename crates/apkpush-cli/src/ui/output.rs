//! Console output.
//!
//! Progress and results go to stdout, warnings and errors to stderr.
//! Everything is printed as it happens; commands are sequential so no
//! buffering or rendering thread is needed.

use apkpush_core::Reporter;
use apkpush_core::device::remote;
use apkpush_schema::{Abi, DeployStatus, DeploymentPlan, DeploymentReport, FailureStage};
use crossterm::style::Stylize;

use super::theme::{Icons, plural};

/// Width of the label column in key/value listings.
const LABEL_WIDTH: usize = 12;

/// Styled terminal reporter.
#[derive(Debug, Clone, Default)]
pub struct Output {
    icons: Icons,
}

impl Output {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prints a visual section header for an operation phase.
    pub fn section(&self, title: &str) {
        println!();
        println!("{}", title.bold());
    }

    /// Prints an informational message.
    pub fn info(&self, msg: &str) {
        println!("  {} {msg}", self.icons.info.dark_grey());
    }

    /// Prints a success message.
    pub fn success(&self, msg: &str) {
        println!("  {} {msg}", self.icons.success.green());
    }

    /// Prints a warning message.
    pub fn warning(&self, msg: &str) {
        eprintln!("  {} {msg}", self.icons.warning.yellow());
    }

    /// Prints an error message.
    pub fn error(&self, msg: &str) {
        eprintln!("  {} {msg}", self.icons.error.red());
    }

    /// Prints a `label value` line.
    pub fn field(&self, label: &str, value: &str) {
        println!("  {}{value}", format!("{label:<LABEL_WIDTH$}").dark_grey());
    }

    /// Prints the closing summary of a library deployment.
    pub fn deployment_summary(&self, report: &DeploymentReport) {
        if report.status == DeployStatus::NoLibraries {
            return;
        }

        let failed = report.failed();
        let pushed = plural(report.succeeded(), "library", "libraries");
        if failed == 0 {
            self.success(&format!("{pushed} deployed"));
            return;
        }

        self.warning(&format!(
            "{pushed} deployed, {} failed:",
            plural(failed, "library", "libraries")
        ));
        for outcome in report.failures() {
            if let Some(failure) = &outcome.failure {
                eprintln!(
                    "      {} {} ({}): {}",
                    self.icons.error.red(),
                    outcome.entry,
                    failure.stage,
                    failure.reason
                );
            }
        }
    }

    /// Prints what a deployment would do.
    pub fn plan(&self, plan: &DeploymentPlan) {
        let Some(selection) = &plan.selection else {
            self.info("No native libraries found");
            return;
        };

        match &plan.device_abi {
            Some(abi) => self.field("device abi", abi.as_str()),
            None => self.field("device abi", "unknown"),
        }
        self.field("selection", &selection.to_string());
        self.info(&format!("Would remove {}", plan.lib_dir));
        for file in &plan.files {
            println!(
                "    {} {} {}",
                remote::basename(&file.entry),
                self.icons.arrow.dark_grey(),
                file.remote_path
            );
        }
        self.info(&format!(
            "Would push {}",
            plural(plan.files.len(), "library", "libraries")
        ));
    }
}

impl Reporter for Output {
    fn section(&self, title: &str) {
        self.section(title);
    }

    fn group_started(&self, abi: &Abi, files: usize) {
        println!(
            "  {} {} {}",
            self.icons.active.cyan(),
            abi.as_str().bold(),
            format!("({})", plural(files, "library", "libraries")).dark_grey()
        );
    }

    fn file_pushed(&self, entry: &str, remote_path: &str) {
        println!(
            "    {} {} {} {}",
            self.icons.success.green(),
            remote::basename(entry),
            self.icons.arrow.dark_grey(),
            remote_path.dark_grey()
        );
    }

    fn file_failed(&self, entry: &str, stage: FailureStage, reason: &str) {
        eprintln!(
            "    {} {} {}",
            self.icons.error.red(),
            remote::basename(entry),
            format!("{stage} failed: {reason}").red()
        );
    }

    fn info(&self, msg: &str) {
        self.info(msg);
    }

    fn success(&self, msg: &str) {
        self.success(msg);
    }

    fn warning(&self, msg: &str) {
        self.warning(msg);
    }

    fn error(&self, msg: &str) {
        self.error(msg);
    }
}
