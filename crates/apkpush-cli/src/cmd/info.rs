//! Info command

use anyhow::Result;
use apkpush_core::AdbBridge;

use crate::ops::Context;
use crate::ui::Output;

/// Show host, tool and device information.
pub fn info(ctx: &Context) -> Result<()> {
    let out = Output::new();
    print_system_info(ctx, &out);
    Ok(())
}

/// Print what apkpush runs on and with. Missing tools are reported, not
/// treated as errors.
pub fn print_system_info(ctx: &Context, out: &Output) {
    out.section("System");
    out.field("host", &format!("{} {}", std::env::consts::OS, std::env::consts::ARCH));
    out.field("apkpush", env!("CARGO_PKG_VERSION"));

    let bridge = ctx.bridge();
    match &bridge {
        Ok(bridge) => out.field("adb", &tool_line(bridge.version(), bridge.adb_path())),
        Err(e) => out.field("adb", &e.to_string()),
    }
    match ctx.inspector() {
        Ok(aapt) => out.field("aapt", &tool_line(aapt.version(), aapt.aapt_path())),
        Err(e) => out.field("aapt", &e.to_string()),
    }

    if let Ok(bridge) = &bridge {
        print_devices(bridge, out);
    }
}

fn tool_line<E: std::fmt::Display>(version: Result<String, E>, path: &std::path::Path) -> String {
    match version {
        Ok(v) if v.is_empty() => path.display().to_string(),
        Ok(v) => format!("{v} ({})", path.display()),
        Err(e) => format!("{} ({e})", path.display()),
    }
}

fn print_devices(bridge: &AdbBridge, out: &Output) {
    match bridge.devices() {
        Ok(devices) if devices.is_empty() => out.field("devices", "none"),
        Ok(devices) => {
            for (i, device) in devices.iter().enumerate() {
                let label = if i == 0 { "devices" } else { "" };
                out.field(label, &format!("{} ({})", device.serial, device.state));
            }
        }
        Err(e) => out.warning(&format!("Could not list devices: {e}")),
    }
}
