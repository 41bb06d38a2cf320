//! UI Theme - icons and formatting helpers

/// Status icons for different states
#[derive(Debug, Clone)]
pub struct Icons {
    /// Group in progress (●)
    pub active: &'static str,
    /// Success/completed state (✓)
    pub success: &'static str,
    /// Error/failed state (✗)
    pub error: &'static str,
    /// Warning state (⚠)
    pub warning: &'static str,
    /// Info state (ℹ)
    pub info: &'static str,
    /// Local to remote mapping (→)
    pub arrow: &'static str,
}

impl Default for Icons {
    fn default() -> Self {
        Self {
            active: "●",
            success: "✓",
            error: "✗",
            warning: "⚠",
            info: "ℹ",
            arrow: "→",
        }
    }
}

/// Format bytes for human-readable display
pub fn format_size(bytes: u64) -> String {
    #[allow(clippy::cast_precision_loss)]
    let kb = bytes as f64 / 1024.0;
    let mb = kb / 1024.0;
    if mb >= 1024.0 {
        format!("{:.1} GB", mb / 1024.0)
    } else if kb >= 1024.0 {
        format!("{mb:.1} MB")
    } else if kb >= 1.0 {
        format!("{kb:.1} KB")
    } else {
        format!("{bytes} B")
    }
}

/// `1 library`, `3 libraries`
pub fn plural(count: usize, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("{count} {singular}")
    } else {
        format!("{count} {plural}")
    }
}
