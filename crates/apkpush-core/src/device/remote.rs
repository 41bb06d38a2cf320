//! Device path helpers. Device paths are always `/`-separated, whatever
//! the host uses.

/// Convert to `/` separators and collapse duplicate or trailing slashes.
pub fn normalize(path: &str) -> String {
    let slashed = path.replace('\\', "/");
    let absolute = slashed.starts_with('/');
    let joined = slashed
        .split('/')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("/");
    if absolute {
        format!("/{joined}")
    } else {
        joined
    }
}

/// Join segments onto a device base path.
pub fn join(base: &str, segments: &[&str]) -> String {
    let mut path = base.to_string();
    for segment in segments {
        path.push('/');
        path.push_str(segment);
    }
    normalize(&path)
}

/// Parent directory (`/data/app/x/base.apk` -> `/data/app/x`).
pub fn parent(path: &str) -> String {
    let normalized = normalize(path);
    match normalized.rfind('/') {
        Some(0) => "/".to_string(),
        Some(idx) => normalized[..idx].to_string(),
        None => ".".to_string(),
    }
}

/// Final path component (`lib/arm64-v8a/libfoo.so` -> `libfoo.so`).
pub fn basename(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("/data/app/x/"), "/data/app/x");
        assert_eq!(normalize("/data//app/x"), "/data/app/x");
        assert_eq!(normalize(r"\data\app\x"), "/data/app/x");
        assert_eq!(normalize("/"), "/");
    }

    #[test]
    fn test_join() {
        assert_eq!(join("/data/app/x", &["lib"]), "/data/app/x/lib");
        assert_eq!(
            join("/data/app/x/", &["lib", "arm64-v8a", "libfoo.so"]),
            "/data/app/x/lib/arm64-v8a/libfoo.so"
        );
    }

    #[test]
    fn test_parent() {
        assert_eq!(parent("/system/priv-app/Foo/Foo.apk"), "/system/priv-app/Foo");
        assert_eq!(parent("/base.apk"), "/");
        assert_eq!(parent("base.apk"), ".");
    }

    #[test]
    fn test_basename() {
        assert_eq!(basename("lib/arm64-v8a/libfoo.so"), "libfoo.so");
        assert_eq!(basename("lib/x86/nested/libbar.so"), "libbar.so");
        assert_eq!(basename("libbaz.so"), "libbaz.so");
    }
}
