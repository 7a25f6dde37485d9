use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

fn main() {
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/index");
    println!("cargo:rustc-env=PLUGIN_RESOLVER_VERSION={}", build_version());
}

/// Version reported by `plugin-resolver --version`.
///
/// A clean tagged checkout reports the tag without its `v`. A modified tree
/// reports `<describe>+dirty.<unix time>`. Outside git the package version is
/// reported as `<version>+local.<unix time>`.
fn build_version() -> String {
    let Some(described) = git_describe() else {
        return format!("{}+local.{}", env!("CARGO_PKG_VERSION"), build_time());
    };

    let described = described.strip_prefix('v').unwrap_or(&described);
    match described.strip_suffix("-dirty") {
        Some(base) => format!("{}+dirty.{}", base, build_time()),
        None => described.to_string(),
    }
}

fn git_describe() -> Option<String> {
    let output = Command::new("git")
        .args(["describe", "--tags", "--always", "--dirty"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }

    let described = String::from_utf8(output.stdout).ok()?.trim().to_string();
    (!described.is_empty()).then_some(described)
}

fn build_time() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}
