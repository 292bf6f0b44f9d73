use std::process::Command;

/// Emits `DAILY_CHANGELOG_LONG_VERSION` for `--version` output:
/// `<pkg version> (<short hash>, built <utc timestamp>)`.
fn main() {
    let built_at = chrono::Utc::now().format("%Y-%m-%d %H:%M UTC");

    let short_hash = Command::new("git")
        .args(["rev-parse", "--short=10", "HEAD"])
        .output()
        .ok()
        .filter(|output| output.status.success())
        .and_then(|output| String::from_utf8(output.stdout).ok())
        .map(|hash| hash.trim().to_string())
        .filter(|hash| !hash.is_empty())
        .unwrap_or_else(|| "unknown".to_string());

    let version = std::env::var("CARGO_PKG_VERSION").unwrap_or_else(|_| "0.0.0".to_string());

    println!(
        "cargo:rustc-env=DAILY_CHANGELOG_LONG_VERSION={} ({}, built {})",
        version,
        short_hash,
        built_at
    );

    println!("cargo:rerun-if-changed=.git/HEAD");
}
