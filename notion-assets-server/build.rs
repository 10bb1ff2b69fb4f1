//! Embeds `GIT_VERSION` and `BUILD_TIME` for the `/version` route.
//! `GIT_VERSION` is left unset outside a git checkout, and `/version`
//! reports "dev" instead.

use std::process::Command;

use chrono::{DateTime, Utc};

fn main() {
    println!("cargo:rerun-if-changed=../.git/HEAD");
    println!("cargo:rerun-if-changed=../.git/refs/tags");
    println!("cargo:rerun-if-env-changed=SOURCE_DATE_EPOCH");

    if let Some(version) = git(&["describe", "--tags", "--always", "--dirty"]) {
        println!("cargo:rustc-env=GIT_VERSION={version}");
    }
    println!("cargo:rustc-env=BUILD_TIME={}", build_time().format("%Y-%m-%dT%H:%M:%SZ"));
}

fn git(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let text = String::from_utf8(output.stdout).ok()?;
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

/// Reproducible builds pin the timestamp through `SOURCE_DATE_EPOCH`.
fn build_time() -> DateTime<Utc> {
    std::env::var("SOURCE_DATE_EPOCH")
        .ok()
        .and_then(|secs| secs.trim().parse::<i64>().ok())
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .unwrap_or_else(Utc::now)
}
