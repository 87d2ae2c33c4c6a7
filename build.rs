//! Build script: embeds the commit the tracker was built from as GIT_HASH

use std::env;
use std::process::Command;

fn git_hash() -> Option<String> {
    let output = Command::new("git").args(["rev-parse", "--short", "HEAD"]).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let hash = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!hash.is_empty()).then_some(hash)
}

fn main() {
    // Packaged builds have no .git; let the packager pass the hash in
    let hash = env::var("RISKZONE_GIT_HASH")
        .ok()
        .or_else(git_hash)
        .unwrap_or_else(|| "unknown".to_string());

    println!("cargo:rustc-env=GIT_HASH={}", hash);
    println!("cargo:rerun-if-env-changed=RISKZONE_GIT_HASH");
    println!("cargo:rerun-if-changed=.git/HEAD");
}
