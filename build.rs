use std::process::Command;

/// Короткий хеш коммита, если сборка идёт из git-репозитория.
fn git_commit() -> Option<String> {
    let out = Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()?;
    if !out.status.success() {
        return None;
    }
    String::from_utf8(out.stdout)
        .ok()
        .map(|s| s.trim().to_string())
}

fn main() {
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=build.rs");

    let commit = git_commit().unwrap_or_else(|| "unknown".into());
    println!("cargo:rustc-env=FTPGATE_GIT_COMMIT={commit}");

    let build_date = chrono::Utc::now().format("%Y-%m-%d");
    println!("cargo:rustc-env=FTPGATE_BUILD_DATE={build_date}");
}
