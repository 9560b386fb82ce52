use std::path::Path;
use std::process::Command;

/// Version suffix for `tally --version`: an explicit `TALLY_BUILD_SHA`
/// (set by packagers building from a tarball), else `git describe`.
fn build_id(workspace: &Path) -> Option<String> {
    if let Ok(id) = std::env::var("TALLY_BUILD_SHA") {
        let id = id.trim().to_string();
        if !id.is_empty() {
            return Some(id);
        }
    }

    let out = Command::new("git")
        .arg("-C")
        .arg(workspace)
        .args(["describe", "--always", "--dirty", "--abbrev=8"])
        .output()
        .ok()?;
    if !out.status.success() {
        return None;
    }
    let id = String::from_utf8(out.stdout).ok()?.trim().to_string();
    (!id.is_empty()).then_some(id)
}

fn main() {
    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").unwrap_or_else(|_| ".".to_string());
    let workspace = Path::new(&manifest_dir).join("..");

    let id = build_id(&workspace).unwrap_or_else(|| "dev".to_string());
    println!("cargo:rustc-env=TALLY_BUILD_SHA={id}");
    println!("cargo:rerun-if-env-changed=TALLY_BUILD_SHA");
    println!("cargo:rerun-if-changed={}", workspace.join(".git/HEAD").display());
}
