//! Injects the root `VERSION` file as `IDENTITY_VERIFIER_VERSION` and keeps it
//! in lockstep with the workspace package version.

use std::path::{Path, PathBuf};

fn workspace_root(manifest_dir: &Path) -> PathBuf {
    manifest_dir
        .ancestors()
        .nth(2)
        .expect("crate lives two levels below the workspace root")
        .to_path_buf()
}

fn main() {
    let manifest_dir = PathBuf::from(std::env::var("CARGO_MANIFEST_DIR").expect("manifest dir"));
    let version_path = workspace_root(&manifest_dir).join("VERSION");
    println!("cargo:rerun-if-changed={}", version_path.display());

    let version = std::fs::read_to_string(&version_path)
        .unwrap_or_else(|error| panic!("read {}: {error}", version_path.display()));
    let version = version.trim();

    let package_version = std::env::var("CARGO_PKG_VERSION").expect("package version");
    assert_eq!(
        version, package_version,
        "VERSION and workspace.package.version must agree"
    );

    println!("cargo:rustc-env=IDENTITY_VERIFIER_VERSION={version}");
}
