// When at least one integration test doesn't use all of the exported methods, there are
// dead code warnings causing clippy CI to fail.
#![allow(dead_code)]

use std::{path::PathBuf, process::Command};

use assert_cmd::prelude::*;

pub fn fixture_path(name: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests/fixtures");
    path.push(name);
    path
}

pub fn cmd() -> Command {
    let mut cmd = Command::cargo_bin("p7mtool").expect("p7mtool binary");
    cmd.env_remove("P7M_SETTINGS").env_remove("RUST_LOG");
    cmd
}

/// Whether an `openssl` executable can be run from the `PATH`.
pub fn openssl_available() -> bool {
    Command::new("openssl")
        .arg("version")
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}
