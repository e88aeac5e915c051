use std::process::Command;

// `verbscope --version` reports the short commit when built from a checkout.
fn main() {
    println!("cargo:rerun-if-changed=.git/HEAD");

    let hash = Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()
        .filter(|output| output.status.success())
        .and_then(|output| String::from_utf8(output.stdout).ok())
        .map(|raw| raw.trim().to_owned())
        .filter(|hash| !hash.is_empty());

    let version = match hash {
        Some(hash) => format!("{} ({hash})", env!("CARGO_PKG_VERSION")),
        None => env!("CARGO_PKG_VERSION").to_owned(),
    };
    println!("cargo:rustc-env=VERBSCOPE_BUILD_VERSION={version}");
}
