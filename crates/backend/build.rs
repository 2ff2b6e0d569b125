//! Places the workspace `config.toml` next to the built binary, where the
//! server looks for it at start-up.

use std::env;
use std::fs;
use std::path::Path;

fn main() {
    println!("cargo:rerun-if-changed=../../config.toml");

    let out_dir = env::var("OUT_DIR").expect("OUT_DIR is set by cargo");
    let profile = env::var("PROFILE").expect("PROFILE is set by cargo");

    // OUT_DIR looks like target/<profile>/build/backend-<hash>/out
    let Some(binary_dir) = Path::new(&out_dir)
        .ancestors()
        .find(|p| p.ends_with(&profile))
    else {
        println!("cargo:warning=Cannot locate target/{} directory, config.toml not copied", profile);
        return;
    };

    let workspace_config = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../config.toml");
    if !workspace_config.exists() {
        return;
    }

    if let Err(e) = fs::copy(&workspace_config, binary_dir.join("config.toml")) {
        println!("cargo:warning=Failed to copy config.toml: {}", e);
    }
}
