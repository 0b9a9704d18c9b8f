// build.rs

use chrono::Utc;
use std::env;
use std::fs;
use std::path::Path;

fn main() -> std::io::Result<()> {
    // Cargo always sets OUT_DIR for build scripts
    let out_dir = env::var("OUT_DIR").map_err(std::io::Error::other)?;
    let dest_path = Path::new(&out_dir).join("build_info.rs");

    let build_date = Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string();

    fs::write(
        &dest_path,
        format!("pub const BUILD_DATE: &str = \"{}\";", build_date),
    )?;

    // re-run only when build.rs itself changes
    println!("cargo:rerun-if-changed=build.rs");
    Ok(())
}
