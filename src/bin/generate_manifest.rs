//! 扫描素材目录并写出 `assets-manifest.json`。
//!
//! 用法：`generate-manifest [素材目录] [输出文件]`，默认 `public/assets` 与
//! `public/assets-manifest.json`。

use std::path::PathBuf;
use std::process::ExitCode;

use memory_match::AssetManifest;

fn main() -> ExitCode {
    let mut args = std::env::args().skip(1);
    let asset_dir = PathBuf::from(args.next().unwrap_or_else(|| "public/assets".into()));
    let output = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| asset_dir.with_file_name("assets-manifest.json"));

    let manifest = match AssetManifest::scan_directory(&asset_dir) {
        Ok(manifest) => manifest,
        Err(error) => {
            eprintln!("failed to scan {}: {error}", asset_dir.display());
            return ExitCode::FAILURE;
        }
    };

    let json = match manifest.to_json_pretty() {
        Ok(json) => json,
        Err(error) => {
            eprintln!("failed to serialize manifest: {error}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(error) = std::fs::write(&output, json) {
        eprintln!("failed to write {}: {error}", output.display());
        return ExitCode::FAILURE;
    }

    println!(
        "wrote {} with {} themes",
        output.display(),
        manifest.themes().len()
    );
    ExitCode::SUCCESS
}
