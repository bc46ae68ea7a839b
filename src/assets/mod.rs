//! 主题素材清单（主题键 → 素材文件名）及其浏览器加载。

pub mod fetch;
pub mod manifest;

pub use fetch::fetch_manifest;
pub use manifest::{
    asset_ref, is_image_file, normalize_theme, AssetManifest, ThemeEntry, ThemeError,
};
