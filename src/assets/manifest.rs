use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::game::AssetRef;

const IMAGE_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "gif", "svg"];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, thiserror::Error)]
#[serde(tag = "type")]
pub enum ThemeError {
    #[error("unknown theme: {theme}")]
    UnknownTheme { theme: String },
    #[error("asset source unavailable: {message}")]
    AssetSourceUnavailable { message: String },
}

impl ThemeError {
    pub fn unavailable(message: impl std::fmt::Display) -> Self {
        Self::AssetSourceUnavailable {
            message: message.to_string(),
        }
    }
}

/// 主题选择界面中的一项：主题键与预览图。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ThemeEntry {
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview: Option<AssetRef>,
    pub pairs: usize,
}

/// 素材清单：`{ 主题键: [文件名, ...] }`，只读。
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct AssetManifest {
    themes: BTreeMap<String, Vec<String>>,
}

impl AssetManifest {
    pub fn from_json(json: &str) -> Result<Self, ThemeError> {
        serde_json::from_str(json).map_err(ThemeError::unavailable)
    }

    /// 由目录列表构建清单，只保留图片文件。
    pub fn from_listing<I, T, F, S>(listing: I) -> Self
    where
        I: IntoIterator<Item = (T, F)>,
        T: Into<String>,
        F: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let themes = listing
            .into_iter()
            .map(|(theme, files)| {
                let files = files
                    .into_iter()
                    .map(Into::into)
                    .filter(|file: &String| is_image_file(file))
                    .collect();
                (theme.into(), files)
            })
            .collect();
        Self { themes }
    }

    /// 扫描素材根目录：每个子目录是一个主题，其中的图片文件按名称排序。
    pub fn scan_directory(root: impl AsRef<std::path::Path>) -> std::io::Result<Self> {
        let mut listing = Vec::new();
        for entry in std::fs::read_dir(root)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let mut files = Vec::new();
            for file in std::fs::read_dir(entry.path())? {
                let file = file?;
                if file.file_type()?.is_file() {
                    files.push(file.file_name().to_string_lossy().into_owned());
                }
            }
            files.sort();
            listing.push((entry.file_name().to_string_lossy().into_owned(), files));
        }
        Ok(Self::from_listing(listing))
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn themes(&self) -> Vec<&str> {
        self.themes.keys().map(String::as_str).collect()
    }

    pub fn contains(&self, theme: &str) -> bool {
        self.themes.contains_key(theme)
    }

    pub fn files(&self, theme: &str) -> Option<&[String]> {
        self.themes.get(theme).map(Vec::as_slice)
    }

    /// 解析主题为素材引用。已知但为空的主题返回空列表，未知主题返回错误。
    pub fn resolve(&self, theme: &str, base: &str) -> Result<Vec<AssetRef>, ThemeError> {
        let files = self.files(theme).ok_or_else(|| ThemeError::UnknownTheme {
            theme: theme.to_string(),
        })?;
        Ok(files
            .iter()
            .map(|file| asset_ref(base, theme, file))
            .collect())
    }

    pub fn catalog(&self, base: &str) -> Vec<ThemeEntry> {
        self.themes
            .iter()
            .map(|(key, files)| ThemeEntry {
                key: key.clone(),
                preview: files.first().map(|file| asset_ref(base, key, file)),
                pairs: files.len(),
            })
            .collect()
    }
}

pub fn is_image_file(name: &str) -> bool {
    name.rsplit_once('.')
        .map(|(_, ext)| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|allowed| ext.eq_ignore_ascii_case(allowed))
        })
        .unwrap_or(false)
}

pub fn asset_ref(base: &str, theme: &str, file: &str) -> AssetRef {
    format!("{}/{theme}/{file}", base.trim_end_matches('/'))
}

/// 主题选择界面显示名（如 "Ocean"）转为主题键。
pub fn normalize_theme(name: &str) -> String {
    name.trim().to_lowercase()
}
