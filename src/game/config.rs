use serde::{Deserialize, Serialize};

pub const DEFAULT_SETTLE_DELAY_MS: u32 = 500;
pub const DEFAULT_ASSET_BASE: &str = "/assets";
pub const DEFAULT_MANIFEST_URL: &str = "/assets-manifest.json";

/// 可调参数：翻回延迟、素材根路径与清单地址。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GameConfig {
    pub settle_delay_ms: u32,
    pub asset_base: String,
    pub manifest_url: String,
}

impl GameConfig {
    pub fn with_settle_delay(mut self, delay_ms: u32) -> Self {
        self.settle_delay_ms = delay_ms;
        self
    }

    pub fn with_asset_base(mut self, base: impl Into<String>) -> Self {
        self.asset_base = base.into();
        self
    }

    pub fn with_manifest_url(mut self, url: impl Into<String>) -> Self {
        self.manifest_url = url.into();
        self
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: DEFAULT_SETTLE_DELAY_MS,
            asset_base: DEFAULT_ASSET_BASE.to_string(),
            manifest_url: DEFAULT_MANIFEST_URL.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config = GameConfig::from_json(r#"{"settle_delay_ms": 800}"#)
            .expect("config should parse");
        assert_eq!(config.settle_delay_ms, 800);
        assert_eq!(config.asset_base, DEFAULT_ASSET_BASE);
        assert_eq!(config.manifest_url, DEFAULT_MANIFEST_URL);
    }

    #[test]
    fn builders_override_fields() {
        let config = GameConfig::default()
            .with_settle_delay(0)
            .with_asset_base("/static")
            .with_manifest_url("/static/manifest.json");
        assert_eq!(config.settle_delay_ms, 0);
        assert_eq!(config.asset_base, "/static");
        assert_eq!(config.manifest_url, "/static/manifest.json");
    }
}
