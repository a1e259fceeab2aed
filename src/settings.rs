use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

pub const DEFAULT_BASE_URL: &str = "https://web-scraping.dev";
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Runtime settings shared by the collector and the dashboard.
///
/// Layered as: defaults, then `shop_scraper.{toml,yaml,json}` if present,
/// then `SHOP_*` environment variables. CLI flags are applied by the
/// binaries on top of the loaded value.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub base_url: String,
    pub data_dir: PathBuf,
    pub page_size: u32,
    pub max_pages: usize,
    pub request_delay_ms: u64,
    pub discover_categories: bool,
    pub user_agent: String,
    pub bind: String,
    pub review_year: i32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            data_dir: PathBuf::from("data"),
            page_size: 20,
            max_pages: 500,
            request_delay_ms: 0,
            discover_categories: true,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            bind: "127.0.0.1:8501".to_string(),
            review_year: 2023,
        }
    }
}

impl Settings {
    pub fn load() -> Result<Self> {
        Config::builder()
            .add_source(File::with_name("shop_scraper").required(false))
            .add_source(Environment::with_prefix("SHOP").try_parsing(true))
            .build()
            .and_then(|c| c.try_deserialize::<Settings>())
            .context("Failed to load settings")
    }

    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_bind(mut self, bind: impl Into<String>) -> Self {
        self.bind = bind.into();
        self
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_mock_shop() {
        let s = Settings::default();
        assert_eq!(s.base_url, "https://web-scraping.dev");
        assert_eq!(s.data_dir, PathBuf::from("data"));
        assert_eq!(s.page_size, 20);
        assert_eq!(s.request_delay(), Duration::ZERO);
    }

    #[test]
    fn builders_override() {
        let s = Settings::default()
            .with_data_dir("/tmp/x")
            .with_base_url("http://localhost:1")
            .with_bind("0.0.0.0:9000");
        assert_eq!(s.data_dir, PathBuf::from("/tmp/x"));
        assert_eq!(s.base_url, "http://localhost:1");
        assert_eq!(s.bind, "0.0.0.0:9000");
    }
}
