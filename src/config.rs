use std::time::Duration;

use anyhow::Context;
use derive_builder::Builder;

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8080";
pub const DEFAULT_PAGE_LIMIT: u32 = 20;
/// Radius in kilometres used when the user does not give one.
pub const DEFAULT_RADIUS_KM: f64 = 100.0;

/// Where and how the search API is reached.
#[derive(Debug, Clone, Builder)]
#[builder(setter(into))]
pub struct ClientConfig {
    #[builder(default = "DEFAULT_API_URL.to_string()")]
    pub api_url: String,
    /// image search may live on a different host than the listing API
    #[builder(default, setter(into, strip_option))]
    pub image_api_url: Option<String>,
    #[builder(default = "DEFAULT_PAGE_LIMIT")]
    pub page_limit: u32,
    #[builder(default = "Duration::from_secs(30)")]
    pub timeout: Duration,
}

impl ClientConfig {
    /// Read the configuration from the environment, loading `.env` first.
    ///
    /// `RESTAURANT_API_URL`, `IMAGE_SEARCH_URL`, `PAGE_LIMIT` and
    /// `HTTP_TIMEOUT_SECS` are all optional.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let mut builder = ClientConfigBuilder::default();
        if let Some(url) = env_var("RESTAURANT_API_URL") {
            builder.api_url(url);
        }
        if let Some(url) = env_var("IMAGE_SEARCH_URL") {
            builder.image_api_url(url);
        }
        if let Some(limit) = env_var("PAGE_LIMIT") {
            let limit: u32 = limit
                .parse()
                .with_context(|| format!("PAGE_LIMIT is not a number: {limit}"))?;
            builder.page_limit(limit.max(1));
        }
        if let Some(secs) = env_var("HTTP_TIMEOUT_SECS") {
            let secs: u64 = secs
                .parse()
                .with_context(|| format!("HTTP_TIMEOUT_SECS is not a number: {secs}"))?;
            builder.timeout(Duration::from_secs(secs));
        }

        builder.build().context("fail to build client config")
    }

    pub fn image_api_url(&self) -> &str {
        self.image_api_url.as_deref().unwrap_or(&self.api_url)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            image_api_url: None,
            page_limit: DEFAULT_PAGE_LIMIT,
            timeout: Duration::from_secs(30),
        }
    }
}

fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults() {
        let config = ClientConfigBuilder::default()
            .api_url("http://search.local")
            .build()
            .unwrap();
        assert_eq!(config.page_limit, 20);
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.image_api_url(), "http://search.local");
    }

    #[test]
    fn image_search_host_override() {
        let config = ClientConfigBuilder::default()
            .image_api_url("http://images.local")
            .build()
            .unwrap();
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.image_api_url(), "http://images.local");
    }
}
