use gloo_net::http::Request;
use serde_json::Value;
use session::{LocalBoxFuture, StyleConfig, StyleError, StyleProvider, parse_versions};

/// Style provider over the browser's `fetch`.
#[derive(Debug, Clone)]
pub struct GlooStyleProvider {
    config: StyleConfig,
    api_key: String,
}

impl GlooStyleProvider {
    pub fn new(config: StyleConfig) -> Result<Self, StyleError> {
        let api_key = config.api_key.clone().ok_or(StyleError::MissingApiKey)?;
        Ok(Self { config, api_key })
    }

    async fn get_json(&self, url: String) -> Result<Value, StyleError> {
        let resp = Request::get(&url)
            .send()
            .await
            .map_err(|e| StyleError::Transport {
                url: url.clone(),
                message: e.to_string(),
            })?;
        if !resp.ok() {
            return Err(StyleError::Status {
                url,
                status: resp.status(),
            });
        }
        let text = resp.text().await.map_err(|e| StyleError::Transport {
            url: url.clone(),
            message: e.to_string(),
        })?;
        serde_json::from_str(&text).map_err(|e| StyleError::Parse(e.to_string()))
    }
}

impl StyleProvider for GlooStyleProvider {
    fn list_versions(&self) -> LocalBoxFuture<'_, Result<Vec<String>, StyleError>> {
        let url = self.config.versions_url(&self.api_key);
        Box::pin(async move { parse_versions(&self.get_json(url).await?) })
    }

    fn fetch_style(&self, version: &str) -> LocalBoxFuture<'_, Result<Value, StyleError>> {
        let url = self.config.style_url(version, &self.api_key);
        Box::pin(self.get_json(url))
    }
}

/// Settings baked in at build time; the browser has no process environment.
pub fn build_env(key: &str) -> Option<String> {
    let value = match key {
        "TOMTOM_API_KEY" => option_env!("TOMTOM_API_KEY"),
        "NEXT_PUBLIC_TOMTOM_API_KEY" => option_env!("NEXT_PUBLIC_TOMTOM_API_KEY"),
        "CIRCLE30_STYLE_BASE_URL" => option_env!("CIRCLE30_STYLE_BASE_URL"),
        "CIRCLE30_STYLE_VERSION" => option_env!("CIRCLE30_STYLE_VERSION"),
        "CIRCLE30_STYLE_MAP" => option_env!("CIRCLE30_STYLE_MAP"),
        "CIRCLE30_PREFIX" => option_env!("CIRCLE30_PREFIX"),
        "CIRCLE30_POINT_TRIGGER" => option_env!("CIRCLE30_POINT_TRIGGER"),
        _ => None,
    };
    value.map(str::to_string)
}
