//! Style document acquisition.
//!
//! A style is resolved in two round trips: list the published versions, then
//! fetch the chosen one. Providers only do transport; version selection and
//! document checks live here so every provider behaves the same.

use std::future::Future;
use std::pin::Pin;

use render::StyleDocument;
use serde_json::Value;
use tracing::{debug, info};

#[cfg(not(target_arch = "wasm32"))]
use crate::config::StyleConfig;

/// Boxed future without a `Send` bound; browser fetches are single-threaded.
pub type LocalBoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StyleError {
    #[error("no map API key configured (set TOMTOM_API_KEY)")]
    MissingApiKey,
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },
    #[error("{url} answered HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("style response is not valid JSON: {0}")]
    Parse(String),
    #[error("no style version matches `{pattern}` ({available} offered)")]
    NoMatchingVersion { pattern: String, available: usize },
    #[error("style document is invalid: {0}")]
    Invalid(&'static str),
}

/// Transport for the two style round trips.
pub trait StyleProvider {
    fn list_versions(&self) -> LocalBoxFuture<'_, Result<Vec<String>, StyleError>>;

    fn fetch_style(&self, version: &str) -> LocalBoxFuture<'_, Result<Value, StyleError>>;
}

/// Lists, selects, fetches and checks a style document.
pub async fn acquire_style<P>(provider: &P, pattern: &str) -> Result<StyleDocument, StyleError>
where
    P: StyleProvider + ?Sized,
{
    let versions = provider.list_versions().await?;
    debug!(offered = versions.len(), pattern, "style versions listed");
    let version = select_version(&versions, pattern).ok_or_else(|| StyleError::NoMatchingVersion {
        pattern: pattern.to_string(),
        available: versions.len(),
    })?;
    let document = check_style(provider.fetch_style(&version).await?)?;
    info!(version = %version, "style acquired");
    Ok(document)
}

/// Picks the newest version matching `pattern`.
///
/// A trailing `*` segment matches any numeric tail (`0.*` takes `0.3.1` over
/// `0.2.9`, never `1.0.0`). Without `*` the version must match exactly.
pub fn select_version(versions: &[String], pattern: &str) -> Option<String> {
    let pattern = pattern.trim();
    let Some(prefix) = pattern.strip_suffix('*') else {
        return versions.iter().find(|v| v.as_str() == pattern).cloned();
    };
    versions
        .iter()
        .filter(|v| v.starts_with(prefix))
        .filter_map(|v| numeric_key(v).map(|key| (key, v)))
        .max_by(|a, b| a.0.cmp(&b.0))
        .map(|(_, v)| v.clone())
}

fn numeric_key(version: &str) -> Option<Vec<u64>> {
    version.split('.').map(|s| s.parse().ok()).collect()
}

/// Reads a version listing: a bare array or `{ "versions": [...] }`, whose
/// entries are strings or objects with a `version`/`id` field.
pub fn parse_versions(body: &Value) -> Result<Vec<String>, StyleError> {
    let entries = match body {
        Value::Array(items) => items,
        Value::Object(map) => map
            .get("versions")
            .and_then(Value::as_array)
            .ok_or(StyleError::Invalid("version listing has no `versions` array"))?,
        _ => return Err(StyleError::Invalid("version listing is not an array")),
    };
    Ok(entries
        .iter()
        .filter_map(|entry| match entry {
            Value::String(s) => Some(s.clone()),
            Value::Object(map) => map
                .get("version")
                .or_else(|| map.get("id"))
                .and_then(Value::as_str)
                .map(str::to_string),
            _ => None,
        })
        .collect())
}

/// Accepts only objects carrying `version`, `sources` and `layers`.
pub fn check_style(value: Value) -> Result<StyleDocument, StyleError> {
    let Some(map) = value.as_object() else {
        return Err(StyleError::Invalid("style is not a JSON object"));
    };
    if !map.get("version").is_some_and(Value::is_number) {
        return Err(StyleError::Invalid("missing numeric `version`"));
    }
    if !map.get("sources").is_some_and(Value::is_object) {
        return Err(StyleError::Invalid("missing `sources` object"));
    }
    if !map.get("layers").is_some_and(Value::is_array) {
        return Err(StyleError::Invalid("missing `layers` array"));
    }
    Ok(StyleDocument::new(value))
}

/// In-memory provider: one fixed document offered under one version.
#[derive(Debug, Clone)]
pub struct StaticStyleProvider {
    versions: Vec<String>,
    style: Result<Value, StyleError>,
}

impl StaticStyleProvider {
    pub fn new(version: impl Into<String>, style: Value) -> Self {
        Self {
            versions: vec![version.into()],
            style: Ok(style),
        }
    }

    /// A blank style offered as `0.0.0`.
    pub fn blank() -> Self {
        Self::new("0.0.0", StyleDocument::blank().into_value())
    }

    /// A provider whose fetch always fails with `error`.
    pub fn failing(error: StyleError) -> Self {
        Self {
            versions: vec!["0.0.0".to_string()],
            style: Err(error),
        }
    }

    pub fn with_versions(mut self, versions: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.versions = versions.into_iter().map(Into::into).collect();
        self
    }
}

impl StyleProvider for StaticStyleProvider {
    fn list_versions(&self) -> LocalBoxFuture<'_, Result<Vec<String>, StyleError>> {
        Box::pin(async move { Ok(self.versions.clone()) })
    }

    fn fetch_style(&self, version: &str) -> LocalBoxFuture<'_, Result<Value, StyleError>> {
        let known = self.versions.iter().any(|v| v == version);
        let version = version.to_string();
        Box::pin(async move {
            if !known {
                return Err(StyleError::Status {
                    url: format!("static://{version}"),
                    status: 404,
                });
            }
            self.style.clone()
        })
    }
}

/// Fetches styles over HTTP with `reqwest`.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Clone)]
pub struct HttpStyleProvider {
    config: StyleConfig,
    api_key: String,
    client: reqwest::Client,
}

#[cfg(not(target_arch = "wasm32"))]
impl HttpStyleProvider {
    pub fn new(config: StyleConfig) -> Result<Self, StyleError> {
        let api_key = config.api_key.clone().ok_or(StyleError::MissingApiKey)?;
        Ok(Self {
            config,
            api_key,
            client: reqwest::Client::new(),
        })
    }

    async fn get_json(&self, url: String) -> Result<Value, StyleError> {
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| StyleError::Transport {
                url: url.clone(),
                message: e.to_string(),
            })?;
        if !resp.status().is_success() {
            return Err(StyleError::Status {
                url,
                status: resp.status().as_u16(),
            });
        }
        resp.json::<Value>()
            .await
            .map_err(|e| StyleError::Parse(e.to_string()))
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl StyleProvider for HttpStyleProvider {
    fn list_versions(&self) -> LocalBoxFuture<'_, Result<Vec<String>, StyleError>> {
        let url = self.config.versions_url(&self.api_key);
        Box::pin(async move { parse_versions(&self.get_json(url).await?) })
    }

    fn fetch_style(&self, version: &str) -> LocalBoxFuture<'_, Result<Value, StyleError>> {
        let url = self.config.style_url(version, &self.api_key);
        Box::pin(self.get_json(url))
    }
}

#[cfg(test)]
mod tests {
    use super::{
        StaticStyleProvider, StyleError, acquire_style, check_style, parse_versions, select_version,
    };
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn strings(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn wildcard_picks_highest_numeric_match() {
        let versions = strings(&["0.2.9", "0.10.0", "1.0.0", "0.3.1", "0.beta"]);
        assert_eq!(select_version(&versions, "0.*").as_deref(), Some("0.10.0"));
        assert_eq!(select_version(&versions, "1.*").as_deref(), Some("1.0.0"));
        assert_eq!(select_version(&versions, "2.*"), None);
    }

    #[test]
    fn exact_pattern_needs_exact_version() {
        let versions = strings(&["0.2.9", "0.3.1"]);
        assert_eq!(select_version(&versions, "0.3.1").as_deref(), Some("0.3.1"));
        assert_eq!(select_version(&versions, "0.3"), None);
    }

    #[test]
    fn version_listing_shapes() {
        assert_eq!(
            parse_versions(&json!(["0.1.0", 3, "0.2.0"])).unwrap(),
            strings(&["0.1.0", "0.2.0"])
        );
        assert_eq!(
            parse_versions(&json!({ "versions": [{ "version": "0.4.0" }, { "id": "0.5.0" }] })).unwrap(),
            strings(&["0.4.0", "0.5.0"])
        );
        assert!(parse_versions(&json!("0.1.0")).is_err());
    }

    #[test]
    fn style_checks() {
        assert!(check_style(json!({ "version": 8, "sources": {}, "layers": [] })).is_ok());
        assert_eq!(
            check_style(json!({ "version": 8, "layers": [] })).unwrap_err(),
            StyleError::Invalid("missing `sources` object")
        );
        assert!(check_style(json!([1, 2])).is_err());
    }

    #[test]
    fn acquire_lists_then_fetches() {
        let provider = StaticStyleProvider::new("0.3.1", json!({ "version": 8, "sources": {}, "layers": [] }))
            .with_versions(["0.2.0", "0.3.1"]);
        let doc = pollster::block_on(acquire_style(&provider, "0.*")).unwrap();
        assert_eq!(doc.version(), Some(8));
    }

    #[test]
    fn acquire_reports_missing_version_and_fetch_failure() {
        let provider = StaticStyleProvider::blank();
        assert_eq!(
            pollster::block_on(acquire_style(&provider, "1.*")).unwrap_err(),
            StyleError::NoMatchingVersion {
                pattern: "1.*".to_string(),
                available: 1
            }
        );

        let failing = StaticStyleProvider::failing(StyleError::Status {
            url: "https://example.test/style.json".to_string(),
            status: 403,
        });
        assert!(matches!(
            pollster::block_on(acquire_style(&failing, "0.*")),
            Err(StyleError::Status { status: 403, .. })
        ));
    }
}
