//! HTTP client for the mock shop: plain pages, the GraphQL endpoint and the
//! HTMX fragment endpoint.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, REFERER};
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::settings::Settings;

#[derive(Error, Debug)]
pub enum ScrapeError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{url} returned {status}")]
    Server { url: String, status: u16 },
    #[error("GraphQL error: {0}")]
    GraphQl(String),
    #[error("invalid URL {0}")]
    InvalidUrl(String),
}

/// Body of a fragment request that the server answered successfully.
pub struct Fragment {
    pub body: String,
    pub is_json: bool,
}

#[derive(Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Deserialize)]
struct GraphQlError {
    message: String,
}

pub struct SiteClient {
    http: reqwest::Client,
    base_url: String,
    delay: Duration,
}

impl SiteClient {
    pub fn new(settings: &Settings) -> Result<Self, ScrapeError> {
        let http = reqwest::Client::builder()
            .user_agent(settings.user_agent.as_str())
            .build()?;
        Ok(Self {
            http,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            delay: settings.request_delay(),
        })
    }

    /// Absolute URL for a path on the shop, e.g. `/products`.
    pub fn endpoint(&self, path: &str) -> Result<Url, ScrapeError> {
        let raw = format!("{}{}", self.base_url, path);
        Url::parse(&raw).map_err(|e| ScrapeError::InvalidUrl(format!("{raw}: {e}")))
    }

    /// Resolve an `href` found on `page` against it.
    pub fn resolve(page: &Url, href: &str) -> Result<Url, ScrapeError> {
        page.join(href)
            .map_err(|e| ScrapeError::InvalidUrl(format!("{href}: {e}")))
    }

    /// Optional pause between page fetches.
    pub async fn pause(&self) {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }

    pub async fn get_html(&self, url: &Url) -> Result<String, ScrapeError> {
        debug!(url = %url, "GET");
        let resp = self.http.get(url.clone()).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ScrapeError::Server {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(resp.text().await?)
    }

    pub async fn graphql<T: DeserializeOwned>(
        &self,
        url: &Url,
        query: &str,
        variables: serde_json::Value,
    ) -> Result<T, ScrapeError> {
        debug!(url = %url, "POST graphql");
        let payload = serde_json::json!({ "query": query, "variables": variables });
        let resp = self.http.post(url.clone()).json(&payload).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ScrapeError::Server {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body: GraphQlResponse<T> = resp.json().await?;
        if !body.errors.is_empty() {
            let msgs: Vec<String> = body.errors.into_iter().map(|e| e.message).collect();
            return Err(ScrapeError::GraphQl(msgs.join("; ")));
        }
        body.data
            .ok_or_else(|| ScrapeError::GraphQl("response has no data".to_string()))
    }

    /// GET an HTMX fragment. `Ok(None)` means the server refused the page,
    /// which is how the testimonials endpoint signals the end.
    pub async fn get_fragment(
        &self,
        url: &Url,
        current_page: &Url,
    ) -> Result<Option<Fragment>, ScrapeError> {
        let mut headers = HeaderMap::new();
        headers.insert("hx-request", HeaderValue::from_static("true"));
        if let Ok(v) = HeaderValue::from_str(current_page.as_str()) {
            headers.insert("hx-current-url", v.clone());
            headers.insert(REFERER, v);
        }

        debug!(url = %url, "GET fragment");
        let resp = self.http.get(url.clone()).headers(headers).send().await?;
        let status = resp.status();
        if !status.is_success() {
            debug!(url = %url, status = status.as_u16(), "fragment refused");
            return Ok(None);
        }

        let is_json = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.contains("application/json"));
        let body = resp.text().await?;
        Ok(Some(Fragment { body, is_json }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_keeps_base_path() {
        let settings = Settings::default().with_base_url("http://localhost:8080/shop/");
        let client = SiteClient::new(&settings).unwrap();
        let url = client.endpoint("/products").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/shop/products");
    }

    #[test]
    fn resolve_relative_and_absolute() {
        let page = Url::parse("https://web-scraping.dev/products?page=1").unwrap();
        let rel = SiteClient::resolve(&page, "/products?page=2").unwrap();
        assert_eq!(rel.as_str(), "https://web-scraping.dev/products?page=2");
        let abs = SiteClient::resolve(&page, "https://example.com/x").unwrap();
        assert_eq!(abs.as_str(), "https://example.com/x");
    }

    #[test]
    fn bad_base_url() {
        let settings = Settings::default().with_base_url("not a url");
        let client = SiteClient::new(&settings).unwrap();
        assert!(matches!(client.endpoint("/products"), Err(ScrapeError::InvalidUrl(_))));
    }
}
