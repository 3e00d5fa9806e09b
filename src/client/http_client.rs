use crate::client::parsers::error_message;
use crate::config::ApiConfig;
use crate::error::ApiError;
use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::multipart::Form;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Thin reqwest wrapper bound to the API base URL. No retries: a failed
/// request surfaces immediately.
pub struct HttpClient {
    inner: reqwest::Client,
    base_url: String,
}

impl HttpClient {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let base_url = config.base_url.trim().trim_end_matches('/').to_string();
        Url::parse(&base_url).with_context(|| format!("Invalid API base URL {:?}", base_url))?;

        let inner = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(default_headers(config)?)
            .gzip(true)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { inner, base_url })
    }

    /// `{base}/{path}?k=v...`, query values percent-encoded.
    pub fn endpoint(&self, path: &str, query: &[(&str, &str)]) -> Result<Url, ApiError> {
        let raw = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        if query.is_empty() {
            Ok(Url::parse(&raw)?)
        } else {
            Ok(Url::parse_with_params(&raw, query)?)
        }
    }

    pub async fn get_text(&self, url: Url) -> Result<String, ApiError> {
        debug!("GET {}", url);
        let request = self.inner.get(url.clone());
        self.send(url, request).await
    }

    pub async fn post_json<B: Serialize + ?Sized>(&self, url: Url, body: &B) -> Result<String, ApiError> {
        debug!("POST {}", url);
        let request = self.inner.post(url.clone()).json(body);
        self.send(url, request).await
    }

    pub async fn post_multipart(&self, url: Url, form: Form) -> Result<String, ApiError> {
        debug!("POST {} (multipart)", url);
        let request = self.inner.post(url.clone()).multipart(form);
        self.send(url, request).await
    }

    async fn send(&self, url: Url, request: reqwest::RequestBuilder) -> Result<String, ApiError> {
        let url = url.to_string();
        let resp = request.send().await.map_err(|source| ApiError::Network {
            url: url.clone(),
            source,
        })?;

        let status = resp.status();
        let body = resp.text().await.map_err(|source| ApiError::Network {
            url: url.clone(),
            source,
        })?;

        if !status.is_success() {
            return Err(ApiError::Status {
                url,
                status: status.as_u16(),
                reason: error_message(&body),
            });
        }

        Ok(body)
    }
}

fn default_headers(config: &ApiConfig) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    for (name, value) in &config.headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .with_context(|| format!("Invalid header name {:?}", name))?;
        let value = HeaderValue::from_str(value)
            .with_context(|| format!("Invalid value for header {}", name))?;
        headers.insert(name, value);
    }
    Ok(headers)
}
