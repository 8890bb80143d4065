//! Reqwest implementation of the collaborator contract.

use std::time::Duration;

use futures::future::BoxFuture;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::models::{BuildRequest, RepositoryHit, SearchProvider, SourceKind};

use super::{
    BackendClient, BuildAccepted, HealthReply, InstallReport, LogsReply, SearchReply,
    SearchRequest, StatusSnapshot, SystemReadiness,
};

/// Error body shape used by the collaborator for non-success statuses.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: String,
}

/// HTTP client for one collaborator instance.
pub struct HttpBackend {
    base_url: String,
    client: reqwest::Client,
}

impl HttpBackend {
    /// Build a client with a per-request timeout so a hung collaborator
    /// cannot stall a monitor tick indefinitely.
    pub fn new(base_url: &str, request_timeout: Duration) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()?;

        Ok(HttpBackend {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        log::debug!("[Api] GET {}", url);
        let response = self.client.get(&url).send().await?;
        Self::decode(response).await
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        log::debug!("[Api] POST {}", url);
        let response = self.client.post(&url).json(body).send().await?;
        Self::decode(response).await
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
        let code = response.status();
        if !code.is_success() {
            let detail = match response.json::<ErrorBody>().await {
                Ok(body) if !body.detail.is_empty() => body.detail,
                _ => code.canonical_reason().unwrap_or("unknown error").to_string(),
            };
            return Err(ApiError::Rejected {
                code: code.as_u16(),
                detail,
            });
        }

        // Decode from text so payload errors are distinguishable from
        // transport errors.
        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }

    fn search_path(provider: SearchProvider) -> &'static str {
        match provider {
            SearchProvider::Github => "/api/search/github",
            SearchProvider::Gitlab => "/api/search/gitlab",
        }
    }
}

impl BackendClient for HttpBackend {
    fn ping(&self) -> BoxFuture<'_, Result<HealthReply, ApiError>> {
        Box::pin(async move { self.get_json("/api/health").await })
    }

    fn check_system(&self) -> BoxFuture<'_, Result<SystemReadiness, ApiError>> {
        Box::pin(async move { self.get_json("/api/system/check").await })
    }

    fn install_dependencies(&self) -> BoxFuture<'_, Result<InstallReport, ApiError>> {
        Box::pin(async move {
            let url = format!("{}{}", self.base_url, "/api/system/install-dependencies");
            log::debug!("[Api] POST {}", url);
            let response = self.client.post(&url).send().await?;
            Self::decode(response).await
        })
    }

    fn search_sources(
        &self,
        provider: SearchProvider,
        kind: SourceKind,
        query: String,
    ) -> BoxFuture<'_, Result<Vec<RepositoryHit>, ApiError>> {
        Box::pin(async move {
            let body = SearchRequest {
                query,
                source_type: kind.source_type().to_string(),
            };
            let reply: SearchReply = self.post_json(Self::search_path(provider), &body).await?;
            Ok(reply.results)
        })
    }

    fn submit_build(&self, request: BuildRequest) -> BoxFuture<'_, Result<BuildAccepted, ApiError>> {
        Box::pin(async move { self.post_json("/api/build/start", &request).await })
    }

    fn fetch_status(&self) -> BoxFuture<'_, Result<StatusSnapshot, ApiError>> {
        Box::pin(async move { self.get_json("/api/build/status").await })
    }

    fn fetch_logs(&self) -> BoxFuture<'_, Result<Vec<String>, ApiError>> {
        Box::pin(async move {
            let reply: LogsReply = self.get_json("/api/build/logs").await?;
            Ok(reply.logs)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let backend = HttpBackend::new("http://localhost:8001/", Duration::from_secs(5)).unwrap();
        assert_eq!(backend.base_url(), "http://localhost:8001");
    }

    #[test]
    fn test_search_paths() {
        assert_eq!(HttpBackend::search_path(SearchProvider::Github), "/api/search/github");
        assert_eq!(HttpBackend::search_path(SearchProvider::Gitlab), "/api/search/gitlab");
    }
}
