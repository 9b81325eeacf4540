//! HTTP gateway implementation of the remote case service

use super::RemoteCaseService;
use crate::error::RemoteError;
use crate::types::{Action, BucketMap, Event, WorkqueueQuery};
use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use std::time::Duration;

/// Gateway client configuration
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Base URL of the case-management gateway
    pub base_url: String,
    /// Optional bearer token for authenticated access
    pub api_key: Option<String>,
    /// Request timeout in seconds (default: 30)
    pub timeout_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:7070".to_string(),
            api_key: None,
            timeout_secs: 30,
        }
    }
}

/// HTTP client for the case-management gateway
///
/// # Example
///
/// ```rust,no_run
/// use caseflow_sdk::remote::{GatewayCaseService, GatewayConfig};
///
/// let gateway = GatewayCaseService::new(GatewayConfig {
///     base_url: "https://gateway.example.org".into(),
///     ..Default::default()
/// });
/// ```
pub struct GatewayCaseService {
    config: GatewayConfig,
    client: Client,
}

impl GatewayCaseService {
    /// Create a new gateway client
    pub fn new(config: GatewayConfig) -> Self {
        let mut headers = header::HeaderMap::new();
        if let Some(ref api_key) = config.api_key {
            headers.insert(
                header::AUTHORIZATION,
                header::HeaderValue::from_str(&format!("Bearer {}", api_key))
                    .expect("Invalid API key"),
            );
        }

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .expect("Failed to build HTTP client");

        Self { config, client }
    }

    fn event_segment(event: Event) -> &'static str {
        match event {
            Event::Birth => "birth",
            Event::Death => "death",
            Event::Marriage => "marriage",
        }
    }

    fn action_segment(action: Action) -> &'static str {
        match action {
            Action::LoadReview => "load-review",
            Action::LoadCorrection => "load-correction",
            Action::Archive => "archive",
            Action::Reinstate => "reinstate",
        }
    }

    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, RemoteError> {
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(RemoteError::Rejected {
                status,
                message: body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| RemoteError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl RemoteCaseService for GatewayCaseService {
    async fn fetch_declaration(
        &self,
        event: Event,
        action: Action,
        id: &str,
    ) -> Result<serde_json::Value, RemoteError> {
        let url = format!(
            "{}/records/{}/{}?action={}",
            self.config.base_url,
            Self::event_segment(event),
            urlencoding::encode(id),
            Self::action_segment(action)
        );

        let response = self.client.get(&url).send().await.map_err(RemoteError::from)?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(RemoteError::Rejected {
                status: 404,
                message: format!("declaration {id} not found"),
            });
        }

        self.handle_response(response).await
    }

    async fn search_workqueues(&self, query: &WorkqueueQuery) -> Result<BucketMap, RemoteError> {
        let url = format!("{}/search/workqueues", self.config.base_url);

        let response = self
            .client
            .post(&url)
            .header(header::CONTENT_TYPE, "application/json")
            .json(query)
            .send()
            .await
            .map_err(RemoteError::from)?;

        self.handle_response(response).await
    }
}
