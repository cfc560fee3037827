//! Chart Endpoint Client
//!
//! Validates an API key against `GET /api/v1/chart` and returns the raw
//! response for the dialog to interpret.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use thiserror::Error;
use url::Url;

use super::constants::*;

/// Errors that prevent a response from being received
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid host URL {0:?}")]
    InvalidHost(String),
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// How the dialog should treat a response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseClass {
    /// 2xx, the key is valid
    Accepted,
    /// 400, 401 or 403
    InvalidCredentials,
    /// Any other non-2xx status
    ServerError(StatusCode),
}

/// Response of the chart endpoint
#[derive(Debug, Clone)]
pub struct ChartResponse {
    pub status: StatusCode,
    /// Body text, only read for successful responses
    pub body: Option<String>,
}

impl ChartResponse {
    pub fn class(&self) -> ResponseClass {
        if self.status.is_success() {
            return ResponseClass::Accepted;
        }
        match self.status {
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                ResponseClass::InvalidCredentials
            }
            status => ResponseClass::ServerError(status),
        }
    }
}

/// Anything that can answer a chart/validation request
#[async_trait]
pub trait ChartEndpoint: Send + Sync {
    async fn fetch_chart(&self, host_url: &str, api_key: &str) -> Result<ChartResponse, ApiError>;
}

/// HTTP client for the OpenAlgo server
pub struct ChartClient {
    client: Client,
}

impl ChartClient {
    /// Create a client that keeps session cookies across requests
    pub fn new(timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder()
            .cookie_store(true)
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }

    /// Full chart endpoint URL for a host
    pub fn chart_url(host_url: &str) -> Result<Url, ApiError> {
        let raw = format!("{}{}", host_url.trim().trim_end_matches('/'), CHART_PATH);
        Url::parse(&raw).map_err(|_| ApiError::InvalidHost(host_url.to_string()))
    }
}

#[async_trait]
impl ChartEndpoint for ChartClient {
    async fn fetch_chart(&self, host_url: &str, api_key: &str) -> Result<ChartResponse, ApiError> {
        let url = Self::chart_url(host_url)?;
        tracing::debug!("Validating API key against {}", url);

        let response = self
            .client
            .get(url)
            .query(&[(API_KEY_PARAM, api_key)])
            .send()
            .await?;

        let status = response.status();
        let body = if status.is_success() {
            match response.text().await {
                Ok(text) => Some(text),
                Err(e) => {
                    tracing::warn!("Could not read chart response body: {}", e);
                    None
                }
            }
        } else {
            None
        };

        tracing::info!("Chart endpoint answered {}", status);
        Ok(ChartResponse { status, body })
    }
}
