//! HTTP client for the Practicum homework status endpoint

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::{debug, info};

use super::HomeworkSource;
use crate::config::ApiConfig;
use crate::error::{Error, Result};

/// Authenticated client for the homework status API
pub struct PracticumClient {
    client: Client,
    endpoint: String,
    authorization: String,
}

impl PracticumClient {
    /// Create a new client
    pub fn new(config: &ApiConfig, token: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            authorization: format!("OAuth {token}"),
        })
    }

    /// Endpoint this client talks to
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl HomeworkSource for PracticumClient {
    async fn fetch(&self, since: i64) -> Result<Value> {
        info!(endpoint = %self.endpoint, from_date = since, "Requesting homework statuses");

        let response = self
            .client
            .get(&self.endpoint)
            .header(AUTHORIZATION, &self.authorization)
            .query(&[("from_date", since)])
            .send()
            .await
            .map_err(|e| Error::Connectivity(e.to_string()))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(Error::UnexpectedStatus {
                endpoint: self.endpoint.clone(),
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| Error::Connectivity(e.to_string()))?;

        debug!(bytes = body.len(), "Received homework statuses");

        Ok(serde_json::from_slice(&body)?)
    }
}
