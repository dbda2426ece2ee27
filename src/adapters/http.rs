use crate::domain::model::RawResponse;
use crate::domain::ports::Fetcher;
use crate::utils::error::{EnrollmentError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    client: Client,
    timeout: Option<Duration>,
}

impl Default for ReqwestFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl ReqwestFetcher {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

fn transport_error(url: &str, e: reqwest::Error) -> EnrollmentError {
    if e.is_timeout() {
        EnrollmentError::Timeout {
            url: url.to_string(),
        }
    } else {
        EnrollmentError::Transport(e)
    }
}

/// 無法解析時回傳 Null，由 ProxyClient 改用原始內容
pub fn parse_body(raw_body: &str) -> Value {
    serde_json::from_str(raw_body).unwrap_or_else(|e| {
        tracing::debug!("Response body is not JSON: {}", e);
        Value::Null
    })
}

#[async_trait]
impl Fetcher for ReqwestFetcher {
    async fn get(&self, url: &str, query: &[(String, String)]) -> Result<RawResponse> {
        let mut request = self.client.get(url).query(query);
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await.map_err(|e| transport_error(url, e))?;
        let status_code = response.status().as_u16();
        tracing::debug!("GET {} -> {}", url, status_code);

        let raw_body = response.text().await.map_err(|e| transport_error(url, e))?;
        let parsed_body = parse_body(&raw_body);

        Ok(RawResponse {
            status_code,
            raw_body,
            parsed_body,
        })
    }
}
