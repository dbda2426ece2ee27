use crate::adapters::http::parse_body;
use crate::domain::model::RawResponse;
use crate::domain::ports::Fetcher;
use crate::utils::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;

/// 假資料模式：依 URL 從磁碟讀取預先存好的回應
#[derive(Debug, Clone)]
pub struct FixtureFetcher {
    base_path: String,
    fixtures: HashMap<String, String>,
}

impl FixtureFetcher {
    pub fn new(base_path: String) -> Self {
        Self {
            base_path,
            fixtures: HashMap::new(),
        }
    }

    pub fn with_fixture(mut self, url: &str, file_name: &str) -> Self {
        self.fixtures.insert(url.to_string(), file_name.to_string());
        self
    }
}

#[async_trait]
impl Fetcher for FixtureFetcher {
    async fn get(&self, url: &str, query: &[(String, String)]) -> Result<RawResponse> {
        let Some(file_name) = self.fixtures.get(url) else {
            tracing::warn!("No fixture registered for {}", url);
            return Ok(RawResponse {
                status_code: 404,
                raw_body: String::new(),
                parsed_body: serde_json::Value::Null,
            });
        };

        let full_path = Path::new(&self.base_path).join(file_name);
        tracing::debug!("Fake request to {} with {:?}; reading {}", url, query, full_path.display());
        let raw_body = tokio::fs::read_to_string(&full_path).await?;
        let parsed_body = parse_body(&raw_body);

        Ok(RawResponse {
            status_code: 200,
            raw_body,
            parsed_body,
        })
    }
}
