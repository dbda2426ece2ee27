use crate::core::cache::RemoteFetchCache;
use crate::core::hash_converter::downcase_and_camelize;
use crate::domain::model::{FeedEnvelope, ProxyResponse};
use crate::domain::ports::{FeatureFlags, Fetcher};
use crate::utils::error::Result;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_IDENTITY_PARAM: &str = "SCC_PROFILE_ID";
pub const DEFAULT_LANGUAGE_CD: &str = "ENG";

/// One upstream endpoint.
#[derive(Debug, Clone)]
pub struct Endpoint {
    pub name: String,
    pub url: String,
    /// Root node of the response. When set, only that node becomes the feed.
    pub root_node: Option<String>,
}

impl Endpoint {
    pub fn new(name: &str, url: &str) -> Self {
        Self {
            name: name.to_string(),
            url: url.to_string(),
            root_node: None,
        }
    }

    pub fn with_root_node(mut self, node: &str) -> Self {
        self.root_node = Some(node.to_string());
        self
    }
}

#[derive(Clone)]
pub struct CacheConfig {
    pub store: Arc<RemoteFetchCache<FeedEnvelope>>,
    pub expires_in: Duration,
}

impl CacheConfig {
    pub fn new(store: Arc<RemoteFetchCache<FeedEnvelope>>, expires_in: Duration) -> Self {
        Self { store, expires_in }
    }
}

#[derive(Clone)]
struct FeatureGate {
    flags: Arc<dyn FeatureFlags>,
    flag: String,
}

/// Client for one campus-records endpoint: cache, optional feature flag and
/// fetcher are plain fields.
#[derive(Clone)]
pub struct ProxyClient {
    endpoint: Endpoint,
    cache: CacheConfig,
    gate: Option<FeatureGate>,
    fetcher: Arc<dyn Fetcher>,
    identity_param: String,
    language_cd: String,
}

impl ProxyClient {
    pub fn new(endpoint: Endpoint, cache: CacheConfig, fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            endpoint,
            cache,
            gate: None,
            fetcher,
            identity_param: DEFAULT_IDENTITY_PARAM.to_string(),
            language_cd: DEFAULT_LANGUAGE_CD.to_string(),
        }
    }

    pub fn with_feature_flag(mut self, flags: Arc<dyn FeatureFlags>, flag: &str) -> Self {
        self.gate = Some(FeatureGate {
            flags,
            flag: flag.to_string(),
        });
        self
    }

    pub fn with_identity_param(mut self, param: &str) -> Self {
        self.identity_param = param.to_string();
        self
    }

    pub fn with_language(mut self, language_cd: &str) -> Self {
        self.language_cd = language_cd.to_string();
        self
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub async fn get(&self, identity: &str) -> Result<ProxyResponse> {
        self.get_with(identity, &[]).await
    }

    /// Upstream error statuses come back as `ProxyResponse::Errored`; only
    /// transport faults are returned as `Err`.
    pub async fn get_with(&self, identity: &str, params: &[(String, String)]) -> Result<ProxyResponse> {
        if let Some(gate) = &self.gate {
            if !gate.flags.enabled(&gate.flag) {
                tracing::debug!("{}: feature '{}' disabled, skipping request", self.endpoint.name, gate.flag);
                return Ok(ProxyResponse::Disabled);
            }
        }

        let key = self.cache_key(identity, params);
        let (envelope, from_cache) = self
            .cache
            .store
            .fetch(&key, self.cache.expires_in, || self.get_internal(identity, params))
            .await?;
        if from_cache {
            tracing::debug!("{}: served {} from cache", self.endpoint.name, key);
        }

        Ok(classify(envelope))
    }

    /// Clears this identity's cache; call after a write on its behalf.
    pub async fn expire(&self, identity: &str, params: &[(String, String)]) {
        self.cache.store.invalidate(&self.cache_key(identity, params)).await;
    }

    fn cache_key(&self, identity: &str, params: &[(String, String)]) -> String {
        let mut key = format!("{}/{}", self.endpoint.name, identity);
        for (name, value) in params {
            key.push_str(&format!("&{}={}", name, value));
        }
        key
    }

    async fn get_internal(&self, identity: &str, params: &[(String, String)]) -> Result<FeedEnvelope> {
        tracing::info!(
            "{}: Making request to {} on behalf of user {}; cache expiration {:?}",
            self.endpoint.name,
            self.endpoint.url,
            identity,
            self.cache.expires_in
        );

        let mut query = vec![
            (self.identity_param.clone(), identity.to_string()),
            ("languageCd".to_string(), self.language_cd.clone()),
        ];
        query.extend(params.iter().cloned());

        let response = self.fetcher.get(&self.endpoint.url, &query).await?;
        tracing::debug!(
            "{}: Remote server status {}, Body = {}",
            self.endpoint.name,
            response.status_code,
            response.raw_body
        );

        let mut feed = self.build_feed(response.parsed_body);
        if is_blank(&feed) {
            tracing::error!(
                "{}: build_feed returned nothing; falling back on raw response body",
                self.endpoint.name
            );
            feed = Value::String(response.raw_body);
        }

        let feed = downcase_and_camelize(feed);
        let no_student_id = feed
            .get("noStudentId")
            .and_then(Value::as_bool)
            .unwrap_or(false);

        Ok(FeedEnvelope {
            status_code: response.status_code,
            feed,
            no_student_id,
        })
    }

    fn build_feed(&self, parsed: Value) -> Value {
        match (&self.endpoint.root_node, parsed) {
            (Some(node), Value::Object(mut map)) => map.remove(node).unwrap_or(Value::Null),
            (Some(_), _) => Value::Null,
            (None, parsed) => parsed,
        }
    }
}

fn classify(envelope: FeedEnvelope) -> ProxyResponse {
    if envelope.no_student_id || envelope.status_code < 400 {
        ProxyResponse::Ok {
            status_code: envelope.status_code,
            feed: envelope.feed,
        }
    } else {
        ProxyResponse::Errored
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}
