use crate::domain::model::{RawResponse, RowQuery, SectionRow, Term};
use crate::utils::error::Result;
use async_trait::async_trait;
use serde_json::Value;

/// Remote HTTP call.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn get(&self, url: &str, query: &[(String, String)]) -> Result<RawResponse>;
}

/// Relational warehouse query. Only the shape of the returned rows matters.
#[async_trait]
pub trait RowSource: Send + Sync {
    async fn fetch_rows(&self, query: &RowQuery) -> Result<Vec<SectionRow>>;
}

pub trait TermCatalog: Send + Sync {
    fn lookup_term(&self, slug: &str) -> Option<Term>;
}

#[async_trait]
pub trait RoleChecker: Send + Sync {
    async fn has_role(&self, student_id: &str, role: &str) -> Result<bool>;
}

#[async_trait]
pub trait LinkResolver: Send + Sync {
    async fn resolve_link(&self, link_key: &str, params: &[(String, String)]) -> Result<Option<String>>;
}

pub trait FeatureFlags: Send + Sync {
    fn enabled(&self, flag: &str) -> bool;
}

/// The external college-and-level feed (plans, holds, levels).
#[async_trait]
pub trait CollegeAndLevelSource: Send + Sync {
    async fn college_and_level(&self, student_id: &str) -> Result<Option<Value>>;
}
