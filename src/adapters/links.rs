use crate::domain::ports::LinkResolver;
use crate::utils::error::{EnrollmentError, Result};
use async_trait::async_trait;
use std::collections::HashMap;

/// `[links]` 區段的深層連結：連結代碼 → 含 `{placeholder}` 的 URL 樣板
#[derive(Debug, Clone, Default)]
pub struct ConfigLinkResolver {
    templates: HashMap<String, String>,
}

impl ConfigLinkResolver {
    pub fn new(templates: HashMap<String, String>) -> Self {
        Self { templates }
    }

    fn fill(&self, link_key: &str, template: &str, params: &[(String, String)]) -> Result<String> {
        let mut url = template.to_string();
        for (key, value) in params {
            url = url.replace(&format!("{{{}}}", key), value);
        }

        // 檢查是否還有未替換的參數
        if url.contains('{') && url.contains('}') {
            return Err(EnrollmentError::ProcessingError {
                message: format!("Unresolved parameters in link {}: {}", link_key, url),
            });
        }
        Ok(url)
    }
}

#[async_trait]
impl LinkResolver for ConfigLinkResolver {
    async fn resolve_link(&self, link_key: &str, params: &[(String, String)]) -> Result<Option<String>> {
        match self.templates.get(link_key) {
            Some(template) => self.fill(link_key, template, params).map(Some),
            None => Ok(None),
        }
    }
}
