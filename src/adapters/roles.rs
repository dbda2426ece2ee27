use crate::core::proxy::ProxyClient;
use crate::domain::ports::RoleChecker;
use crate::utils::error::Result;
use async_trait::async_trait;
use serde_json::Value;

/// Role lookup through the user-attributes feed (`roles.<name>` flags).
#[derive(Clone)]
pub struct UserAttributesRoles {
    client: ProxyClient,
}

impl UserAttributesRoles {
    pub fn new(client: ProxyClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl RoleChecker for UserAttributesRoles {
    async fn has_role(&self, student_id: &str, role: &str) -> Result<bool> {
        let response = self.client.get(student_id).await?;
        let has_role = response
            .feed()
            .and_then(|feed| feed.get("roles"))
            .and_then(|roles| roles.get(role))
            .and_then(Value::as_bool)
            .unwrap_or(false);
        Ok(has_role)
    }
}
