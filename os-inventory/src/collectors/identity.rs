use crate::collector_core::*;
use crate::http;
use crate::mock;
use crate::openstack::Session;
use anyhow::Result;
use async_trait::async_trait;

pub struct UserCollector;

impl UserCollector {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Collector for UserCollector {
    fn name(&self) -> &'static str {
        "identity"
    }

    fn kind(&self) -> ResourceKind {
        ResourceKind::User
    }

    async fn discover(&self, session: Option<&Session>) -> Result<Vec<Resource>> {
        let Some(session) = session else {
            return Ok(super::to_resources(self.kind(), mock::users()));
        };
        let url = http::join(session.identity_url(), "users");
        let body = session.get_json(&url).await?;
        Ok(super::to_resources(self.kind(), http::take_list(&url, body, "users")?))
    }
}
