use crate::collector_core::*;
use crate::http;
use crate::mock;
use crate::openstack::Session;
use anyhow::Result;
use async_trait::async_trait;

pub struct SecurityGroupCollector;

impl SecurityGroupCollector {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Collector for SecurityGroupCollector {
    fn name(&self) -> &'static str {
        "network"
    }

    fn kind(&self) -> ResourceKind {
        ResourceKind::SecurityGroup
    }

    async fn discover(&self, session: Option<&Session>) -> Result<Vec<Resource>> {
        let Some(session) = session else {
            return Ok(super::to_resources(self.kind(), mock::security_groups()));
        };
        let url = http::join(&session.endpoint(&["network"])?, "v2.0/security-groups");
        let body = session.get_json(&url).await?;
        Ok(super::to_resources(
            self.kind(),
            http::take_list(&url, body, "security_groups")?,
        ))
    }
}
