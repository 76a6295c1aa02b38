use crate::collector_core::*;
use crate::http;
use crate::mock;
use crate::openstack::Session;
use anyhow::Result;
use async_trait::async_trait;

pub struct ServerCollector;

impl ServerCollector {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Collector for ServerCollector {
    fn name(&self) -> &'static str {
        "compute"
    }

    fn kind(&self) -> ResourceKind {
        ResourceKind::Server
    }

    async fn discover(&self, session: Option<&Session>) -> Result<Vec<Resource>> {
        let Some(session) = session else {
            return Ok(super::to_resources(self.kind(), mock::servers()));
        };
        // all projects, not only the token's own
        let url = http::join(&session.endpoint(&["compute"])?, "servers/detail?all_tenants=1");
        let body = session.get_json(&url).await?;
        Ok(super::to_resources(self.kind(), http::take_list(&url, body, "servers")?))
    }
}
