use crate::collector_core::*;
use crate::http;
use crate::mock;
use crate::openstack::Session;
use anyhow::Result;
use async_trait::async_trait;

pub struct VolumeCollector;

impl VolumeCollector {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Collector for VolumeCollector {
    fn name(&self) -> &'static str {
        "block_storage"
    }

    fn kind(&self) -> ResourceKind {
        ResourceKind::Volume
    }

    async fn discover(&self, session: Option<&Session>) -> Result<Vec<Resource>> {
        let Some(session) = session else {
            return Ok(super::to_resources(self.kind(), mock::volumes()));
        };
        let base = session.endpoint(&["volumev3", "block-storage", "volumev2"])?;
        let url = http::join(&base, "volumes/detail?all_tenants=1");
        let body = session.get_json(&url).await?;
        Ok(super::to_resources(self.kind(), http::take_list(&url, body, "volumes")?))
    }
}
