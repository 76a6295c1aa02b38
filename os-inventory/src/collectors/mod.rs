mod block_storage;
mod compute;
mod identity;
mod image;
mod network;

use crate::catalog::Catalog;
use crate::collector_core::{Collector, Resource, ResourceKind};
use crate::openstack::Session;
use anyhow::{Context, Result};
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

pub fn build_collectors(kinds: &[ResourceKind]) -> Vec<Arc<dyn Collector>> {
    let mut v: Vec<Arc<dyn Collector>> = vec![];
    for kind in kinds {
        match kind {
            ResourceKind::Image => v.push(Arc::new(image::ImageCollector::new())),
            ResourceKind::SecurityGroup => v.push(Arc::new(network::SecurityGroupCollector::new())),
            ResourceKind::Volume => v.push(Arc::new(block_storage::VolumeCollector::new())),
            ResourceKind::Server => v.push(Arc::new(compute::ServerCollector::new())),
            ResourceKind::User => v.push(Arc::new(identity::UserCollector::new())),
        }
    }
    v
}

pub async fn fetch_catalog(session: Option<&Session>) -> Result<Catalog> {
    let mut catalog = Catalog::new();
    for c in build_collectors(&ResourceKind::ALL) {
        let found = c
            .discover(session)
            .await
            .with_context(|| format!("{} collector failed", c.name()))?;
        info!("{} -> {} resources", c.name(), found.len());
        catalog.insert(c.kind(), found);
    }
    Ok(catalog)
}

fn to_resources(kind: ResourceKind, items: Vec<Value>) -> Vec<Resource> {
    items
        .into_iter()
        .map(|v| Resource::from_value(kind, v))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_catalog_has_every_kind() {
        let catalog = fetch_catalog(None).await.unwrap();
        for (kind, resources) in catalog.iter() {
            assert!(!resources.is_empty(), "no {kind} fixtures");
            assert!(resources.iter().all(|r| r.kind == kind));
        }
    }
}
