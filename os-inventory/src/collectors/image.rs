use crate::collector_core::*;
use crate::http;
use crate::mock;
use crate::openstack::Session;
use anyhow::Result;
use async_trait::async_trait;
use serde_json::{Map, Value};

// Glance v2 core attributes; anything else is a custom image property.
const CORE_FIELDS: &[&str] = &[
    "id",
    "name",
    "status",
    "visibility",
    "protected",
    "checksum",
    "owner",
    "owner_id",
    "size",
    "virtual_size",
    "min_ram",
    "min_disk",
    "disk_format",
    "container_format",
    "created_at",
    "updated_at",
    "tags",
    "file",
    "schema",
    "self",
    "direct_url",
    "locations",
    "os_hidden",
    "os_hash_algo",
    "os_hash_value",
];

pub struct ImageCollector;

impl ImageCollector {
    pub fn new() -> Self {
        Self
    }

    fn fold_properties(record: Value) -> Value {
        let Value::Object(fields) = record else {
            return record;
        };
        let mut core = Map::new();
        let mut props = Map::new();
        for (key, value) in fields {
            if key == "properties" {
                if let Value::Object(existing) = value {
                    props.extend(existing);
                }
            } else if CORE_FIELDS.contains(&key.as_str()) {
                core.insert(key, value);
            } else {
                props.insert(key, value);
            }
        }
        core.insert("properties".into(), Value::Object(props));
        Value::Object(core)
    }
}

#[async_trait]
impl Collector for ImageCollector {
    fn name(&self) -> &'static str {
        "image"
    }

    fn kind(&self) -> ResourceKind {
        ResourceKind::Image
    }

    async fn discover(&self, session: Option<&Session>) -> Result<Vec<Resource>> {
        let raw = match session {
            None => mock::images(),
            Some(session) => {
                let base = session.endpoint(&["image"])?;
                let path = if base.ends_with("/v2") { "images" } else { "v2/images" };
                let url = http::join(&base, path);
                let body = session.get_json(&url).await?;
                http::take_list(&url, body, "images")?
            }
        };
        let folded = raw.into_iter().map(Self::fold_properties).collect();
        Ok(super::to_resources(self.kind(), folded))
    }
}
