use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use anyhow::Result;
use async_trait::async_trait;

use crate::openstack::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Image,
    SecurityGroup,
    Volume,
    Server,
    User,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 5] = [
        ResourceKind::Image,
        ResourceKind::SecurityGroup,
        ResourceKind::Volume,
        ResourceKind::Server,
        ResourceKind::User,
    ];

    pub const OWNED: [ResourceKind; 4] = [
        ResourceKind::Server,
        ResourceKind::Volume,
        ResourceKind::Image,
        ResourceKind::SecurityGroup,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Image => "image",
            ResourceKind::SecurityGroup => "security_group",
            ResourceKind::Volume => "volume",
            ResourceKind::Server => "server",
            ResourceKind::User => "user",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SecurityGroupRef {
    pub name: Option<String>,
    pub id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageProperties {
    pub owner_user_name: Option<String>,
    pub user_id: Option<String>,
    pub image_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    pub kind: ResourceKind,
    pub id: Option<String>,
    pub name: Option<String>,
    pub user_id: Option<String>,
    pub owner: Option<String>,
    pub owner_id: Option<String>,
    pub email: Option<String>,
    pub properties: ImageProperties,
    pub security_groups: Vec<SecurityGroupRef>,
    pub fields: Map<String, Value>,
}

fn str_field(map: &Map<String, Value>, key: &str) -> Option<String> {
    map.get(key).and_then(Value::as_str).map(str::to_string)
}

impl Resource {
    pub fn from_record(kind: ResourceKind, fields: Map<String, Value>) -> Self {
        let properties = match fields.get("properties") {
            Some(Value::Object(p)) => ImageProperties {
                owner_user_name: str_field(p, "owner_user_name"),
                user_id: str_field(p, "user_id"),
                image_type: str_field(p, "image_type"),
            },
            _ => ImageProperties::default(),
        };

        let security_groups = match fields.get("security_groups") {
            Some(Value::Array(groups)) => groups
                .iter()
                .filter_map(Value::as_object)
                .map(|g| SecurityGroupRef {
                    name: str_field(g, "name"),
                    id: str_field(g, "id"),
                })
                .collect(),
            _ => Vec::new(),
        };

        Resource {
            kind,
            id: str_field(&fields, "id"),
            name: str_field(&fields, "name"),
            user_id: str_field(&fields, "user_id"),
            owner: str_field(&fields, "owner"),
            owner_id: str_field(&fields, "owner_id"),
            email: str_field(&fields, "email"),
            properties,
            security_groups,
            fields,
        }
    }

    pub fn from_value(kind: ResourceKind, value: Value) -> Self {
        match value {
            Value::Object(map) => Self::from_record(kind, map),
            _ => Self::from_record(kind, Map::new()),
        }
    }

    pub fn label(&self) -> &str {
        self.name
            .as_deref()
            .or(self.id.as_deref())
            .unwrap_or("<unnamed>")
    }

    pub fn name_or_empty(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }
}

// Collector interface: one per resource kind
#[async_trait]
pub trait Collector: Send + Sync {
    fn name(&self) -> &'static str;
    fn kind(&self) -> ResourceKind;
    /// Without a session the collector serves its fixture records.
    async fn discover(&self, session: Option<&Session>) -> Result<Vec<Resource>>;
}
