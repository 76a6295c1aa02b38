use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::attribution::{OwnedResources, UserResources};
use crate::catalog::Catalog;
use crate::collector_core::{Resource, ResourceKind};

/// Field names left out of the report. Every list defaults to empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputFilter {
    pub image: Vec<String>,
    pub security_group: Vec<String>,
    pub volume: Vec<String>,
    pub server: Vec<String>,
    pub user: Vec<String>,
    pub properties: Vec<String>,
    pub security_group_rules: Vec<String>,
    pub security_groups: Vec<String>,
}

impl OutputFilter {
    pub fn for_kind(&self, kind: ResourceKind) -> &[String] {
        match kind {
            ResourceKind::Image => &self.image,
            ResourceKind::SecurityGroup => &self.security_group,
            ResourceKind::Volume => &self.volume,
            ResourceKind::Server => &self.server,
            ResourceKind::User => &self.user,
        }
    }
}

fn excluded(list: &[String], key: &str) -> bool {
    list.iter().any(|k| k == key)
}

pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub struct ReportFormatter<'a> {
    filter: &'a OutputFilter,
}

impl<'a> ReportFormatter<'a> {
    pub fn new(filter: &'a OutputFilter) -> Self {
        Self { filter }
    }

    pub fn catalog_lines(&self, catalog: &Catalog) -> Vec<String> {
        let mut out = Vec::new();
        for (kind, resources) in catalog.iter() {
            self.resources(&mut out, kind, resources, "");
        }
        out
    }

    pub fn user_tree_lines(&self, tree: &UserResources) -> Vec<String> {
        let mut out = Vec::new();
        for (name, owned) in tree.iter() {
            self.user(&mut out, name, owned);
        }
        out
    }

    pub fn user_lines(&self, heading: &str, owned: &OwnedResources) -> Vec<String> {
        let mut out = Vec::new();
        self.user(&mut out, heading, owned);
        out
    }

    fn user(&self, out: &mut Vec<String>, heading: &str, owned: &OwnedResources) {
        out.push(format!("{heading}:"));
        for (kind, resources) in owned.iter() {
            self.resources(out, kind, resources, "\t");
        }
    }

    fn resources(&self, out: &mut Vec<String>, kind: ResourceKind, list: &[Resource], prefix: &str) {
        let skip = self.filter.for_kind(kind);
        let inner = format!("{prefix}\t");
        for resource in list {
            out.push(format!("{prefix}{kind}:"));
            for (key, value) in &resource.fields {
                if excluded(skip, key) {
                    continue;
                }
                match (key.as_str(), value) {
                    ("properties", Value::Object(props)) => self.properties(out, props, &inner),
                    ("security_group_rules", Value::Array(rules)) => self.rules(out, rules, &inner),
                    ("security_groups", Value::Null) => {}
                    ("security_groups", Value::Array(groups)) => self.groups(out, groups, &inner),
                    _ => out.push(format!("{inner}{key}: {}", display_value(value))),
                }
            }
            out.push(String::new());
        }
    }

    fn properties(&self, out: &mut Vec<String>, props: &Map<String, Value>, prefix: &str) {
        out.push(format!("{prefix}properties:"));
        for (key, value) in props {
            if !excluded(&self.filter.properties, key) {
                out.push(format!("{prefix}\t{key}: {}", display_value(value)));
            }
        }
    }

    fn rules(&self, out: &mut Vec<String>, rules: &[Value], prefix: &str) {
        out.push(format!("{prefix}security_group_rules:"));
        for rule in rules {
            out.push(format!("{prefix}\trule:"));
            let Some(rule) = rule.as_object() else {
                out.push(format!("{prefix}\t\t{}", display_value(rule)));
                continue;
            };
            for (key, value) in rule {
                if !excluded(&self.filter.security_group_rules, key) {
                    out.push(format!("{prefix}\t\t{key}: {}", display_value(value)));
                }
            }
        }
    }

    // `group: <name>` per reference, remaining unfiltered fields nested below
    fn groups(&self, out: &mut Vec<String>, groups: &[Value], prefix: &str) {
        out.push(format!("{prefix}security_groups:"));
        for group in groups {
            let Some(group) = group.as_object() else {
                out.push(format!("{prefix}\tgroup: {}", display_value(group)));
                continue;
            };
            let label = group
                .get("name")
                .or_else(|| group.get("id"))
                .map(display_value)
                .unwrap_or_default();
            out.push(format!("{prefix}\tgroup: {label}"));
            for (key, value) in group {
                if key == "name" || excluded(&self.filter.security_groups, key) {
                    continue;
                }
                out.push(format!("{prefix}\t\t{key}: {}", display_value(value)));
            }
        }
    }
}
