//! Ownership attribution: assigns every server, volume, image and security
//! group of a catalog to the identities that own it.
//!
//! Servers and volumes carry an owner id and are resolved directly. Images
//! and security groups have no reliable owner field, so they go through
//! name heuristics and may end up under several identities or none.

use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use crate::catalog::Catalog;
use crate::collector_core::{Resource, ResourceKind};
use crate::error::UnknownOwnerError;
use crate::identity::IdentityIndex;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OwnedResources {
    pub servers: Vec<Resource>,
    pub volumes: Vec<Resource>,
    pub images: Vec<Resource>,
    pub security_groups: Vec<Resource>,
}

impl OwnedResources {
    pub fn get(&self, kind: ResourceKind) -> &[Resource] {
        match kind {
            ResourceKind::Server => &self.servers,
            ResourceKind::Volume => &self.volumes,
            ResourceKind::Image => &self.images,
            ResourceKind::SecurityGroup => &self.security_groups,
            ResourceKind::User => &[],
        }
    }

    fn push(&mut self, resource: &Resource) {
        let list = match resource.kind {
            ResourceKind::Server => &mut self.servers,
            ResourceKind::Volume => &mut self.volumes,
            ResourceKind::Image => &mut self.images,
            ResourceKind::SecurityGroup => &mut self.security_groups,
            ResourceKind::User => return,
        };
        list.push(resource.clone());
    }

    pub fn iter(&self) -> impl Iterator<Item = (ResourceKind, &[Resource])> {
        ResourceKind::OWNED.into_iter().map(move |k| (k, self.get(k)))
    }

    pub fn is_empty(&self) -> bool {
        self.iter().all(|(_, v)| v.is_empty())
    }
}

#[derive(Debug, Clone, Default)]
pub struct UserResources {
    entries: Vec<(String, OwnedResources)>,
    slots: HashMap<String, usize>,
}

impl UserResources {
    pub fn for_identities(index: &IdentityIndex) -> Self {
        let mut tree = Self::default();
        for identity in index.iter() {
            tree.entry_mut(&identity.display_name);
        }
        tree
    }

    fn entry_mut(&mut self, name: &str) -> &mut OwnedResources {
        let slot = match self.slots.get(name) {
            Some(&slot) => slot,
            None => {
                self.slots.insert(name.to_string(), self.entries.len());
                self.entries.push((name.to_string(), OwnedResources::default()));
                self.entries.len() - 1
            }
        };
        &mut self.entries[slot].1
    }

    pub fn get(&self, name: &str) -> Option<&OwnedResources> {
        self.slots.get(name).map(|&slot| &self.entries[slot].1)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &OwnedResources)> {
        self.entries.iter().map(|(n, r)| (n.as_str(), r))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AmbiguousAttribution {
    pub kind: ResourceKind,
    pub resource: String,
    pub owners: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct AttributionReport {
    pub attributed: usize,
    pub unattributed: usize,
    pub applied_security_groups: usize,
    pub ambiguous: Vec<AmbiguousAttribution>,
    pub unknown_owners: Vec<UnknownOwnerError>,
}

#[derive(Debug, Clone)]
pub struct Attribution {
    pub tree: UserResources,
    pub report: AttributionReport,
}

#[derive(Debug, Clone, Default)]
pub struct AppliedSecurityGroups {
    names: HashSet<String>,
    ids: HashSet<String>,
}

impl AppliedSecurityGroups {
    pub fn collect<'a>(servers: impl IntoIterator<Item = &'a Resource>) -> Self {
        let mut applied = Self::default();
        for sg in servers.into_iter().flat_map(|s| &s.security_groups) {
            if let Some(name) = &sg.name {
                applied.names.insert(name.clone());
            } else if let Some(id) = &sg.id {
                applied.ids.insert(id.clone());
            }
        }
        applied
    }

    pub fn contains(&self, group: &Resource) -> bool {
        group.name.as_ref().is_some_and(|n| self.names.contains(n))
            || group.id.as_ref().is_some_and(|i| self.ids.contains(i))
    }
}

/// Runs the full pass. Servers go first: the snapshot branch of the image
/// cascade matches against servers already attributed.
pub fn attribute(catalog: &Catalog, index: &IdentityIndex) -> Attribution {
    let mut engine = Engine {
        index,
        names: distinct_names(index),
        tree: UserResources::for_identities(index),
        report: AttributionReport::default(),
    };

    for kind in [ResourceKind::Server, ResourceKind::Volume] {
        for resource in catalog.get(kind) {
            engine.attribute_direct(resource);
        }
    }

    for image in catalog.get(ResourceKind::Image) {
        let owners = engine.image_owners(image);
        engine.record(image, owners);
    }

    let applied = AppliedSecurityGroups::collect(catalog.get(ResourceKind::Server));
    for group in catalog.get(ResourceKind::SecurityGroup) {
        if applied.contains(group) {
            engine.report.applied_security_groups += 1;
            continue;
        }
        let owners = engine.names_within(group.name_or_empty());
        engine.record(group, owners);
    }

    if !engine.report.ambiguous.is_empty() {
        warn!(
            count = engine.report.ambiguous.len(),
            "resources attributed to more than one user"
        );
    }

    Attribution {
        tree: engine.tree,
        report: engine.report,
    }
}

fn distinct_names(index: &IdentityIndex) -> Vec<String> {
    let mut seen = HashSet::new();
    index
        .iter()
        .filter(|i| seen.insert(i.display_name.as_str()))
        .map(|i| i.display_name.clone())
        .collect()
}

struct Engine<'a> {
    index: &'a IdentityIndex,
    names: Vec<String>,
    tree: UserResources,
    report: AttributionReport,
}

impl Engine<'_> {
    fn attribute_direct(&mut self, resource: &Resource) {
        let user_id = resource.user_id.as_deref().unwrap_or_default();
        match self.index.resolve(user_id) {
            Some(identity) => {
                let name = identity.display_name.clone();
                self.record(resource, vec![name]);
            }
            None => {
                let err = UnknownOwnerError {
                    kind: resource.kind,
                    resource: resource.label().to_string(),
                    user_id: user_id.to_string(),
                };
                warn!("skipping resource: {err}");
                self.report.unknown_owners.push(err);
            }
        }
    }

    fn resolve_name(&self, id: Option<&str>) -> Option<String> {
        self.index.resolve(id?).map(|i| i.display_name.clone())
    }

    /// Ordered cascade; the first branch that applies decides.
    fn image_owners(&self, image: &Resource) -> Vec<String> {
        if let Some(name) = self.resolve_name(image.owner.as_deref()) {
            return vec![name];
        }
        if let Some(name) = self.resolve_name(image.owner_id.as_deref()) {
            return vec![name];
        }
        let props = &image.properties;
        if let Some(name) = props.owner_user_name.as_ref().filter(|n| !n.is_empty()) {
            return vec![name.clone()];
        }
        if let Some(user_id) = props.user_id.as_deref() {
            // owner_user_name is absent here; the id is resolved instead.
            return self.resolve_name(Some(user_id)).into_iter().collect();
        }
        match props.image_type.as_deref().unwrap_or("") {
            "" | "image" => self.names_within(image.name_or_empty()),
            "snapshot" => self.snapshot_owners(image.name_or_empty()),
            other => {
                debug!(image = image.label(), image_type = other, "unhandled image type");
                Vec::new()
            }
        }
    }

    fn names_within(&self, haystack: &str) -> Vec<String> {
        self.names
            .iter()
            .filter(|n| !n.is_empty() && haystack.contains(n.as_str()))
            .cloned()
            .collect()
    }

    fn snapshot_owners(&self, haystack: &str) -> Vec<String> {
        self.names
            .iter()
            .filter(|n| {
                self.tree.get(n).is_some_and(|owned| {
                    owned.servers.iter().any(|s| {
                        let server = s.name_or_empty();
                        !server.is_empty() && haystack.contains(server)
                    })
                })
            })
            .cloned()
            .collect()
    }

    fn record(&mut self, resource: &Resource, owners: Vec<String>) {
        if owners.is_empty() {
            debug!(kind = %resource.kind, resource = resource.label(), "unattributed");
            self.report.unattributed += 1;
            return;
        }
        for owner in &owners {
            self.tree.entry_mut(owner).push(resource);
        }
        self.report.attributed += 1;
        if owners.len() > 1 {
            warn!(
                kind = %resource.kind,
                resource = resource.label(),
                owners = ?owners,
                "ambiguous attribution"
            );
            self.report.ambiguous.push(AmbiguousAttribution {
                kind: resource.kind,
                resource: resource.label().to_string(),
                owners,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};

    fn res(kind: ResourceKind, v: Value) -> Resource {
        Resource::from_value(kind, v)
    }

    fn run(resources: Vec<Resource>) -> Attribution {
        let catalog = Catalog::from_resources(resources);
        let index = IdentityIndex::build(catalog.get(ResourceKind::User));
        attribute(&catalog, &index)
    }

    fn names(list: &[Resource]) -> Vec<&str> {
        list.iter().map(Resource::label).collect()
    }

    fn users() -> Vec<Resource> {
        vec![
            res(ResourceKind::User, json!({"id": "u1", "name": "alice"})),
            res(ResourceKind::User, json!({"id": "u2", "name": "Bob"})),
        ]
    }

    #[test]
    fn snapshot_follows_attributed_server() {
        let out = run(vec![
            res(ResourceKind::User, json!({"id": "u1", "name": "alice"})),
            res(ResourceKind::Server, json!({"user_id": "u1", "name": "web1"})),
            res(
                ResourceKind::Image,
                json!({"name": "web1-snapshot", "properties": {"image_type": "snapshot"}}),
            ),
        ]);
        let alice = out.tree.get("alice").unwrap();
        assert_eq!(names(&alice.servers), ["web1"]);
        assert_eq!(names(&alice.images), ["web1-snapshot"]);
        assert!(out.report.ambiguous.is_empty());
    }

    #[test]
    fn every_identity_has_an_entry() {
        let out = run(users());
        assert_eq!(out.tree.names().collect::<Vec<_>>(), ["alice", "Bob"]);
        assert!(out.tree.iter().all(|(_, owned)| owned.is_empty()));
    }

    #[test]
    fn unknown_owner_is_skipped_not_fatal() {
        let mut resources = users();
        resources.push(res(ResourceKind::Volume, json!({"name": "v1", "user_id": "ghost"})));
        resources.push(res(ResourceKind::Volume, json!({"name": "v2", "user_id": "u2"})));
        let out = run(resources);

        assert_eq!(names(&out.tree.get("Bob").unwrap().volumes), ["v2"]);
        assert_eq!(
            out.report.unknown_owners,
            vec![UnknownOwnerError {
                kind: ResourceKind::Volume,
                resource: "v1".into(),
                user_id: "ghost".into(),
            }]
        );
    }

    #[test]
    fn image_owner_beats_owner_id() {
        let mut resources = users();
        resources.push(res(
            ResourceKind::Image,
            json!({"name": "x", "owner": "u1", "owner_id": "u2"}),
        ));
        let out = run(resources);
        assert_eq!(names(&out.tree.get("alice").unwrap().images), ["x"]);
        assert!(out.tree.get("Bob").unwrap().images.is_empty());
    }

    #[test]
    fn unresolvable_owner_falls_through_to_owner_id() {
        let mut resources = users();
        resources.push(res(
            ResourceKind::Image,
            json!({"name": "x", "owner": "project-7", "owner_id": "u2"}),
        ));
        let out = run(resources);
        assert_eq!(names(&out.tree.get("Bob").unwrap().images), ["x"]);
    }

    #[test]
    fn owner_user_name_is_taken_verbatim() {
        let mut resources = users();
        resources.push(res(
            ResourceKind::Image,
            json!({"name": "alice-img", "properties": {"owner_user_name": "carol"}}),
        ));
        let out = run(resources);
        assert_eq!(names(&out.tree.get("carol").unwrap().images), ["alice-img"]);
        assert!(out.tree.get("alice").unwrap().images.is_empty());
    }

    #[test]
    fn empty_owner_user_name_is_ignored() {
        let mut resources = users();
        resources.push(res(
            ResourceKind::Image,
            json!({"name": "alice-img", "properties": {"owner_user_name": ""}}),
        ));
        let out = run(resources);
        assert_eq!(out.tree.names().collect::<Vec<_>>(), ["alice", "Bob"]);
        // falls through to name matching
        assert_eq!(names(&out.tree.get("alice").unwrap().images), ["alice-img"]);
    }

    #[test]
    fn property_user_id_resolves_through_index() {
        let mut resources = users();
        resources.push(res(
            ResourceKind::Image,
            json!({"name": "alice-img", "properties": {"user_id": "u2"}}),
        ));
        resources.push(res(
            ResourceKind::Image,
            json!({"name": "alice-img-2", "properties": {"user_id": "ghost"}}),
        ));
        let out = run(resources);
        assert_eq!(names(&out.tree.get("Bob").unwrap().images), ["alice-img"]);
        // the cascade stops at the user_id branch, no name matching
        assert!(out.tree.get("alice").unwrap().images.is_empty());
        assert_eq!(out.report.unattributed, 1);
    }

    #[test]
    fn name_matching_is_case_sensitive() {
        let mut resources = users();
        resources.push(res(ResourceKind::Image, json!({"name": "Bob-snap-1"})));
        resources.push(res(ResourceKind::Image, json!({"name": "bob-snap-1"})));
        resources.push(res(
            ResourceKind::Image,
            json!({"name": "Bob-odd", "properties": {"image_type": "backup"}}),
        ));
        let out = run(resources);
        assert_eq!(names(&out.tree.get("Bob").unwrap().images), ["Bob-snap-1"]);
        assert_eq!(out.report.unattributed, 2);
    }

    #[test]
    fn substring_collision_attributes_to_all() {
        let out = run(vec![
            res(ResourceKind::User, json!({"id": "u1", "name": "ann"})),
            res(ResourceKind::User, json!({"id": "u2", "name": "joann"})),
            res(ResourceKind::Image, json!({"name": "joann-base"})),
        ]);
        assert_eq!(names(&out.tree.get("ann").unwrap().images), ["joann-base"]);
        assert_eq!(names(&out.tree.get("joann").unwrap().images), ["joann-base"]);
        assert_eq!(
            out.report.ambiguous,
            vec![AmbiguousAttribution {
                kind: ResourceKind::Image,
                resource: "joann-base".into(),
                owners: vec!["ann".into(), "joann".into()],
            }]
        );
    }

    #[test]
    fn applied_security_groups_are_never_attributed() {
        let mut resources = users();
        resources.push(res(
            ResourceKind::Server,
            json!({"name": "s", "user_id": "u1", "security_groups": [{"name": "alice-web"}, {"id": "sg-2"}]}),
        ));
        resources.push(res(ResourceKind::SecurityGroup, json!({"id": "sg-1", "name": "alice-web"})));
        resources.push(res(ResourceKind::SecurityGroup, json!({"id": "sg-2", "name": "alice-db"})));
        resources.push(res(ResourceKind::SecurityGroup, json!({"id": "sg-3", "name": "alice-old"})));
        let out = run(resources);

        assert_eq!(names(&out.tree.get("alice").unwrap().security_groups), ["alice-old"]);
        assert_eq!(out.report.applied_security_groups, 2);
    }

    #[test]
    fn applied_ref_with_name_does_not_record_its_id() {
        let servers = [res(
            ResourceKind::Server,
            json!({"security_groups": [{"name": "web", "id": "sg-1"}]}),
        )];
        let applied = AppliedSecurityGroups::collect(&servers);
        assert!(applied.contains(&res(ResourceKind::SecurityGroup, json!({"name": "web"}))));
        assert!(!applied.contains(&res(ResourceKind::SecurityGroup, json!({"id": "sg-1", "name": "other"}))));
    }

    #[test]
    fn attribution_is_idempotent() {
        let mut resources = users();
        resources.push(res(ResourceKind::Server, json!({"name": "s1", "user_id": "u1"})));
        resources.push(res(ResourceKind::Image, json!({"name": "Bob-base"})));
        let catalog = Catalog::from_resources(resources);
        let index = IdentityIndex::build(catalog.get(ResourceKind::User));
        let first = attribute(&catalog, &index);
        let second = attribute(&catalog, &index);
        for ((n1, r1), (n2, r2)) in first.tree.iter().zip(second.tree.iter()) {
            assert_eq!(n1, n2);
            assert_eq!(r1, r2);
        }
    }
}
