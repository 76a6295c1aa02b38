use std::collections::BTreeMap;

use crate::collector_core::{Resource, ResourceKind};

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    by_kind: BTreeMap<ResourceKind, Vec<Resource>>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_resources(resources: impl IntoIterator<Item = Resource>) -> Self {
        let mut catalog = Self::new();
        for r in resources {
            catalog.by_kind.entry(r.kind).or_default().push(r);
        }
        catalog
    }

    pub fn insert(&mut self, kind: ResourceKind, mut resources: Vec<Resource>) {
        self.by_kind.entry(kind).or_default().append(&mut resources);
    }

    pub fn get(&self, kind: ResourceKind) -> &[Resource] {
        self.by_kind.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = (ResourceKind, &[Resource])> {
        ResourceKind::ALL.into_iter().map(move |k| (k, self.get(k)))
    }

    pub fn len(&self) -> usize {
        self.by_kind.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn iterates_every_kind_in_catalog_order() {
        let catalog = Catalog::from_resources([
            Resource::from_value(ResourceKind::User, json!({"id": "u1"})),
            Resource::from_value(ResourceKind::Image, json!({"id": "i1"})),
        ]);
        let kinds: Vec<_> = catalog.iter().map(|(k, v)| (k, v.len())).collect();
        assert_eq!(
            kinds,
            vec![
                (ResourceKind::Image, 1),
                (ResourceKind::SecurityGroup, 0),
                (ResourceKind::Volume, 0),
                (ResourceKind::Server, 0),
                (ResourceKind::User, 1),
            ]
        );
        assert_eq!(catalog.len(), 2);
    }
}
