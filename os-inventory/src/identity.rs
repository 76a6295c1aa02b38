use std::collections::HashMap;

use crate::collector_core::Resource;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: String,
    pub display_name: String,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct IdentityIndex {
    identities: Vec<Identity>,
    by_id: HashMap<String, usize>,
    emails: HashMap<String, String>,
}

impl IdentityIndex {
    pub fn build<'a>(users: impl IntoIterator<Item = &'a Resource>) -> Self {
        let mut index = Self::default();
        for user in users {
            let Some(id) = user.id.clone() else { continue };
            let identity = Identity {
                display_name: user.name.clone().unwrap_or_else(|| id.clone()),
                email: user.email.clone().filter(|e| !e.is_empty()),
                id: id.clone(),
            };

            match &identity.email {
                Some(email) => {
                    index.emails.insert(id.clone(), email.clone());
                }
                None => {
                    index.emails.remove(&id);
                }
            }

            match index.by_id.get(&id) {
                Some(&slot) => index.identities[slot] = identity,
                None => {
                    index.by_id.insert(id, index.identities.len());
                    index.identities.push(identity);
                }
            }
        }
        index
    }

    pub fn resolve(&self, id: &str) -> Option<&Identity> {
        self.by_id.get(id).map(|&slot| &self.identities[slot])
    }

    pub fn email(&self, id: &str) -> Option<&str> {
        self.emails.get(id).map(String::as_str)
    }

    pub fn email_for_name(&self, display_name: &str) -> Option<&str> {
        self.identities
            .iter()
            .filter(|i| i.display_name == display_name)
            .find_map(|i| self.email(&i.id))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Identity> {
        self.identities.iter()
    }

    pub fn len(&self) -> usize {
        self.identities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector_core::ResourceKind;
    use serde_json::json;

    fn user(v: serde_json::Value) -> Resource {
        Resource::from_value(ResourceKind::User, v)
    }

    #[test]
    fn unknown_id_is_unattributable() {
        let users = [user(json!({"id": "u1", "name": "alice"}))];
        let index = IdentityIndex::build(&users);
        assert_eq!(index.resolve("u1").map(|i| i.display_name.as_str()), Some("alice"));
        assert!(index.resolve("nope").is_none());
        assert!(index.email("u1").is_none());
    }

    #[test]
    fn duplicate_id_is_last_write_wins() {
        let users = [
            user(json!({"id": "u1", "name": "alice", "email": "a@x.org"})),
            user(json!({"id": "u2", "name": "bob"})),
            user(json!({"id": "u1", "name": "alicia"})),
        ];
        let index = IdentityIndex::build(&users);
        let names: Vec<_> = index.iter().map(|i| i.display_name.as_str()).collect();
        assert_eq!(names, ["alicia", "bob"]);
        assert!(index.email("u1").is_none());
    }

    #[test]
    fn email_by_display_name() {
        let users = [
            user(json!({"id": "u1", "name": "alice", "email": ""})),
            user(json!({"id": "u3", "name": "alice", "email": "alice@x.org"})),
        ];
        let index = IdentityIndex::build(&users);
        assert_eq!(index.email_for_name("alice"), Some("alice@x.org"));
        assert_eq!(index.email_for_name("carol"), None);
    }
}
