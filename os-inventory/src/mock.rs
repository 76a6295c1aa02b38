use serde_json::{json, Value};

pub fn users() -> Vec<Value> {
    vec![
        json!({"id": "u-alice", "name": "alice", "email": "alice@example.org", "enabled": true, "domain_id": "default"}),
        json!({"id": "u-bob", "name": "bob", "email": "bob@example.org", "enabled": true, "domain_id": "default"}),
        json!({"id": "u-carol", "name": "carol", "enabled": false, "domain_id": "default"}),
    ]
}

pub fn servers() -> Vec<Value> {
    vec![
        json!({
            "id": "7c1e2a4e-0001",
            "name": "web1",
            "status": "ACTIVE",
            "user_id": "u-alice",
            "tenant_id": "p-demo",
            "flavor": {"original_name": "m1.small"},
            "security_groups": [{"name": "default"}, {"name": "alice-web"}]
        }),
        json!({
            "id": "7c1e2a4e-0002",
            "name": "ci-runner",
            "status": "SHUTOFF",
            "user_id": "u-bob",
            "tenant_id": "p-demo",
            "flavor": {"original_name": "m1.large"},
            "security_groups": [{"id": "sg-bob-ci"}]
        }),
    ]
}

pub fn volumes() -> Vec<Value> {
    vec![
        json!({"id": "vol-0001", "name": "web1-data", "size": 20, "status": "in-use", "user_id": "u-alice"}),
        json!({"id": "vol-0002", "name": "scratch", "size": 100, "status": "available", "user_id": "u-bob"}),
        json!({"id": "vol-0003", "name": "orphan", "size": 5, "status": "available", "user_id": "u-deleted"}),
    ]
}

pub fn images() -> Vec<Value> {
    vec![
        json!({"id": "img-0001", "name": "debian-12", "status": "active", "owner": "u-bob", "visibility": "private"}),
        json!({"id": "img-0002", "name": "base", "status": "active", "owner": "p-demo", "owner_id": "u-alice"}),
        json!({"id": "img-0003", "name": "golden", "status": "active", "owner_user_name": "carol"}),
        json!({"id": "img-0004", "name": "legacy", "status": "active", "user_id": "u-bob"}),
        json!({"id": "img-0005", "name": "alice-toolbox", "status": "active", "image_type": "image"}),
        json!({"id": "img-0006", "name": "web1-snapshot-2024", "status": "active", "image_type": "snapshot"}),
        json!({"id": "img-0007", "name": "cirros", "status": "active", "visibility": "public"}),
    ]
}

pub fn security_groups() -> Vec<Value> {
    vec![
        json!({"id": "sg-default", "name": "default", "description": "Default security group", "security_group_rules": []}),
        json!({
            "id": "sg-alice-web",
            "name": "alice-web",
            "description": "",
            "security_group_rules": [
                {"id": "r-1", "direction": "ingress", "protocol": "tcp", "port_range_min": 443, "port_range_max": 443}
            ]
        }),
        json!({"id": "sg-bob-ci", "name": "bob-ci", "description": "", "security_group_rules": []}),
        json!({"id": "sg-bob-old", "name": "bob-old", "description": "unused", "security_group_rules": []}),
    ]
}
