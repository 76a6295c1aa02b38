use crate::error::ProviderError;
use anyhow::Result;
use serde_json::Value;
use std::time::Duration;

const CONNECT_TIMEOUT: u64 = 5;
const READ_TIMEOUT: u64 = 60;

pub const TOKEN_HEADER: &str = "X-Auth-Token";

pub fn build_client() -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT))
        .timeout(Duration::from_secs(READ_TIMEOUT))
        .build()?;
    Ok(client)
}

pub async fn get_json(client: &reqwest::Client, url: &str, token: &str) -> Result<Value> {
    let resp = client
        .get(url)
        .header(TOKEN_HEADER, token)
        .header(reqwest::header::ACCEPT, "application/json")
        .send()
        .await?;

    let status = resp.status();
    if !status.is_success() {
        return Err(ProviderError::Request {
            url: url.to_string(),
            status: status.as_u16(),
            body: resp.text().await.unwrap_or_default(),
        }
        .into());
    }
    Ok(resp.json().await?)
}

pub fn take_list(url: &str, mut body: Value, key: &'static str) -> Result<Vec<Value>> {
    match body.get_mut(key).map(Value::take) {
        Some(Value::Array(items)) => Ok(items),
        _ => Err(ProviderError::Shape {
            url: url.to_string(),
            key,
        }
        .into()),
    }
}

pub fn join(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn join_normalizes_slashes() {
        assert_eq!(join("http://h:9696/", "/v2.0/security-groups"), "http://h:9696/v2.0/security-groups");
        assert_eq!(join("http://h:9292", "v2/images"), "http://h:9292/v2/images");
    }

    #[test]
    fn take_list_requires_array() {
        let items = take_list("u", json!({"users": [{"id": "1"}]}), "users").unwrap();
        assert_eq!(items.len(), 1);
        assert!(take_list("u", json!({"users": null}), "users").is_err());
        assert!(take_list("u", json!({}), "servers").is_err());
    }
}
