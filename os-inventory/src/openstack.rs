use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use crate::config::CloudConfig;
use crate::error::ProviderError;
use crate::http;

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogEntry {
    #[serde(rename = "type")]
    pub service_type: String,
    #[serde(default)]
    pub endpoints: Vec<Endpoint>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Endpoint {
    pub interface: String,
    #[serde(default)]
    pub region_id: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    pub url: String,
}

#[derive(Debug, Deserialize)]
struct TokenBody {
    token: TokenInfo,
}

#[derive(Debug, Deserialize)]
struct TokenInfo {
    #[serde(default)]
    catalog: Vec<CatalogEntry>,
}

pub struct Session {
    client: reqwest::Client,
    token: String,
    catalog: Vec<CatalogEntry>,
    region: String,
    interface: String,
    identity_url: String,
}

impl Session {
    pub async fn authenticate(cloud: &CloudConfig, password: &str) -> Result<Self> {
        let client = http::build_client()?;
        let auth = &cloud.auth;
        let url = http::join(&identity_base(&auth.auth_url), "auth/tokens");

        let body = json!({
            "auth": {
                "identity": {
                    "methods": ["password"],
                    "password": {
                        "user": {
                            "name": auth.username,
                            "domain": { "name": auth.user_domain_name },
                            "password": password
                        }
                    }
                },
                "scope": {
                    "project": {
                        "name": auth.project_name,
                        "domain": { "name": auth.project_domain_name }
                    }
                }
            }
        });

        let resp = client
            .post(&url)
            .json(&body)
            .send()
            .await
            .with_context(|| format!("POST {url}"))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ProviderError::Auth {
                url,
                status: status.as_u16(),
                body: resp.text().await.unwrap_or_default(),
            }
            .into());
        }

        let token = resp
            .headers()
            .get("X-Subject-Token")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| ProviderError::MissingToken(url.clone()))?;
        let info: TokenBody = resp.json().await.context("parsing token response")?;

        info!(
            user = %auth.username,
            project = %auth.project_name,
            services = info.token.catalog.len(),
            "authenticated against keystone"
        );

        Ok(Self::from_parts(
            client,
            token,
            info.token.catalog,
            cloud,
        ))
    }

    pub fn from_parts(
        client: reqwest::Client,
        token: String,
        catalog: Vec<CatalogEntry>,
        cloud: &CloudConfig,
    ) -> Self {
        Self {
            client,
            token,
            catalog,
            region: cloud.region_name.clone(),
            interface: cloud.interface.trim_end_matches("URL").to_string(),
            identity_url: identity_base(&cloud.auth.auth_url),
        }
    }

    pub fn identity_url(&self) -> &str {
        &self.identity_url
    }

    pub fn endpoint(&self, service_types: &[&str]) -> Result<String, ProviderError> {
        let found = service_types.iter().find_map(|t| {
            self.catalog
                .iter()
                .filter(|e| e.service_type == *t)
                .flat_map(|e| &e.endpoints)
                .find(|ep| {
                    ep.interface == self.interface
                        && (ep.region_id.as_deref() == Some(self.region.as_str())
                            || ep.region.as_deref() == Some(self.region.as_str()))
                })
        });

        match found {
            Some(ep) => {
                debug!(service = ?service_types, url = %ep.url, "endpoint selected");
                Ok(ep.url.trim_end_matches('/').to_string())
            }
            None => Err(ProviderError::NoEndpoint {
                service: service_types.join("|"),
                interface: self.interface.clone(),
                region: self.region.clone(),
            }),
        }
    }

    pub async fn get_json(&self, url: &str) -> Result<serde_json::Value> {
        http::get_json(&self.client, url, &self.token).await
    }
}

fn identity_base(auth_url: &str) -> String {
    let base = auth_url.trim_end_matches('/');
    if base.ends_with("/v3") {
        base.to_string()
    } else {
        format!("{base}/v3")
    }
}
