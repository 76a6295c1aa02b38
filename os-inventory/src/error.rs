use std::path::PathBuf;
use thiserror::Error;

use crate::collector_core::ResourceKind;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid config value for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} `{resource}` references unknown owner id `{user_id}`")]
pub struct UnknownOwnerError {
    pub kind: ResourceKind,
    pub resource: String,
    pub user_id: String,
}

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("cannot connect to mail host {host}: {reason}")]
    Connect { host: String, reason: String },

    #[error("mail authentication failed for {user}: {reason}")]
    Auth { user: String, reason: String },

    #[error("invalid mail address `{address}`: {reason}")]
    Address { address: String, reason: String },

    #[error("cannot build message for {recipient}: {reason}")]
    Build { recipient: String, reason: String },

    #[error("sending to {recipient} failed: {reason}")]
    Send { recipient: String, reason: String },

    #[error("closing mail connection failed: {0}")]
    Close(String),
}

#[derive(Debug, Error)]
pub enum SecretError {
    #[error("credential store error for `{service}`: {source}")]
    Store {
        service: &'static str,
        #[source]
        source: keyring::Error,
    },

    #[error("password prompt failed: {0}")]
    Prompt(String),

    #[error("no password found for `{0}` (config, environment or keyring)")]
    Missing(&'static str),
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("authentication against {url} failed: HTTP {status} {body}")]
    Auth {
        url: String,
        status: u16,
        body: String,
    },

    #[error("token response from {0} carries no X-Subject-Token header")]
    MissingToken(String),

    #[error("no `{service}` endpoint for interface `{interface}` in region `{region}`")]
    NoEndpoint {
        service: String,
        interface: String,
        region: String,
    },

    #[error("GET {url} failed: HTTP {status} {body}")]
    Request {
        url: String,
        status: u16,
        body: String,
    },

    #[error("response from {url} has no `{key}` list")]
    Shape { url: String, key: &'static str },
}
