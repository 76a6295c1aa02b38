use tracing::{debug, info, warn};

use crate::error::SecretError;
use crate::utils::env_opt;

pub const OPENSTACK_SERVICE: &str = "openstack";
pub const EMAIL_SERVICE: &str = "email";
pub const OPENSTACK_PASSWORD_ENV: &str = "OS_PASSWORD";
pub const EMAIL_PASSWORD_ENV: &str = "OS_INVENTORY_EMAIL_PASSWORD";

const DEFAULT_ACCOUNT: &str = "default";

pub struct SecretStore {
    account: String,
}

impl Default for SecretStore {
    fn default() -> Self {
        Self::new(DEFAULT_ACCOUNT)
    }
}

impl SecretStore {
    pub fn new(account: impl Into<String>) -> Self {
        Self {
            account: account.into(),
        }
    }

    fn entry(&self, service: &'static str) -> Result<keyring::Entry, SecretError> {
        keyring::Entry::new(service, &self.account)
            .map_err(|source| SecretError::Store { service, source })
    }

    pub fn store(&self, service: &'static str, password: &str) -> Result<(), SecretError> {
        self.entry(service)?
            .set_password(password)
            .map_err(|source| SecretError::Store { service, source })
    }

    pub fn lookup(&self, service: &'static str) -> Result<Option<String>, SecretError> {
        match self.entry(service)?.get_password() {
            Ok(p) => Ok(Some(p)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(source) => Err(SecretError::Store { service, source }),
        }
    }

    pub fn rotate(&self, service: &'static str) {
        let entered = dialoguer::Password::new()
            .with_prompt(format!("Enter {service} password"))
            .interact()
            .map_err(|e| SecretError::Prompt(e.to_string()));
        match entered.and_then(|p| self.store(service, &p)) {
            Ok(()) => info!(service, "stored new password"),
            Err(e) => warn!("password rotation failed: {e}"),
        }
    }

    pub fn resolve(
        &self,
        service: &'static str,
        configured: Option<&str>,
        env_key: &str,
    ) -> Result<String, SecretError> {
        if let Some(p) = configured.filter(|p| !p.is_empty()) {
            debug!(service, "password from config");
            return Ok(p.to_string());
        }
        if let Some(p) = env_opt(env_key) {
            debug!(service, env_key, "password from environment");
            return Ok(p);
        }
        self.lookup(service)?.ok_or(SecretError::Missing(service))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configured_password_wins() {
        let store = SecretStore::default();
        let p = store
            .resolve(EMAIL_SERVICE, Some("from-config"), "OS_INVENTORY_TEST_UNSET")
            .unwrap();
        assert_eq!(p, "from-config");
    }

    #[test]
    fn environment_before_keyring() {
        std::env::set_var("OS_INVENTORY_TEST_SECRET", "from-env");
        let p = SecretStore::default()
            .resolve(OPENSTACK_SERVICE, Some(""), "OS_INVENTORY_TEST_SECRET")
            .unwrap();
        assert_eq!(p, "from-env");
    }
}
