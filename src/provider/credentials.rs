//! Credential lookup behind a trait, with a JSON-file implementation.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use serde::Deserialize;

use crate::error::{ProviderError, Result};

/// Login credentials for one venue.
#[derive(Clone, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

// Manual Debug so the secret never lands in logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Lookup of credentials by provider name.
pub trait CredentialStore: Send + Sync {
    fn lookup(&self, provider: &str) -> Result<Credentials>;
}

/// Credential store backed by a JSON file mapping provider name to
/// `{"username": ..., "password": ...}`.
pub struct JsonFileCredentials {
    entries: HashMap<String, Credentials>,
}

impl JsonFileCredentials {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let entries: HashMap<String, Credentials> = serde_json::from_str(&content)?;
        Ok(Self { entries })
    }
}

impl CredentialStore for JsonFileCredentials {
    fn lookup(&self, provider: &str) -> Result<Credentials> {
        self.entries
            .get(provider)
            .cloned()
            .ok_or_else(|| ProviderError::MissingCredentials(provider.to_string()).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_and_looks_up() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"bookline": {{"username": "user1", "password": "hunter2"}}}}"#
        )
        .unwrap();

        let store = JsonFileCredentials::load(file.path()).unwrap();
        let creds = store.lookup("bookline").unwrap();
        assert_eq!(creds.username, "user1");
        assert_eq!(creds.password, "hunter2");
    }

    #[test]
    fn unknown_provider_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{}}").unwrap();

        let store = JsonFileCredentials::load(file.path()).unwrap();
        assert!(store.lookup("nowhere").is_err());
    }

    #[test]
    fn debug_redacts_password() {
        let creds = Credentials {
            username: "user1".into(),
            password: "hunter2".into(),
        };
        let rendered = format!("{:?}", creds);
        assert!(rendered.contains("user1"));
        assert!(!rendered.contains("hunter2"));
    }
}
