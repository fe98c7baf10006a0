//! Backend registry resolving model identifiers to backend base addresses.

use std::collections::HashMap;

use thiserror::Error;

use crate::config::BackendsConfig;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Model '{0}' not registered")]
    UnknownModel(String),
}

/// Static table of backend addresses, fixed at startup.
#[derive(Debug, Clone, Default)]
pub struct BackendRegistry {
    backends: HashMap<String, String>,
}

impl BackendRegistry {
    /// Build the registry from configured backend addresses.
    pub fn from_config(config: &BackendsConfig) -> Self {
        Self::from_entries(config.entries())
    }

    pub fn from_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let backends = entries
            .into_iter()
            .map(|(model, url)| {
                (
                    model.as_ref().trim().to_lowercase(),
                    url.as_ref().trim_end_matches('/').to_string(),
                )
            })
            .collect();

        Self { backends }
    }

    /// Resolve the base address for a model (case-insensitive).
    pub fn resolve(&self, model: &str) -> Result<&str, RegistryError> {
        let key = model.trim().to_lowercase();
        self.backends
            .get(&key)
            .map(String::as_str)
            .ok_or(RegistryError::UnknownModel(key))
    }
}
