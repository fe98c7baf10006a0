//! Per-route parameter schemas for the Zeo++ backend.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration errors raised while loading the route schemas. Fatal at startup.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("Failed to read route schema file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse route schema file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Route schema defines no routes")]
    Empty,
    #[error("Default route '{0}' has no schema entry")]
    MissingDefaultRoute(String),
}

/// Parameters accepted by one analysis route.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteSchema {
    /// Parameters that must be present for the call to be made.
    #[serde(default)]
    pub required: Vec<String>,
    /// Parameters forwarded only when the caller provides them.
    #[serde(default)]
    pub optional: Vec<String>,
}

/// The route whitelist with its schemas. Read-only after startup.
#[derive(Debug, Clone)]
pub struct RouteSchemas {
    routes: BTreeMap<String, RouteSchema>,
    default_route: String,
}

impl RouteSchemas {
    /// Load schemas from a JSON file mapping route name to `{required, optional}`.
    pub fn load(path: impl AsRef<Path>, default_route: &str) -> Result<Self, SchemaError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| SchemaError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let routes = serde_json::from_str(&raw).map_err(|source| SchemaError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        Self::new(routes, default_route)
    }

    pub fn new(
        routes: BTreeMap<String, RouteSchema>,
        default_route: &str,
    ) -> Result<Self, SchemaError> {
        if routes.is_empty() {
            return Err(SchemaError::Empty);
        }
        if !routes.contains_key(default_route) {
            return Err(SchemaError::MissingDefaultRoute(default_route.to_string()));
        }

        Ok(Self {
            routes,
            default_route: default_route.to_string(),
        })
    }

    pub fn get(&self, route: &str) -> Option<&RouteSchema> {
        self.routes.get(route)
    }

    /// Supported route names, sorted.
    pub fn route_names(&self) -> Vec<String> {
        self.routes.keys().cloned().collect()
    }

    pub fn default_route(&self) -> &str {
        &self.default_route
    }
}
