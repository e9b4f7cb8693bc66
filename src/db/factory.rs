//! Factory for creating repository instances.

use std::str::FromStr;
use std::sync::Arc;

use super::repository::{FullRepository, RepositoryError, RepositoryResult};

/// Available repository backend types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepositoryType {
    /// In-memory backend for unit testing and local development.
    Local,
}

impl FromStr for RepositoryType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "local" | "memory" | "in-memory" => Ok(RepositoryType::Local),
            other => Err(format!("unknown repository type: {other:?}")),
        }
    }
}

/// Factory for creating repository instances from configuration.
pub struct RepositoryFactory;

impl RepositoryFactory {
    /// Create a repository of the requested type.
    pub fn create(repo_type: RepositoryType) -> RepositoryResult<Arc<dyn FullRepository>> {
        match repo_type {
            #[cfg(feature = "local-repo")]
            RepositoryType::Local => Ok(Self::create_local()),
            #[allow(unreachable_patterns)]
            _ => Err(RepositoryError::ConfigurationError(format!(
                "repository backend {repo_type:?} is not enabled in this build"
            ))),
        }
    }

    /// Create an in-memory local repository.
    #[cfg(feature = "local-repo")]
    pub fn create_local() -> Arc<dyn FullRepository> {
        Arc::new(super::repositories::LocalRepository::new())
    }
}
