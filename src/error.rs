//! Error types shared across the cache and the controller

use crate::models::ResourceKind;
use crate::selector::SelectorError;
use thiserror::Error;

/// Message an installer returns while another task still holds the release
pub const RELEASE_BUSY_MESSAGE: &str = "please wait for the release latest task";

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("{kind} {namespace}/{name} is not found")]
    NotFound {
        kind: ResourceKind,
        namespace: String,
        name: String,
    },

    #[error(transparent)]
    InvalidSelector(#[from] SelectorError),

    #[error("kubernetes api error: {0}")]
    Kube(#[from] kube::Error),

    #[error("failed to convert {kind} {namespace}/{name}: {message}")]
    Conversion {
        kind: ResourceKind,
        namespace: String,
        name: String,
        message: String,
    },

    #[error("timed out waiting for {0} to sync")]
    SyncTimeout(String),
}

impl CacheError {
    pub fn not_found(kind: ResourceKind, namespace: &str, name: &str) -> Self {
        CacheError::NotFound {
            kind,
            namespace: namespace.to_string(),
            name: name.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, CacheError::NotFound { .. })
    }
}

/// Failure reported by a release installer
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InstallerError {
    #[error("release {namespace}/{name} is busy: {message}")]
    ReleaseBusy {
        namespace: String,
        name: String,
        message: String,
    },

    #[error("{0}")]
    Failed(String),
}

impl InstallerError {
    /// Whether the release is locked by another in-flight task
    ///
    /// Installers that only report text are recognised by their message.
    pub fn is_release_busy(&self) -> bool {
        match self {
            InstallerError::ReleaseBusy { .. } => true,
            InstallerError::Failed(message) => message.contains(RELEASE_BUSY_MESSAGE),
        }
    }
}

/// Failure to hand a config delta event to its sink
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to publish release config event: {0}")]
pub struct PublishError(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_predicate() {
        let err = CacheError::not_found(ResourceKind::Deployment, "ns", "web");
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Deployment ns/web is not found");
        assert!(!CacheError::SyncTimeout("pods".to_string()).is_not_found());
    }

    #[test]
    fn test_release_busy_detection() {
        let typed = InstallerError::ReleaseBusy {
            namespace: "ns".to_string(),
            name: "kafka".to_string(),
            message: "locked".to_string(),
        };
        assert!(typed.is_release_busy());

        let text = InstallerError::Failed(format!(
            "failed to reload: {} of ns/kafka",
            RELEASE_BUSY_MESSAGE
        ));
        assert!(text.is_release_busy());

        assert!(!InstallerError::Failed("chart not found".to_string()).is_release_busy());
    }
}
