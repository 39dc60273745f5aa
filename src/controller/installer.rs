//! Boundary to the component that installs releases

use crate::error::InstallerError;
use async_trait::async_trait;

/// Installs and reloads releases
///
/// A reload re-renders a release with the current output configs of its
/// dependencies. While another task holds the release, implementations
/// report [`InstallerError::ReleaseBusy`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReleaseInstaller: Send + Sync {
    async fn reload_release(
        &self,
        namespace: &str,
        name: &str,
        force: bool,
    ) -> Result<(), InstallerError>;
}
