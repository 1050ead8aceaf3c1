//! Collaborator interface the waiter polls.
//!
//! The waiter only ever talks to the platform through [`PlatformApi`], so tests
//! can drive it with `MockPlatformApi` instead of an HTTP server.

use async_trait::async_trait;

#[cfg(any(test, feature = "testing"))]
use mockall::automock;

use super::errors::PlatformError;
use super::types::{Environment, Site, Workflow};

#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait PlatformApi: Send + Sync {
    /// Resolve `<site>.<env>` to the site and a validated environment.
    async fn get_site_env(&self, site_env_id: &str) -> Result<(Site, Environment), PlatformError>;

    /// Re-fetch a site by id.
    async fn get_site(&self, site_id: &str) -> Result<Site, PlatformError>;

    /// All workflows for the site, unpaged, newest first.
    async fn list_workflows(&self, site_id: &str) -> Result<Vec<Workflow>, PlatformError>;

    /// Fetch one workflow's current detail.
    async fn fetch_workflow(
        &self,
        site_id: &str,
        workflow_id: &str,
    ) -> Result<Workflow, PlatformError>;
}
