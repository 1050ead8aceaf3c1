pub mod api;
pub mod client;
pub mod errors;
pub mod types;

pub use api::PlatformApi;
#[cfg(any(test, feature = "testing"))]
pub use api::MockPlatformApi;
pub use client::PlatformClient;
pub use errors::PlatformError;
pub use types::{Environment, Site, SiteEnvId, Workflow, WorkflowStatus};
