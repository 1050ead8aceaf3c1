// workflow-wait library - blocks until a platform workflow finishes
// This exposes the core components for testing and integration

pub mod cli;
pub mod config;
pub mod platform;
pub mod telemetry;
pub mod workflows;

// Re-export key types for easy access
pub use config::{config, WorkflowWaitConfig, DEFAULT_WORKFLOW_TIMEOUT_SECS};
pub use platform::{PlatformApi, PlatformClient, PlatformError, Site, Workflow, WorkflowStatus};
pub use telemetry::{create_wait_span, generate_correlation_id, init_telemetry};
pub use workflows::{WaitOutcome, WaitRequest, WaitSettings, WorkflowWaiter};
