pub mod waiter;

pub use waiter::{WaitOutcome, WaitRequest, WaitSettings, WorkflowWaiter};
