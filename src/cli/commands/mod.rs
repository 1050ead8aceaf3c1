use anyhow::Result;
use std::process::ExitCode;

pub mod show_config;
pub mod workflow_wait;

pub use show_config::ShowConfigCommand;
pub use workflow_wait::WorkflowWaitCommand;

/// Exit status when the wait ran out of time
pub const EXIT_TIMED_OUT: u8 = 2;
/// Exit status when no workflow for the environment ever showed up
pub const EXIT_GAVE_UP: u8 = 3;
/// Exit status when interrupted with Ctrl-C
pub const EXIT_INTERRUPTED: u8 = 130;

#[allow(async_fn_in_trait)]
pub trait Command {
    async fn execute(&self) -> Result<ExitCode>;
}

pub fn show_usage() -> Result<()> {
    println!("⏳ workflow-wait - wait for platform workflows to finish");
    println!();
    println!("Usage:");
    println!("  🚦 workflow-wait workflowwait <site>.<env> [max_wait_in_seconds] [--start=<epoch>]");
    println!("  ⚙️  workflow-wait config    # Show effective configuration");
    println!();
    println!("💡 Set WORKFLOW_WAIT_API__TOKEN or TERMINUS_SESSION to authenticate.");
    Ok(())
}
