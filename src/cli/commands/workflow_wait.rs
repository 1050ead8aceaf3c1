use anyhow::{Context, Result};
use std::future::Future;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{info, warn, Instrument};

use super::{Command, EXIT_GAVE_UP, EXIT_INTERRUPTED, EXIT_TIMED_OUT};
use crate::platform::PlatformApi;
use crate::telemetry::{create_wait_span, generate_correlation_id};
use crate::workflows::{WaitOutcome, WaitRequest, WaitSettings, WorkflowWaiter};

pub struct WorkflowWaitCommand {
    request: WaitRequest,
    waiter: WorkflowWaiter,
}

impl WorkflowWaitCommand {
    pub fn new(request: WaitRequest, api: Arc<dyn PlatformApi>, settings: WaitSettings) -> Self {
        Self {
            request,
            waiter: WorkflowWaiter::new(api, settings),
        }
    }

    /// Run the wait without signal handling.
    pub async fn wait(&self) -> Result<WaitOutcome> {
        let correlation_id = generate_correlation_id();
        let span = create_wait_span(&self.request.site_env_id, &correlation_id);
        let now = chrono::Utc::now().timestamp();

        self.waiter
            .run(&self.request, now)
            .instrument(span)
            .await
            .with_context(|| format!("Failed waiting for workflow on {}", self.request.site_env_id))
    }
}

/// Map a finished wait to the process exit status.
pub fn exit_code_for(outcome: &WaitOutcome) -> u8 {
    match outcome {
        WaitOutcome::Succeeded { .. } => 0,
        WaitOutcome::TimedOut { .. } => EXIT_TIMED_OUT,
        WaitOutcome::GaveUp { .. } => EXIT_GAVE_UP,
    }
}

fn report(outcome: &WaitOutcome) {
    match outcome {
        WaitOutcome::Succeeded { workflow } => {
            println!("✅ Workflow '{}' succeeded (ID: {})", workflow.description, workflow.id);
        }
        WaitOutcome::TimedOut { waited_seconds } => {
            println!("⏰ No successful workflow after waiting {waited_seconds}s");
        }
        WaitOutcome::GaveUp { attempts } => {
            println!("🔍 No workflow found for the environment after {attempts} attempts");
        }
    }
}

impl WorkflowWaitCommand {
    /// Wait until the outcome is known or `interrupt` fires. An interrupt
    /// source that fails to install is logged and ignored.
    pub async fn wait_until_interrupted<I>(&self, interrupt: I) -> Result<ExitCode>
    where
        I: Future<Output = std::io::Result<()>>,
    {
        let wait = self.wait();
        tokio::pin!(wait);

        let outcome = tokio::select! {
            outcome = &mut wait => outcome?,
            signal = interrupt => match signal {
                Ok(()) => {
                    info!("Interrupted, stopped waiting for workflow");
                    return Ok(ExitCode::from(EXIT_INTERRUPTED));
                }
                Err(e) => {
                    warn!(error = %e, "Could not listen for Ctrl-C, waiting without it");
                    wait.await?
                }
            },
        };

        report(&outcome);
        Ok(ExitCode::from(exit_code_for(&outcome)))
    }
}

impl Command for WorkflowWaitCommand {
    async fn execute(&self) -> Result<ExitCode> {
        self.wait_until_interrupted(tokio::signal::ctrl_c()).await
    }
}
