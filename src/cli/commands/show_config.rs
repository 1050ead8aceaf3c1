use anyhow::Result;
use std::process::ExitCode;

use super::Command;
use crate::config::WorkflowWaitConfig;

pub struct ShowConfigCommand {
    config: WorkflowWaitConfig,
}

impl ShowConfigCommand {
    pub fn new(config: WorkflowWaitConfig) -> Self {
        Self { config }
    }

    pub fn render(&self) -> Result<String> {
        self.config.redacted().to_toml()
    }
}

impl Command for ShowConfigCommand {
    async fn execute(&self) -> Result<ExitCode> {
        println!("{}", self.render()?);
        println!(
            "# effective default timeout: {}s",
            self.config.wait.effective_timeout_seconds()
        );
        Ok(ExitCode::SUCCESS)
    }
}
