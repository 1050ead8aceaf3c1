use clap::{Parser, Subcommand};

pub mod commands;

#[derive(Parser)]
#[command(name = "workflow-wait")]
#[command(version)]
#[command(about = "Wait for a hosting-platform workflow to complete")]
#[command(long_about = "Polls the platform API for workflows on a site environment and blocks until one \
                       succeeds, none is found for too long, or the maximum wait elapses. Usually used to \
                       wait for code commits, which start workflows nobody is waiting on.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Commands {
    /// Wait for a workflow on <site>.<env> to complete
    #[command(name = "workflowwait")]
    WorkflowWait {
        /// Site and environment to wait on, as <site>.<env>
        #[arg(help = "The site environment to wait for, e.g. my-site.dev")]
        site_env_id: String,
        /// Maximum time to wait for the workflow to finish
        #[arg(help = "Maximum wait for a workflow to finish in seconds (defaults to configuration)")]
        max_wait_in_seconds: Option<u64>,
        /// Ignore workflows created before this epoch timestamp
        #[arg(long, help = "Ignore any workflows started prior to the start time (epoch seconds)")]
        start: Option<i64>,
    },
    /// Print the effective configuration as TOML
    Config,
}
