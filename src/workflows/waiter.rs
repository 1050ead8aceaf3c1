//! Polls a site's workflow list until a workflow in the target environment
//! succeeds, none turns up for too long, or the wait times out.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::DEFAULT_WORKFLOW_TIMEOUT_SECS;
use crate::platform::{PlatformApi, PlatformError, Site, Workflow};

/// Knobs for the polling loop
#[derive(Debug, Clone, PartialEq)]
pub struct WaitSettings {
    pub default_timeout_seconds: u64,
    pub poll_interval: Duration,
    /// `None` or zero means unbounded
    pub max_not_found_attempts: Option<u32>,
    pub start_lookback_seconds: i64,
}

impl Default for WaitSettings {
    fn default() -> Self {
        Self {
            default_timeout_seconds: DEFAULT_WORKFLOW_TIMEOUT_SECS,
            poll_interval: Duration::from_secs(5),
            max_not_found_attempts: None,
            start_lookback_seconds: 60,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitRequest {
    pub site_env_id: String,
    pub max_wait_seconds: Option<u64>,
    /// Epoch seconds; `None` or zero means "shortly before now"
    pub start_timestamp: Option<i64>,
}

impl WaitRequest {
    pub fn new(site_env_id: impl Into<String>) -> Self {
        Self {
            site_env_id: site_env_id.into(),
            max_wait_seconds: None,
            start_timestamp: None,
        }
    }

    pub fn with_max_wait(mut self, seconds: Option<u64>) -> Self {
        self.max_wait_seconds = seconds;
        self
    }

    pub fn with_start(mut self, timestamp: Option<i64>) -> Self {
        self.start_timestamp = timestamp;
        self
    }

    /// Start timestamp, falling back to `now` minus the configured look-back.
    pub fn effective_start(&self, settings: &WaitSettings, now: i64) -> i64 {
        match self.start_timestamp {
            Some(start) if start != 0 => start,
            _ => now - settings.start_lookback_seconds,
        }
    }

    pub fn effective_max_wait(&self, settings: &WaitSettings) -> u64 {
        self.max_wait_seconds
            .unwrap_or(settings.default_timeout_seconds)
    }
}

/// How a wait ended
#[derive(Debug, Clone, PartialEq)]
pub enum WaitOutcome {
    Succeeded { workflow: Workflow },
    TimedOut { waited_seconds: u64 },
    GaveUp { attempts: u32 },
}

impl WaitOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, WaitOutcome::Succeeded { .. })
    }
}

// What one pass over the workflow list saw.
enum Pass {
    Succeeded(Workflow),
    Continue {
        found: bool,
        last_environment: Option<String>,
    },
}

pub struct WorkflowWaiter {
    api: Arc<dyn PlatformApi>,
    settings: WaitSettings,
}

impl WorkflowWaiter {
    pub fn new(api: Arc<dyn PlatformApi>, settings: WaitSettings) -> Self {
        Self { api, settings }
    }

    /// Resolve the request's site and environment, apply defaults, and wait.
    pub async fn run(&self, request: &WaitRequest, now: i64) -> Result<WaitOutcome, PlatformError> {
        let (site, environment) = self.api.get_site_env(&request.site_env_id).await?;
        let start = request.effective_start(&self.settings, now);
        let max_wait = request.effective_max_wait(&self.settings);

        info!(
            site = %site.name,
            env = %environment.name,
            start = start,
            max_wait_seconds = max_wait,
            "Waiting for workflow"
        );

        self.wait(
            &site,
            &environment.name,
            start,
            max_wait,
            self.settings.max_not_found_attempts,
        )
        .await
    }

    pub async fn wait(
        &self,
        site: &Site,
        environment_name: &str,
        start_timestamp: i64,
        max_wait_seconds: u64,
        max_not_found_attempts: Option<u32>,
    ) -> Result<WaitOutcome, PlatformError> {
        let started = Instant::now();
        let mut site_id = site.id.clone();
        let mut not_found_attempts: u32 = 0;

        loop {
            // Refresh the site on each iteration.
            let site = self.api.get_site(&site_id).await?;
            site_id = site.id.clone();

            let workflows = self.api.list_workflows(&site.id).await?;

            match self
                .scan(&site, &workflows, environment_name, start_timestamp)
                .await?
            {
                Pass::Succeeded(workflow) => {
                    info!(workflow.id = %workflow.id, "Workflow succeeded");
                    return Ok(WaitOutcome::Succeeded { workflow });
                }
                Pass::Continue {
                    found: false,
                    last_environment,
                } => {
                    not_found_attempts += 1;
                    info!(
                        attempt = not_found_attempts,
                        "Current workflow env is '{}'; waiting for env '{}'",
                        last_environment.as_deref().unwrap_or("none"),
                        environment_name
                    );

                    if let Some(max) = max_not_found_attempts.filter(|max| *max > 0) {
                        if not_found_attempts >= max {
                            warn!(
                                "Attempted '{}' times, giving up waiting for workflow to be found",
                                max
                            );
                            return Ok(WaitOutcome::GaveUp {
                                attempts: not_found_attempts,
                            });
                        }
                    }
                }
                Pass::Continue { found: true, .. } => {}
            }

            tokio::time::sleep(self.settings.poll_interval).await;

            let waited = started.elapsed().as_secs();
            if waited >= max_wait_seconds {
                warn!(
                    "Waited '{}' seconds, giving up waiting for workflow",
                    max_wait_seconds
                );
                return Ok(WaitOutcome::TimedOut {
                    waited_seconds: waited,
                });
            }
        }
    }

    // Workflows arrive newest first, so the first one older than the start
    // time ends the pass.
    async fn scan(
        &self,
        site: &Site,
        workflows: &[Workflow],
        environment_name: &str,
        start_timestamp: i64,
    ) -> Result<Pass, PlatformError> {
        let mut found = false;
        let mut last_environment = None;

        if let Some(first) = workflows.first() {
            debug!(
                workflow.id = %first.id,
                created_at = ?first.created_at_utc(),
                "Newest workflow"
            );
        }

        for listed in workflows {
            last_environment = listed.environment.clone();

            if listed.created_at < start_timestamp {
                break;
            }

            if listed.environment.as_deref() != Some(environment_name) {
                continue;
            }

            let workflow = self.api.fetch_workflow(&site.id, &listed.id).await?;
            info!(
                workflow.id = %workflow.id,
                "Workflow '{}' {}.",
                listed.description,
                workflow.status
            );
            found = true;

            if workflow.is_successful() {
                return Ok(Pass::Succeeded(workflow));
            }
            if workflow.status.is_failed() {
                warn!(
                    workflow.id = %workflow.id,
                    "Workflow '{}' failed; still waiting for a successful one",
                    listed.description
                );
            }
        }

        Ok(Pass::Continue {
            found,
            last_environment,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{Environment, MockPlatformApi, WorkflowStatus};
    use mockall::predicate::eq;

    const SITE_ID: &str = "11111111-2222-3333-4444-555555555555";

    fn site() -> Site {
        Site {
            id: SITE_ID.to_string(),
            name: "my-site".to_string(),
        }
    }

    fn workflow(id: &str, created_at: i64, env: &str, status: WorkflowStatus) -> Workflow {
        Workflow {
            id: id.to_string(),
            created_at,
            description: format!("Deploy {id}"),
            environment: Some(env.to_string()),
            status,
        }
    }

    fn settings() -> WaitSettings {
        WaitSettings {
            default_timeout_seconds: 15,
            ..WaitSettings::default()
        }
    }

    /// Mock that serves the same workflow list on every poll and allows no detail fetches.
    fn mock_listing(workflows: Vec<Workflow>, list_calls: usize) -> MockPlatformApi {
        let mut api = MockPlatformApi::new();
        api.expect_get_site()
            .with(eq(SITE_ID))
            .returning(|_| Ok(site()));
        api.expect_list_workflows()
            .times(list_calls)
            .returning(move |_| Ok(workflows.clone()));
        api
    }

    /// Like `mock_listing`, with detail fetches echoing the listed workflow.
    fn mock_with(workflows: Vec<Workflow>, list_calls: usize) -> MockPlatformApi {
        let mut api = mock_listing(workflows.clone(), list_calls);
        api.expect_fetch_workflow().returning(move |_, id| {
            Ok(workflows
                .iter()
                .find(|w| w.id == id)
                .cloned()
                .expect("fetched workflow was listed"))
        });
        api
    }

    fn waiter(api: MockPlatformApi) -> WorkflowWaiter {
        WorkflowWaiter::new(Arc::new(api), settings())
    }

    #[tokio::test(start_paused = true)]
    async fn test_successful_match_ends_first_iteration() {
        let api = mock_with(vec![workflow("w1", 1010, "dev", WorkflowStatus::Succeeded)], 1);

        let outcome = waiter(api).wait(&site(), "dev", 1000, 15, None).await.unwrap();

        match outcome {
            WaitOutcome::Succeeded { workflow } => assert_eq!(workflow.id, "w1"),
            other => panic!("expected success, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_after_running_match_without_sleeping() {
        let api = mock_with(
            vec![
                workflow("running", 1010, "dev", WorkflowStatus::Running),
                workflow("done", 1005, "dev", WorkflowStatus::Succeeded),
            ],
            1,
        );

        let before = Instant::now();
        let outcome = waiter(api).wait(&site(), "dev", 1000, 15, None).await.unwrap();

        assert_eq!(Instant::now(), before, "no poll interval should have elapsed");
        match outcome {
            WaitOutcome::Succeeded { workflow } => assert_eq!(workflow.id, "done"),
            other => panic!("expected success, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_scan_stops_at_workflow_older_than_start() {
        let api = mock_listing(vec![workflow("old", 900, "dev", WorkflowStatus::Succeeded)], 1);

        let outcome = waiter(api).wait(&site(), "dev", 1000, 15, Some(1)).await.unwrap();

        assert_eq!(outcome, WaitOutcome::GaveUp { attempts: 1 });
    }

    #[tokio::test(start_paused = true)]
    async fn test_scan_ignores_entries_after_an_old_workflow() {
        // Out-of-order list: anything past the old entry is never looked at.
        let api = mock_listing(
            vec![
                workflow("old", 900, "dev", WorkflowStatus::Running),
                workflow("new", 1010, "dev", WorkflowStatus::Succeeded),
            ],
            1,
        );

        let outcome = waiter(api).wait(&site(), "dev", 1000, 15, Some(1)).await.unwrap();

        assert_eq!(outcome, WaitOutcome::GaveUp { attempts: 1 });
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_max_not_found_attempts() {
        let api = mock_listing(vec![workflow("w1", 1010, "test", WorkflowStatus::Running)], 3);

        let outcome = waiter(api)
            .wait(&site(), "dev", 1000, 3600, Some(3))
            .await
            .unwrap();

        assert_eq!(outcome, WaitOutcome::GaveUp { attempts: 3 });
    }

    #[tokio::test(start_paused = true)]
    async fn test_other_environment_success_does_not_count() {
        let api = mock_listing(vec![workflow("prod", 1010, "prod", WorkflowStatus::Succeeded)], 1);

        let outcome = waiter(api).wait(&site(), "dev", 1000, 15, Some(1)).await.unwrap();

        assert_eq!(outcome, WaitOutcome::GaveUp { attempts: 1 });
    }

    #[tokio::test(start_paused = true)]
    async fn test_times_out_when_match_never_succeeds() {
        let api = mock_with(vec![workflow("w1", 1010, "dev", WorkflowStatus::Running)], 2);

        let outcome = waiter(api).wait(&site(), "dev", 1000, 10, None).await.unwrap();

        assert_eq!(outcome, WaitOutcome::TimedOut { waited_seconds: 10 });
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_not_found_cap_is_unbounded() {
        let api = mock_listing(Vec::new(), 2);

        let outcome = waiter(api).wait(&site(), "dev", 1000, 10, Some(0)).await.unwrap();

        assert_eq!(outcome, WaitOutcome::TimedOut { waited_seconds: 10 });
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_match_keeps_polling() {
        let mut api = MockPlatformApi::new();
        api.expect_get_site().returning(|_| Ok(site()));

        let mut polls = 0;
        api.expect_list_workflows().times(2).returning(move |_| {
            polls += 1;
            let status = if polls == 1 {
                WorkflowStatus::Failed
            } else {
                WorkflowStatus::Succeeded
            };
            Ok(vec![workflow("w1", 1010, "dev", status)])
        });

        let mut fetches = 0;
        api.expect_fetch_workflow().times(2).returning(move |_, _| {
            fetches += 1;
            let status = if fetches == 1 {
                WorkflowStatus::Failed
            } else {
                WorkflowStatus::Succeeded
            };
            Ok(workflow("w1", 1010, "dev", status))
        });

        let outcome = waiter(api).wait(&site(), "dev", 1000, 60, None).await.unwrap();

        assert!(outcome.is_success());
    }

    #[tokio::test(start_paused = true)]
    async fn test_detail_fetch_decides_status() {
        let mut api = MockPlatformApi::new();
        api.expect_get_site().returning(|_| Ok(site()));
        api.expect_list_workflows()
            .times(1)
            .returning(|_| Ok(vec![workflow("w1", 1010, "dev", WorkflowStatus::Running)]));
        api.expect_fetch_workflow()
            .with(eq(SITE_ID), eq("w1"))
            .times(1)
            .returning(|_, _| Ok(workflow("w1", 1010, "dev", WorkflowStatus::Succeeded)));

        let outcome = waiter(api).wait(&site(), "dev", 1000, 15, None).await.unwrap();

        assert!(outcome.is_success());
    }

    #[tokio::test(start_paused = true)]
    async fn test_api_errors_propagate() {
        let mut api = MockPlatformApi::new();
        api.expect_get_site()
            .returning(|_| Err(PlatformError::SiteNotFound { site: "gone".to_string() }));

        let result = waiter(api).wait(&site(), "dev", 1000, 15, None).await;

        assert!(matches!(result, Err(PlatformError::SiteNotFound { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_resolves_site_env_and_defaults() {
        let mut api = mock_with(vec![workflow("w1", 1_700_000_000, "live", WorkflowStatus::Succeeded)], 1);
        api.expect_get_site_env()
            .with(eq("my-site.live"))
            .times(1)
            .returning(|_| Ok((site(), Environment::new("live"))));

        let request = WaitRequest::new("my-site.live");
        let outcome = waiter(api).run(&request, 1_700_000_030).await.unwrap();

        assert!(outcome.is_success());
    }

    #[test]
    fn test_request_defaults() {
        let settings = settings();

        let request = WaitRequest::new("my-site.dev");
        assert_eq!(request.effective_start(&settings, 5000), 4940);
        assert_eq!(request.effective_max_wait(&settings), 15);

        let zero_start = request.clone().with_start(Some(0));
        assert_eq!(zero_start.effective_start(&settings, 5000), 4940);

        let explicit = request.with_start(Some(1234)).with_max_wait(Some(42));
        assert_eq!(explicit.effective_start(&settings, 5000), 1234);
        assert_eq!(explicit.effective_max_wait(&settings), 42);
    }
}
