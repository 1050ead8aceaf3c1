use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use super::api::PlatformApi;
use super::errors::PlatformError;
use super::types::{Environment, Site, SiteEnvId, Workflow, WorkflowRecord};
use crate::config::ApiConfig;

const USER_AGENT: &str = concat!("workflow-wait/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Deserialize)]
struct SiteNameRecord {
    id: String,
}

/// Rate-limited HTTP client for the hosting platform API
#[derive(Debug)]
pub struct PlatformClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
    rate_limiter: Arc<DefaultDirectRateLimiter>,
}

impl PlatformClient {
    pub fn new(config: &ApiConfig) -> Result<Self, PlatformError> {
        let per_second = NonZeroU32::new(config.requests_per_second).unwrap_or(NonZeroU32::MIN);
        let rate_limiter = Arc::new(RateLimiter::direct(Quota::per_second(per_second)));

        let mut builder = reqwest::Client::builder().user_agent(USER_AGENT);
        if let Some(seconds) = config.request_timeout_seconds {
            builder = builder.timeout(Duration::from_secs(seconds));
        }
        let http = builder.build()?;

        info!(base_url = %config.base_url, "Platform client initialized");

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
            rate_limiter,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, PlatformError> {
        self.rate_limiter.until_ready().await;

        let url = format!("{}{}", self.base_url, path);
        debug!(path = path, "Sending platform API request");

        let mut request = self.http.get(&url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            debug!(path = path, status = status.as_u16(), "Platform API request failed");
            return Err(PlatformError::from_status(status.as_u16(), &body));
        }

        serde_json::from_str(&body).map_err(|e| PlatformError::InvalidResponse {
            message: format!("{path}: {e}"),
        })
    }

    async fn resolve_site_id(&self, site: &str) -> Result<String, PlatformError> {
        if uuid::Uuid::parse_str(site).is_ok() {
            return Ok(site.to_string());
        }

        match self
            .get_json::<SiteNameRecord>(&format!("/site-names/{site}"))
            .await
        {
            Ok(record) => Ok(record.id),
            Err(PlatformError::Api { status: 404, .. }) => Err(PlatformError::SiteNotFound {
                site: site.to_string(),
            }),
            Err(e) => Err(e),
        }
    }

    async fn environment_names(&self, site_id: &str) -> Result<Vec<String>, PlatformError> {
        let environments: HashMap<String, serde_json::Value> = self
            .get_json(&format!("/sites/{site_id}/environments"))
            .await?;
        Ok(environments.into_keys().collect())
    }
}

#[async_trait]
impl PlatformApi for PlatformClient {
    async fn get_site_env(&self, site_env_id: &str) -> Result<(Site, Environment), PlatformError> {
        let id: SiteEnvId = site_env_id.parse()?;
        let site_id = self.resolve_site_id(&id.site).await?;
        let site = self.get_site(&site_id).await?;

        let environments = self.environment_names(&site.id).await?;
        if !environments.iter().any(|name| name == &id.env) {
            return Err(PlatformError::EnvironmentNotFound {
                site: site.name,
                env: id.env,
            });
        }

        Ok((site, Environment::new(id.env)))
    }

    async fn get_site(&self, site_id: &str) -> Result<Site, PlatformError> {
        match self.get_json(&format!("/sites/{site_id}")).await {
            Err(PlatformError::Api { status: 404, .. }) => Err(PlatformError::SiteNotFound {
                site: site_id.to_string(),
            }),
            other => other,
        }
    }

    async fn list_workflows(&self, site_id: &str) -> Result<Vec<Workflow>, PlatformError> {
        let records: Vec<WorkflowRecord> = self
            .get_json(&format!("/sites/{site_id}/workflows"))
            .await?;
        Ok(records.into_iter().map(Workflow::from).collect())
    }

    async fn fetch_workflow(
        &self,
        site_id: &str,
        workflow_id: &str,
    ) -> Result<Workflow, PlatformError> {
        let record: WorkflowRecord = self
            .get_json(&format!("/sites/{site_id}/workflows/{workflow_id}"))
            .await?;
        Ok(record.into())
    }
}
