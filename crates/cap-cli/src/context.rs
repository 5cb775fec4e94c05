use std::future::Future;
use std::sync::Arc;

use anyhow::Context;
use cap_config::CapConfig;
use cap_db::LibsqlStore;
use cap_workflow::{PortalService, WorkflowError, with_retry};

/// Shared application resources initialized once at startup.
pub struct AppContext {
    pub service: PortalService,
    pub config: CapConfig,
}

impl AppContext {
    /// Open the configured store and build the workflow service over it.
    pub async fn init(config: CapConfig) -> anyhow::Result<Self> {
        let store = LibsqlStore::open(&config.store)
            .await
            .with_context(|| format!("failed to open record store at {}", config.store.path))?;
        let service = PortalService::new(Arc::new(store), &config)
            .context("failed to initialize the event journal")?;
        Ok(Self { service, config })
    }

    /// Run a workflow operation under the configured retry policy.
    pub async fn retrying<T, F, Fut>(&self, op: F) -> anyhow::Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, WorkflowError>>,
    {
        Ok(with_retry(&self.config.retry, op).await?)
    }
}
