use std::{future::Future, time::Duration};

use async_trait::async_trait;
use deployer_api::error::{Error, Result};
use k8s_openapi::api::{batch::v1::Job, core::v1::Pod};
use tokio::time::timeout;
use tracing::warn;

use super::{Scheduler, SubmissionOutput};

/// Bounds every call of the inner scheduler; an expired call is a transport failure.
pub struct TimeoutScheduler<S> {
    inner: S,
    timeout: Duration,
}

impl<S> TimeoutScheduler<S> {
    pub const fn new(inner: S, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    async fn bounded<F, T>(&self, operation: &str, f: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        match timeout(self.timeout, f).await {
            Ok(result) => result,
            Err(_) => {
                let timeout = self.timeout;
                warn!("scheduler call timed out after {timeout:?}: {operation}");
                Err(Error::Transport(format!(
                    "{operation} timed out after {timeout:?}"
                )))
            }
        }
    }
}

#[async_trait]
impl<S> Scheduler for TimeoutScheduler<S>
where
    S: Scheduler,
{
    async fn apply(&self, job: &Job) -> Result<SubmissionOutput> {
        self.bounded("apply", self.inner.apply(job)).await
    }

    async fn get_job(&self, name: &str) -> Result<Job> {
        self.bounded("get job", self.inner.get_job(name)).await
    }

    async fn list_execution_units(&self, job_name: &str) -> Result<Vec<Pod>> {
        self.bounded("list pods", self.inner.list_execution_units(job_name))
            .await
    }
}
