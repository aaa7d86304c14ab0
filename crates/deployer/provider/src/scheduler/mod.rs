pub mod kubernetes;
pub mod memory;
pub mod timeout;

use std::sync::Arc;

use async_trait::async_trait;
use deployer_api::error::Result;
use k8s_openapi::api::{batch::v1::Job, core::v1::Pod};

/// What the scheduler reported back after accepting a manifest.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SubmissionOutput {
    pub success: String,
    pub diagnostic: String,
}

/// The narrow view of the cluster control plane this service relies on.
///
/// Implementations report an unreachable or misbehaving control plane as
/// [`Error::Transport`](deployer_api::error::Error::Transport) and a missing
/// object as [`Error::NotFound`](deployer_api::error::Error::NotFound).
#[async_trait]
pub trait Scheduler: Send + Sync {
    async fn apply(&self, job: &Job) -> Result<SubmissionOutput>;

    async fn get_job(&self, name: &str) -> Result<Job>;

    /// Lists the pods labeled `job-name={job_name}`.
    async fn list_execution_units(&self, job_name: &str) -> Result<Vec<Pod>>;
}

#[async_trait]
impl<T> Scheduler for Arc<T>
where
    T: ?Sized + Scheduler,
{
    async fn apply(&self, job: &Job) -> Result<SubmissionOutput> {
        <T as Scheduler>::apply(&**self, job).await
    }

    async fn get_job(&self, name: &str) -> Result<Job> {
        <T as Scheduler>::get_job(&**self, name).await
    }

    async fn list_execution_units(&self, job_name: &str) -> Result<Vec<Pod>> {
        <T as Scheduler>::list_execution_units(&**self, job_name).await
    }
}

#[async_trait]
impl<T> Scheduler for Box<T>
where
    T: ?Sized + Scheduler,
{
    async fn apply(&self, job: &Job) -> Result<SubmissionOutput> {
        <T as Scheduler>::apply(&**self, job).await
    }

    async fn get_job(&self, name: &str) -> Result<Job> {
        <T as Scheduler>::get_job(&**self, name).await
    }

    async fn list_execution_units(&self, job_name: &str) -> Result<Vec<Pod>> {
        <T as Scheduler>::list_execution_units(&**self, job_name).await
    }
}
