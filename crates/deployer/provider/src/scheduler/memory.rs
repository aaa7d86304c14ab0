use std::{collections::BTreeMap, time::Duration};

use async_trait::async_trait;
use deployer_api::{
    consts::LABEL_JOB_NAME,
    error::{Error, ResourceKind, Result},
};
use k8s_openapi::api::{batch::v1::Job, core::v1::Pod};
use tokio::{sync::Mutex, time::sleep};

use super::SubmissionOutput;

/// An in-process scheduler that only stores what it is given.
///
/// Jobs never progress on their own; tests drive their status with
/// [`MemoryScheduler::insert_job`] and [`MemoryScheduler::insert_pod`].
#[derive(Debug, Default)]
pub struct MemoryScheduler {
    state: Mutex<MemoryState>,
}

#[derive(Debug, Default)]
struct MemoryState {
    jobs: BTreeMap<String, Job>,
    pods: Vec<Pod>,
    latency: Option<Duration>,
    unavailable: Option<String>,
}

impl MemoryScheduler {
    pub async fn insert_job(&self, job: Job) {
        let name = job.metadata.name.clone().unwrap_or_default();
        self.state.lock().await.jobs.insert(name, job);
    }

    pub async fn insert_pod(&self, pod: Pod) {
        self.state.lock().await.pods.push(pod)
    }

    pub async fn jobs(&self) -> Vec<Job> {
        self.state.lock().await.jobs.values().cloned().collect()
    }

    /// Delays every call, e.g. to exercise timeouts.
    pub async fn set_latency(&self, latency: Option<Duration>) {
        self.state.lock().await.latency = latency;
    }

    /// Fails every call with the given transport error.
    pub async fn set_unavailable(&self, reason: Option<String>) {
        self.state.lock().await.unavailable = reason;
    }

    async fn enter(&self) -> Result<()> {
        let (latency, unavailable) = {
            let state = self.state.lock().await;
            (state.latency, state.unavailable.clone())
        };
        if let Some(latency) = latency {
            sleep(latency).await;
        }
        match unavailable {
            Some(reason) => Err(Error::Transport(reason)),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl super::Scheduler for MemoryScheduler {
    async fn apply(&self, job: &Job) -> Result<SubmissionOutput> {
        self.enter().await?;

        let name = job
            .metadata
            .name
            .clone()
            .ok_or_else(|| Error::transport("refusing to apply an unnamed job"))?;
        let verb = match self
            .state
            .lock()
            .await
            .jobs
            .insert(name.clone(), job.clone())
        {
            Some(_) => "configured",
            None => "created",
        };
        Ok(SubmissionOutput {
            success: format!("job.batch/{name} {verb}\n"),
            diagnostic: String::new(),
        })
    }

    async fn get_job(&self, name: &str) -> Result<Job> {
        self.enter().await?;

        self.state
            .lock()
            .await
            .jobs
            .get(name)
            .cloned()
            .ok_or_else(|| Error::not_found(ResourceKind::Job, name))
    }

    async fn list_execution_units(&self, job_name: &str) -> Result<Vec<Pod>> {
        self.enter().await?;

        Ok(self
            .state
            .lock()
            .await
            .pods
            .iter()
            .filter(|pod| {
                pod.metadata
                    .labels
                    .as_ref()
                    .and_then(|labels| labels.get(LABEL_JOB_NAME))
                    .map(String::as_str)
                    == Some(job_name)
            })
            .cloned()
            .collect())
    }
}
