use async_trait::async_trait;
use deployer_api::{
    consts::{LABEL_JOB_NAME, NAME},
    error::{Error, ResourceKind, Result},
};
use k8s_openapi::api::{batch::v1::Job, core::v1::Pod};
use kube::{
    api::{ListParams, Patch, PatchParams, PostParams},
    Api, Client,
};
use tracing::{info, instrument, Level};

use super::SubmissionOutput;

pub struct KubernetesScheduler {
    kube: Client,
    namespace: String,
}

impl KubernetesScheduler {
    /// Binds to `namespace`, or to the default namespace of the client.
    pub fn new(kube: Client, namespace: Option<String>) -> Self {
        let namespace = namespace.unwrap_or_else(|| kube.default_namespace().to_string());
        Self { kube, namespace }
    }
}

#[async_trait]
impl super::Scheduler for KubernetesScheduler {
    // errors may echo the rendered env block; the caller logs them once redacted
    #[instrument(level = Level::INFO, skip(self, job), fields(job.name = ?job.metadata.name))]
    async fn apply(&self, job: &Job) -> Result<SubmissionOutput> {
        let name = job
            .metadata
            .name
            .as_deref()
            .ok_or_else(|| Error::transport("refusing to apply an unnamed job"))?;
        let namespace = job.metadata.namespace.as_deref().unwrap_or(&self.namespace);
        let api = Api::<Job>::namespaced(self.kube.clone(), namespace);

        let verb = match api.get_opt(name).await.map_err(Error::transport)? {
            Some(_) => {
                let pp = PatchParams {
                    field_manager: Some(NAME.into()),
                    force: true,
                    ..Default::default()
                };
                api.patch(name, &pp, &Patch::Apply(job))
                    .await
                    .map_err(Error::transport)?;
                "configured"
            }
            None => {
                let pp = PostParams {
                    field_manager: Some(NAME.into()),
                    ..Default::default()
                };
                api.create(&pp, job).await.map_err(Error::transport)?;
                "created"
            }
        };

        info!("Applied job ({namespace}/{name}): {verb}");
        Ok(SubmissionOutput {
            success: format!("job.batch/{name} {verb}\n"),
            diagnostic: String::new(),
        })
    }

    #[instrument(level = Level::INFO, skip(self), err(Display))]
    async fn get_job(&self, name: &str) -> Result<Job> {
        let api = Api::<Job>::namespaced(self.kube.clone(), &self.namespace);
        api.get_opt(name)
            .await
            .map_err(Error::transport)?
            .ok_or_else(|| Error::not_found(ResourceKind::Job, name))
    }

    #[instrument(level = Level::INFO, skip(self), err(Display))]
    async fn list_execution_units(&self, job_name: &str) -> Result<Vec<Pod>> {
        let api = Api::<Pod>::namespaced(self.kube.clone(), &self.namespace);
        let lp = ListParams::default().labels(&format!("{LABEL_JOB_NAME}={job_name}"));
        api.list(&lp)
            .await
            .map(|list| list.items)
            .map_err(Error::transport)
    }
}
