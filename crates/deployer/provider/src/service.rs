use deployer_api::{
    error::{Error, ResourceKind, Result},
    job::{ExecutionUnitStatus, JobStatus},
    request::{DeploymentRequest, SubmitResponse},
};
use secrecy::{ExposeSecret, SecretString};
use tracing::{info, instrument, warn, Level};

use crate::{
    manifest::{ManifestBuilder, RunnerTemplate},
    naming::NamingPolicy,
    scheduler::Scheduler,
    status,
};

/// Process-wide settings of the submit path.
#[derive(Debug)]
pub struct DeployConfig {
    pub credential: Option<SecretString>,
    pub namespace: Option<String>,
    pub job_name_prefix: String,
    pub template: RunnerTemplate,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            credential: None,
            namespace: None,
            job_name_prefix: "deploy-job".into(),
            template: RunnerTemplate::default(),
        }
    }
}

pub struct DeployService<S = Box<dyn Scheduler>> {
    config: DeployConfig,
    naming: NamingPolicy,
    scheduler: S,
}

impl<S> DeployService<S>
where
    S: Scheduler,
{
    pub fn new(config: DeployConfig, scheduler: S) -> Self {
        Self {
            config,
            naming: NamingPolicy::default(),
            scheduler,
        }
    }

    #[instrument(level = Level::INFO, skip_all, err(Display))]
    pub async fn submit(&self, request: &DeploymentRequest) -> Result<SubmitResponse> {
        let missing = request.missing_fields();
        if !missing.is_empty() {
            return Err(Error::Validation { missing });
        }

        let credential = self
            .config
            .credential
            .as_ref()
            .ok_or_else(|| Error::Configuration("PAT_TOKEN not set in environment".into()))?;
        let namespace = self
            .config
            .namespace
            .as_deref()
            .ok_or_else(|| Error::Configuration("NAMESPACE not set in environment".into()))?;

        let builder = ManifestBuilder {
            job_name_prefix: &self.config.job_name_prefix,
            namespace: Some(namespace),
            template: &self.config.template,
        };
        let manifest = builder.build(request, credential, &self.naming)?;
        let name = manifest.name().to_string();
        info!("Submitting job ({namespace}/{name})...");

        let output = self
            .scheduler
            .apply(manifest.job())
            .await
            .map_err(|error| error.redact(credential.expose_secret()))?;

        let diagnostics: Vec<&str> = manifest
            .diagnostics()
            .iter()
            .map(String::as_str)
            .chain(Some(output.diagnostic.as_str()).filter(|text| !text.is_empty()))
            .collect();
        for diagnostic in &diagnostics {
            warn!("job ({namespace}/{name}): {diagnostic}");
        }

        Ok(SubmitResponse {
            job_name: name,
            raw_success_output: output.success,
            raw_diagnostic_output: diagnostics.join("\n"),
        })
    }

    #[instrument(level = Level::INFO, skip(self), err(Display))]
    pub async fn job_status(&self, name: &str) -> Result<JobStatus> {
        check_name(name)?;

        let job = self.scheduler.get_job(name).await?;
        Ok(status::normalize_job(&job))
    }

    #[instrument(level = Level::INFO, skip(self), err(Display))]
    pub async fn latest_execution_unit(&self, job_name: &str) -> Result<ExecutionUnitStatus> {
        check_name(job_name)?;

        let pods = self.scheduler.list_execution_units(job_name).await?;
        status::select_latest(pods)
            .map(|pod| status::normalize_execution_unit(&pod))
            .ok_or_else(|| Error::not_found(ResourceKind::Pod, job_name))
    }
}

fn check_name(name: &str) -> Result<()> {
    if name.is_empty() {
        Err(Error::Validation {
            missing: vec!["name"],
        })
    } else if name.len() > NamingPolicy::MAX_LEN
        || !name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '.')
    {
        Err(Error::InvalidField {
            field: "name",
            reason: format!("not a valid job name: {name:?}"),
        })
    } else {
        Ok(())
    }
}
