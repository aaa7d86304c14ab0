use std::{collections::BTreeMap, fmt};

use base64::{engine::general_purpose::STANDARD, Engine};
use deployer_api::{
    consts::{LABEL_MANAGED_BY, NAME},
    error::{Error, Result},
    request::DeploymentRequest,
};
use k8s_openapi::api::{
    batch::v1::{Job, JobSpec},
    core::v1::{Container, EnvVar, PodSpec, PodTemplateSpec},
};
use kube::core::ObjectMeta;
use secrecy::{ExposeSecret, SecretString};
use url::Url;

use crate::naming::NamingPolicy;

pub mod consts {
    pub const CONTAINER_NAME: &str = "deploy-runner";
    pub const CONTAINER_COMMAND: &[&str] = &["/bin/bash", "/usr/local/bin/deploy.sh"];

    pub const ENV_REPO_URL: &str = "REPO_URL";
    pub const ENV_COMMIT_ID: &str = "COMMIT_ID";
    pub const ENV_EXEC_CMD: &str = "EXEC_CMD";
    pub const ENV_ENV_FILENAME: &str = "ENV_FILENAME";
    pub const ENV_ENV_VARS_JSON: &str = "ENV_VARS_JSON";
    pub const ENV_WORKDIR: &str = "WORKDIR";

    pub const SECURE_SCHEME: &str = "https://";
}

/// Static settings of the container that runs a deployment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunnerTemplate {
    pub image: String,
    pub image_pull_policy: String,
    pub workdir: String,
}

impl Default for RunnerTemplate {
    fn default() -> Self {
        Self {
            image: "deploy-runner:latest".into(),
            image_pull_policy: "Never".into(),
            workdir: "/tmp/workdir".into(),
        }
    }
}

/// A rendered job, ready to be handed to the scheduler.
#[derive(Clone)]
pub struct Manifest {
    job: Job,
    diagnostics: Vec<String>,
}

impl fmt::Debug for Manifest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // the environment block carries the credential
        f.debug_struct("Manifest")
            .field("name", &self.name())
            .field("namespace", &self.job.metadata.namespace)
            .field("diagnostics", &self.diagnostics)
            .finish_non_exhaustive()
    }
}

impl Manifest {
    pub fn name(&self) -> &str {
        self.job.metadata.name.as_deref().unwrap_or_default()
    }

    pub fn namespace(&self) -> Option<&str> {
        self.job.metadata.namespace.as_deref()
    }

    pub const fn job(&self) -> &Job {
        &self.job
    }

    /// Non-fatal notes collected while rendering.
    pub fn diagnostics(&self) -> &[String] {
        &self.diagnostics
    }

    /// The value of an environment variable of the runner container.
    pub fn env_value(&self, key: &str) -> Option<&str> {
        self.job
            .spec
            .as_ref()?
            .template
            .spec
            .as_ref()?
            .containers
            .first()?
            .env
            .as_ref()?
            .iter()
            .find(|env| env.name == key)
            .and_then(|env| env.value.as_deref())
    }

    pub fn to_yaml(&self) -> Result<String> {
        ::serde_yaml::to_string(&self.job).map_err(|error| Error::InvalidField {
            field: "manifest",
            reason: error.to_string(),
        })
    }
}

#[derive(Copy, Clone, Debug)]
pub struct ManifestBuilder<'a> {
    pub job_name_prefix: &'a str,
    pub namespace: Option<&'a str>,
    pub template: &'a RunnerTemplate,
}

impl<'a> ManifestBuilder<'a> {
    pub fn build(
        &self,
        request: &DeploymentRequest,
        credential: &SecretString,
        naming: &NamingPolicy,
    ) -> Result<Manifest> {
        let missing = request.missing_fields();
        if !missing.is_empty() {
            return Err(Error::Validation { missing });
        }

        let DeploymentRequest {
            repository_url,
            commit_id,
            exec_command,
            env_file_name,
            env_vars,
        } = request;
        let mut diagnostics = vec![];

        let repository_url = repository_url.as_deref().unwrap_or_default();
        let clone_url = match inject_credential(repository_url, credential.expose_secret()) {
            Some(clone_url) => {
                diagnostics.extend(inspect_secure_url(repository_url));
                clone_url
            }
            None => {
                diagnostics.push(format!(
                    "credential was not injected: repository URL does not start with {scheme:?}",
                    scheme = consts::SECURE_SCHEME,
                ));
                repository_url.to_string()
            }
        };

        let env_vars = encode_env_vars(env_vars.as_ref())?;

        let name = naming.new_name(self.job_name_prefix);
        let labels: BTreeMap<_, _> = [(LABEL_MANAGED_BY.to_string(), NAME.to_string())]
            .into_iter()
            .collect();

        let env = [
            (consts::ENV_REPO_URL, clone_url),
            (consts::ENV_COMMIT_ID, commit_id.clone().unwrap_or_default()),
            (
                consts::ENV_EXEC_CMD,
                exec_command.clone().unwrap_or_default(),
            ),
            (
                consts::ENV_ENV_FILENAME,
                env_file_name.clone().unwrap_or_default(),
            ),
            (consts::ENV_ENV_VARS_JSON, env_vars),
            (consts::ENV_WORKDIR, self.template.workdir.clone()),
        ]
        .into_iter()
        .map(|(key, value)| EnvVar {
            name: key.into(),
            value: Some(value),
            value_from: None,
        })
        .collect();

        let job = Job {
            metadata: ObjectMeta {
                name: Some(name),
                namespace: self.namespace.map(Into::into),
                labels: Some(labels.clone()),
                ..Default::default()
            },
            spec: Some(JobSpec {
                backoff_limit: Some(0),
                template: PodTemplateSpec {
                    metadata: Some(ObjectMeta {
                        labels: Some(labels),
                        ..Default::default()
                    }),
                    spec: Some(PodSpec {
                        containers: vec![Container {
                            name: consts::CONTAINER_NAME.into(),
                            command: Some(
                                consts::CONTAINER_COMMAND
                                    .iter()
                                    .map(|arg| arg.to_string())
                                    .collect(),
                            ),
                            env: Some(env),
                            image: Some(self.template.image.clone()),
                            image_pull_policy: Some(self.template.image_pull_policy.clone()),
                            ..Default::default()
                        }],
                        restart_policy: Some("Never".into()),
                        ..Default::default()
                    }),
                },
                ..Default::default()
            }),
            status: None,
        };

        Ok(Manifest { job, diagnostics })
    }
}

/// Embeds `credential` right after the secure scheme, keeping the rest of
/// the URL as given. Returns `None` for any other scheme.
pub fn inject_credential(repository_url: &str, credential: &str) -> Option<String> {
    repository_url
        .strip_prefix(consts::SECURE_SCHEME)
        .map(|suffix| {
            let scheme = consts::SECURE_SCHEME;
            format!("{scheme}{credential}@{suffix}")
        })
}

/// Notes on a secure URL the clone step may trip over; never fatal.
fn inspect_secure_url(repository_url: &str) -> Option<String> {
    match Url::parse(repository_url) {
        Ok(url) if !url.username().is_empty() || url.password().is_some() => Some(
            "repository URL already carries user info; the credential was prepended to it".into(),
        ),
        Ok(_) => None,
        Err(error) => Some(format!(
            "repository URL may not be cloneable ({error}); the credential was injected anyway"
        )),
    }
}

pub fn encode_env_vars(env_vars: Option<&BTreeMap<String, String>>) -> Result<String> {
    let empty = BTreeMap::default();
    let json = ::serde_json::to_vec(env_vars.unwrap_or(&empty)).map_err(|error| {
        Error::InvalidField {
            field: "liquibase_envs",
            reason: error.to_string(),
        }
    })?;
    Ok(STANDARD.encode(json))
}
