use std::{net::SocketAddr, time::Duration};

use clap::Parser;
use deployer_provider::{manifest::RunnerTemplate, DeployConfig};
use duration_string::DurationString;
use secrecy::SecretString;

// NOTE: no `Debug` here, `pat_token` and `api_tokens` are credentials
#[derive(Clone, Parser)]
#[command(author, version, about, long_about = None)]
#[clap(rename_all = "kebab-case")]
pub struct Args {
    #[arg(long, env = "BIND_ADDR", value_name = "ADDR", default_value = "0.0.0.0:3000")]
    pub bind_addr: SocketAddr,

    /// Comma-separated bearer tokens accepted on the submit endpoint
    #[arg(
        long,
        env = "API_TOKENS",
        value_name = "TOKENS",
        value_delimiter = ',',
        hide_env_values = true
    )]
    pub api_tokens: Vec<String>,

    /// Credential injected into https repository URLs
    #[arg(long, env = "PAT_TOKEN", value_name = "TOKEN", hide_env_values = true)]
    pub pat_token: Option<String>,

    #[arg(long, env = "NAMESPACE", value_name = "NAMESPACE")]
    pub namespace: Option<String>,

    #[arg(
        long,
        env = "DEPLOYER_JOB_NAME_PREFIX",
        value_name = "PREFIX",
        default_value = "deploy-job"
    )]
    pub job_name_prefix: String,

    #[arg(
        long,
        env = "DEPLOYER_RUNNER_IMAGE",
        value_name = "IMAGE",
        default_value = "deploy-runner:latest"
    )]
    pub runner_image: String,

    #[arg(
        long,
        env = "DEPLOYER_RUNNER_IMAGE_PULL_POLICY",
        value_name = "POLICY",
        default_value = "Never"
    )]
    pub runner_image_pull_policy: String,

    #[arg(
        long,
        env = "DEPLOYER_RUNNER_WORKDIR",
        value_name = "PATH",
        default_value = "/tmp/workdir"
    )]
    pub runner_workdir: String,

    /// Upper bound of every scheduler call
    #[arg(
        long,
        env = "DEPLOYER_SCHEDULER_TIMEOUT",
        value_name = "DURATION",
        default_value = "30s"
    )]
    pub scheduler_timeout: DurationString,
}

impl Args {
    pub fn scheduler_timeout(&self) -> Duration {
        self.scheduler_timeout.into()
    }

    pub fn deploy_config(&self) -> DeployConfig {
        DeployConfig {
            credential: self
                .pat_token
                .as_ref()
                .filter(|token| !token.is_empty())
                .cloned()
                .map(SecretString::from),
            namespace: self
                .namespace
                .as_ref()
                .filter(|namespace| !namespace.is_empty())
                .cloned(),
            job_name_prefix: self.job_name_prefix.clone(),
            template: RunnerTemplate {
                image: self.runner_image.clone(),
                image_pull_policy: self.runner_image_pull_policy.clone(),
                workdir: self.runner_workdir.clone(),
            },
        }
    }
}
