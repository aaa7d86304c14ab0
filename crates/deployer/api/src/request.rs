use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A deployment request, exactly as the caller sent it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentRequest {
    #[serde(default, rename = "repo_url")]
    pub repository_url: Option<String>,
    #[serde(default)]
    pub commit_id: Option<String>,
    #[serde(default, rename = "liquibase_exec_cmd")]
    pub exec_command: Option<String>,
    #[serde(default, rename = "env_filename")]
    pub env_file_name: Option<String>,
    #[serde(default, rename = "liquibase_envs")]
    pub env_vars: Option<BTreeMap<String, String>>,
}

impl DeploymentRequest {
    pub const FIELD_REPOSITORY_URL: &'static str = "repo_url";
    pub const FIELD_EXEC_COMMAND: &'static str = "liquibase_exec_cmd";
    pub const FIELD_ENV_FILE_NAME: &'static str = "env_filename";

    /// Names of the required fields that are absent or empty.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        fn is_missing(value: &Option<String>) -> bool {
            value.as_deref().map(str::is_empty).unwrap_or(true)
        }

        [
            (Self::FIELD_REPOSITORY_URL, &self.repository_url),
            (Self::FIELD_EXEC_COMMAND, &self.exec_command),
            (Self::FIELD_ENV_FILE_NAME, &self.env_file_name),
        ]
        .into_iter()
        .filter(|(_, value)| is_missing(value))
        .map(|(field, _)| field)
        .collect()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub job_name: String,
    pub raw_success_output: String,
    pub raw_diagnostic_output: String,
}
