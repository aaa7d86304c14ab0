use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

#[derive(
    Copy,
    Clone,
    Debug,
    Default,
    Display,
    EnumString,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
)]
pub enum JobState {
    #[default]
    Unknown,
    Running,
    Succeeded,
    Failed,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatus {
    pub name: String,
    pub start_time: Option<DateTime<Utc>>,
    pub completion_time: Option<DateTime<Utc>>,
    pub succeeded_count: i32,
    pub failed_count: i32,
    pub state: JobState,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionUnitStatus {
    pub pod_name: String,
    pub phase: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub completion_time: Option<DateTime<Utc>>,
    pub terminal_container_state: Option<TerminalContainerState>,
}

/// How the primary container of a pod exited; absent until it has.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TerminalContainerState {
    pub exit_code: i32,
    pub reason: Option<String>,
    pub message: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobStatusResponse {
    pub job: JobStatus,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionUnitResponse {
    pub job: String,
    pub pod: ExecutionUnitStatus,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn serialize_job_status() {
        let status = JobStatus {
            name: "deploy-job-1".into(),
            start_time: None,
            completion_time: None,
            succeeded_count: 0,
            failed_count: 1,
            state: JobState::Failed,
        };
        assert_eq!(
            ::serde_json::to_value(&status).unwrap(),
            json!({
                "name": "deploy-job-1",
                "startTime": null,
                "completionTime": null,
                "succeededCount": 0,
                "failedCount": 1,
                "state": "Failed",
            }),
        );
    }

    #[test]
    fn serialize_terminated_container() {
        let state = TerminalContainerState {
            exit_code: 3,
            reason: Some("Error".into()),
            message: None,
            started_at: None,
            finished_at: None,
        };
        let value = ::serde_json::to_value(state).unwrap();
        assert_eq!(value["exitCode"], 3);
        assert_eq!(value["reason"], "Error");
        assert_eq!(value["finishedAt"], json!(null));
    }
}
