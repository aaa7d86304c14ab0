use chrono::{DateTime, Utc};
use deployer_api::job::{ExecutionUnitStatus, JobState, JobStatus, TerminalContainerState};
use k8s_openapi::{
    api::{
        batch::v1::{Job, JobCondition},
        core::v1::{ContainerStateTerminated, ContainerStatus, Pod},
    },
    apimachinery::pkg::apis::meta::v1::Time,
};

use crate::manifest::consts::CONTAINER_NAME;

/// Reduces the scheduler view of a job to its canonical state.
///
/// Present activity always wins: a job with a running pod is `Running`
/// even if an earlier attempt already left a `Failed` condition behind.
pub fn normalize_job(job: &Job) -> JobStatus {
    let status = job.status.as_ref();
    let conditions = status
        .and_then(|status| status.conditions.as_deref())
        .unwrap_or_default();
    let has_condition = |kind: &str| {
        conditions
            .iter()
            .any(|JobCondition { type_, status, .. }| type_ == kind && status == "True")
    };

    let state = if status.and_then(|status| status.active).unwrap_or_default() > 0 {
        JobState::Running
    } else if has_condition("Complete") {
        JobState::Succeeded
    } else if has_condition("Failed") {
        JobState::Failed
    } else {
        JobState::Unknown
    };

    JobStatus {
        name: job.metadata.name.clone().unwrap_or_default(),
        start_time: status.and_then(|status| to_datetime(&status.start_time)),
        completion_time: status.and_then(|status| to_datetime(&status.completion_time)),
        succeeded_count: status
            .and_then(|status| status.succeeded)
            .unwrap_or_default(),
        failed_count: status.and_then(|status| status.failed).unwrap_or_default(),
        state,
    }
}

pub fn normalize_execution_unit(pod: &Pod) -> ExecutionUnitStatus {
    let status = pod.status.as_ref();
    let terminal_container_state = status
        .and_then(|status| primary_container(status.container_statuses.as_deref()?))
        .and_then(|status| status.state.as_ref()?.terminated.as_ref())
        .map(to_terminal_state);

    ExecutionUnitStatus {
        pod_name: pod.metadata.name.clone().unwrap_or_default(),
        phase: status.and_then(|status| status.phase.clone()),
        start_time: status.and_then(|status| to_datetime(&status.start_time)),
        completion_time: terminal_container_state
            .as_ref()
            .and_then(|state| state.finished_at),
        terminal_container_state,
    }
}

/// Picks the most recently created pod; ties go to the earliest in `pods`.
pub fn select_latest(pods: impl IntoIterator<Item = Pod>) -> Option<Pod> {
    fn created_at(pod: &Pod) -> Option<DateTime<Utc>> {
        to_datetime(&pod.metadata.creation_timestamp)
    }

    pods.into_iter().reduce(|latest, pod| {
        if created_at(&pod) > created_at(&latest) {
            pod
        } else {
            latest
        }
    })
}

fn primary_container(statuses: &[ContainerStatus]) -> Option<&ContainerStatus> {
    statuses
        .iter()
        .find(|status| status.name == CONTAINER_NAME)
        .or_else(|| statuses.first())
}

fn to_terminal_state(state: &ContainerStateTerminated) -> TerminalContainerState {
    TerminalContainerState {
        exit_code: state.exit_code,
        reason: state.reason.clone(),
        message: state.message.clone(),
        started_at: to_datetime(&state.started_at),
        finished_at: to_datetime(&state.finished_at),
    }
}

fn to_datetime(time: &Option<Time>) -> Option<DateTime<Utc>> {
    time.as_ref().map(|Time(time)| *time)
}
