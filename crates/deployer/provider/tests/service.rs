use std::{collections::BTreeMap, sync::Arc, time::Duration};

use base64::{engine::general_purpose::STANDARD, Engine};
use deployer_api::{
    consts::LABEL_JOB_NAME,
    error::Error,
    job::JobState,
    request::DeploymentRequest,
};
use deployer_provider::{
    manifest::consts::{ENV_ENV_VARS_JSON, ENV_EXEC_CMD, ENV_REPO_URL},
    scheduler::{memory::MemoryScheduler, timeout::TimeoutScheduler, Scheduler},
    DeployConfig, DeployService,
};
use futures::future::try_join_all;
use k8s_openapi::{
    api::{
        batch::v1::{Job, JobCondition, JobStatus},
        core::v1::{
            ContainerState as RawContainerState, ContainerStateTerminated, ContainerStatus, Pod,
            PodStatus,
        },
    },
    apimachinery::pkg::apis::meta::v1::Time,
    chrono::DateTime,
};
use kube::core::ObjectMeta;
use secrecy::SecretString;

fn config() -> DeployConfig {
    DeployConfig {
        credential: Some(SecretString::from("tok123".to_string())),
        namespace: Some("migrations".into()),
        ..Default::default()
    }
}

fn service(config: DeployConfig) -> (Arc<MemoryScheduler>, DeployService) {
    let scheduler = Arc::new(MemoryScheduler::default());
    let boxed: Box<dyn Scheduler> = Box::new(scheduler.clone());
    (scheduler, DeployService::new(config, boxed))
}

fn request() -> DeploymentRequest {
    DeploymentRequest {
        repository_url: Some("https://git.example/org/repo.git".into()),
        commit_id: None,
        exec_command: Some("migrate --env prod".into()),
        env_file_name: Some(".env.prod".into()),
        env_vars: Some([("A".to_string(), "1".to_string())].into_iter().collect()),
    }
}

fn env_value<'a>(job: &'a Job, key: &str) -> Option<&'a str> {
    job.spec.as_ref()?.template.spec.as_ref()?.containers[0]
        .env
        .as_ref()?
        .iter()
        .find(|env| env.name == key)?
        .value
        .as_deref()
}

fn at(secs: i64) -> Time {
    Time(DateTime::from_timestamp(secs, 0).unwrap())
}

fn pod(job_name: &str, name: &str, created: i64, exit_code: Option<i32>) -> Pod {
    Pod {
        metadata: ObjectMeta {
            name: Some(name.into()),
            creation_timestamp: Some(at(created)),
            labels: Some(
                [(LABEL_JOB_NAME.to_string(), job_name.to_string())]
                    .into_iter()
                    .collect(),
            ),
            ..Default::default()
        },
        spec: None,
        status: Some(PodStatus {
            phase: Some(if exit_code == Some(0) { "Succeeded" } else { "Failed" }.into()),
            container_statuses: exit_code.map(|exit_code| {
                vec![ContainerStatus {
                    name: "deploy-runner".into(),
                    state: Some(RawContainerState {
                        terminated: Some(ContainerStateTerminated {
                            exit_code,
                            finished_at: Some(at(created + 30)),
                            ..Default::default()
                        }),
                        ..Default::default()
                    }),
                    ..Default::default()
                }]
            }),
            ..Default::default()
        }),
    }
}

#[tokio::test]
async fn submit_renders_and_applies() {
    let (scheduler, service) = service(config());

    let response = service.submit(&request()).await.unwrap();
    assert!(response.job_name.starts_with("deploy-job-"));
    assert_eq!(
        response.raw_success_output,
        format!("job.batch/{} created\n", response.job_name),
    );
    assert_eq!(response.raw_diagnostic_output, "");

    let jobs = scheduler.jobs().await;
    assert_eq!(jobs.len(), 1);
    let job = &jobs[0];
    assert_eq!(job.metadata.name.as_deref(), Some(response.job_name.as_str()));
    assert_eq!(job.metadata.namespace.as_deref(), Some("migrations"));
    assert_eq!(
        env_value(job, ENV_REPO_URL),
        Some("https://tok123@git.example/org/repo.git"),
    );
    assert_eq!(env_value(job, ENV_EXEC_CMD), Some("migrate --env prod"));

    let blob = STANDARD
        .decode(env_value(job, ENV_ENV_VARS_JSON).unwrap())
        .unwrap();
    let env_vars: BTreeMap<String, String> = ::serde_json::from_slice(&blob).unwrap();
    assert_eq!(env_vars, request().env_vars.unwrap());
}

#[tokio::test]
async fn resubmit_mints_new_names() {
    let (scheduler, service) = service(config());
    let service = Arc::new(service);

    let names = try_join_all((0..16).map(|_| {
        let service = service.clone();
        async move { service.submit(&request()).await.map(|r| r.job_name) }
    }))
    .await
    .unwrap();

    let mut unique = names.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(unique.len(), names.len());
    assert_eq!(scheduler.jobs().await.len(), names.len());
}

#[tokio::test]
async fn reject_invalid_request_before_scheduling() {
    let (scheduler, service) = service(config());

    let request = DeploymentRequest {
        exec_command: None,
        ..request()
    };
    match service.submit(&request).await {
        Err(Error::Validation { missing }) => assert_eq!(missing, vec!["liquibase_exec_cmd"]),
        other => panic!("unexpected result: {other:?}"),
    }
    assert!(scheduler.jobs().await.is_empty());
}

#[tokio::test]
async fn fail_fast_without_configuration() {
    for config in [
        DeployConfig {
            credential: None,
            ..config()
        },
        DeployConfig {
            namespace: None,
            ..config()
        },
    ] {
        let (scheduler, service) = service(config);
        assert!(matches!(
            service.submit(&request()).await,
            Err(Error::Configuration(_)),
        ));
        assert!(scheduler.jobs().await.is_empty());
    }
}

#[tokio::test]
async fn surface_diagnostics_without_failing() {
    let (_, service) = service(config());

    let request = DeploymentRequest {
        repository_url: Some("ssh://git@git.example/org/repo.git".into()),
        ..request()
    };
    let response = service.submit(&request).await.unwrap();
    assert!(response
        .raw_diagnostic_output
        .contains("credential was not injected"));
}

#[tokio::test]
async fn transport_errors_hide_credential() {
    let (scheduler, service) = service(config());
    scheduler
        .set_unavailable(Some(
            "admission webhook rejected https://tok123@git.example/org/repo.git".into(),
        ))
        .await;

    match service.submit(&request()).await {
        Err(Error::Transport(message)) => {
            assert!(!message.contains("tok123"));
            assert!(message.contains("***@git.example"));
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[tokio::test]
async fn report_succeeded_job() {
    let (scheduler, service) = service(config());

    scheduler
        .insert_job(Job {
            metadata: ObjectMeta {
                name: Some("deploy-job-1".into()),
                ..Default::default()
            },
            spec: None,
            status: Some(JobStatus {
                active: Some(0),
                succeeded: Some(1),
                completion_time: Some(at(200)),
                conditions: Some(vec![JobCondition {
                    type_: "Complete".into(),
                    status: "True".into(),
                    ..Default::default()
                }]),
                ..Default::default()
            }),
        })
        .await;

    let status = service.job_status("deploy-job-1").await.unwrap();
    assert_eq!(status.state, JobState::Succeeded);
    assert_eq!(status.succeeded_count, 1);
    assert_eq!(status.completion_time, Some(at(200).0));
}

#[tokio::test]
async fn report_missing_job() {
    let (_, service) = service(config());

    assert!(matches!(
        service.job_status("deploy-job-404").await,
        Err(Error::NotFound { .. }),
    ));
    assert!(matches!(
        service.job_status("").await,
        Err(Error::Validation { .. }),
    ));
    assert!(matches!(
        service.job_status("Bad Name").await,
        Err(Error::InvalidField { .. }),
    ));
}

#[tokio::test]
async fn report_latest_pod() {
    let (scheduler, service) = service(config());

    assert!(matches!(
        service.latest_execution_unit("deploy-job-1").await,
        Err(Error::NotFound { .. }),
    ));

    scheduler.insert_pod(pod("deploy-job-1", "first", 10, Some(1))).await;
    scheduler.insert_pod(pod("deploy-job-1", "third", 30, Some(0))).await;
    scheduler.insert_pod(pod("deploy-job-1", "second", 20, Some(1))).await;
    scheduler.insert_pod(pod("deploy-job-2", "other", 99, None)).await;

    let status = service.latest_execution_unit("deploy-job-1").await.unwrap();
    assert_eq!(status.pod_name, "third");
    assert_eq!(status.phase.as_deref(), Some("Succeeded"));
    assert_eq!(status.completion_time, Some(at(60).0));
    assert_eq!(
        status
            .terminal_container_state
            .map(|terminated| terminated.exit_code),
        Some(0),
    );

    let status = service.latest_execution_unit("deploy-job-2").await.unwrap();
    assert_eq!(status.pod_name, "other");
    assert_eq!(status.terminal_container_state, None);
}

#[tokio::test]
async fn slow_scheduler_times_out() {
    let scheduler = Arc::new(MemoryScheduler::default());
    scheduler.set_latency(Some(Duration::from_millis(500))).await;

    let bounded = TimeoutScheduler::new(scheduler.clone(), Duration::from_millis(20));
    let service = DeployService::new(config(), bounded);

    assert!(matches!(
        service.job_status("deploy-job-1").await,
        Err(Error::Transport(_)),
    ));
    assert!(matches!(
        service.submit(&request()).await,
        Err(Error::Transport(_)),
    ));
}
