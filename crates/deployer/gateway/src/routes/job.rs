use actix_web::{
    get,
    web::{Data, Path},
    HttpRequest, HttpResponse, Responder,
};
use deployer_api::job::{ExecutionUnitResponse, JobStatusResponse};
use deployer_core::result::Result;
use deployer_provider::DeployService;
use tracing::{instrument, Level};

use crate::auth::ApiTokens;

#[instrument(level = Level::INFO, skip(request, tokens, service))]
#[get("/job/{name}/status")]
pub async fn get_status(
    request: HttpRequest,
    tokens: Data<ApiTokens>,
    service: Data<DeployService>,
    name: Path<String>,
) -> impl Responder {
    if let Err(error) = tokens.authorize(&request) {
        return error.into_response();
    }

    let result = service
        .job_status(&name)
        .await
        .map(|job| JobStatusResponse { job });
    HttpResponse::from(Result::from(result))
}

#[instrument(level = Level::INFO, skip(request, tokens, service))]
#[get("/job/{name}/pod")]
pub async fn get_latest_pod(
    request: HttpRequest,
    tokens: Data<ApiTokens>,
    service: Data<DeployService>,
    name: Path<String>,
) -> impl Responder {
    if let Err(error) = tokens.authorize(&request) {
        return error.into_response();
    }

    let name = name.into_inner();
    let result = service
        .latest_execution_unit(&name)
        .await
        .map(|pod| ExecutionUnitResponse { job: name, pod });
    HttpResponse::from(Result::from(result))
}
