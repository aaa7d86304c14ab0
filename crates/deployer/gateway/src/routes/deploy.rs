use actix_web::{
    post,
    web::{Data, Json},
    HttpRequest, HttpResponse, Responder,
};
use deployer_api::request::DeploymentRequest;
use deployer_core::result::Result;
use deployer_provider::DeployService;
use tracing::{instrument, Level};

use crate::auth::ApiTokens;

#[instrument(level = Level::INFO, skip(request, tokens, service, body))]
#[post("/deploy")]
pub async fn post(
    request: HttpRequest,
    tokens: Data<ApiTokens>,
    service: Data<DeployService>,
    Json(body): Json<DeploymentRequest>,
) -> impl Responder {
    if let Err(error) = tokens.authorize(&request) {
        return error.into_response();
    }

    let result = service.submit(&body).await;
    HttpResponse::from(Result::from(result))
}
