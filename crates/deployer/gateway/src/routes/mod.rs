pub mod deploy;
pub mod job;

use actix_web::{get, HttpResponse, Responder};
use deployer_api::consts::NAME;
use tracing::{instrument, Level};

#[instrument(level = Level::INFO)]
#[get("/")]
pub async fn index() -> impl Responder {
    HttpResponse::Ok().json(NAME)
}

#[instrument(level = Level::INFO)]
#[get("/health")]
pub async fn health() -> impl Responder {
    HttpResponse::Ok().json("healthy")
}
