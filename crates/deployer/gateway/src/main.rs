mod args;
mod auth;
mod routes;

use actix_cors::Cors;
use actix_web::{middleware, web::Data, App, HttpServer};
use actix_web_opentelemetry::{RequestMetrics, RequestTracing};
use anyhow::{anyhow, Result};
use clap::Parser;
use deployer_api::consts::NAME;
use deployer_core::tracer;
use deployer_provider::{
    scheduler::{kubernetes::KubernetesScheduler, timeout::TimeoutScheduler, Scheduler},
    DeployService,
};
use kube::Client;
use opentelemetry::global;
use tracing::{info, warn};

use crate::{args::Args, auth::ApiTokens};

#[actix_web::main]
async fn main() {
    async fn try_main(args: Args) -> Result<()> {
        tracer::init_once(NAME)?;

        let tokens = ApiTokens::new(&args.api_tokens);
        if tokens.is_empty() {
            warn!("API_TOKENS is empty; every protected request will be rejected");
        }
        let config = args.deploy_config();
        if config.credential.is_none() {
            warn!("PAT_TOKEN is not set; deployments will be rejected");
        }
        if config.namespace.is_none() {
            warn!("NAMESPACE is not set; deployments will be rejected");
        }

        // Initialize kubernetes client
        let kube = Client::try_default().await?;
        let scheduler: Box<dyn Scheduler> = Box::new(TimeoutScheduler::new(
            KubernetesScheduler::new(kube, config.namespace.clone()),
            args.scheduler_timeout(),
        ));

        let service = Data::new(DeployService::new(config, scheduler));
        let tokens = Data::new(tokens);

        // Start web server
        let addr = args.bind_addr;
        info!("Listening on {addr} with {} token(s)...", tokens.len());
        HttpServer::new(move || {
            let app = App::new()
                .app_data(Data::clone(&service))
                .app_data(Data::clone(&tokens));
            let app = app
                .service(routes::index)
                .service(routes::health)
                .service(routes::deploy::post)
                .service(routes::job::get_status)
                .service(routes::job::get_latest_pod);
            app.wrap(Cors::permissive())
                .wrap(middleware::NormalizePath::new(
                    middleware::TrailingSlash::Trim,
                ))
                .wrap(RequestMetrics::default())
                .wrap(RequestTracing::default())
        })
        .bind(addr)
        .map_err(|error| anyhow!("failed to bind to {addr}: {error}"))?
        .run()
        .await
        .map_err(Into::into)
    }

    try_main(Args::parse()).await.expect("running a server");
    global::shutdown_tracer_provider()
}
