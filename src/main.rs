mod config;
mod error;
mod middlewares;
mod routes;
mod structs;
mod utils;

use std::sync::Arc;

use actix_web::{App, HttpServer, middleware::Logger, web};
use anyhow::Context;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    config::Config,
    utils::{
        backend_utils::{BookingBackend, HttpBackend},
        flow_utils::FlowStore,
    },
};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "samass_headless=info,actix_web=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().context("Failed to load configuration")?;
    let bind_address = config.bind_address();

    let backend: Arc<dyn BookingBackend> = Arc::new(
        HttpBackend::new(&config.backend_api_url, config.backend_timeout)
            .context("Failed to build the backend client")?,
    );
    let backend = web::Data::from(backend);
    let flows = web::Data::new(FlowStore::new(config.flow_ttl));

    info!(
        backend = %config.backend_api_url,
        timezone = %config.timezone,
        "Server starting at http://{}",
        bind_address
    );

    let app_config = web::Data::new(config);

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(app_config.clone())
            .app_data(backend.clone())
            .app_data(flows.clone())
            .configure(routes::configure)
    })
    .bind(&bind_address)
    .with_context(|| format!("Failed to bind {bind_address}"))?
    .run()
    .await
    .context("Server stopped with an error")
}
