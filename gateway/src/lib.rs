pub mod config;
pub mod draft;
pub mod errors;
pub mod handlers;
pub mod headers;
pub mod metrics_defs;
pub mod push;
pub mod router;
pub mod service;

use errors::GatewayError;
use service::{Gateway, GatewayService};
use shared::admin_service::AdminService;
use shared::http::{bind, run_http_service, serve_http_service};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::net::TcpListener;

pub async fn run(config: config::Config) -> Result<(), GatewayError> {
    let ready = Arc::new(AtomicBool::new(false));
    let probe = ready.clone();
    let admin_service: AdminService<_, GatewayError> =
        AdminService::new(move || probe.load(Ordering::Relaxed));
    let admin_task = run_http_service(
        &config.admin_listener.host,
        config.admin_listener.port,
        admin_service,
    );

    tokio::try_join!(serve_gateway(&config, &ready), admin_task)?;
    Ok(())
}

async fn serve_gateway(config: &config::Config, ready: &AtomicBool) -> Result<(), GatewayError> {
    let (listener, gateway) = start(config, ready).await?;
    serve_http_service(listener, GatewayService::new(gateway)).await
}

/// Loads the snapshot and binds the site listener, then flips `ready`.
async fn start(
    config: &config::Config,
    ready: &AtomicBool,
) -> Result<(TcpListener, Arc<Gateway>), GatewayError> {
    let gateway = Arc::new(Gateway::from_config(config)?);
    let listener = bind(&config.listener.host, config.listener.port).await?;
    ready.store(true, Ordering::Relaxed);
    Ok((listener, gateway))
}
