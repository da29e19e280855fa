mod config;

use clap::Parser;
use config::{Config, LoggingConfig, MetricsConfig};
use metrics_exporter_statsd::{StatsdBuilder, StatsdError};
use shared::metrics_defs::describe_all;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pitlane", about = "Multi-tenant racing site content gateway")]
struct Cli {
    /// Path to the YAML config file
    #[arg(long, short, default_value = "pitlane.yaml")]
    config: PathBuf,
}

#[derive(thiserror::Error, Debug)]
enum MetricsError {
    #[error("could not build statsd recorder: {0}")]
    Statsd(#[from] StatsdError),
    #[error("could not install metrics recorder: {0}")]
    Install(String),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match Config::load(&cli.config, |name| std::env::var(name).ok()) {
        Ok(config) => config,
        Err(error) => {
            eprintln!("{}: {error}", cli.config.display());
            return ExitCode::FAILURE;
        }
    };

    let sentry_guard = init_sentry(config.logging.as_ref());
    init_tracing(sentry_guard.is_some());

    if let Some(metrics) = &config.metrics {
        match init_metrics(metrics) {
            Ok(()) => tracing::info!(host = %metrics.statsd_host, port = metrics.statsd_port, "statsd metrics enabled"),
            Err(error) => tracing::error!(%error, "metrics disabled"),
        }
    }

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(error) => {
            tracing::error!(%error, "could not start tokio runtime");
            return ExitCode::FAILURE;
        }
    };

    tracing::info!(config = %cli.config.display(), "starting pitlane");
    match runtime.block_on(gateway::run(config.gateway)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!(%error, "gateway stopped");
            ExitCode::FAILURE
        }
    }
}

fn init_sentry(logging: Option<&LoggingConfig>) -> Option<sentry::ClientInitGuard> {
    let logging = logging?;
    let dsn = match logging.sentry_dsn.as_deref()?.parse::<sentry::types::Dsn>() {
        Ok(dsn) => dsn,
        Err(error) => {
            eprintln!("ignoring invalid sentry DSN: {error}");
            return None;
        }
    };

    Some(sentry::init(sentry::ClientOptions {
        dsn: Some(dsn),
        release: sentry::release_name!(),
        environment: logging.environment.clone().map(Into::into),
        ..Default::default()
    }))
}

fn init_tracing(with_sentry: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(with_sentry.then(sentry::integrations::tracing::layer))
        .init();
}

fn init_metrics(config: &MetricsConfig) -> Result<(), MetricsError> {
    let recorder = StatsdBuilder::from(config.statsd_host.clone(), config.statsd_port)
        .build(Some(&config.prefix))?;
    metrics::set_global_recorder(recorder).map_err(|e| MetricsError::Install(e.to_string()))?;

    describe_all(content::metrics_defs::ALL_METRICS);
    describe_all(gateway::metrics_defs::ALL_METRICS);
    Ok(())
}
