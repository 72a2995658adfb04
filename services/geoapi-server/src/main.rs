//! geoapi server
//!
//! OGC API server with interchangeable axum and hyper backends.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use geoapi_core::{Api, Backend, ConfigResult, GeoApiConfig};
use geoapi_server::backends::{self, hyper::HyperServer};
use geoapi_server::state::AppState;

/// geoapi server
#[derive(Parser, Debug)]
#[command(name = "geoapi-server")]
#[command(about = "OGC API server")]
struct Args {
    /// Configuration file
    #[arg(
        short,
        long,
        global = true,
        default_value = "geoapi-config.yml",
        env = "GEOAPI_CONFIG"
    )]
    config: PathBuf,

    /// Log level, used when RUST_LOG is not set (defaults to the configured level)
    #[arg(long, global = true, env = "GEOAPI_LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server
    Serve {
        /// HTTP backend
        #[arg(long, value_enum, default_value_t = ServeBackend::Axum, env = "GEOAPI_BACKEND")]
        backend: ServeBackend,

        /// Number of worker threads
        #[arg(
            long,
            env = "GEOAPI_WORKER_THREADS",
            value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..)
        )]
        worker_threads: Option<usize>,
    },
    /// Load and validate a configuration file
    CheckConfig,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum ServeBackend {
    Axum,
    Hyper,
}

fn main() {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();
    let config = GeoApiConfig::from_file(&args.config);

    init_tracing(&args, &config);

    let config = match config {
        Ok(config) => config,
        Err(e) => {
            error!(path = %args.config.display(), error = %e, "Invalid configuration");
            std::process::exit(1);
        }
    };

    let result = match args.command {
        Command::CheckConfig => check_config(config),
        Command::Serve {
            backend,
            worker_threads,
        } => serve(config, backend, worker_threads),
    };

    if let Err(e) = result {
        error!(error = %format!("{:#}", e), "geoapi server failed");
        std::process::exit(1);
    }
}

fn init_tracing(args: &Args, config: &ConfigResult<GeoApiConfig>) {
    let level = match (&args.log_level, config) {
        (Some(level), _) => level.clone(),
        (None, Ok(config)) => config.logging.filter_directive().to_string(),
        (None, Err(_)) => "info".to_string(),
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .json()
        .init();
}

fn check_config(config: GeoApiConfig) -> Result<()> {
    let api = Api::new(config)?;

    let locales: Vec<String> = api.locales().iter().map(ToString::to_string).collect();
    println!("languages: {}", locales.join(", "));
    println!("default language: {}", api.locales().default_locale());
    for backend in Backend::ALL {
        let prefix = api.rules().url_prefix(backend);
        println!(
            "url prefix ({}): {}",
            backend,
            if prefix.is_empty() { "/" } else { prefix }
        );
    }
    println!("resources: {}", api.config().resources.len());
    Ok(())
}

fn serve(config: GeoApiConfig, backend: ServeBackend, worker_threads: Option<usize>) -> Result<()> {
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();

    if let Some(threads) = worker_threads {
        runtime_builder.worker_threads(threads);
    }

    let runtime = runtime_builder
        .build()
        .context("Failed to create Tokio runtime")?;

    runtime.block_on(run_server(config, backend))
}

async fn run_server(config: GeoApiConfig, backend: ServeBackend) -> Result<()> {
    info!(?backend, "Starting geoapi server");

    let prometheus = geoapi_server::metrics::install_recorder()?;
    let addr = config.server.bind.address();
    let api = Arc::new(Api::new(config)?);

    match backend {
        ServeBackend::Axum => {
            let state = Arc::new(AppState::new(api, Some(prometheus)));
            backends::axum::serve(state, &addr).await
        }
        ServeBackend::Hyper => {
            let addr: SocketAddr = addr
                .parse()
                .with_context(|| format!("Invalid bind address {}", addr))?;
            Arc::new(HyperServer::new(api)?).serve(addr).await
        }
    }
}
