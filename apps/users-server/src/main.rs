use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mimalloc::MiMalloc;
use runtime::{AppConfig, CliArgs};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use api_ingress::{ApiIngress, ApiIngressConfig};
use axum::Router;
use users_info::api::rest::routes::register_routes;
use users_info::config::UsersInfoConfig;
use users_info::domain::service::Service;
use users_info::infra::storage::MemoryUsersRepository;

mod shutdown;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

/// Users Server - in-memory user records over HTTP
#[derive(Parser)]
#[command(name = "users-server")]
#[command(about = "Users Server - in-memory user records over HTTP")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port for HTTP server (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Print current configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server
    Run,
    /// Check configuration
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let args = CliArgs {
        config: cli.config.as_ref().map(|p| p.to_string_lossy().to_string()),
        port: cli.port,
        print_config: cli.print_config,
        verbose: cli.verbose,
    };

    // Load configuration (normalized home_dir is applied inside)
    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;
    config.apply_cli_overrides(&args);

    let logging_config = config.logging.clone().unwrap_or_default();
    runtime::logging::init_logging_from_config(&logging_config, Path::new(&config.server.home_dir));
    tracing::info!("Users Server starting");

    if args.print_config {
        println!("{}", config.to_yaml()?);
        return Ok(());
    }

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_server(config).await,
        Commands::Check => check_config(config),
    }
}

fn ingress_config(config: &AppConfig) -> ApiIngressConfig {
    // timeout_sec = 0 falls back to the ingress default
    ApiIngressConfig {
        bind_addr: config.bind_addr(),
        cors_enabled: config.server.cors_enabled,
        request_timeout_secs: config.server.timeout_sec,
        ..ApiIngressConfig::default()
    }
}

/// Wire store -> service -> routes and wrap them in the ingress middleware.
fn build_app(config: &AppConfig) -> Result<(ApiIngress, Router)> {
    let users_cfg = UsersInfoConfig::from_value(config.module_config("users_info"))
        .context("Invalid modules.users_info config")?;

    let repo = Arc::new(MemoryUsersRepository::new());
    let service = Arc::new(Service::new(repo, users_cfg.service_config()));

    let ingress = ApiIngress::new(ingress_config(config));
    let router = ingress.build_router(register_routes(Router::new(), service));
    Ok((ingress, router))
}

async fn run_server(config: AppConfig) -> Result<()> {
    tracing::info!("Initializing modules...");
    let (ingress, router) = build_app(&config)?;

    let cancel = CancellationToken::new();
    shutdown::cancel_on_signal(cancel.clone());

    ingress.serve(router, cancel).await?;
    tracing::info!("Users Server stopped");
    Ok(())
}

fn check_config(config: AppConfig) -> Result<()> {
    tracing::info!("Checking configuration...");

    // Module sections and addresses must parse the same way `run` parses them.
    build_app(&config)?;
    config
        .bind_addr()
        .parse::<std::net::SocketAddr>()
        .map_err(|e| anyhow::anyhow!("Invalid bind address '{}': {}", config.bind_addr(), e))?;

    tracing::info!("Configuration is valid");
    println!("Configuration check passed");
    println!("{}", config.to_yaml()?);
    Ok(())
}
