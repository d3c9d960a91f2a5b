//! ProxLib API server
//!
//! Serves the authentication and admin API over Postgres, and optionally
//! the single-page UI from a static directory.

mod seed;

use anyhow::{Context, Result};
use api::{router, AppState};
use clap::{Parser, Subcommand};
use proxlib_core::AppConfig;
use std::path::PathBuf;
use std::sync::Arc;
use storage::{migrations::run_migrations, PgCredentialStore};
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// ProxLib API server
#[derive(Parser)]
#[command(name = "proxlib-server")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to a TOML configuration file (defaults to ./proxlib.toml if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply migrations, seed the admin account and serve HTTP (default)
    Serve,

    /// Apply pending migrations and exit
    Migrate,

    /// Create an administrator account
    CreateAdmin {
        #[arg(long)]
        name: String,

        #[arg(long)]
        password: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing();

    let (config, overrides) =
        AppConfig::load_with_env(cli.config.as_deref()).context("Failed to load configuration")?;
    if !overrides.is_empty() {
        info!(keys = ?overrides, "configuration overridden from environment");
    }

    let store = PgCredentialStore::connect(&config.database.url, config.database.max_connections)
        .await
        .context("Failed to connect to database")?;

    let applied = run_migrations(store.pool())
        .await
        .context("Failed to run migrations")?;
    info!(applied, "migrations up to date");

    let token_expiry = config.token_expiry_seconds()?;
    let state = Arc::new(AppState::from_store(
        Arc::new(store),
        config.auth.jwt_secret.clone(),
        token_expiry,
    ));

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(state, &config).await,
        Commands::Migrate => Ok(()),
        Commands::CreateAdmin { name, password } => {
            let id = state
                .auth_service
                .create_admin(&name, &password)
                .await
                .context("Failed to create admin")?;
            println!("Created admin '{name}' with id {id}");
            Ok(())
        }
    }
}

async fn serve(state: Arc<AppState>, config: &AppConfig) -> Result<()> {
    seed::seed_admin(&state.auth_service, &config.auth)
        .await
        .context("Failed to seed admin account")?;

    let app = router::app(state, &config.server).context("Invalid server.cors_origin")?;

    let listener = tokio::net::TcpListener::bind(config.bind_address())
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_address()))?;
    info!(addr = %listener.local_addr()?, "ProxLib API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .init();
}

/// Wait for Ctrl-C or SIGTERM
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received Ctrl-C, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
}
