//! uj-server - University Journal records service
//!
//! Startup: parse arguments, load the TOML config, initialize tracing,
//! resolve the root folder, open (or create) the database, serve HTTP
//! until Ctrl+C or SIGTERM.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uj_common::config::{RootFolderInitializer, RootFolderResolver, TomlConfig};
use uj_common::db::init_database;
use uj_common::export::resolve_font;
use uj_common::SqliteGateway;
use uj_server::{build_router, AppState};

const DEFAULT_LOG_FILTER: &str = "uj_server=info,uj_common=info,tower_http=info";

#[derive(Parser, Debug)]
#[command(name = "uj-server")]
#[command(about = "University journal records service")]
#[command(version)]
struct Args {
    /// Root folder holding ujournal.db (overrides UJ_ROOT_FOLDER and config)
    #[arg(short, long)]
    root_folder: Option<PathBuf>,

    /// HTTP port (default 5730)
    #[arg(short, long, env = "UJ_PORT")]
    port: Option<u16>,

    /// TrueType font used for PDF export
    #[arg(long, env = "UJ_PDF_FONT")]
    pdf_font: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = TomlConfig::load_or_default();

    // RUST_LOG wins over the config file's [logging] level
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| {
            EnvFilter::try_new(config.logging.level.as_deref().unwrap_or(DEFAULT_LOG_FILTER))
        })
        .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting University Journal server (uj-server) v{}",
        env!("CARGO_PKG_VERSION")
    );

    let resolver = RootFolderResolver::new(args.root_folder, &config);
    let initializer = RootFolderInitializer::new(resolver.resolve());
    initializer
        .ensure_directory_exists()
        .context("Failed to prepare root folder")?;
    info!("Root folder: {}", initializer.root_folder().display());

    let db_path = initializer.database_path();
    if !initializer.database_exists() {
        info!("Creating new database");
    }
    info!("Database path: {}", db_path.display());

    let pool = init_database(&db_path)
        .await
        .context("Failed to initialize database")?;
    info!("✓ Database ready");

    let pdf_font = args.pdf_font.or_else(|| config.pdf_font.clone());
    match resolve_font(pdf_font.as_deref()) {
        Ok(font) => info!("PDF export font: {}", font),
        Err(e) => warn!("PDF export will fail until pdf_font is fixed: {}", e),
    }

    let state = AppState::new(SqliteGateway::new(pool.clone()), pdf_font);
    let app = build_router(state);

    let port = args.port.unwrap_or_else(|| config.port());
    let bind_address = config.bind_address();
    let listener = tokio::net::TcpListener::bind((bind_address, port))
        .await
        .with_context(|| format!("Failed to bind to {}:{}", bind_address, port))?;
    info!("uj-server listening on http://{}:{}", bind_address, port);
    info!("Health check: http://{}:{}/health", bind_address, port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    pool.close().await;
    info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
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
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
