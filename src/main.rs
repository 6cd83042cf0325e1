use std::net::SocketAddr;
use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tokio::signal;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

use foundation_admin::auth::password;
use foundation_admin::browser::Catalog;
use foundation_admin::config::Config;
use foundation_admin::db::{MemoryRecordSource, PgRecordSource, RecordSource};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // `foundation-admin hash-password <password>` prints a value for ADMIN_PASSWORD_HASH
    let args: Vec<String> = std::env::args().collect();
    if args.get(1).map(String::as_str) == Some("hash-password") {
        let Some(plain) = args.get(2) else {
            return Err("usage: foundation-admin hash-password <password>".into());
        };
        println!("{}", password::hash(plain)?);
        return Ok(());
    }

    // Load .env if present
    let _ = dotenvy::dotenv();

    // Load config
    let config = Config::from_env().expect("Failed to load configuration");

    // Init tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(&config.log_level)
        }))
        .init();

    tracing::info!("Starting Foundation Admin");

    let catalog = Catalog::standard()?;

    let source: Arc<dyn RecordSource> = match &config.database_url {
        Some(url) => {
            let pool = PgPoolOptions::new()
                .max_connections(10)
                .connect(url)
                .await
                .expect("Failed to connect to database");

            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .expect("Failed to run migrations");

            tracing::info!("Migrations applied");
            Arc::new(PgRecordSource::new(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using an empty in-memory record source");
            Arc::new(MemoryRecordSource::with_collections(catalog.collections()))
        }
    };

    let addr = SocketAddr::new(config.host, config.port);
    let (app, state) = foundation_admin::build_app(source, catalog, config);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let sweeper = foundation_admin::sweeper::spawn(state, shutdown_rx);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let _ = shutdown_tx.send(true);
    let _ = sweeper.await;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
