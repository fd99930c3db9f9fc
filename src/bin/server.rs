//! Itinera document server
//!
//! Stores shared trip documents in SQLite and pushes every save to the
//! WebSocket subscribers of that trip.
//!
//! # Configuration
//!
//! Environment variables:
//! - `ITINERA_PORT`: Port to listen on (default: 8080)
//! - `ITINERA_DATABASE_PATH`: SQLite file (default: ~/.local/share/itinera-server/documents.db)
//!
//! # Endpoints
//!
//! - `GET /health`: Health check
//! - `GET /trips/{id}`: Fetch a document
//! - `PUT /trips/{id}`: Replace a document
//! - `GET /trips/{id}/subscribe`: WebSocket stream of document changes

use std::net::SocketAddr;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use itinera::server::{init_db, router, AppState, DocumentRepository};

/// Server configuration
#[derive(Debug, Clone)]
struct Config {
    /// Port to listen on
    port: u16,
    /// SQLite database file
    database_path: PathBuf,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Self {
        let port = std::env::var("ITINERA_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);

        let database_path = std::env::var("ITINERA_DATABASE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                dirs::data_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join("itinera-server")
                    .join("documents.db")
            });

        Self {
            port,
            database_path,
        }
    }
}

async fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!("Database: {}", config.database_path.display());

    let pool = init_db(&config.database_path).await?;
    let app = router(AppState::new(DocumentRepository::new(pool)));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "itinera_server=info,itinera=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();

    if let Err(e) = run(config).await {
        tracing::error!("Server failed: {}", e);
        std::process::exit(1);
    }
}
