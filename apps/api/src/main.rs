use std::error::Error;

use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use roster_api::api;
use roster_api::config::AppConfig;
use roster_api::infrastructure::{database, seed};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("roster_api=info,tower_http=info")),
        )
        .init();

    let config = AppConfig::from_env()?;

    // Connect to database
    tracing::info!(url = %config.database_url, "Connecting to database...");
    let pool = database::connect(&config.database_url, config.max_connections).await?;
    database::migrate(&pool).await?;
    tracing::info!("Database connected and migrated");

    if config.seed_sample_data {
        seed::seed_sample_data(&pool).await?;
    }

    // Configure CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = api::router(pool)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // Start server
    tracing::info!("Server listening on {}", config.bind_addr);
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
