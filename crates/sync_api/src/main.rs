use std::sync::Arc;

use sync_api::config::Config;
use sync_api::state::AppState;

#[tokio::main]
async fn main() {
    // Load .env from workspace root (when running from project root)
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("configuration error: {e}");
            return;
        }
    };

    let pool = match db::connect(&config.database_url).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!("Database: not available: {e}");
            tracing::error!("Check DATABASE_URL (default sqlite://syncdrop.db?mode=rwc)");
            return;
        }
    };
    if let Err(e) = db::run_migrations(&pool).await {
        tracing::error!("Migrations failed: {e}");
        return;
    }
    tracing::info!("Database: connected, migrations applied");

    let addr = config.bind_addr.clone();
    let state = AppState::new(pool, Arc::new(config));
    let app = sync_api::app(state);

    tracing::info!("listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
