use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{trace::TraceLayer, cors::{Any, CorsLayer}};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use jyotish_progress::{config::AppConfig, db, routes, store};
use jyotish_progress::store::ProgressStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.log_filter))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let store: Arc<dyn ProgressStore> = match &config.database_url {
        Some(url) => {
            let pool = db::connect(url).await?;
            // crate-relative path for sqlx migrations
            sqlx::migrate!("./migrations").run(&pool).await?;
            Arc::new(db::PgStore::new(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, progress is kept in memory only");
            Arc::new(store::MemoryStore::new())
        }
    };
    if config.seed_catalog {
        store::seed_if_empty(store.as_ref()).await?;
    }

    let app = routes::router(routes::AppState::new(store))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any));

    let listener = TcpListener::bind(config.bind_addr()).await?;
    tracing::info!("listening on http://{}", config.bind_addr());

    axum::serve(listener, app).await?;
    Ok(())
}
