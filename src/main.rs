use anyhow::Context;
use gigbook::{config::Config, db, router, state::AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("gigbook=info,tower_http=info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = Config::from_env()?;
    let pool = gigbook::connect(&config)
        .await
        .with_context(|| format!("failed to connect to {}", config.database_url))?;
    db::init_schema(&pool)
        .await
        .context("failed to create tables")?;

    if config.seed_demo {
        match db::seed_demo_if_empty(&pool).await {
            Ok(true) => tracing::info!("store was empty, demo venues and artists added"),
            Ok(false) => tracing::info!("store already has venues, skipping demo seed"),
            Err(e) => tracing::warn!(error = %e, "demo seed failed"),
        }
    }

    let app = router(AppState { pool });

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(%addr, "listening");
    axum::serve(listener, app).await?;
    Ok(())
}
