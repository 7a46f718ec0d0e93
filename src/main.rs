use std::{net::SocketAddr, sync::Arc, time::Duration};

use anyhow::Context;
use tokio::signal;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::info;

use souk_api as api;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = api::config::load_config().context("failed to load configuration")?;
    api::config::init_tracing(&cfg.log_level, cfg.log_json);

    let db = api::db::establish_connection_from_app_config(&cfg)
        .await
        .context("failed to connect to the database")?;
    if cfg.auto_migrate {
        api::db::init_schema(&db).await?;
    }
    let db = Arc::new(db);

    let (event_sender, event_rx) = api::events::channel(1024);
    tokio::spawn(api::events::process_events(event_rx));
    let event_sender = Arc::new(event_sender);

    let catalog = Arc::new(api::services::catalog::CatalogService::new(db.clone()));
    let coupons = Arc::new(api::services::coupons::CouponService::new(db.clone()));
    let stock = api::services::stock::StockService::new(db.clone(), Some(event_sender.clone()));
    let orders = Arc::new(api::services::orders::OrderService::new(
        db.clone(),
        catalog.clone(),
        stock,
        Some(event_sender.clone()),
        Duration::from_secs(cfg.order_cache_ttl_secs),
    ));

    let state = api::handlers::AppState {
        catalog,
        coupons,
        orders,
    };
    let app = api::handlers::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(CompressionLayer::new());

    let addr: SocketAddr = format!("{}:{}", cfg.host, cfg.port)
        .parse()
        .context("invalid host/port configuration")?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("failed to bind listen address")?;
    info!(%addr, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let _ = signal::ctrl_c().await;
    info!("shutdown signal received");
}
