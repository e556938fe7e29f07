// VantagePoint Prediction Market Engine - Main Entry Point
//
// Binary-outcome markets priced by a constant-product AMM, with a keeper-
// driven limit order book, a bonded oracle dispute flow, and pro-rata
// settlement. The engine itself lives in the library; this binary wires it
// to an axum JSON API.

use std::net::SocketAddr;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;
use tracing_subscriber::EnvFilter;

use vantagepoint_engine::app_state::AppState;
use vantagepoint_engine::config::Config;
use vantagepoint_engine::handlers;

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env();
    let port = config.port;
    let state = AppState::shared(config);

    let app = handlers::router(state).layer(
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
    );

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "VantagePoint market engine listening");
    info!("POST /markets             - create market");
    info!("POST /markets/:id/buy     - AMM buy");
    info!("POST /markets/:id/sell    - AMM sell");
    info!("GET  /markets/:id/preview - trade preview");
    info!("POST /orders              - place limit order");
    info!("POST /orders/:id/fill     - keeper fill");
    info!("POST /markets/:id/outcome - oracle report");
    info!("POST /markets/:id/dispute - file truth bond");
    info!("POST /markets/:id/claim   - claim winnings");
    info!("GET  /events              - event stream");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind API port");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown signal received");
        })
        .await
        .expect("server error");
}
