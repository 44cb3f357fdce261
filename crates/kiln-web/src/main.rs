//! Kiln playground execution service.

mod handlers;
mod models;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{routing::post, Router};
use clap::Parser;
use kiln_compiler::RunLimits;
use tower_http::trace::TraceLayer;

use crate::handlers::AppState;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value_t = 3000)]
    port: u16,

    /// Execution budget per run, in VM instructions
    #[arg(long, default_value_t = 25_000_000)]
    fuel: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();

    let state = Arc::new(AppState {
        limits: RunLimits {
            fuel: Some(args.fuel),
            ..RunLimits::default()
        },
    });

    let app = Router::new()
        .route("/api/execute", post(handlers::execute))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], args.port));
    tracing::info!("listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
