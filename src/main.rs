//! simple-server demo binary
//!
//! Serves a small application on top of the dispatcher.
//!
//! # Architecture Overview
//!
//! ```text
//!                     ┌──────────────────────────────────────────────────┐
//!                     │                  SIMPLE SERVER                   │
//!                     │                                                  │
//!   Client Request    │  ┌─────────┐   ┌─────────┐   ┌──────────────┐    │
//!   ──────────────────┼─▶│   net   │──▶│  http   │──▶│  dispatcher  │    │
//!                     │  │listener │   │ server  │   │ (ctx scope)  │    │
//!                     │  └─────────┘   └─────────┘   └──────┬───────┘    │
//!                     │                                     │            │
//!                     │                                     ▼            │
//!                     │                              ┌──────────────┐    │
//!                     │                              │   routing    │    │
//!                     │                              │ key/matcher  │    │
//!                     │                              └──────┬───────┘    │
//!                     │                                     │            │
//!                     │                                     ▼            │
//!   Client Response   │  ┌─────────┐                 ┌──────────────┐    │
//!   ◀─────────────────┼──│response │◀────────────────│   handlers   │    │
//!                     │  │  sink   │◀── funnel ◀─────│  (on error)  │    │
//!                     │  └─────────┘                 └──────────────┘    │
//!                     │                                                  │
//!                     │  Cross-cutting: config, lifecycle, observability │
//!                     └──────────────────────────────────────────────────┘
//! ```
//!
//! # Routes
//! - `GET /` plain-text greeting
//! - `GET /users/:id` JSON document echoing the id
//! - `POST /echo` echoes the request body
//! - `GET /fail` fails with 503, rendered by the JSON error observer

use std::path::PathBuf;
use std::sync::Arc;

use axum::http::{header, HeaderValue, StatusCode};
use clap::Parser;
use serde::Serialize;

use simple_server::config::{load_config, ServerConfig};
use simple_server::lifecycle::shutdown_signal;
use simple_server::observability::{logging, metrics};
use simple_server::{parse_body, Application, Context, HandlerResult, HttpError};

#[derive(Parser)]
#[command(name = "simple-server")]
#[command(about = "Minimal async HTTP request dispatcher", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override `listener.bind_address`.
    #[arg(short, long)]
    bind: Option<String>,
}

#[derive(Serialize)]
struct User<'a> {
    id: &'a str,
    name: String,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ServerConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    logging::init_logging(&config.observability);
    tracing::info!("simple-server v{} starting", env!("CARGO_PKG_VERSION"));

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr)?,
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let app = Application::with_config(config);
    register_routes(&app)?;

    let server = app.listen().await?;
    tracing::info!(address = %server.local_addr(), "Listening for connections");

    shutdown_signal().await;
    server.close().await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

fn register_routes(app: &Application) -> Result<(), simple_server::RouteKeyError> {
    app.on("GET /", |ctx: Arc<Context>| async move {
        ctx.response().end("Hello from simple-server\n");
        Ok(())
    })?
    .on("GET /users/:id", |ctx: Arc<Context>| async move {
        let id = ctx.param("id").unwrap_or_default();
        let body = serde_json::to_vec(&User {
            id,
            name: format!("user-{id}"),
        })?;
        respond_json(&ctx, StatusCode::OK, body);
        HandlerResult::Ok(())
    })?
    .on("POST /echo", |ctx: Arc<Context>| async move {
        let body = parse_body(&ctx).await?;
        ctx.response().end(body);
        HandlerResult::Ok(())
    })?
    .on("GET /fail", |_ctx: Arc<Context>| async move {
        HandlerResult::Err(HttpError::new("upstream unavailable").with_status(503))
    })?
    .on_error(|ctx: Arc<Context>| async move {
        let Some(error) = ctx.error() else {
            return Ok(());
        };
        let status = error.resolved_status();
        let body = serde_json::to_vec(&ErrorBody {
            error: error.name(),
            message: error.resolved_message(),
        })?;
        respond_json(&ctx, status, body);
        HandlerResult::Ok(())
    });
    Ok(())
}

fn respond_json(ctx: &Context, status: StatusCode, body: Vec<u8>) {
    let response = ctx.response();
    response.set_status(status);
    response.set_header(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response.end(body);
}
