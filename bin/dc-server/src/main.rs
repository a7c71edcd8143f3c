//! DentalCampus Server
//!
//! Serves the platform REST APIs:
//! - Appointments, guided bookings and schedules
//! - Approval requests, clinical cases, assignments, tasks, evaluations
//! - Notification inbox, platform config and health probes
//!
//! Caller identity is forwarded by the authenticating gateway in the
//! `X-Actor-Id` / `X-Actor-Role` headers.
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `DENTALCAMPUS_CONFIG` | - | Path to the TOML config file |
//! | `DENTALCAMPUS_HTTP_PORT` | `8080` | HTTP API port |
//! | `DENTALCAMPUS_DEV_MODE` | `false` | Seed demo data on startup |
//! | `LOG_FORMAT` | `text` | `json` for structured logs |
//! | `RUST_LOG` | `info` | Log level |

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::http::{HeaderName, HeaderValue, Method};
use tokio::{net::TcpListener, signal};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use dc_config::{AppConfig, ConfigLoader, HttpConfig};
use dc_platform::seed::DevDataSeeder;
use dc_platform::shared::HealthState;
use dc_platform::{api_router, ApiDoc, AppState, ClinicPlatform, InMemoryDirectory};

#[tokio::main]
async fn main() -> Result<()> {
    dc_common::logging::init_logging("dc-server");

    info!("Starting DentalCampus Server");

    let config: AppConfig = ConfigLoader::new().load().context("loading configuration")?;

    let directory = Arc::new(InMemoryDirectory::new());
    if config.dev_mode {
        DevDataSeeder::seed_directory(&directory)?;
    }

    let platform = Arc::new(ClinicPlatform::new(&config, directory)?);
    info!(
        notifications = platform.notifications_enabled(),
        slot_minutes = platform.booking_policy().slot_minutes,
        "Platform initialized"
    );

    if config.dev_mode {
        if let Err(e) = DevDataSeeder::new(&platform).seed() {
            warn!("Dev data seeding failed: {}", e);
        }
    }

    let health = HealthState::new(Arc::clone(&platform), Some(env!("CARGO_PKG_VERSION").to_string()));

    let app = api_router(AppState::new(platform), health.clone())
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config.http));

    let addr = format!("{}:{}", config.http.host, config.http.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {}", addr))?;

    health.set_ready();
    info!("API server listening on http://{}", addr);
    info!("Swagger UI at http://{}/swagger-ui", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("DentalCampus Server shutdown complete");
    Ok(())
}

fn cors_layer(http: &HttpConfig) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            HeaderName::from_static("x-actor-id"),
            HeaderName::from_static("x-actor-role"),
            HeaderName::from_static("x-correlation-id"),
        ]);

    if http.cors_origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = http
        .cors_origins
        .iter()
        .filter_map(|o| match o.parse() {
            Ok(v) => Some(v),
            Err(_) => {
                warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(origins)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received...");
}
