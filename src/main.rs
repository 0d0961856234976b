use clap::Parser;
use dotenvy::dotenv;
use image_upload_gateway::config::GatewayConfig;
use image_upload_gateway::infrastructure::storage;
use image_upload_gateway::services::provisioning::provision_buckets;
use image_upload_gateway::services::worker::StagingSweeper;
use image_upload_gateway::{AppState, create_app};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Port for the HTTP server (overrides PORT)
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "image_upload_gateway=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("🚀 Starting image upload gateway...");

    let mut config = GatewayConfig::from_env();
    if let Some(port) = args.port {
        config.port = port;
    }

    // Object store client, shared by every request
    let store = storage::setup_storage(&config).await;
    provision_buckets(store.as_ref(), config.provisioning_policy).await?;

    let state = AppState::new(store, config.clone());
    if let Err(e) = state.uploads.staging().ensure_root().await {
        warn!("⚠️  {:#}. Uploads will retry creating it.", e);
    }

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);

    if let Some(hours) = config.staging_cleanup_age_hours {
        let sweeper = StagingSweeper::new(
            config.staging_dir.clone(),
            Duration::from_secs(hours * 3600),
            Duration::from_secs(3600),
            shutdown_rx,
        );
        tokio::spawn(sweeper.run());
    }

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &axum::http::Request<_>| {
            let request_id = request
                .headers()
                .get("x-request-id")
                .and_then(|v| v.to_str().ok())
                .unwrap_or("unknown");
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = %request_id,
            )
        })
        .on_request(|request: &axum::http::Request<_>, _span: &tracing::Span| {
            info!("📥 {} {}", request.method(), request.uri());
        })
        .on_response(
            |response: &axum::http::Response<_>,
             latency: std::time::Duration,
             _span: &tracing::Span| {
                info!(
                    "📤 Finished in {:?} with status {}",
                    latency,
                    response.status()
                );
            },
        );

    let app = create_app(state).layer(trace_layer);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("✅ Server is running on port {}", config.port);
    info!("📖 Swagger UI documentation: http://localhost:{}/swagger-ui", config.port);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            let _ = shutdown_tx.send(true);
        })
        .await?;

    info!("🛑 Server shut down gracefully.");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("⌨️  Ctrl+C received, starting graceful shutdown...");
        },
        _ = terminate => {
            info!("💤 SIGTERM received, starting graceful shutdown...");
        },
    }
}
