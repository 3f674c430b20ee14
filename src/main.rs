//! Embeddable assistant
//!
//! Serves a chat page backed by a hosted assistant. Each request reruns the
//! page against the caller's session.

mod api;
mod assistant;
mod bridge;
mod config;
mod session;
mod state_machine;

use api::{create_router, AppState};
use assistant::{LoggingService, OpenAIAssistants};
use bridge::ConversationBridge;
use config::{Config, QuickReply};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower_http::{compression::CompressionLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Quick replies offered under the conversation
fn quick_replies() -> Vec<QuickReply> {
    vec![
        QuickReply::new(
            "📖 Ask me to check the manual",
            "Carefully check the troubleshooting guide, then other technical documentation. Revise your answer.",
        ),
        QuickReply::new(
            "📊 Ask me to recheck the result table",
            "Check the results table for those values and revise your answer.",
        ),
    ]
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "embeddable_assistant=info,tower_http=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    // Configuration
    let config = Config::from_env()?;
    let service = OpenAIAssistants::new(&config.api_key, &config.base_url)?;
    tracing::info!(base_url = %config.base_url, "Assistant service configured");

    let shutdown = CancellationToken::new();
    let bridge = ConversationBridge::connect(
        LoggingService::new(Arc::new(service)),
        config.bridge.with_buttons(quick_replies()),
    )
    .await?
    .with_cancellation(shutdown.clone());

    let compression = CompressionLayer::new()
        .gzip(true)
        .br(true)
        .deflate(true)
        .zstd(true);

    let app = create_router(AppState::new(bridge, config.session_idle))
        .layer(TraceLayer::new_for_http())
        .layer(compression);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Assistant page listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Shutting down");
            }
            // Ends any exchange still waiting on a run
            shutdown.cancel();
        })
        .await?;

    Ok(())
}
