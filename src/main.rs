//! User Inactivity - HTTP host for an inactivity-tracked region
//!
//! This is the main entry point for the user-inactivity application.

use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use user_inactivity::{
    api::create_router,
    config::Config,
    state::AppState,
    timer::{BackgroundTimeoutHandler, TimeoutHandler},
    utils::shutdown_signal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("user_inactivity={},tower_http=info", config.log_level()))
        .init();

    info!("Starting user-inactivity v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration: host={}, port={}, timer={}ms, background_timer={}",
          config.host, config.port, config.timer_ms, config.background_timer);

    let inactivity = config.inactivity()?;
    let handler: Option<Arc<dyn TimeoutHandler>> = if config.background_timer {
        Some(Arc::new(BackgroundTimeoutHandler::new()))
    } else {
        None
    };

    let state = Arc::new(AppState::mount(config.port, config.host.clone(), inactivity, handler)?);

    // Log transitions as they are announced
    let mut transitions = state.transition_tx.subscribe();
    tokio::spawn(async move {
        while let Ok(transition) = transitions.recv().await {
            info!("Region {} at {}", if transition.active { "active" } else { "inactive" }, transition.at);
        }
    });

    let app = create_router(Arc::clone(&state));

    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  POST /touch/:phase      - Gesture capture request (start|move|terminate)");
    info!("  POST /keyboard/show     - Keyboard became visible");
    info!("  POST /keyboard/hide     - Keyboard became hidden");
    info!("  POST /activity          - Reset the inactivity timer");
    info!("  POST /inactivity-time   - Change the inactivity time");
    info!("  POST /is-active         - Set the is_active input");
    info!("  GET  /status            - Region state and transitions");
    info!("  GET  /health            - Health check");

    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        result = shutdown_signal() => {
            match result {
                Ok(()) => info!("Shutdown signal received"),
                Err(e) => tracing::error!("Failed to install signal handler: {}", e),
            }
        }
    }

    if let Err(e) = state.unmount() {
        tracing::error!("Failed to unmount region: {}", e);
    }

    info!("Server shutdown complete");
    Ok(())
}
