// Main entry point - Dependency injection and server setup
use std::{net::SocketAddr, sync::Arc, time::Duration};

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use neocare360::application::client_store::{ClientStore, AUTH_TOKEN_KEY};
use neocare360::application::local_cache::LocalCache;
use neocare360::application::realtime::RealtimeFeed;
use neocare360::application::request_executor::RequestExecutor;
use neocare360::application::retry::RetryPolicy;
use neocare360::domain::facility::DashboardFilters;
use neocare360::domain::permissions::{derive_permissions, Role};
use neocare360::infrastructure::config::{load_app_config, ApiMode};
use neocare360::infrastructure::file_store::FileStore;
use neocare360::infrastructure::http_executor::HttpExecutor;
use neocare360::infrastructure::mock_executor::MockExecutor;
use neocare360::infrastructure::websocket::WebSocketChannel;
use neocare360::presentation::app_state::AppState;
use neocare360::presentation::handlers::{
    export_endpoint, get_dashboard, health_check, list_dashboards, permissions, realtime_status,
    refresh_dashboard,
};
use neocare360::presentation::registry::{ViewContext, ViewRegistry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("neocare360=info,tower_http=info")),
        )
        .init();

    // Load configuration
    let config = load_app_config()?;

    // Client state (auth token, facility id, cache entries)
    let store: Arc<dyn ClientStore> = Arc::new(FileStore::open(&config.cache.path));
    if let Some(token) = &config.session.auth_token {
        store.set_item(AUTH_TOKEN_KEY, token)?;
    }
    let cache = LocalCache::new(store.clone())
        .with_prefix(config.cache.prefix.clone())
        .with_default_ttl(Duration::from_millis(config.cache.default_ttl_ms));

    // Request executor (infrastructure layer)
    let executor: Arc<dyn RequestExecutor> = match config.api.mode {
        ApiMode::Live => Arc::new(HttpExecutor::new(
            &config.api.base_url,
            Duration::from_millis(config.api.timeout_ms),
            store.clone(),
        )?),
        ApiMode::Mock => {
            tracing::info!("Serving inline mock data");
            Arc::new(MockExecutor::new())
        }
    };

    // Session permissions, resolved once
    let role: Role = config.session.role.parse()?;
    let capabilities = derive_permissions(role);
    tracing::info!(%role, "Session permissions resolved");

    // Mount the views this session may see (application layer)
    let filters = DashboardFilters {
        facility: config.session.facility.clone(),
        scope: config.session.scope,
        timeframe: config.session.timeframe.clone(),
        period: config.session.period.clone(),
        ..DashboardFilters::default()
    };
    let registry = ViewRegistry::standard();
    let ctx = ViewContext {
        executor: executor.clone(),
        filters,
    };
    let views = registry.mount_permitted(&ctx, &capabilities);
    tracing::info!(views = views.len(), "Dashboard views mounted");

    // Optional push updates; the first connection attempt is retried
    let realtime = if config.realtime.enabled && config.api.mode == ApiMode::Live {
        let channel = &WebSocketChannel::new(&config.api.base_url, store.clone());
        let endpoint = config.realtime.endpoint.as_deref();
        let retry = RetryPolicy::new(
            config.retry.max_attempts,
            Duration::from_millis(config.retry.delay_ms),
        );
        match retry
            .execute(move || RealtimeFeed::subscribe(channel, endpoint))
            .await
        {
            Ok(feed) => Some(feed),
            Err(e) => {
                tracing::warn!("Realtime updates unavailable: {}", e);
                None
            }
        }
    } else {
        None
    };

    // Create application state
    let state = Arc::new(AppState {
        role,
        capabilities,
        views,
        executor,
        cache,
        realtime,
    });

    // Build router (presentation layer)
    let router = Router::new()
        .route("/healthz", get(health_check))
        .route("/permissions", get(permissions))
        .route("/dashboards", get(list_dashboards))
        .route("/dashboards/:name", get(get_dashboard))
        .route("/dashboards/:name/refresh", post(refresh_dashboard))
        .route("/export/*endpoint", get(export_endpoint))
        .route("/realtime", get(realtime_status))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr: SocketAddr = config.server.bind.parse()?;
    tracing::info!("Starting neocare360 service on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down");
        })
        .await?;

    Ok(())
}
