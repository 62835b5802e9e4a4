//! HTTP application wiring: shared state, router composition and the server loop.
use anyhow::Context;
use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use std::any::Any;
use std::sync::Arc;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::auth::{JwtSessionResolver, ProfileRoleLookup};
use crate::config::{AppConfig, SecurityConfig, StoreBackend};
use crate::database::{MemoryRecordStore, PgRecordStore, RecordStore};
use crate::error::ApiError;
use crate::handlers::{outlet_products, outlets, products, system};
use crate::middleware::{admin_only, AuthorizationGate};

/// State injected into every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RecordStore>,
    pub gate: AuthorizationGate,
}

impl AppState {
    pub fn new(store: Arc<dyn RecordStore>, gate: AuthorizationGate) -> Self {
        Self { store, gate }
    }

    /// JWT sessions and profile-backed roles over `store`.
    pub fn from_config(store: Arc<dyn RecordStore>, config: &AppConfig) -> anyhow::Result<Self> {
        let sessions = JwtSessionResolver::new(&config.auth).context("invalid session configuration")?;
        let roles = ProfileRoleLookup::new(store.clone());
        Ok(Self::new(store, AuthorizationGate::new(Arc::new(sessions), Arc::new(roles))))
    }
}

pub fn build_router(state: AppState, config: &AppConfig) -> Router {
    let mut router = Router::new()
        .route("/", get(system::root))
        .route("/health", get(system::health))
        .merge(admin_routes(state.gate.clone()))
        .fallback(system::route_not_found)
        .layer(DefaultBodyLimit::max(config.api.max_request_size_bytes))
        .layer(CatchPanicLayer::custom(panic_response));

    if config.security.enable_cors {
        router = router.layer(cors_layer(&config.security));
    }
    if config.api.enable_request_logging {
        router = router.layer(TraceLayer::new_for_http());
    }

    router.with_state(state)
}

/// Admin resources. Unsupported methods answer like unknown routes, after the gate.
fn admin_routes(gate: AuthorizationGate) -> Router<AppState> {
    Router::new()
        .route(
            "/api/admin/outlets",
            get(outlets::list).post(outlets::create).fallback(system::route_not_found),
        )
        .route(
            "/api/admin/outlets/:id",
            get(outlets::show)
                .put(outlets::update)
                .delete(outlets::delete)
                .fallback(system::route_not_found),
        )
        .route(
            "/api/admin/products",
            get(products::list).post(products::create).fallback(system::route_not_found),
        )
        .route(
            "/api/admin/products/:id",
            get(products::show)
                .put(products::update)
                .delete(products::delete)
                .fallback(system::route_not_found),
        )
        .route(
            "/api/admin/outlet-products",
            get(outlet_products::list)
                .post(outlet_products::create)
                .fallback(system::route_not_found),
        )
        .route(
            "/api/admin/outlet-products/:id",
            get(outlet_products::show)
                .put(outlet_products::update)
                .delete(outlet_products::delete)
                .fallback(system::route_not_found),
        )
        .route_layer(middleware::from_fn_with_state(gate, admin_only))
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    let origins = if security.cors_origins.iter().any(|origin| origin == "*") {
        AllowOrigin::any()
    } else {
        let parsed: Vec<HeaderValue> = security
            .cors_origins
            .iter()
            .filter_map(|origin| match HeaderValue::from_str(origin) {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                    None
                }
            })
            .collect();
        AllowOrigin::list(parsed)
    };

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}

fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!("Handler panicked: {}", detail);
    ApiError::Unexpected.into_response()
}

/// Builds the configured record store.
pub async fn build_store(config: &AppConfig) -> anyhow::Result<Arc<dyn RecordStore>> {
    match config.store.backend {
        StoreBackend::Postgres => {
            let store = PgRecordStore::connect(&config.database)
                .await
                .context("failed to connect to the record store")?;
            Ok(Arc::new(store))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using the in-memory record store; data is lost on restart");
            let store = MemoryRecordStore::new();
            if let Some(admin_id) = config.store.seed_admin_id {
                store.seed_profile(admin_id, Some(crate::middleware::ADMIN_ROLE)).await?;
                tracing::info!("Seeded admin profile for user {}", admin_id);
            }
            Ok(Arc::new(store))
        }
    }
}

/// Runs the HTTP server until Ctrl-C.
pub async fn serve(config: &AppConfig) -> anyhow::Result<()> {
    config.validate()?;

    let store = build_store(config).await?;
    let state = AppState::from_config(store, config)?;
    let app = build_router(state, config);

    let bind_addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;

    tracing::info!(
        "Pukk admin API listening on http://{} ({:?}, {:?} store)",
        bind_addr,
        config.environment,
        config.store.backend
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}
