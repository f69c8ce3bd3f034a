//! HTTP routes for the Casting Service.
//!
//! Defines the Axum router and application state.

use crate::auth::permissions::{
    DELETE_ACTORS, DELETE_MOVIES, GET_ACTOR, GET_ACTORS, GET_MOVIE, GET_MOVIES, PATCH_ACTORS,
    PATCH_MOVIES, POST_ACTORS, POST_MOVIES,
};
use crate::auth::{JwksClient, JwtValidator};
use crate::config::Config;
use crate::handlers;
use crate::middleware::{http_metrics_middleware, require_permission, AuthState, PermissionGuard};
use crate::repositories::CastingStore;
use axum::{
    http::{header, Method},
    middleware,
    routing::{delete, get, patch, post, MethodRouter},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

pub use crate::observability::metrics::init_metrics_recorder;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Actor and movie records.
    pub store: Arc<dyn CastingStore>,

    /// Service configuration.
    pub config: Config,
}

/// Wrap one method route in the authorization gate for `permission`.
fn guarded<S>(route: MethodRouter<S>, auth: &AuthState, permission: &'static str) -> MethodRouter<S>
where
    S: Clone + Send + Sync + 'static,
{
    route.route_layer(middleware::from_fn_with_state(
        PermissionGuard::new(auth.clone(), permission),
        require_permission,
    ))
}

/// Build the application routes.
///
/// Creates an Axum router with:
/// - `/health` - Liveness probe - public
/// - `/ready` - Readiness probe (pings the store) - public
/// - `/metrics` - Prometheus metrics endpoint - public
/// - `/actors`, `/actors/:id` - Actor CRUD, one permission per method
/// - `/movies`, `/movies/:id` - Movie CRUD, one permission per method
/// - Unserved methods on those paths answer 405 with the JSON error body
/// - CORS for browser clients
/// - TraceLayer for request logging
/// - HTTP metrics middleware
/// - 30 second request timeout
pub fn build_routes(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    // Create JWKS client and JWT validator
    let jwks_client = Arc::new(JwksClient::with_settings(
        state.config.jwks_url.clone(),
        Duration::from_secs(state.config.jwks_cache_ttl_seconds),
        Duration::from_secs(state.config.jwks_fetch_timeout_seconds),
    ));
    let jwt_validator = Arc::new(JwtValidator::new(
        jwks_client,
        state.config.api_audience.clone(),
        state.config.jwt_issuer.clone(),
    ));
    let auth = AuthState::new(jwt_validator);

    // Public routes (no authentication required)
    let public_routes = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .with_state(state.clone());

    let metrics_routes = Router::new()
        .route("/metrics", get(handlers::metrics_handler))
        .with_state(metrics_handle);

    // Protected routes: every method carries its own permission
    let protected_routes = Router::new()
        .route(
            "/actors",
            guarded(get(handlers::list_actors), &auth, GET_ACTORS)
                .merge(guarded(post(handlers::create_actor), &auth, POST_ACTORS))
                .fallback(handlers::method_not_allowed),
        )
        .route(
            "/actors/:id",
            guarded(get(handlers::get_actor), &auth, GET_ACTOR)
                .merge(guarded(patch(handlers::update_actor), &auth, PATCH_ACTORS))
                .merge(guarded(delete(handlers::delete_actor), &auth, DELETE_ACTORS))
                .fallback(handlers::method_not_allowed),
        )
        .route(
            "/movies",
            guarded(get(handlers::list_movies), &auth, GET_MOVIES)
                .merge(guarded(post(handlers::create_movie), &auth, POST_MOVIES))
                .fallback(handlers::method_not_allowed),
        )
        .route(
            "/movies/:id",
            guarded(get(handlers::get_movie), &auth, GET_MOVIE)
                .merge(guarded(patch(handlers::update_movie), &auth, PATCH_MOVIES))
                .merge(guarded(delete(handlers::delete_movie), &auth, DELETE_MOVIES))
                .fallback(handlers::method_not_allowed),
        )
        .with_state(state);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ]);

    // Layer order (bottom-to-top execution):
    // 1. TimeoutLayer - Timeout the request (innermost)
    // 2. TraceLayer - Log request details
    // 3. CorsLayer - Answer preflights before auth runs
    // 4. http_metrics_middleware - Record ALL responses (outermost)
    public_routes
        .merge(metrics_routes)
        .merge(protected_routes)
        .fallback(handlers::not_found)
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(middleware::from_fn(http_metrics_middleware))
}
