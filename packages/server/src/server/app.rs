//! Application setup and router configuration.

use std::sync::Arc;

use axum::{
    extract::Extension,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        Method,
    },
    middleware,
    routing::{get, patch, post},
    Router,
};
use sqlx::PgPool;
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::domains::auth::JwtService;
use crate::kernel::BaseAI;
use crate::server::middleware::jwt_auth_middleware;
use crate::server::routes::{
    analytics::{
        category_analytics, compute_snapshot, county_analytics, dashboard_stats, list_snapshots,
        trends_analytics,
    },
    geography::{list_constituencies, list_counties, list_wards},
    health::health_handler,
    issues::{
        add_image, categorize_issue, create_issue, delete_issue, get_issue, list_issues,
        my_issues, update_issue, vote_issue,
    },
    moderation::{add_note, add_response, add_update, update_status},
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub jwt_service: Arc<JwtService>,
    /// None disables classification; issue creation proceeds unclassified.
    pub ai: Option<Arc<dyn BaseAI>>,
}

/// Build the Axum application router.
///
/// `rate_limit_enabled` exists so tests can drive the router without
/// tripping the per-IP limiter.
pub fn build_app(
    pool: PgPool,
    jwt_service: Arc<JwtService>,
    ai: Option<Arc<dyn BaseAI>>,
    rate_limit_enabled: bool,
) -> Router {
    let app_state = AppState {
        db_pool: pool,
        jwt_service: jwt_service.clone(),
        ai,
    };

    let mut api = Router::new()
        // Issues (literal segments registered alongside /:id; the router
        // prefers static matches)
        .route("/issues", get(list_issues).post(create_issue))
        .route("/issues/my-issues", get(my_issues))
        .route("/issues/categorize", post(categorize_issue))
        .route(
            "/issues/:id",
            get(get_issue)
                .put(update_issue)
                .patch(update_issue)
                .delete(delete_issue),
        )
        .route("/issues/:id/vote", post(vote_issue))
        .route("/issues/:id/response", post(add_response))
        .route("/issues/:id/note", post(add_note))
        .route("/issues/:id/updates", post(add_update))
        .route("/issues/:id/images", post(add_image))
        .route("/issues/:id/status", patch(update_status))
        // Analytics (read-only except the snapshot rollup)
        .route("/analytics/dashboard", get(dashboard_stats))
        .route("/analytics/counties", get(county_analytics))
        .route("/analytics/categories", get(category_analytics))
        .route("/analytics/trends", get(trends_analytics))
        .route(
            "/analytics/snapshots",
            get(list_snapshots).post(compute_snapshot),
        )
        // Reference data
        .route("/counties", get(list_counties))
        .route("/constituencies", get(list_constituencies))
        .route("/wards", get(list_wards));

    if rate_limit_enabled {
        // 10 requests per second per IP with bursts up to 20
        let rate_limit_config = Arc::new(
            GovernorConfigBuilder::default()
                .per_second(10)
                .burst_size(20)
                .use_headers()
                .finish()
                .expect("Rate limiter configuration is valid and should never fail"),
        );
        api = api.layer(GovernorLayer {
            config: rate_limit_config,
        });
    }

    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE]);

    let jwt_service_for_middleware = jwt_service.clone();

    Router::new()
        // Health check (no rate limit)
        .route("/health", get(health_handler))
        .nest("/api", api)
        // Middleware layers (applied in reverse order - last added runs first)
        .layer(middleware::from_fn(move |req, next| {
            jwt_auth_middleware(jwt_service_for_middleware.clone(), req, next)
        }))
        .layer(Extension(app_state))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
