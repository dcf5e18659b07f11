use std::sync::Arc;

use axum::{
    http::{header::HeaderName, HeaderValue, Method},
    middleware::from_fn,
    routing::{get, post, put},
    Json, Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;

use crate::app_state::AppState;

pub mod chain_api;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod swap_api;
pub mod wallet_api;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "ArcFX API",
        version = "0.1.0",
        description = "Cross-chain stablecoin swap console"
    ),
    paths(
        handlers::api_health,
        handlers::api_errors,
        chain_api::list_chains,
        wallet_api::connect_wallet,
        wallet_api::refresh_balance,
        swap_api::get_state,
        swap_api::update_form,
        swap_api::flip_chains,
        swap_api::get_fee,
        swap_api::get_bridge,
        swap_api::submit_swap,
    ),
    components(schemas(
        handlers::HealthResponse,
        handlers::ErrorCatalogEntry,
        chain_api::ChainDto,
        chain_api::TokenDto,
        swap_api::UpdateFormRequest,
    )),
    tags(
        (name = "wallet", description = "钱包连接与余额"),
        (name = "swap", description = "兑换表单、费用与提交"),
    )
)]
pub struct ApiDoc;

pub fn routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(handlers::api_health))
        .route("/api/v1/errors", get(handlers::api_errors))
        .route(
            "/api/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        )
        .route("/api/v1/chains", get(chain_api::list_chains))
        .route("/api/v1/state", get(swap_api::get_state))
        .route("/api/v1/wallet/connect", post(wallet_api::connect_wallet))
        .route("/api/v1/balance/refresh", post(wallet_api::refresh_balance))
        .route("/api/v1/form", put(swap_api::update_form))
        .route("/api/v1/form/flip", post(swap_api::flip_chains))
        .route("/api/v1/fee", get(swap_api::get_fee))
        .route("/api/v1/bridge", get(swap_api::get_bridge))
        .route("/api/v1/swap", post(swap_api::submit_swap))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(from_fn(middleware::trace_id_middleware))
                .layer(cors_layer())
                .layer(from_fn(middleware::add_security_headers))
                .layer(from_fn(middleware::add_response_time_header))
                .layer(from_fn(middleware::request_log)),
        )
}

/// CORS_ALLOW_ORIGINS: 逗号分隔的来源列表，或 "*"
fn cors_layer() -> CorsLayer {
    let allow_origins = std::env::var("CORS_ALLOW_ORIGINS")
        .unwrap_or_else(|_| "http://localhost:3000,http://127.0.0.1:3000".into());

    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers(Any)
        .expose_headers([HeaderName::from_static("x-trace-id")]);

    if allow_origins.trim() == "*" {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = allow_origins
        .split(',')
        .filter_map(|o| HeaderValue::from_str(o.trim()).ok())
        .collect();
    layer.allow_origin(origins)
}
