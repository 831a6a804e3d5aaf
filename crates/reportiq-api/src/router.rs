//! Route table and middleware stack.
//!
//! One shared resource router is mounted twice, under `/api` and at the
//! root, so both path forms the dashboard historically used keep working.
//! Rate limiting covers only the upload and query routes.

use axum::http::{header, HeaderName, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post, put};
use axum::{extract::State, Json, Router};
use serde_json::json;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{
    MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::handlers::{
    actions, chat, embedding, insights, kpi, notifications, query, settings, summary, system,
    trend, upload,
};
use crate::state::AppState;

/// Generates time-ordered UUIDv7 request correlation IDs.
#[derive(Clone, Default)]
struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string().parse().ok()?;
        Some(RequestId::new(id))
    }
}

/// Routes shared by the `/api` mount and the bare aliases.
fn resource_routes(state: &AppState) -> Router<AppState> {
    let rate_limited = Router::new()
        .route("/upload", post(upload::upload_report))
        .route("/query", post(query::run_query))
        .route("/query/batch", post(query::run_batch))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ));

    Router::new()
        .merge(rate_limited)
        .route("/upload/status", get(upload::status))
        .route("/summary/:report_id", get(summary::get_summary))
        .route("/summary/regenerate/:report_id", post(summary::regenerate_summary))
        .route("/summary/status", get(summary::status))
        .route("/kpi/:report_id", get(kpi::get_kpi))
        .route("/kpi/compare", post(kpi::compare_kpi))
        .route("/kpi/status", get(kpi::status))
        .route("/trend/:report_id", get(trend::get_trend))
        .route("/trend/forecast/:report_id", post(trend::forecast))
        .route("/trend/status", get(trend::status))
        .route("/query/suggestions", get(query::suggestions))
        .route("/query/status", get(query::status))
        .route("/insights/:report_id", get(insights::get_insights))
        .route("/insights/:report_id/categories", get(insights::categories))
        .route("/insights/status", get(insights::status))
        .route("/actions/:report_id", get(actions::get_actions))
        .route("/actions/status", get(actions::status))
        .route("/embedding-status", get(embedding::embedding_status))
        .route("/embedding/status", get(embedding::raw_status))
        // Historical alias for the dashboard
        .route("/status", get(embedding::embedding_status))
        .route("/chat", post(chat::chat))
        .route("/chat/status", get(chat::status))
        .route(
            "/notifications",
            get(notifications::list).post(notifications::create),
        )
        .route("/notifications/status", get(notifications::status))
        .route("/notifications/read-all", put(notifications::mark_all_read))
        .route("/notifications/:id/read", put(notifications::mark_read))
        .route("/notifications/:id", delete(notifications::delete))
        .route(
            "/settings",
            get(settings::get_settings).put(settings::update_settings),
        )
        .route("/settings/reset", post(settings::reset_settings))
        .route("/settings/export", get(settings::export_settings))
        .route("/settings/import", post(settings::import_settings))
        .route("/settings/status", get(settings::status))
}

/// Build the full application router with the middleware stack applied.
pub fn build_router(state: AppState) -> Router {
    // Multipart bodies carry base64-free binary, leave headroom over the
    // configured file cap
    let body_limit = (state.config.max_file_size as usize).saturating_add(1024 * 1024);

    Router::new()
        .route("/health", get(system::health))
        .route("/", get(system::root))
        .nest("/api", resource_routes(&state))
        .merge(resource_routes(&state))
        .fallback(system::not_found)
        .layer(CatchPanicLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
        .layer(
            CorsLayer::new()
                .allow_origin(AllowOrigin::mirror_request())
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers([
                    header::AUTHORIZATION,
                    header::CONTENT_TYPE,
                    HeaderName::from_static("x-request-id"),
                ])
                .allow_credentials(true),
        )
        .layer(RequestBodyLimitLayer::new(body_limit))
        .with_state(state)
}

async fn rate_limit_middleware(
    State(state): State<AppState>,
    request: axum::extract::Request,
    next: axum::middleware::Next,
) -> Result<Response, (StatusCode, Json<serde_json::Value>)> {
    if let Some(limiter) = &state.rate_limiter {
        if limiter.check().is_err() {
            tracing::warn!("Rate limit exceeded");
            return Err((
                StatusCode::TOO_MANY_REQUESTS,
                Json(json!({
                    "success": false,
                    "error": true,
                    "message": "Too many requests, please try again later.",
                    "timestamp": chrono::Utc::now().to_rfc3339(),
                })),
            ));
        }
    }
    Ok(next.run(request).await.into_response())
}
