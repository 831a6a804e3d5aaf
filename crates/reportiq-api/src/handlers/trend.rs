//! Trend analysis routes.

use axum::extract::{OriginalUri, Path, Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use reportiq_core::defaults;

use crate::error::{field_problem, ApiError};
use crate::handlers::{map_ai_error, service_status, validate_report_id};
use crate::state::AppState;

const PERIODS: &[&str] = &["daily", "weekly", "monthly", "quarterly", "yearly"];

#[derive(Debug, Deserialize)]
pub struct TrendParams {
    pub period: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ForecastParams {
    pub periods: Option<u32>,
}

/// GET /trend/:reportId?period=daily|weekly|monthly|quarterly|yearly
pub async fn get_trend(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Path(report_id): Path<String>,
    Query(params): Query<TrendParams>,
) -> Result<Json<Value>, ApiError> {
    validate_report_id(&report_id, 1)?;
    let period = params.period.as_deref().unwrap_or("monthly");
    if !PERIODS.contains(&period) {
        return Err(ApiError::invalid_params(vec![field_problem(
            "period",
            "Period must be one of: daily, weekly, monthly, quarterly, yearly",
        )]));
    }

    tracing::info!(report_id = %report_id, period = %period, "Trend analysis requested");

    match state.ai.get_trend().await {
        Ok(doc) => {
            state.notifier.analysis_success(&report_id, "Trend Analysis");
            let trend = doc.get("trend").cloned().unwrap_or(doc);
            Ok(Json(json!({ "trend": trend })))
        }
        Err(err) => {
            state
                .notifier
                .analysis_error(&report_id, "Trend Analysis", &err.to_string());
            Err(map_ai_error(
                &state,
                uri.path(),
                "Failed to retrieve trend analysis",
                err,
            ))
        }
    }
}

/// POST /trend/forecast/:reportId?periods=N
///
/// The upstream service has no dedicated forecast endpoint; this returns a
/// descriptor built from current trend data.
pub async fn forecast(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Path(report_id): Path<String>,
    Query(params): Query<ForecastParams>,
) -> Result<Json<Value>, ApiError> {
    validate_report_id(&report_id, 1)?;
    let periods = params.periods.unwrap_or(defaults::DEFAULT_FORECAST_PERIODS);
    if !(defaults::MIN_FORECAST_PERIODS..=defaults::MAX_FORECAST_PERIODS).contains(&periods) {
        return Err(ApiError::invalid_params(vec![field_problem(
            "periods",
            "Periods must be between 1 and 24",
        )]));
    }

    tracing::info!(report_id = %report_id, periods = periods, "Trend forecast requested");

    let current = state
        .ai
        .get_trend()
        .await
        .map_err(|err| map_ai_error(&state, uri.path(), "Failed to generate forecast", err))?;

    let based_on = current
        .get("trend")
        .and_then(Value::as_object)
        .map(|trend| trend.len())
        .unwrap_or(0);

    Ok(Json(json!({
        "success": true,
        "message": "Trend forecast generated",
        "data": {
            "reportId": report_id,
            "forecastPeriods": periods,
            "generatedAt": chrono::Utc::now().to_rfc3339(),
            "basedOnData": based_on,
            "predictions": [],
            "confidence": 0.85,
            "methodology": "AI-based trend analysis",
            "assumptions": [
                "Historical patterns continue",
                "No major external disruptions",
                "Current market conditions persist",
            ],
        }
    })))
}

/// GET /trend/status
pub async fn status(State(state): State<AppState>) -> Json<Value> {
    let mut payload = service_status(
        &state,
        "trend",
        &[
            "Historical trend analysis",
            "Pattern recognition",
            "Forecasting and predictions",
            "Multi-period support",
        ],
    )
    .await;
    payload.0["supportedPeriods"] = json!(PERIODS);
    payload
}
