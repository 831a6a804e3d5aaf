//! KPI analysis routes.

use axum::extract::{OriginalUri, Path, Query, State};
use axum::Json;
use futures::future::join_all;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::error::{field_problem, ApiError};
use crate::handlers::{map_ai_error, service_status, validate_report_id};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct KpiParams {
    pub format: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CompareRequest {
    #[serde(default, rename = "reportIds")]
    pub report_ids: Vec<String>,
}

const FORMATS: &[&str] = &["detailed", "summary", "chart"];

/// GET /kpi/:reportId?format=detailed|summary|chart
pub async fn get_kpi(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Path(report_id): Path<String>,
    Query(params): Query<KpiParams>,
) -> Result<Json<Value>, ApiError> {
    validate_report_id(&report_id, 1)?;
    let format = params.format.as_deref().unwrap_or("detailed");
    if !FORMATS.contains(&format) {
        return Err(ApiError::invalid_params(vec![field_problem(
            "format",
            "Format must be one of: detailed, summary, chart",
        )]));
    }

    tracing::info!(report_id = %report_id, format = %format, "KPI analysis requested");

    let doc = match state.ai.get_kpi().await {
        Ok(doc) => doc,
        Err(err) => {
            state
                .notifier
                .analysis_error(&report_id, "KPI Analysis", &err.to_string());
            return Err(map_ai_error(
                &state,
                uri.path(),
                "Failed to retrieve KPI analysis",
                err,
            ));
        }
    };

    let kpi = doc.get("kpi").cloned().unwrap_or(doc);
    state.notifier.analysis_success(&report_id, "KPI Analysis");
    Ok(Json(shape_kpi(&kpi, format)))
}

fn shape_kpi(kpi: &Value, format: &str) -> Value {
    let county = kpi
        .get("county_distribution")
        .cloned()
        .unwrap_or_else(|| json!({}));
    match format {
        "summary" => json!({
            "kpi": {
                "total_subscribers": kpi.get("total_subscribers").cloned().unwrap_or(json!(0)),
                "top_counties": top_counties(&county, 3),
            }
        }),
        "chart" => json!({
            "kpi": kpi,
            "charts": {
                "county_distribution": county,
                "domestic_foreign_distribution": kpi
                    .get("domestic_foreign_distribution")
                    .cloned()
                    .unwrap_or_else(|| json!({})),
            }
        }),
        _ => json!({
            "kpi": {
                "total_subscribers": kpi.get("total_subscribers").cloned().unwrap_or(json!(0)),
                "county_distribution": county,
                "domestic_foreign_distribution": kpi
                    .get("domestic_foreign_distribution")
                    .cloned()
                    .unwrap_or_else(|| json!({})),
            }
        }),
    }
}

/// Top-N entries of a count map, descending by value.
fn top_counties(distribution: &Value, n: usize) -> Value {
    let mut entries: Vec<(String, f64)> = distribution
        .as_object()
        .map(|obj| {
            obj.iter()
                .map(|(key, value)| (key.clone(), value.as_f64().unwrap_or(0.0)))
                .collect()
        })
        .unwrap_or_default();
    entries.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    let mut top = Map::new();
    for (key, _) in entries.into_iter().take(n) {
        if let Some(value) = distribution.get(&key) {
            top.insert(key, value.clone());
        }
    }
    Value::Object(top)
}

/// POST /kpi/compare
///
/// Fetches KPIs for every requested report concurrently. A failing report is
/// recorded with its error instead of aborting the comparison.
pub async fn compare_kpi(
    State(state): State<AppState>,
    Json(request): Json<CompareRequest>,
) -> Result<Json<Value>, ApiError> {
    if request.report_ids.len() < 2 {
        return Err(ApiError::bad_request(
            "At least 2 report IDs are required",
            Some(json!("reportIds must be an array of report identifiers")),
        ));
    }

    tracing::info!(count = request.report_ids.len(), "KPI comparison requested");

    let fetches = request.report_ids.iter().map(|_| state.ai.get_kpi());
    let results = join_all(fetches).await;

    let reports: Vec<Value> = request
        .report_ids
        .iter()
        .zip(results)
        .map(|(id, result)| match result {
            Ok(doc) => json!({
                "reportId": id,
                "kpis": doc.get("kpis").cloned().unwrap_or_else(|| json!([])),
                "kpi": doc.get("kpi").cloned().unwrap_or(doc),
            }),
            Err(err) => json!({ "reportId": id, "error": err.to_string() }),
        })
        .collect();

    let common_metrics = common_metric_names(&reports);

    Ok(Json(json!({
        "success": true,
        "message": "KPI comparison completed",
        "data": {
            "reportIds": request.report_ids,
            "comparedAt": chrono::Utc::now().to_rfc3339(),
            "reports": reports,
            "commonMetrics": common_metrics,
            "insights": [],
        }
    })))
}

/// KPI names present in every successfully fetched report.
fn common_metric_names(reports: &[Value]) -> Vec<String> {
    let name_sets: Vec<Vec<String>> = reports
        .iter()
        .filter(|report| report.get("error").is_none())
        .map(|report| {
            report["kpis"]
                .as_array()
                .map(|kpis| {
                    kpis.iter()
                        .filter_map(|kpi| kpi.get("name").and_then(Value::as_str))
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default()
        })
        .collect();

    let Some(first) = name_sets.first() else {
        return Vec::new();
    };
    first
        .iter()
        .filter(|name| name_sets.iter().all(|set| set.contains(name)))
        .cloned()
        .collect()
}

/// GET /kpi/status
pub async fn status(State(state): State<AppState>) -> Json<Value> {
    let mut payload = service_status(
        &state,
        "kpi",
        &[
            "KPI extraction and analysis",
            "Performance metrics calculation",
            "Multi-report comparison",
            "Custom formatting (detailed, summary, chart)",
        ],
    )
    .await;
    payload.0["supportedFormats"] = json!(FORMATS);
    payload
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_top_counties_sorted_and_capped() {
        let dist = json!({ "Dublin": 120, "Cork": 80, "Galway": 95, "Sligo": 10 });
        let top = top_counties(&dist, 3);
        let keys: Vec<&String> = top.as_object().unwrap().keys().collect();
        assert_eq!(keys, ["Dublin", "Galway", "Cork"]);
    }

    #[test]
    fn test_top_counties_serializes_in_descending_order() {
        // Alphabetical input must come back ordered by count, not by key.
        let dist = json!({ "Cork": 80, "Dublin": 120, "Galway": 95 });
        let text = serde_json::to_string(&top_counties(&dist, 3)).unwrap();
        let dublin = text.find("Dublin").unwrap();
        let galway = text.find("Galway").unwrap();
        let cork = text.find("Cork").unwrap();
        assert!(dublin < galway);
        assert!(galway < cork);
    }

    #[test]
    fn test_shape_summary_format() {
        let kpi = json!({
            "total_subscribers": 305,
            "county_distribution": { "Dublin": 120, "Cork": 80, "Galway": 95, "Sligo": 10 },
        });
        let shaped = shape_kpi(&kpi, "summary");
        assert_eq!(shaped["kpi"]["total_subscribers"], 305);
        assert!(shaped["kpi"]["top_counties"].get("Sligo").is_none());
    }

    #[test]
    fn test_shape_chart_format_adds_chart_objects() {
        let kpi = json!({
            "total_subscribers": 1,
            "county_distribution": { "Dublin": 1 },
            "domestic_foreign_distribution": { "domestic": 1 },
        });
        let shaped = shape_kpi(&kpi, "chart");
        assert_eq!(shaped["charts"]["county_distribution"]["Dublin"], 1);
        assert_eq!(shaped["charts"]["domestic_foreign_distribution"]["domestic"], 1);
    }

    #[test]
    fn test_common_metrics_intersection() {
        let reports = vec![
            json!({ "reportId": "a", "kpis": [ { "name": "growth" }, { "name": "churn" } ] }),
            json!({ "reportId": "b", "kpis": [ { "name": "churn" } ] }),
            json!({ "reportId": "c", "error": "unavailable" }),
        ];
        assert_eq!(common_metric_names(&reports), vec!["churn".to_string()]);
    }
}
