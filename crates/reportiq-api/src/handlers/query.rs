//! Natural-language query routes.

use axum::extract::{OriginalUri, Query, State};
use axum::Json;
use futures::future::join_all;
use serde::Deserialize;
use serde_json::{json, Value};

use reportiq_core::defaults;

use crate::error::{field_problem, ApiError};
use crate::handlers::{map_ai_error, service_status};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    #[serde(default)]
    pub query: String,
    pub report_id: Option<String>,
    pub context: Option<Value>,
    pub language: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct BatchItem {
    #[serde(default)]
    pub query: String,
    pub report_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct BatchRequest {
    #[serde(default)]
    pub queries: Vec<BatchItem>,
    pub report_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SuggestionParams {
    pub report_id: Option<String>,
    pub category: Option<String>,
}

fn validate_query_text(text: &str, field: &str) -> Option<Value> {
    let chars = text.chars().count();
    if text.trim().is_empty() {
        Some(field_problem(field, "Query is required"))
    } else if chars < defaults::MIN_QUERY_LEN || chars > defaults::MAX_QUERY_LEN {
        Some(field_problem(
            field,
            "Query must be between 3 and 1000 characters",
        ))
    } else {
        None
    }
}

/// POST /query
pub async fn run_query(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Json(request): Json<QueryRequest>,
) -> Result<Json<Value>, ApiError> {
    let mut problems = Vec::new();
    if let Some(problem) = validate_query_text(&request.query, "query") {
        problems.push(problem);
    }
    if let Some(report_id) = &request.report_id {
        if report_id.is_empty() || report_id.len() > defaults::MAX_REPORT_ID_LEN {
            problems.push(field_problem("report_id", "Invalid Report ID format"));
        }
    }
    if !problems.is_empty() {
        return Err(ApiError::invalid_params(problems));
    }

    let language = request.language.as_deref().unwrap_or("en");
    tracing::info!(
        query_len = request.query.len(),
        report_id = ?request.report_id,
        "Natural language query received"
    );

    let doc = state
        .ai
        .query(&request.query, request.report_id.as_deref())
        .await
        .map_err(|err| map_ai_error(&state, uri.path(), "Failed to process query", err))?;

    let mut formatted = json!({
        "query": request.query,
        "reportId": request.report_id,
        "language": language,
        "answeredAt": chrono::Utc::now().to_rfc3339(),
        "answer": doc.get("answer")
            .or_else(|| doc.get("response"))
            .cloned()
            .unwrap_or_else(|| doc.clone()),
        "confidence": doc.get("confidence").cloned().unwrap_or(json!(0.9)),
        "responseType": doc.get("type").cloned().unwrap_or(json!("text")),
        "data": doc.get("data").cloned().unwrap_or(Value::Null),
        "visualizations": doc.get("visualizations").cloned().unwrap_or_else(|| json!([])),
        "relatedQuestions": doc.get("relatedQuestions").cloned().unwrap_or_else(|| json!([])),
        "sources": doc.get("sources").cloned().unwrap_or_else(|| json!([])),
        "processingTime": doc.get("processingTime").cloned().unwrap_or(Value::Null),
    });
    if let Some(context) = request.context {
        formatted["context"] = context;
    }

    Ok(Json(json!({
        "success": true,
        "message": "Query processed successfully",
        "data": formatted,
    })))
}

/// POST /query/batch
///
/// Items run concurrently; a failing item is reported in its slot and never
/// aborts the batch.
pub async fn run_batch(
    State(state): State<AppState>,
    Json(request): Json<BatchRequest>,
) -> Result<Json<Value>, ApiError> {
    let mut problems = Vec::new();
    if request.queries.len() < defaults::MIN_BATCH_QUERIES
        || request.queries.len() > defaults::MAX_BATCH_QUERIES
    {
        problems.push(field_problem("queries", "Between 1 and 10 queries allowed"));
    }
    for (index, item) in request.queries.iter().enumerate() {
        if let Some(problem) =
            validate_query_text(&item.query, &format!("queries[{}].query", index))
        {
            problems.push(problem);
        }
    }
    if !problems.is_empty() {
        return Err(ApiError::invalid_params(problems));
    }

    tracing::info!(count = request.queries.len(), "Batch query received");

    let fetches = request.queries.iter().map(|item| {
        let report_id = item.report_id.as_deref().or(request.report_id.as_deref());
        state.ai.query(&item.query, report_id)
    });
    let outcomes = join_all(fetches).await;

    let results: Vec<Value> = request
        .queries
        .iter()
        .zip(outcomes)
        .enumerate()
        .map(|(index, (item, outcome))| match outcome {
            Ok(doc) => json!({
                "index": index,
                "query": item.query,
                "success": true,
                "answer": doc.get("answer")
                    .or_else(|| doc.get("response"))
                    .cloned()
                    .unwrap_or(doc.clone()),
                "confidence": doc.get("confidence").cloned().unwrap_or(Value::Null),
                "processingTime": doc.get("processingTime").cloned().unwrap_or(Value::Null),
            }),
            Err(err) => json!({
                "index": index,
                "query": item.query,
                "success": false,
                "error": err.to_string(),
            }),
        })
        .collect();

    let successful = results
        .iter()
        .filter(|result| result["success"] == json!(true))
        .count();

    Ok(Json(json!({
        "success": true,
        "message": "Batch queries processed",
        "data": {
            "totalQueries": request.queries.len(),
            "successfulQueries": successful,
            "failedQueries": request.queries.len() - successful,
            "processedAt": chrono::Utc::now().to_rfc3339(),
            "results": results,
        }
    })))
}

/// GET /query/suggestions?category=...
pub async fn suggestions(Query(params): Query<SuggestionParams>) -> Json<Value> {
    let catalog = [
        (
            "general",
            vec![
                "What are the main findings in this report?",
                "Which KPIs matter most?",
                "How is overall performance?",
                "What trends stand out?",
            ],
        ),
        (
            "financial",
            vec![
                "How are revenue trends developing?",
                "What does the cost analysis show?",
                "What are the profitability ratios?",
                "How is budget performance?",
            ],
        ),
        (
            "marketing",
            vec![
                "How is customer segmentation structured?",
                "How did campaigns perform?",
                "What are the conversion rates?",
                "How satisfied are customers?",
            ],
        ),
        (
            "operational",
            vec![
                "How efficient are operations?",
                "How are processes performing?",
                "What are the quality metrics?",
                "What does the time analysis show?",
            ],
        ),
    ];

    let category = params.category.as_deref().unwrap_or("general");
    let selected = catalog
        .iter()
        .find(|(name, _)| *name == category)
        .or_else(|| catalog.first())
        .map(|(_, items)| items.clone())
        .unwrap_or_default();

    Json(json!({
        "success": true,
        "message": "Query suggestions",
        "data": {
            "category": if catalog.iter().any(|(name, _)| *name == category) {
                category
            } else {
                "general"
            },
            "reportId": params.report_id,
            "suggestions": selected,
            "availableCategories": catalog.iter().map(|(name, _)| *name).collect::<Vec<_>>(),
        }
    }))
}

/// GET /query/status
pub async fn status(State(state): State<AppState>) -> Json<Value> {
    let mut payload = service_status(
        &state,
        "query",
        &[
            "Natural language processing",
            "Context-aware responses",
            "Batch query processing",
            "Query suggestions",
        ],
    )
    .await;
    payload.0["limits"] = json!({
        "maxQueryLength": defaults::MAX_QUERY_LEN,
        "maxBatchSize": defaults::MAX_BATCH_QUERIES,
    });
    payload
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_text_bounds() {
        assert!(validate_query_text("", "query").is_some());
        assert!(validate_query_text("ab", "query").is_some());
        assert!(validate_query_text("abc", "query").is_none());
        assert!(validate_query_text(&"x".repeat(1001), "query").is_some());
    }

    #[test]
    fn test_query_text_counts_characters_not_bytes() {
        // 600 characters but 1800 bytes: still within the 1000-character cap
        assert!(validate_query_text(&"値".repeat(600), "query").is_none());
        assert!(validate_query_text(&"値".repeat(1001), "query").is_some());
    }
}
