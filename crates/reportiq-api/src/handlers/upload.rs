//! Report upload route.
//!
//! The file is persisted locally, forwarded to the AI service as multipart,
//! and only removed again when the forward fails. Successful uploads reset
//! the embedding readiness latch and start the background status poller for
//! the new analysis run.

use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Multipart, State};
use axum::Json;
use serde_json::{json, Value};

use reportiq_ai::{StatusPoller, UploadFile};
use reportiq_core::{sanitize_filename, stored_file_name};

use crate::error::ApiError;
use crate::handlers::service_status;
use crate::state::AppState;

/// POST /upload
pub async fn upload_report(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    mut multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let mut file: Option<(String, String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ApiError::bad_request("Malformed multipart request", Some(json!(err.to_string()))))?
    {
        match field.name() {
            Some("file") => {
                if file.is_some() {
                    return Err(ApiError::bad_request(
                        "Only one file may be uploaded",
                        Some(json!("Multiple file fields received")),
                    ));
                }
                let filename = sanitize_filename(field.file_name().unwrap_or("unnamed_file"));
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field.bytes().await.map_err(|err| {
                    ApiError::bad_request("File could not be read", Some(json!(err.to_string())))
                })?;
                file = Some((filename, content_type, data.to_vec()));
            }
            other => {
                return Err(ApiError::bad_request(
                    "Unexpected form field",
                    Some(json!(other.unwrap_or("unnamed"))),
                ));
            }
        }
    }

    let Some((filename, content_type, data)) = file else {
        state
            .notifier
            .file_upload_error("Unknown file", "No file selected");
        return Err(ApiError::bad_request(
            "File upload failed",
            Some(json!("Please select a valid file")),
        ));
    };

    let policy = state.upload_policy();
    if let Err(rejection) = policy.validate(&filename, &data) {
        let message = rejection.message(&policy.allowed_extensions);
        state.notifier.file_upload_error(&filename, &message);
        return Err(ApiError::bad_request(message, None));
    }

    let size = data.len() as u64;
    tracing::info!(
        filename = %filename,
        size_bytes = size,
        content_type = %content_type,
        "File uploaded"
    );

    // Persist locally before forwarding
    let stored_name = stored_file_name(&filename);
    let stored_path = state.config.upload_dir.join(&stored_name);
    tokio::fs::write(&stored_path, &data).await.map_err(|err| {
        tracing::error!(path = %stored_path.display(), error = %err, "Failed to store upload");
        ApiError::internal(format!("Failed to store upload: {err}"))
    })?;

    let uploaded_at = chrono::Utc::now().to_rfc3339();
    let forward = state
        .ai
        .upload_report(UploadFile {
            filename: filename.clone(),
            content_type: content_type.clone(),
            data,
            uploaded_at: uploaded_at.clone(),
            uploaded_by: Some(peer.ip().to_string()),
        })
        .await;

    let doc = match forward {
        Ok(doc) => doc,
        Err(err) => {
            // Local copy is only kept for successfully processed uploads
            if let Err(remove_err) = tokio::fs::remove_file(&stored_path).await {
                tracing::warn!(
                    path = %stored_path.display(),
                    error = %remove_err,
                    "Failed to remove stored upload"
                );
            }
            state.notifier.file_upload_error(&filename, &err.to_string());
            return Err(ApiError::Unavailable {
                message: "File processing failed".to_string(),
                details: Some(json!({
                    "info": "AI service is currently unavailable, please try again later",
                    "uploadInfo": { "filename": filename, "size": size, "type": content_type },
                })),
            });
        }
    };

    let report_id = doc
        .get("reportId")
        .or_else(|| doc.get("id"))
        .and_then(Value::as_str)
        .unwrap_or("unknown")
        .to_string();

    state
        .notifier
        .file_upload_success(&filename, &report_id, size);

    // New analysis run: reopen the readiness question and start polling
    state.gate.reset();
    StatusPoller::spawn(
        state.ai.clone(),
        state.gate.clone(),
        state.config.poll_interval,
    );

    let mut data_out = json!({
        "reportId": report_id,
        "filename": filename,
        "size": size,
        "type": content_type,
        "uploadedAt": uploaded_at,
        "processingStatus": doc.get("status").cloned().unwrap_or(json!("processed")),
    });
    if let (Some(data_obj), Some(doc_obj)) = (data_out.as_object_mut(), doc.as_object()) {
        for (key, value) in doc_obj {
            data_obj.entry(key.clone()).or_insert_with(|| value.clone());
        }
    }

    Ok(Json(json!({
        "success": true,
        "message": "File uploaded and processed",
        "data": data_out,
    })))
}

/// GET /upload/status
pub async fn status(State(state): State<AppState>) -> Json<Value> {
    let mut payload = service_status(
        &state,
        "upload",
        &["Report file upload", "AI-backed processing", "Type and size validation"],
    )
    .await;
    payload.0["configuration"] = json!({
        "maxFileSize": format!("{}MB", state.config.max_file_size / 1024 / 1024),
        "allowedTypes": state.config.allowed_file_types,
        "uploadDir": state.config.upload_dir.display().to_string(),
    });
    payload
}
