//! HTTP handlers for diagnoses.
//!
//! A diagnosis arrives either as a plain JSON object or as `multipart/form-data` with the
//! questionnaire in a `data` field and the documents in `bizFile` and `creditFile` file parts.

use axum::{
    Json,
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, header},
};
use serde_json::Map;
use tracing::{debug, info};

use super::{parse_json_object, parse_record_id};
use crate::{
    AppState,
    api::models::{SubmitResponse, SuccessResponse},
    errors::{Error, Result},
    multipart,
    notifications::{self, messages},
    storage::{Attachments, Entry, NewSubmission, Submission, UploadSink},
};

const DATA_FIELD: &str = "data";
const BIZ_FILE_FIELD: &str = "bizFile";
const CREDIT_FILE_FIELD: &str = "creditFile";

/// Store a diagnosis, with any attached documents, and notify the operator.
#[tracing::instrument(skip_all)]
pub async fn submit_diagnosis(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<SubmitResponse>> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    let (new, stored_files) = if multipart::is_multipart(content_type) {
        read_multipart(&state.uploads, content_type, &body).await?
    } else {
        (NewSubmission::from_fields(parse_json_object(&body)?), Vec::new())
    };

    let diagnosis = match state.diagnoses.append(new).await {
        Ok(diagnosis) => diagnosis,
        Err(e) => {
            state.uploads.discard(&stored_files).await;
            return Err(e.into());
        }
    };

    info!(
        id = diagnosis.id,
        employee_count = ?diagnosis.field("employeeCount"),
        credit_score = ?diagnosis.field("creditScore"),
        overdue = ?diagnosis.field("overdue"),
        has_biz_file = matches!(diagnosis.biz_file_server, Some(Some(_))),
        has_credit_file = matches!(diagnosis.credit_file_server, Some(Some(_))),
        "New diagnosis received"
    );
    notifications::dispatch(state.notifier.clone(), messages::diagnosis_message(&diagnosis));

    Ok(Json(SubmitResponse::stored(diagnosis.id)))
}

/// Decode a multipart diagnosis and store its files. Returns the submission and the names of
/// every stored file.
///
/// The `data` field is parsed before anything is written, so a malformed questionnaire
/// leaves no orphaned uploads behind. Every file part is stored; only `bizFile` and
/// `creditFile` are referenced by the record. When a field repeats, the last one wins.
async fn read_multipart(
    uploads: &UploadSink,
    content_type: &str,
    body: &Bytes,
) -> Result<(NewSubmission, Vec<String>)> {
    let boundary = multipart::boundary_from_content_type(content_type)
        .ok_or_else(|| Error::bad_request("Missing multipart boundary"))?;
    let parts = multipart::decode(body, &boundary);
    debug!(parts = parts.len(), "Decoded multipart body");

    let fields = match parts.iter().rev().find(|part| !part.is_file() && part.name == DATA_FIELD) {
        Some(part) => parse_json_object(&part.data)?,
        None => Map::new(),
    };

    let mut attachments = Attachments::default();
    let mut stored_files = Vec::new();
    for part in parts.iter().filter(|part| part.is_file()) {
        let filename = part.filename.as_deref().unwrap_or_default();
        let stored_name = match uploads.store(filename, &part.data).await {
            Ok(name) => name,
            Err(e) => {
                uploads.discard(&stored_files).await;
                return Err(e.into());
            }
        };
        stored_files.push(stored_name.clone());
        debug!(field = %part.name, stored_name = %stored_name, bytes = part.data.len(), "Stored attachment");

        match part.name.as_str() {
            BIZ_FILE_FIELD => attachments.biz_file = Some(stored_name),
            CREDIT_FILE_FIELD => attachments.credit_file = Some(stored_name),
            _ => {}
        }
    }

    Ok((NewSubmission { fields, attachments }, stored_files))
}

#[tracing::instrument(skip_all)]
pub async fn list_submissions(State(state): State<AppState>) -> Json<Vec<Entry<Submission>>> {
    Json(state.diagnoses.load_all().await)
}

/// Delete every diagnosis with the given id. Stored documents are kept.
#[tracing::instrument(skip(state))]
pub async fn delete_submission(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>> {
    if let Some(id) = parse_record_id(&id) {
        let removed = state.diagnoses.delete_by_id(id).await?;
        if removed {
            info!(id, "Diagnosis deleted");
        }
    }
    Ok(Json(SuccessResponse::ok()))
}
