//! HTTP handlers for first-stage leads.

use axum::{
    Json,
    body::Bytes,
    extract::{Path, State},
};
use tracing::info;

use super::{parse_json_object, parse_record_id};
use crate::{
    AppState,
    api::models::{SubmitResponse, SuccessResponse},
    errors::Result,
    notifications::{self, messages},
    storage::{Entry, NewSubmission, Submission},
};

/// Store a lead from a JSON object body and notify the operator.
#[tracing::instrument(skip_all)]
pub async fn submit_lead(State(state): State<AppState>, body: Bytes) -> Result<Json<SubmitResponse>> {
    let fields = parse_json_object(&body)?;
    let lead = state.leads.append(NewSubmission::from_fields(fields)).await?;

    info!(
        id = lead.id,
        industry = ?lead.field("industry"),
        company = ?lead.field("companyName"),
        "New lead received"
    );
    notifications::dispatch(state.notifier.clone(), messages::lead_message(&lead));

    Ok(Json(SubmitResponse::stored(lead.id)))
}

#[tracing::instrument(skip_all)]
pub async fn list_leads(State(state): State<AppState>) -> Json<Vec<Entry<Submission>>> {
    Json(state.leads.load_all().await)
}

/// Delete every lead with the given id. Unknown ids succeed without changing anything.
#[tracing::instrument(skip(state))]
pub async fn delete_lead(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<SuccessResponse>> {
    if let Some(id) = parse_record_id(&id) {
        let removed = state.leads.delete_by_id(id).await?;
        if removed {
            info!(id, "Lead deleted");
        }
    }
    Ok(Json(SuccessResponse::ok()))
}

#[cfg(test)]
mod tests {
    use crate::test_utils::*;
    use axum::http::StatusCode;
    use serde_json::{Value, json};

    #[tokio::test]
    async fn test_lead_round_trip() {
        let app = create_test_app().await;

        let response = app
            .server
            .post("/api/submit-lead")
            .json(&json!({
                "industry": "IT",
                "companyName": "Acme",
                "contactName": "Kim",
                "contactPhone": "010-0000-0000",
            }))
            .await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["success"], true);
        let id = body["id"].as_i64().unwrap();

        let leads: Vec<Value> = app.server.get("/api/leads").await.json();
        assert_eq!(leads.len(), 1);
        assert_eq!(leads[0]["id"], id);
        assert_eq!(leads[0]["type"], "lead");
        assert_eq!(leads[0]["industry"], "IT");
        assert_eq!(leads[0]["companyName"], "Acme");
        assert_eq!(leads[0]["contactName"], "Kim");
        assert_eq!(leads[0]["contactPhone"], "010-0000-0000");
        assert!(leads[0]["submittedAt"].as_str().is_some_and(|s| !s.is_empty()));
        assert!(leads[0].get("bizFileServer").is_none());

        let messages = app.notifier.wait_for_messages(1).await;
        assert_eq!(messages.len(), 1);
        assert!(messages[0].starts_with("🔔 <b>새로운 정책자금 진단 신청</b>"));
        assert!(messages[0].contains("🏢 업체명: Acme\n"));
        assert!(messages[0].contains("010-0000-0000"));

        let response = app.server.delete(&format!("/api/leads/{id}")).await;
        response.assert_status_ok();
        response.assert_json(&json!({ "success": true }));

        let leads: Vec<Value> = app.server.get("/api/leads").await.json();
        assert!(leads.is_empty());
    }

    #[tokio::test]
    async fn test_records_written_by_older_versions_are_listed() {
        let app = create_test_app().await;
        std::fs::write(
            app.config.storage.leads_path(),
            r#"[{"id": "legacy", "companyName": "Old", "type": "lead"}]"#,
        )
        .unwrap();

        app.server
            .post("/api/submit-lead")
            .json(&json!({ "companyName": "New" }))
            .await
            .assert_status_ok();

        let leads: Vec<Value> = app.server.get("/api/leads").await.json();
        assert_eq!(leads.len(), 2);
        assert_eq!(leads[0], json!({ "id": "legacy", "companyName": "Old", "type": "lead" }));
        assert_eq!(leads[1]["companyName"], "New");
    }

    #[tokio::test]
    async fn test_submitted_type_is_overridden() {
        let app = create_test_app().await;

        app.server
            .post("/api/submit-lead")
            .json(&json!({ "type": "diagnosis", "submittedAt": "2026. 1. 1. 오전 9:00:00" }))
            .await
            .assert_status_ok();

        let leads = app.leads().await;
        let stored = serde_json::to_value(&leads[0]).unwrap();
        assert_eq!(stored["type"], "lead");
        assert_eq!(stored["submittedAt"], "2026. 1. 1. 오전 9:00:00");
    }

    #[tokio::test]
    async fn test_invalid_bodies_are_rejected() {
        let app = create_test_app().await;

        for body in ["{not json", "[1, 2, 3]", "42", ""] {
            let response = app.server.post("/api/submit-lead").text(body).await;

            response.assert_status(StatusCode::BAD_REQUEST);
            let error: Value = response.json();
            assert!(error["error"].as_str().is_some(), "body {body:?} gave {error}");
        }

        assert!(app.leads().await.is_empty());
        assert!(app.notifier.messages().is_empty());
    }

    #[tokio::test]
    async fn test_notification_failure_does_not_fail_submission() {
        let app = create_test_app().await;
        app.notifier.fail_sends(true);

        let response = app.server.post("/api/submit-lead").json(&json!({ "companyName": "x" })).await;

        response.assert_status_ok();
        assert_eq!(app.leads().await.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_unknown_or_non_numeric_id_succeeds() {
        let app = create_test_app().await;
        app.server
            .post("/api/submit-lead")
            .json(&json!({ "companyName": "kept" }))
            .await
            .assert_status_ok();

        for path in ["/api/leads/1", "/api/leads/not-a-number"] {
            let response = app.server.delete(path).await;
            response.assert_status_ok();
            response.assert_json(&json!({ "success": true }));
        }

        assert_eq!(app.leads().await.len(), 1);
    }

    #[tokio::test]
    async fn test_storage_failure_is_reported() {
        let app = create_test_app().await;
        // Replace the leads file with a directory so the rename fails
        let leads_path = app.config.storage.leads_path();
        std::fs::remove_file(&leads_path).unwrap();
        std::fs::create_dir_all(leads_path.join("blocker")).unwrap();

        let response = app.server.post("/api/submit-lead").json(&json!({ "companyName": "x" })).await;

        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
        let error: Value = response.json();
        assert!(error["error"].as_str().is_some());
        assert!(app.notifier.messages().is_empty());
    }
}
