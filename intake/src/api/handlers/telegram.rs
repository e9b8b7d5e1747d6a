//! HTTP handlers for the operator's Telegram settings.

use axum::{Json, body::Bytes, extract::State};
use serde_json::Value;

use super::parse_json_object;
use crate::{
    AppState,
    api::models::SuccessResponse,
    errors::{Error, Result},
    notifications::{self, messages},
    storage::{SettingsStatus, SettingsUpdate},
};

/// Report which settings are present. The values themselves are never returned.
#[tracing::instrument(skip_all)]
pub async fn get_telegram_config(State(state): State<AppState>) -> Json<SettingsStatus> {
    Json(state.settings.load().await.status())
}

/// Partially update the bot token and chat id.
#[tracing::instrument(skip_all)]
pub async fn update_telegram_config(State(state): State<AppState>, body: Bytes) -> Result<Json<SuccessResponse>> {
    let fields = parse_json_object(&body)?;
    let update: SettingsUpdate = serde_json::from_value(Value::Object(fields))
        .map_err(|e| Error::bad_request(format!("Invalid settings: {e}")))?;
    state.settings.update(update).await?;
    Ok(Json(SuccessResponse::ok()))
}

/// Send the fixed test message with the current settings.
#[tracing::instrument(skip_all)]
pub async fn send_test_notification(State(state): State<AppState>) -> Json<SuccessResponse> {
    notifications::dispatch(state.notifier.clone(), messages::TEST_MESSAGE.to_string());
    Json(SuccessResponse::ok())
}
