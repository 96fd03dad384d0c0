//! HTTP API endpoint handlers.
//!
//! 参照系のエンドポイントは WebSocket と同じトークンで認証する（`?token=` か `Authorization: Bearer`）。

use std::{str::FromStr, sync::Arc};

use axum::{
    Json,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
};

use crate::{
    domain::{RoomId, SessionId, UserId, UserProfile, ValidationError},
    infrastructure::dto::{
        http::{ChatHistoryDto, ErrorResponseDto, HeartRateHistoryDto, RoomMembersDto},
        websocket::{ChatMessageDto, HeartRateSampleDto, UserInfo},
    },
    ui::state::AppState,
    usecase::QueryError,
};

use super::credential::{CredentialQuery, credential};

type ApiError = (StatusCode, Json<ErrorResponseDto>);

fn api_error(status: StatusCode, error: String) -> ApiError {
    (status, Json(ErrorResponseDto { error }))
}

fn bad_request(e: ValidationError) -> ApiError {
    api_error(StatusCode::BAD_REQUEST, e.to_string())
}

fn query_failed(e: QueryError) -> ApiError {
    match e {
        QueryError::Forbidden { .. } => {
            tracing::warn!("Rejected history query: {}", e);
            api_error(StatusCode::FORBIDDEN, e.to_string())
        }
        QueryError::Store(_) => {
            tracing::warn!("History query failed: {}", e);
            api_error(StatusCode::SERVICE_UNAVAILABLE, e.to_string())
        }
    }
}

/// リクエストのトークンを検証し、呼び出し元のユーザーを返す
async fn authenticate(
    state: &AppState,
    query: CredentialQuery,
    headers: &HeaderMap,
) -> Result<UserProfile, ApiError> {
    let token = credential(query, headers);
    state
        .session_hub
        .authenticate(token.as_deref())
        .await
        .map_err(|e| {
            tracing::warn!("Rejected HTTP request: {}", e);
            api_error(StatusCode::UNAUTHORIZED, e.to_string())
        })
}

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Get the current members of a room (`user:<id>`, `trainer-session:<id>`, `challenge:<id>`)
pub async fn get_room_members(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
    Query(query): Query<CredentialQuery>,
    headers: HeaderMap,
) -> Result<Json<RoomMembersDto>, ApiError> {
    authenticate(&state, query, &headers).await?;
    let room_id = RoomId::from_str(&room_id).map_err(bad_request)?;
    let members = state.get_room_members_usecase.execute(&room_id).await;

    // Domain Model から DTO への変換
    Ok(Json(RoomMembersDto {
        room_id: room_id.to_string(),
        member_count: members.len(),
        members: members.iter().map(UserInfo::from).collect(),
    }))
}

/// Get the stored chat history of a session (members of the session room only)
pub async fn get_chat_history(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    Query(query): Query<CredentialQuery>,
    headers: HeaderMap,
) -> Result<Json<ChatHistoryDto>, ApiError> {
    let requester = authenticate(&state, query, &headers).await?;
    let session_id = SessionId::new(session_id).map_err(bad_request)?;
    let messages = state
        .get_chat_history_usecase
        .execute(&requester.id, &session_id)
        .await
        .map_err(query_failed)?;

    Ok(Json(ChatHistoryDto {
        session_id: session_id.to_string(),
        messages: messages.iter().map(ChatMessageDto::from).collect(),
    }))
}

/// Get the retained heart-rate samples of a user (the user themself only)
pub async fn get_heart_rate_history(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    Query(query): Query<CredentialQuery>,
    headers: HeaderMap,
) -> Result<Json<HeartRateHistoryDto>, ApiError> {
    let requester = authenticate(&state, query, &headers).await?;
    let user_id = UserId::new(user_id).map_err(bad_request)?;
    let samples = state
        .get_heart_rate_history_usecase
        .execute(&requester.id, &user_id)
        .await
        .map_err(query_failed)?;

    Ok(Json(HeartRateHistoryDto {
        user_id: user_id.to_string(),
        samples: samples.iter().map(HeartRateSampleDto::from).collect(),
    }))
}
