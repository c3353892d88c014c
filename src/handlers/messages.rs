use axum::{
    extract::{Path, State},
    Extension, Json,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::Deserialize;

use crate::entities::{message, user};
use crate::error::{AppError, AppResult};
use crate::utils::jwt::Claims;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub receiver_id: i64,
    pub content: String,
}

/// Send a direct message to another user
pub async fn send_message(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<SendMessageRequest>,
) -> AppResult<Json<message::Model>> {
    if payload.content.trim().is_empty() {
        return Err(AppError::BadRequest("Message cannot be empty".to_string()));
    }

    user::Entity::find_by_id(payload.receiver_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Receiver not found".to_string()))?;

    let msg = message::ActiveModel {
        sender_id: Set(claims.sub),
        receiver_id: Set(payload.receiver_id),
        content: Set(payload.content),
        is_read: Set(false),
        ..Default::default()
    };

    let result = msg.insert(&state.db).await?;
    Ok(Json(result))
}

/// List messages the caller sent or received, newest first
pub async fn my_messages(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> AppResult<Json<Vec<message::Model>>> {
    let messages = message::Entity::find()
        .filter(
            Condition::any()
                .add(message::Column::SenderId.eq(claims.sub))
                .add(message::Column::ReceiverId.eq(claims.sub)),
        )
        .order_by_desc(message::Column::CreatedAt)
        .all(&state.db)
        .await?;

    Ok(Json(messages))
}

/// Mark a received message as read.
/// A message addressed to someone else reads as not found.
pub async fn mark_read(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> AppResult<Json<message::Model>> {
    let msg = message::Entity::find_by_id(id)
        .filter(message::Column::ReceiverId.eq(claims.sub))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Message not found".to_string()))?;

    let mut active: message::ActiveModel = msg.into();
    active.is_read = Set(true);

    let result = active.update(&state.db).await?;
    Ok(Json(result))
}
