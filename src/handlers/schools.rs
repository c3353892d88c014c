use axum::{
    extract::{Path, State},
    Json,
};
use chrono::NaiveTime;
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use serde::Deserialize;

use crate::entities::school;
use crate::error::{AppError, AppResult};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateSchoolRequest {
    pub name: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub latitude: f64,
    pub longitude: f64,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

/// Create a school (admin)
pub async fn create_school(
    State(state): State<AppState>,
    Json(payload): Json<CreateSchoolRequest>,
) -> AppResult<Json<school::Model>> {
    let school = school::ActiveModel {
        name: Set(payload.name),
        address: Set(payload.address),
        city: Set(payload.city),
        state: Set(payload.state),
        zip_code: Set(payload.zip_code),
        latitude: Set(payload.latitude),
        longitude: Set(payload.longitude),
        start_time: Set(payload.start_time),
        end_time: Set(payload.end_time),
        ..Default::default()
    };

    let result = school.insert(&state.db).await?;
    Ok(Json(result))
}

/// List all schools
pub async fn list_schools(State(state): State<AppState>) -> AppResult<Json<Vec<school::Model>>> {
    let schools = school::Entity::find().all(&state.db).await?;
    Ok(Json(schools))
}

/// Get a school by id
pub async fn get_school(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<school::Model>> {
    let school = school::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("School not found".to_string()))?;

    Ok(Json(school))
}

/// Delete a school (admin)
pub async fn delete_school(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<serde_json::Value>> {
    let result = school::Entity::delete_by_id(id).exec(&state.db).await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound("School not found".to_string()));
    }

    Ok(Json(serde_json::json!({ "message": "School deleted" })))
}
