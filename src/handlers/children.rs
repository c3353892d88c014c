use axum::{
    extract::{Path, State},
    Extension, Json,
};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use serde::Deserialize;

use crate::entities::{child, school};
use crate::error::{AppError, AppResult};
use crate::utils::jwt::Claims;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateChildRequest {
    pub name: String,
    pub age: i32,
    pub grade: Option<String>,
    pub school_id: Option<i64>,
    pub emergency_contact_name: Option<String>,
    pub emergency_contact_phone: Option<String>,
    pub medical_info: Option<String>,
    pub special_needs: Option<String>,
}

/// Register a child under the calling parent
pub async fn create_child(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateChildRequest>,
) -> AppResult<Json<child::Model>> {
    let child = create_record(&state.db, claims.sub, payload).await?;
    Ok(Json(child))
}

async fn create_record(
    db: &DatabaseConnection,
    parent_id: i64,
    payload: CreateChildRequest,
) -> AppResult<child::Model> {
    if payload.age <= 0 {
        return Err(AppError::BadRequest("Age must be positive".to_string()));
    }

    if let Some(school_id) = payload.school_id {
        school::Entity::find_by_id(school_id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::NotFound("School not found".to_string()))?;
    }

    let child = child::ActiveModel {
        parent_id: Set(parent_id),
        name: Set(payload.name),
        age: Set(payload.age),
        grade: Set(payload.grade),
        school_id: Set(payload.school_id),
        emergency_contact_name: Set(payload.emergency_contact_name),
        emergency_contact_phone: Set(payload.emergency_contact_phone),
        medical_info: Set(payload.medical_info),
        special_needs: Set(payload.special_needs),
        ..Default::default()
    };

    Ok(child.insert(db).await?)
}

/// List the calling parent's children
pub async fn list_children(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> AppResult<Json<Vec<child::Model>>> {
    let children = child::Entity::find()
        .filter(child::Column::ParentId.eq(claims.sub))
        .all(&state.db)
        .await?;

    Ok(Json(children))
}

/// Get one of the calling parent's children.
/// A child owned by someone else reads as not found.
pub async fn get_child(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> AppResult<Json<child::Model>> {
    let child = child::Entity::find_by_id(id)
        .filter(child::Column::ParentId.eq(claims.sub))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Child not found".to_string()))?;

    Ok(Json(child))
}

/// Remove a child record
pub async fn delete_child(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> AppResult<Json<serde_json::Value>> {
    let result = child::Entity::delete_many()
        .filter(child::Column::Id.eq(id))
        .filter(child::Column::ParentId.eq(claims.sub))
        .exec(&state.db)
        .await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound("Child not found".to_string()));
    }

    Ok(Json(serde_json::json!({ "message": "Child deleted" })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn child_with_missing_school_is_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<school::Model>::new()])
            .into_connection();

        let payload = CreateChildRequest {
            name: "Mia".to_string(),
            age: 8,
            grade: Some("3rd".to_string()),
            school_id: Some(5),
            emergency_contact_name: None,
            emergency_contact_phone: None,
            medical_info: None,
            special_needs: None,
        };

        let err = create_record(&db, 10, payload).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
