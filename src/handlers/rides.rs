use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::{NaiveDate, NaiveTime, Utc};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use serde::Deserialize;

use crate::entities::ride::{self, RideStatus};
use crate::entities::school;
use crate::error::{AppError, AppResult};
use crate::utils::jwt::Claims;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateRideRequest {
    pub school_id: i64,
    pub ride_date: NaiveDate,
    pub departure_time: NaiveTime,
    pub pickup_location: String,
    pub pickup_lat: f64,
    pub pickup_lng: f64,
    pub dropoff_location: String,
    pub dropoff_lat: f64,
    pub dropoff_lng: f64,
    pub available_seats: i32,
    pub total_seats: i32,
    pub seat_cost: Option<f64>,
    pub recurrence: Option<String>,
    pub notes: Option<String>,
}

/// Offer a ride
pub async fn create_ride(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateRideRequest>,
) -> AppResult<Json<ride::Model>> {
    let ride = create_offer(&state.db, claims.sub, payload).await?;
    Ok(Json(ride))
}

async fn create_offer(
    db: &DatabaseConnection,
    driver_id: i64,
    payload: CreateRideRequest,
) -> AppResult<ride::Model> {
    if payload.total_seats <= 0 {
        return Err(AppError::BadRequest(
            "Total seats must be positive".to_string(),
        ));
    }

    // A fresh offer starts with every seat open
    if payload.available_seats != payload.total_seats {
        return Err(AppError::BadRequest(
            "Available seats must equal total seats on creation".to_string(),
        ));
    }

    school::Entity::find_by_id(payload.school_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("School not found".to_string()))?;

    let ride = ride::ActiveModel {
        driver_id: Set(driver_id),
        school_id: Set(payload.school_id),
        ride_date: Set(payload.ride_date),
        departure_time: Set(payload.departure_time),
        pickup_location: Set(payload.pickup_location),
        pickup_lat: Set(payload.pickup_lat),
        pickup_lng: Set(payload.pickup_lng),
        dropoff_location: Set(payload.dropoff_location),
        dropoff_lat: Set(payload.dropoff_lat),
        dropoff_lng: Set(payload.dropoff_lng),
        available_seats: Set(payload.available_seats),
        total_seats: Set(payload.total_seats),
        seat_cost: Set(payload.seat_cost),
        recurrence: Set(payload.recurrence),
        notes: Set(payload.notes),
        status: Set(RideStatus::Scheduled),
        ..Default::default()
    };

    Ok(ride.insert(db).await?)
}

#[derive(Debug, Deserialize)]
pub struct RideFilter {
    pub school_id: Option<i64>,
    pub status: Option<RideStatus>,
}

/// List rides, optionally narrowed by school and status
pub async fn list_rides(
    State(state): State<AppState>,
    Query(filter): Query<RideFilter>,
) -> AppResult<Json<Vec<ride::Model>>> {
    let mut query = ride::Entity::find();

    if let Some(school_id) = filter.school_id {
        query = query.filter(ride::Column::SchoolId.eq(school_id));
    }
    if let Some(status) = filter.status {
        query = query.filter(ride::Column::Status.eq(status));
    }

    let rides = query.all(&state.db).await?;
    Ok(Json(rides))
}

/// List rides offered by the caller
pub async fn my_rides(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> AppResult<Json<Vec<ride::Model>>> {
    let rides = ride::Entity::find()
        .filter(ride::Column::DriverId.eq(claims.sub))
        .all(&state.db)
        .await?;

    Ok(Json(rides))
}

/// Get a ride by id
pub async fn get_ride(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<ride::Model>> {
    let ride = ride::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Ride not found".to_string()))?;

    Ok(Json(ride))
}

#[derive(Debug, Deserialize)]
pub struct UpdateRideStatusRequest {
    pub status: RideStatus,
}

/// Change a ride's status (driver only).
/// A ride owned by someone else reads as not found.
pub async fn update_ride_status(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateRideStatusRequest>,
) -> AppResult<Json<ride::Model>> {
    let ride = ride::Entity::find_by_id(id)
        .filter(ride::Column::DriverId.eq(claims.sub))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Ride not found".to_string()))?;

    let mut active: ride::ActiveModel = ride.into();
    active.status = Set(payload.status);
    active.updated_at = Set(Utc::now().into());

    let result = active.update(&state.db).await?;
    Ok(Json(result))
}

/// Delete a ride. Existence and ownership are checked in one filtered
/// delete, so a ride owned by someone else reads as not found. The
/// ride's requests go with it via the FK cascade.
pub async fn delete_ride(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> AppResult<Json<serde_json::Value>> {
    delete_offer(&state.db, claims.sub, id).await?;
    Ok(Json(serde_json::json!({ "message": "Ride deleted" })))
}

async fn delete_offer(db: &DatabaseConnection, driver_id: i64, id: i64) -> AppResult<()> {
    let result = ride::Entity::delete_many()
        .filter(ride::Column::Id.eq(id))
        .filter(ride::Column::DriverId.eq(driver_id))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound("Ride not found".to_string()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Transaction};

    fn offer_payload() -> CreateRideRequest {
        CreateRideRequest {
            school_id: 5,
            ride_date: NaiveDate::from_ymd_opt(2024, 3, 18).unwrap(),
            departure_time: NaiveTime::from_hms_opt(7, 45, 0).unwrap(),
            pickup_location: "12 Maple Ave".to_string(),
            pickup_lat: 40.7128,
            pickup_lng: -74.0060,
            dropoff_location: "Lincoln Elementary".to_string(),
            dropoff_lat: 40.7306,
            dropoff_lng: -73.9866,
            available_seats: 3,
            total_seats: 3,
            seat_cost: None,
            recurrence: None,
            notes: None,
        }
    }

    #[tokio::test]
    async fn offer_for_missing_school_is_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<school::Model>::new()])
            .into_connection();

        let err = create_offer(&db, 10, offer_payload()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn delete_issues_one_owner_scoped_statement() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();

        delete_offer(&db, 10, 2).await.unwrap();

        // A single DELETE filtered on both id and driver; removing the
        // ride's requests is left to the FK cascade
        let log = db.into_transaction_log();
        assert_eq!(
            log,
            [Transaction::from_sql_and_values(
                DatabaseBackend::Postgres,
                r#"DELETE FROM "ride" WHERE "ride"."id" = $1 AND "ride"."driver_id" = $2"#,
                [2i64.into(), 10i64.into()],
            )]
        );
    }

    #[tokio::test]
    async fn delete_of_another_drivers_ride_is_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .into_connection();

        let err = delete_offer(&db, 99, 2).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
