use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::Utc;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::Deserialize;

use crate::entities::child;
use crate::entities::ride;
use crate::entities::ride_request::{self, RequestStatus};
use crate::error::{AppError, AppResult};
use crate::utils::jwt::Claims;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateRideRequestPayload {
    pub ride_id: i64,
    pub child_id: i64,
    pub pickup_address: String,
    pub pickup_lat: f64,
    pub pickup_lng: f64,
    pub notes: Option<String>,
}

/// Ask for a seat on a ride
pub async fn create_ride_request(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateRideRequestPayload>,
) -> AppResult<Json<ride_request::Model>> {
    let request = create_request(&state.db, claims.sub, payload).await?;
    Ok(Json(request))
}

/// List the caller's own seat requests
pub async fn my_requests(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> AppResult<Json<Vec<ride_request::Model>>> {
    let requests = ride_request::Entity::find()
        .filter(ride_request::Column::RequesterId.eq(claims.sub))
        .all(&state.db)
        .await?;

    Ok(Json(requests))
}

/// List the requests against one of the caller's rides.
/// A ride that is absent or belongs to another driver reads as not found.
pub async fn requests_for_ride(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(ride_id): Path<i64>,
) -> AppResult<Json<Vec<ride_request::Model>>> {
    ride::Entity::find_by_id(ride_id)
        .filter(ride::Column::DriverId.eq(claims.sub))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Ride not found".to_string()))?;

    let requests = ride_request::Entity::find()
        .filter(ride_request::Column::RideId.eq(ride_id))
        .order_by_asc(ride_request::Column::CreatedAt)
        .all(&state.db)
        .await?;

    Ok(Json(requests))
}

/// Accept a pending request, consuming one seat
pub async fn accept(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> AppResult<Json<ride_request::Model>> {
    let request = accept_request(&state.db, id, claims.sub).await?;
    Ok(Json(request))
}

/// Decline a pending request (driver only). Seats are untouched: none
/// were consumed while the request was pending.
pub async fn decline(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> AppResult<Json<ride_request::Model>> {
    let request = resolve_driver_request(&state.db, id, claims.sub).await?;

    if request.status != RequestStatus::Pending {
        return Err(AppError::InvalidState(
            "Request is no longer pending".to_string(),
        ));
    }

    let mut active: ride_request::ActiveModel = request.into();
    active.status = Set(RequestStatus::Declined);
    active.updated_at = Set(Utc::now().into());

    let result = active.update(&state.db).await?;
    Ok(Json(result))
}

/// Cancel one of the caller's own pending requests.
/// A request owned by someone else reads as not found.
pub async fn cancel(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> AppResult<Json<ride_request::Model>> {
    let request = ride_request::Entity::find_by_id(id)
        .filter(ride_request::Column::RequesterId.eq(claims.sub))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Ride request not found".to_string()))?;

    if request.status != RequestStatus::Pending {
        return Err(AppError::InvalidState(
            "Request is no longer pending".to_string(),
        ));
    }

    let mut active: ride_request::ActiveModel = request.into();
    active.status = Set(RequestStatus::Cancelled);
    active.updated_at = Set(Utc::now().into());

    let result = active.update(&state.db).await?;
    Ok(Json(result))
}

/// Record that the child was picked up (driver only)
pub async fn mark_picked_up(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> AppResult<Json<ride_request::Model>> {
    let request = resolve_driver_request(&state.db, id, claims.sub).await?;

    if request.status != RequestStatus::Accepted {
        return Err(AppError::InvalidState(
            "Only accepted requests can be picked up".to_string(),
        ));
    }

    let mut active: ride_request::ActiveModel = request.into();
    active.picked_up_at = Set(Some(Utc::now().into()));
    active.updated_at = Set(Utc::now().into());

    let result = active.update(&state.db).await?;
    Ok(Json(result))
}

/// Record that the child was dropped off (driver only)
pub async fn mark_dropped_off(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> AppResult<Json<ride_request::Model>> {
    let request = resolve_driver_request(&state.db, id, claims.sub).await?;

    if request.status != RequestStatus::Accepted {
        return Err(AppError::InvalidState(
            "Only accepted requests can be dropped off".to_string(),
        ));
    }

    let mut active: ride_request::ActiveModel = request.into();
    active.dropped_off_at = Set(Some(Utc::now().into()));
    active.updated_at = Set(Utc::now().into());

    let result = active.update(&state.db).await?;
    Ok(Json(result))
}

/// Load a request and verify the caller drives the ride it targets
async fn resolve_driver_request(
    db: &DatabaseConnection,
    request_id: i64,
    caller_id: i64,
) -> AppResult<ride_request::Model> {
    let request = ride_request::Entity::find_by_id(request_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Ride request not found".to_string()))?;

    let ride = ride::Entity::find_by_id(request.ride_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Ride not found".to_string()))?;

    if ride.driver_id != caller_id {
        return Err(AppError::Forbidden(
            "Only the ride's driver can manage its requests".to_string(),
        ));
    }

    Ok(request)
}

/// Create a pending seat request against a ride.
///
/// The seat check here is advisory: it rejects requests against a ride
/// that is already full, but reserves nothing. Seats are only consumed
/// at acceptance, so more pending requests than seats can accumulate.
async fn create_request(
    db: &DatabaseConnection,
    requester_id: i64,
    payload: CreateRideRequestPayload,
) -> AppResult<ride_request::Model> {
    let ride = ride::Entity::find_by_id(payload.ride_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Ride not found".to_string()))?;

    if ride.available_seats <= 0 {
        return Err(AppError::InvalidState("No seats available".to_string()));
    }

    // The child must belong to the requester
    child::Entity::find_by_id(payload.child_id)
        .filter(child::Column::ParentId.eq(requester_id))
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Child not found".to_string()))?;

    let request = ride_request::ActiveModel {
        ride_id: Set(ride.id),
        requester_id: Set(requester_id),
        child_id: Set(payload.child_id),
        pickup_address: Set(payload.pickup_address),
        pickup_lat: Set(payload.pickup_lat),
        pickup_lng: Set(payload.pickup_lng),
        status: Set(RequestStatus::Pending),
        notes: Set(payload.notes),
        ..Default::default()
    };

    Ok(request.insert(db).await?)
}

/// Transition a request from pending to accepted, decrementing the
/// ride's seat count in the same transaction.
///
/// Both writes are conditional: the status update only matches a
/// still-pending request, and the decrement only matches a ride with
/// `available_seats > 0`. Two racing accepts therefore resolve to
/// exactly one winner; the loser sees zero rows affected and the whole
/// transaction rolls back, so a seat is never consumed without an
/// acceptance or vice versa.
async fn accept_request(
    db: &DatabaseConnection,
    request_id: i64,
    caller_id: i64,
) -> AppResult<ride_request::Model> {
    let request = ride_request::Entity::find_by_id(request_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Ride request not found".to_string()))?;

    let ride = ride::Entity::find_by_id(request.ride_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Ride not found".to_string()))?;

    if ride.driver_id != caller_id {
        return Err(AppError::Forbidden(
            "Only the ride's driver can accept its requests".to_string(),
        ));
    }

    if ride.available_seats <= 0 {
        return Err(AppError::InvalidState("No seats available".to_string()));
    }

    let now: sea_orm::prelude::DateTimeWithTimeZone = Utc::now().into();
    let txn = db.begin().await?;

    let resolved = ride_request::Entity::update_many()
        .set(ride_request::ActiveModel {
            status: Set(RequestStatus::Accepted),
            updated_at: Set(now),
            ..Default::default()
        })
        .filter(ride_request::Column::Id.eq(request.id))
        .filter(ride_request::Column::Status.eq(RequestStatus::Pending))
        .exec(&txn)
        .await?;

    if resolved.rows_affected == 0 {
        // Already accepted, declined or cancelled; accept is one-way
        txn.rollback().await?;
        return Err(AppError::InvalidState(
            "Request is no longer pending".to_string(),
        ));
    }

    let decrement = ride::Entity::update_many()
        .col_expr(
            ride::Column::AvailableSeats,
            Expr::col(ride::Column::AvailableSeats).sub(1),
        )
        .col_expr(ride::Column::UpdatedAt, Expr::val(now).into())
        .filter(ride::Column::Id.eq(ride.id))
        .filter(ride::Column::AvailableSeats.gt(0))
        .exec(&txn)
        .await?;

    if decrement.rows_affected == 0 {
        // A concurrent accept took the last seat between our read and
        // the conditional update
        txn.rollback().await?;
        return Err(AppError::InvalidState("No seats available".to_string()));
    }

    txn.commit().await?;

    tracing::info!(
        request_id = request.id,
        ride_id = request.ride_id,
        "Ride request accepted, one seat consumed"
    );

    Ok(ride_request::Model {
        status: RequestStatus::Accepted,
        updated_at: now,
        ..request
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    use crate::entities::ride::RideStatus;

    fn ride(id: i64, driver_id: i64, available_seats: i32, total_seats: i32) -> ride::Model {
        ride::Model {
            id,
            driver_id,
            school_id: 1,
            ride_date: NaiveDate::from_ymd_opt(2024, 3, 18).unwrap(),
            departure_time: chrono::NaiveTime::from_hms_opt(7, 45, 0).unwrap(),
            pickup_location: "12 Maple Ave".to_string(),
            pickup_lat: 40.7128,
            pickup_lng: -74.0060,
            dropoff_location: "Lincoln Elementary".to_string(),
            dropoff_lat: 40.7306,
            dropoff_lng: -73.9866,
            available_seats,
            total_seats,
            seat_cost: None,
            recurrence: None,
            notes: None,
            status: RideStatus::Scheduled,
            created_at: Utc::now().into(),
            updated_at: Utc::now().into(),
        }
    }

    fn request(id: i64, ride_id: i64, status: RequestStatus) -> ride_request::Model {
        ride_request::Model {
            id,
            ride_id,
            requester_id: 50,
            child_id: 7,
            pickup_address: "12 Maple Ave".to_string(),
            pickup_lat: 40.7128,
            pickup_lng: -74.0060,
            status,
            picked_up_at: None,
            dropped_off_at: None,
            notes: None,
            created_at: Utc::now().into(),
            updated_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn accept_missing_request_is_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<ride_request::Model>::new()])
            .into_connection();

        let err = accept_request(&db, 1, 10).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn accept_by_non_driver_is_forbidden() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![request(1, 2, RequestStatus::Pending)]])
            .append_query_results([vec![ride(2, 10, 3, 3)]])
            .into_connection();

        let err = accept_request(&db, 1, 99).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn second_accept_is_rejected() {
        // The conditional status update matches nothing once the
        // request has left pending, even when seats remain
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![request(1, 2, RequestStatus::Accepted)]])
            .append_query_results([vec![ride(2, 10, 2, 3)]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .into_connection();

        let err = accept_request(&db, 1, 10).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidState(_)));
    }

    #[tokio::test]
    async fn accept_with_no_seats_is_rejected_before_any_write() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![request(1, 2, RequestStatus::Pending)]])
            .append_query_results([vec![ride(2, 10, 0, 3)]])
            .into_connection();

        let err = accept_request(&db, 1, 10).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidState(_)));

        // No statements beyond the two reads were issued
        let log = db.into_transaction_log();
        assert_eq!(log.len(), 2);
    }

    #[tokio::test]
    async fn accept_decrements_seat_and_marks_accepted() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![request(1, 2, RequestStatus::Pending)]])
            .append_query_results([vec![ride(2, 10, 1, 3)]])
            .append_exec_results([
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                },
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                },
            ])
            .into_connection();

        let updated = accept_request(&db, 1, 10).await.unwrap();
        assert_eq!(updated.status, RequestStatus::Accepted);
        assert_eq!(updated.id, 1);
        assert_eq!(updated.ride_id, 2);
    }

    #[tokio::test]
    async fn losing_a_seat_race_is_rejected() {
        // The pre-check sees a free seat, but the conditional decrement
        // affects zero rows, as when a concurrent accept committed first
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![request(1, 2, RequestStatus::Pending)]])
            .append_query_results([vec![ride(2, 10, 1, 3)]])
            .append_exec_results([
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                },
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                },
            ])
            .into_connection();

        let err = accept_request(&db, 1, 10).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidState(_)));
    }

    #[tokio::test]
    async fn request_against_full_ride_is_rejected() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![ride(2, 10, 0, 3)]])
            .into_connection();

        let payload = CreateRideRequestPayload {
            ride_id: 2,
            child_id: 7,
            pickup_address: "12 Maple Ave".to_string(),
            pickup_lat: 40.7128,
            pickup_lng: -74.0060,
            notes: None,
        };

        let err = create_request(&db, 50, payload).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidState(_)));
    }

    #[tokio::test]
    async fn request_with_someone_elses_child_is_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![ride(2, 10, 2, 3)]])
            .append_query_results([Vec::<child::Model>::new()])
            .into_connection();

        let payload = CreateRideRequestPayload {
            ride_id: 2,
            child_id: 7,
            pickup_address: "12 Maple Ave".to_string(),
            pickup_lat: 40.7128,
            pickup_lng: -74.0060,
            notes: None,
        };

        let err = create_request(&db, 50, payload).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
