use axum::{
    extract::{Path, State},
    Extension, Json,
};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use serde::Deserialize;

use crate::entities::{rating, ride, user};
use crate::error::{AppError, AppResult};
use crate::utils::jwt::Claims;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateRatingRequest {
    pub rated_id: i64,
    pub ride_id: i64,
    pub score: i32,
    pub comment: Option<String>,
}

/// Rate a driver for a ride
pub async fn create_rating(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateRatingRequest>,
) -> AppResult<Json<rating::Model>> {
    if !(1..=5).contains(&payload.score) {
        return Err(AppError::BadRequest(
            "Score must be between 1 and 5".to_string(),
        ));
    }

    user::Entity::find_by_id(payload.rated_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Rated user not found".to_string()))?;

    let ride = ride::Entity::find_by_id(payload.ride_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Ride not found".to_string()))?;

    // Either the rated user or the rater must be the ride's driver
    if ride.driver_id != payload.rated_id && ride.driver_id != claims.sub {
        return Err(AppError::Forbidden(
            "Neither party took part in this ride".to_string(),
        ));
    }

    let new_rating = rating::ActiveModel {
        rater_id: Set(claims.sub),
        rated_id: Set(payload.rated_id),
        ride_id: Set(payload.ride_id),
        score: Set(payload.score),
        comment: Set(payload.comment),
        ..Default::default()
    };

    let result = new_rating.insert(&state.db).await?;

    update_average_rating(&state, payload.rated_id).await?;

    Ok(Json(result))
}

/// List ratings received by a user
pub async fn user_ratings(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> AppResult<Json<Vec<rating::Model>>> {
    let ratings = rating::Entity::find()
        .filter(rating::Column::RatedId.eq(user_id))
        .all(&state.db)
        .await?;

    Ok(Json(ratings))
}

/// Recompute the rated user's running average
async fn update_average_rating(state: &AppState, user_id: i64) -> AppResult<()> {
    let ratings = rating::Entity::find()
        .filter(rating::Column::RatedId.eq(user_id))
        .all(&state.db)
        .await?;

    if ratings.is_empty() {
        return Ok(());
    }

    let average = average_score(&ratings);

    let user = user::Entity::find_by_id(user_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let total = ratings.len() as i32;
    let mut active: user::ActiveModel = user.into();
    active.average_rating = Set(average);
    active.total_ratings = Set(total);
    active.update(&state.db).await?;

    Ok(())
}

fn average_score(ratings: &[rating::Model]) -> f64 {
    ratings.iter().map(|r| r.score as f64).sum::<f64>() / ratings.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn rating(score: i32) -> rating::Model {
        rating::Model {
            id: 1,
            rater_id: 1,
            rated_id: 2,
            ride_id: 3,
            score,
            comment: None,
            created_at: Utc::now().into(),
        }
    }

    #[test]
    fn average_of_mixed_scores() {
        let ratings = vec![rating(5), rating(4), rating(3)];
        assert!((average_score(&ratings) - 4.0).abs() < f64::EPSILON);
    }

    #[test]
    fn average_of_single_score() {
        let ratings = vec![rating(2)];
        assert!((average_score(&ratings) - 2.0).abs() < f64::EPSILON);
    }
}
