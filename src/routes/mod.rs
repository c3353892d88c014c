use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};

use crate::handlers::{auth, children, messages, ratings, ride_requests, rides, schools};
use crate::middleware::auth::{auth_middleware, require_admin};
use crate::middleware::rate_limit::create_public_governor;
use crate::middleware::user_rate_limit::create_user_governor;
use crate::AppState;

pub fn create_router(state: AppState) -> Router {
    // IP-based governor for unauthenticated routes, user-keyed for the rest
    let public_governor = create_public_governor();
    let user_governor = create_user_governor();

    // Public routes (registration and login)
    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .layer(public_governor);

    // School management (requires auth + admin role)
    let admin_routes = Router::new()
        .route("/schools", post(schools::create_school))
        .route("/schools/{id}", delete(schools::delete_school))
        .layer(middleware::from_fn(require_admin))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    // Authenticated routes
    let api_routes = Router::new()
        // Current user
        .route("/auth/me", get(auth::me))
        // Schools (read)
        .route("/schools", get(schools::list_schools))
        .route("/schools/{id}", get(schools::get_school))
        // Children
        .route("/children", post(children::create_child))
        .route("/children", get(children::list_children))
        .route("/children/{id}", get(children::get_child))
        .route("/children/{id}", delete(children::delete_child))
        // Ride catalog
        .route("/rides", post(rides::create_ride))
        .route("/rides", get(rides::list_rides))
        .route("/rides/my-rides", get(rides::my_rides))
        .route("/rides/{id}", get(rides::get_ride))
        .route("/rides/{id}", delete(rides::delete_ride))
        .route("/rides/{id}/status", put(rides::update_ride_status))
        // Ride request workflow
        .route("/ride-requests", post(ride_requests::create_ride_request))
        .route("/ride-requests/my-requests", get(ride_requests::my_requests))
        .route("/ride-requests/ride/{ride_id}", get(ride_requests::requests_for_ride))
        .route("/ride-requests/{id}/accept", post(ride_requests::accept))
        .route("/ride-requests/{id}/decline", post(ride_requests::decline))
        .route("/ride-requests/{id}/cancel", post(ride_requests::cancel))
        .route("/ride-requests/{id}/pickup", post(ride_requests::mark_picked_up))
        .route("/ride-requests/{id}/dropoff", post(ride_requests::mark_dropped_off))
        // Messaging
        .route("/messages", post(messages::send_message))
        .route("/messages", get(messages::my_messages))
        .route("/messages/{id}/read", put(messages::mark_read))
        // Ratings
        .route("/ratings", post(ratings::create_rating))
        .route("/ratings/user/{user_id}", get(ratings::user_ratings))
        .layer(user_governor)
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    // Combine all routes
    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api/admin", admin_routes)
        .nest("/api", api_routes)
        .with_state(state)
}
