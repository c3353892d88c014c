pub use sea_orm_migration::prelude::*;

mod m20240311_000001_create_users;
mod m20240311_000002_create_schools;
mod m20240311_000003_create_children;
mod m20240311_000004_create_rides;
mod m20240311_000005_create_ride_requests;
mod m20240311_000006_create_messages;
mod m20240311_000007_create_ratings;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240311_000001_create_users::Migration),
            Box::new(m20240311_000002_create_schools::Migration),
            Box::new(m20240311_000003_create_children::Migration),
            Box::new(m20240311_000004_create_rides::Migration),
            Box::new(m20240311_000005_create_ride_requests::Migration),
            Box::new(m20240311_000006_create_messages::Migration),
            Box::new(m20240311_000007_create_ratings::Migration),
        ]
    }
}
