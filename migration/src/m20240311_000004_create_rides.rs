use sea_orm_migration::{prelude::*, schema::*, sea_orm::sea_query::extension::postgres::Type};

use super::m20240311_000001_create_users::User;
use super::m20240311_000002_create_schools::School;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create ride status enum
        manager
            .create_type(
                Type::create()
                    .as_enum(RideStatus::Enum)
                    .values([
                        RideStatus::Scheduled,
                        RideStatus::InProgress,
                        RideStatus::Completed,
                        RideStatus::Cancelled,
                    ])
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Ride::Table)
                    .if_not_exists()
                    .col(big_integer(Ride::Id).auto_increment().primary_key())
                    .col(big_integer(Ride::DriverId).not_null())
                    .col(big_integer(Ride::SchoolId).not_null())
                    .col(date(Ride::RideDate).not_null())
                    .col(time(Ride::DepartureTime).not_null())
                    .col(string_len(Ride::PickupLocation, 255).not_null())
                    .col(double(Ride::PickupLat).not_null())
                    .col(double(Ride::PickupLng).not_null())
                    .col(string_len(Ride::DropoffLocation, 255).not_null())
                    .col(double(Ride::DropoffLat).not_null())
                    .col(double(Ride::DropoffLng).not_null())
                    .col(
                        integer(Ride::AvailableSeats).not_null().check(
                            Expr::col(Ride::AvailableSeats)
                                .gte(0)
                                .and(Expr::col(Ride::AvailableSeats).lte(Expr::col(Ride::TotalSeats))),
                        ),
                    )
                    .col(integer(Ride::TotalSeats).not_null())
                    .col(double_null(Ride::SeatCost))
                    .col(string_len_null(Ride::Recurrence, 50))
                    .col(text_null(Ride::Notes))
                    .col(
                        ColumnDef::new(Ride::Status)
                            .custom(RideStatus::Enum)
                            .not_null(),
                    )
                    .col(
                        timestamp_with_time_zone(Ride::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp_with_time_zone(Ride::UpdatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_ride_driver")
                            .from(Ride::Table, Ride::DriverId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_ride_school")
                            .from(Ride::Table, Ride::SchoolId)
                            .to(School::Table, School::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Ride::Table).to_owned())
            .await?;

        manager
            .drop_type(Type::drop().name(RideStatus::Enum).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Ride {
    Table,
    Id,
    DriverId,
    SchoolId,
    RideDate,
    DepartureTime,
    PickupLocation,
    PickupLat,
    PickupLng,
    DropoffLocation,
    DropoffLat,
    DropoffLng,
    AvailableSeats,
    TotalSeats,
    SeatCost,
    Recurrence,
    Notes,
    Status,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
pub enum RideStatus {
    #[sea_orm(iden = "ride_status")]
    Enum,
    #[sea_orm(iden = "scheduled")]
    Scheduled,
    #[sea_orm(iden = "in_progress")]
    InProgress,
    #[sea_orm(iden = "completed")]
    Completed,
    #[sea_orm(iden = "cancelled")]
    Cancelled,
}
