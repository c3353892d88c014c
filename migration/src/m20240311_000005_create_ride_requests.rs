use sea_orm_migration::{prelude::*, schema::*, sea_orm::sea_query::extension::postgres::Type};

use super::m20240311_000001_create_users::User;
use super::m20240311_000003_create_children::Child;
use super::m20240311_000004_create_rides::Ride;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create request status enum
        manager
            .create_type(
                Type::create()
                    .as_enum(RequestStatus::Enum)
                    .values([
                        RequestStatus::Pending,
                        RequestStatus::Accepted,
                        RequestStatus::Declined,
                        RequestStatus::Cancelled,
                    ])
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(RideRequest::Table)
                    .if_not_exists()
                    .col(big_integer(RideRequest::Id).auto_increment().primary_key())
                    .col(big_integer(RideRequest::RideId).not_null())
                    .col(big_integer(RideRequest::RequesterId).not_null())
                    .col(big_integer(RideRequest::ChildId).not_null())
                    .col(string_len(RideRequest::PickupAddress, 255).not_null())
                    .col(double(RideRequest::PickupLat).not_null())
                    .col(double(RideRequest::PickupLng).not_null())
                    .col(
                        ColumnDef::new(RideRequest::Status)
                            .custom(RequestStatus::Enum)
                            .not_null(),
                    )
                    .col(timestamp_with_time_zone_null(RideRequest::PickedUpAt))
                    .col(timestamp_with_time_zone_null(RideRequest::DroppedOffAt))
                    .col(text_null(RideRequest::Notes))
                    .col(
                        timestamp_with_time_zone(RideRequest::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp_with_time_zone(RideRequest::UpdatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_ride_request_ride")
                            .from(RideRequest::Table, RideRequest::RideId)
                            .to(Ride::Table, Ride::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_ride_request_requester")
                            .from(RideRequest::Table, RideRequest::RequesterId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_ride_request_child")
                            .from(RideRequest::Table, RideRequest::ChildId)
                            .to(Child::Table, Child::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(RideRequest::Table).to_owned())
            .await?;

        manager
            .drop_type(Type::drop().name(RequestStatus::Enum).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum RideRequest {
    Table,
    Id,
    RideId,
    RequesterId,
    ChildId,
    PickupAddress,
    PickupLat,
    PickupLng,
    Status,
    PickedUpAt,
    DroppedOffAt,
    Notes,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
pub enum RequestStatus {
    #[sea_orm(iden = "request_status")]
    Enum,
    #[sea_orm(iden = "pending")]
    Pending,
    #[sea_orm(iden = "accepted")]
    Accepted,
    #[sea_orm(iden = "declined")]
    Declined,
    #[sea_orm(iden = "cancelled")]
    Cancelled,
}
