use sea_orm_migration::{prelude::*, schema::*};

use super::m20240311_000001_create_users::User;
use super::m20240311_000004_create_rides::Ride;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Rating::Table)
                    .if_not_exists()
                    .col(big_integer(Rating::Id).auto_increment().primary_key())
                    .col(big_integer(Rating::RaterId).not_null())
                    .col(big_integer(Rating::RatedId).not_null())
                    .col(big_integer(Rating::RideId).not_null())
                    .col(
                        integer(Rating::Score).not_null().check(
                            Expr::col(Rating::Score)
                                .gte(1)
                                .and(Expr::col(Rating::Score).lte(5)),
                        ),
                    )
                    .col(text_null(Rating::Comment))
                    .col(
                        timestamp_with_time_zone(Rating::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_rating_rater")
                            .from(Rating::Table, Rating::RaterId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_rating_rated")
                            .from(Rating::Table, Rating::RatedId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_rating_ride")
                            .from(Rating::Table, Rating::RideId)
                            .to(Ride::Table, Ride::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Rating::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Rating {
    Table,
    Id,
    RaterId,
    RatedId,
    RideId,
    Score,
    Comment,
    CreatedAt,
}
