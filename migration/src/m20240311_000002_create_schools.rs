use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(School::Table)
                    .if_not_exists()
                    .col(big_integer(School::Id).auto_increment().primary_key())
                    .col(string_len(School::Name, 150).not_null())
                    .col(string_len(School::Address, 255).not_null())
                    .col(string_len(School::City, 100).not_null())
                    .col(string_len(School::State, 50).not_null())
                    .col(string_len(School::ZipCode, 20).not_null())
                    .col(double(School::Latitude).not_null())
                    .col(double(School::Longitude).not_null())
                    .col(time(School::StartTime).not_null())
                    .col(time(School::EndTime).not_null())
                    .col(
                        timestamp_with_time_zone(School::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(School::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum School {
    Table,
    Id,
    Name,
    Address,
    City,
    State,
    ZipCode,
    Latitude,
    Longitude,
    StartTime,
    EndTime,
    CreatedAt,
}
