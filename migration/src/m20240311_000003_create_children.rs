use sea_orm_migration::{prelude::*, schema::*};

use super::m20240311_000001_create_users::User;
use super::m20240311_000002_create_schools::School;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Child::Table)
                    .if_not_exists()
                    .col(big_integer(Child::Id).auto_increment().primary_key())
                    .col(big_integer(Child::ParentId).not_null())
                    .col(string_len(Child::Name, 100).not_null())
                    .col(integer(Child::Age).not_null())
                    .col(string_len_null(Child::Grade, 20))
                    .col(big_integer_null(Child::SchoolId))
                    .col(string_len_null(Child::EmergencyContactName, 100))
                    .col(string_len_null(Child::EmergencyContactPhone, 30))
                    .col(text_null(Child::MedicalInfo))
                    .col(text_null(Child::SpecialNeeds))
                    .col(
                        timestamp_with_time_zone(Child::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_child_parent")
                            .from(Child::Table, Child::ParentId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_child_school")
                            .from(Child::Table, Child::SchoolId)
                            .to(School::Table, School::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Child::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Child {
    Table,
    Id,
    ParentId,
    Name,
    Age,
    Grade,
    SchoolId,
    EmergencyContactName,
    EmergencyContactPhone,
    MedicalInfo,
    SpecialNeeds,
    CreatedAt,
}
