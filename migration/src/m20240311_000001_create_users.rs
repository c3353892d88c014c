use sea_orm_migration::{prelude::*, schema::*, sea_orm::sea_query::extension::postgres::Type};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create user role enum
        manager
            .create_type(
                Type::create()
                    .as_enum(UserRole::Enum)
                    .values([UserRole::Admin, UserRole::Parent])
                    .to_owned(),
            )
            .await?;

        // Create verification status enum
        manager
            .create_type(
                Type::create()
                    .as_enum(VerificationStatus::Enum)
                    .values([
                        VerificationStatus::Pending,
                        VerificationStatus::Verified,
                        VerificationStatus::Rejected,
                    ])
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(User::Table)
                    .if_not_exists()
                    .col(big_integer(User::Id).auto_increment().primary_key())
                    .col(string_len(User::Email, 255).not_null().unique_key())
                    .col(string_len(User::PasswordHash, 255).not_null())
                    .col(string_len(User::FullName, 100).not_null())
                    .col(string_len_null(User::Phone, 30))
                    .col(
                        ColumnDef::new(User::Role)
                            .custom(UserRole::Enum)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(User::VerificationStatus)
                            .custom(VerificationStatus::Enum)
                            .not_null(),
                    )
                    .col(
                        boolean(User::BackgroundCheckCompleted)
                            .not_null()
                            .default(false),
                    )
                    .col(double(User::AverageRating).not_null().default(0.0))
                    .col(integer(User::TotalRatings).not_null().default(0))
                    .col(
                        timestamp_with_time_zone(User::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(User::Table).to_owned())
            .await?;

        manager
            .drop_type(Type::drop().name(VerificationStatus::Enum).to_owned())
            .await?;

        manager
            .drop_type(Type::drop().name(UserRole::Enum).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum User {
    Table,
    Id,
    Email,
    PasswordHash,
    FullName,
    Phone,
    Role,
    VerificationStatus,
    BackgroundCheckCompleted,
    AverageRating,
    TotalRatings,
    CreatedAt,
}

#[derive(DeriveIden)]
pub enum UserRole {
    #[sea_orm(iden = "user_role")]
    Enum,
    #[sea_orm(iden = "admin")]
    Admin,
    #[sea_orm(iden = "parent")]
    Parent,
}

#[derive(DeriveIden)]
pub enum VerificationStatus {
    #[sea_orm(iden = "verification_status")]
    Enum,
    #[sea_orm(iden = "pending")]
    Pending,
    #[sea_orm(iden = "verified")]
    Verified,
    #[sea_orm(iden = "rejected")]
    Rejected,
}
