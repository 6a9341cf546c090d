use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 创建用户表
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Users::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Users::Username)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Users::Email)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Users::PasswordHash).string().not_null())
                    .col(ColumnDef::new(Users::Role).string().not_null())
                    .col(ColumnDef::new(Users::Status).string().not_null())
                    .col(ColumnDef::new(Users::Department).string().null())
                    .col(ColumnDef::new(Users::DisplayName).string().null())
                    .col(ColumnDef::new(Users::LastLogin).big_integer().null())
                    .col(ColumnDef::new(Users::CreatedAt).big_integer().not_null())
                    .col(ColumnDef::new(Users::UpdatedAt).big_integer().not_null())
                    .to_owned(),
            )
            .await?;

        // 创建课程/服务表
        manager
            .create_table(
                Table::create()
                    .table(Offerings::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Offerings::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Offerings::Code)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Offerings::Name).string().not_null())
                    .col(ColumnDef::new(Offerings::Description).text().null())
                    .col(ColumnDef::new(Offerings::OfferingType).string().not_null())
                    .col(ColumnDef::new(Offerings::Department).string().not_null())
                    .col(ColumnDef::new(Offerings::ResponsibleId).big_integer().null())
                    .col(ColumnDef::new(Offerings::Credits).integer().null())
                    .col(ColumnDef::new(Offerings::Semester).string().null())
                    .col(
                        ColumnDef::new(Offerings::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Offerings::CreatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Offerings::UpdatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Offerings::Table, Offerings::ResponsibleId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        // 创建评价表（回复内联存储，每条评价至多一条回复）
        manager
            .create_table(
                Table::create()
                    .table(Reviews::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Reviews::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Reviews::OfferingId).big_integer().not_null())
                    .col(ColumnDef::new(Reviews::ReviewerId).big_integer().not_null())
                    .col(ColumnDef::new(Reviews::RatingOverall).small_integer().not_null())
                    .col(ColumnDef::new(Reviews::RatingClarity).small_integer().null())
                    .col(ColumnDef::new(Reviews::RatingMaterial).small_integer().null())
                    .col(ColumnDef::new(Reviews::RatingPedagogy).small_integer().null())
                    .col(ColumnDef::new(Reviews::Comment).text().not_null())
                    .col(
                        ColumnDef::new(Reviews::Anonymous)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(Reviews::Status).string().not_null())
                    .col(ColumnDef::new(Reviews::ModeratedBy).big_integer().null())
                    .col(ColumnDef::new(Reviews::ModeratedAt).big_integer().null())
                    .col(ColumnDef::new(Reviews::ResponseText).text().null())
                    .col(ColumnDef::new(Reviews::ResponderId).big_integer().null())
                    .col(ColumnDef::new(Reviews::RespondedAt).big_integer().null())
                    .col(ColumnDef::new(Reviews::ResponseUpdatedAt).big_integer().null())
                    .col(ColumnDef::new(Reviews::CreatedAt).big_integer().not_null())
                    .col(ColumnDef::new(Reviews::UpdatedAt).big_integer().not_null())
                    .col(ColumnDef::new(Reviews::DeletedAt).big_integer().null())
                    .foreign_key(
                        ForeignKey::create()
                            .from(Reviews::Table, Reviews::OfferingId)
                            .to(Offerings::Table, Offerings::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Reviews::Table, Reviews::ReviewerId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 创建索引
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_users_role")
                    .table(Users::Table)
                    .col(Users::Role)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_offerings_department")
                    .table(Offerings::Table)
                    .col(Offerings::Department)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_offerings_responsible_id")
                    .table(Offerings::Table)
                    .col(Offerings::ResponsibleId)
                    .to_owned(),
            )
            .await?;

        // 重复提交检查走这个索引
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_reviews_reviewer_offering")
                    .table(Reviews::Table)
                    .col(Reviews::ReviewerId)
                    .col(Reviews::OfferingId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_reviews_offering_status")
                    .table(Reviews::Table)
                    .col(Reviews::OfferingId)
                    .col(Reviews::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_reviews_status_created_at")
                    .table(Reviews::Table)
                    .col(Reviews::Status)
                    .col(Reviews::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Reviews::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Offerings::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Users {
    #[sea_orm(iden = "users")]
    Table,
    Id,
    Username,
    Email,
    PasswordHash,
    Role,
    Status,
    Department,
    DisplayName,
    LastLogin,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Offerings {
    #[sea_orm(iden = "offerings")]
    Table,
    Id,
    Code,
    Name,
    Description,
    OfferingType,
    Department,
    ResponsibleId,
    Credits,
    Semester,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Reviews {
    #[sea_orm(iden = "reviews")]
    Table,
    Id,
    OfferingId,
    ReviewerId,
    RatingOverall,
    RatingClarity,
    RatingMaterial,
    RatingPedagogy,
    Comment,
    Anonymous,
    Status,
    ModeratedBy,
    ModeratedAt,
    ResponseText,
    ResponderId,
    RespondedAt,
    ResponseUpdatedAt,
    CreatedAt,
    UpdatedAt,
    DeletedAt,
}
