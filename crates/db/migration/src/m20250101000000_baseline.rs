use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::DatabaseBackend;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create().if_not_exists()
                    .table(Categories::Table)
                    .col(pk_id_col(manager, Categories::Id))
                    .col(uuid_col(Categories::Uuid))
                    .col(uuid_col(Categories::UserId))
                    .col(ColumnDef::new(Categories::Name).string().not_null())
                    .col(ColumnDef::new(Categories::Description).text())
                    .col(ColumnDef::new(Categories::Color).string_len(16).not_null())
                    .col(bool_col(Categories::IsDefault, false))
                    .col(timestamp_col(Categories::CreatedAt))
                    .col(timestamp_col(Categories::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create().if_not_exists()
                    .name("idx_categories_uuid")
                    .table(Categories::Table)
                    .col(Categories::Uuid)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Uniqueness per user is enforced here, not in application code, so
        // concurrent creates race into a retryable duplicate error.
        manager
            .create_index(
                Index::create().if_not_exists()
                    .name("idx_categories_user_id_name")
                    .table(Categories::Table)
                    .col(Categories::UserId)
                    .col(Categories::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create().if_not_exists()
                    .table(Workflows::Table)
                    .col(pk_id_col(manager, Workflows::Id))
                    .col(uuid_col(Workflows::Uuid))
                    .col(uuid_col(Workflows::UserId))
                    .col(ColumnDef::new(Workflows::Name).string().not_null())
                    .col(ColumnDef::new(Workflows::Description).text())
                    .col(bool_col(Workflows::IsDefault, false))
                    .col(bool_col(Workflows::IsActive, true))
                    .col(
                        ColumnDef::new(Workflows::Statuses)
                            .json()
                            .not_null()
                            .default(Expr::val("[]")),
                    )
                    .col(timestamp_col(Workflows::CreatedAt))
                    .col(timestamp_col(Workflows::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create().if_not_exists()
                    .name("idx_workflows_uuid")
                    .table(Workflows::Table)
                    .col(Workflows::Uuid)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create().if_not_exists()
                    .name("idx_workflows_user_id_name")
                    .table(Workflows::Table)
                    .col(Workflows::UserId)
                    .col(Workflows::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create().if_not_exists()
                    .table(TaskStatuses::Table)
                    .col(pk_id_col(manager, TaskStatuses::Id))
                    .col(uuid_col(TaskStatuses::Uuid))
                    .col(uuid_col(TaskStatuses::UserId))
                    .col(ColumnDef::new(TaskStatuses::Name).string().not_null())
                    .col(ColumnDef::new(TaskStatuses::Description).text())
                    .col(ColumnDef::new(TaskStatuses::Color).string_len(16).not_null())
                    .col(
                        ColumnDef::new(TaskStatuses::SortOrder)
                            .integer()
                            .not_null()
                            .default(Expr::val(0)),
                    )
                    .col(bool_col(TaskStatuses::IsDefault, false))
                    .col(bool_col(TaskStatuses::IsCompleted, false))
                    .col(bool_col(TaskStatuses::IsActive, true))
                    .col(fk_id_nullable_col(manager, TaskStatuses::WorkflowId))
                    .col(timestamp_col(TaskStatuses::CreatedAt))
                    .col(timestamp_col(TaskStatuses::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create().if_not_exists()
                    .name("idx_task_statuses_uuid")
                    .table(TaskStatuses::Table)
                    .col(TaskStatuses::Uuid)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create().if_not_exists()
                    .name("idx_task_statuses_user_id_name")
                    .table(TaskStatuses::Table)
                    .col(TaskStatuses::UserId)
                    .col(TaskStatuses::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create().if_not_exists()
                    .name("idx_task_statuses_workflow_id")
                    .table(TaskStatuses::Table)
                    .col(TaskStatuses::WorkflowId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create().if_not_exists()
                    .table(TaskLevels::Table)
                    .col(pk_id_col(manager, TaskLevels::Id))
                    .col(uuid_col(TaskLevels::Uuid))
                    .col(uuid_col(TaskLevels::UserId))
                    .col(ColumnDef::new(TaskLevels::Name).string().not_null())
                    .col(ColumnDef::new(TaskLevels::Description).text())
                    .col(ColumnDef::new(TaskLevels::Level).integer().not_null())
                    .col(ColumnDef::new(TaskLevels::Color).string_len(16).not_null())
                    .col(ColumnDef::new(TaskLevels::Icon).string())
                    .col(bool_col(TaskLevels::IsDefault, false))
                    .col(bool_col(TaskLevels::IsActive, true))
                    .col(timestamp_col(TaskLevels::CreatedAt))
                    .col(timestamp_col(TaskLevels::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create().if_not_exists()
                    .name("idx_task_levels_uuid")
                    .table(TaskLevels::Table)
                    .col(TaskLevels::Uuid)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create().if_not_exists()
                    .name("idx_task_levels_user_id_name")
                    .table(TaskLevels::Table)
                    .col(TaskLevels::UserId)
                    .col(TaskLevels::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create().if_not_exists()
                    .name("idx_task_levels_user_id_level")
                    .table(TaskLevels::Table)
                    .col(TaskLevels::UserId)
                    .col(TaskLevels::Level)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create().if_not_exists()
                    .table(Tasks::Table)
                    .col(pk_id_col(manager, Tasks::Id))
                    .col(uuid_col(Tasks::Uuid))
                    .col(uuid_col(Tasks::UserId))
                    .col(ColumnDef::new(Tasks::Title).string().not_null())
                    .col(ColumnDef::new(Tasks::Description).text())
                    .col(ColumnDef::new(Tasks::Category).string().not_null())
                    .col(
                        ColumnDef::new(Tasks::Priority)
                            .string_len(16)
                            .not_null()
                            .default(Expr::val("medium")),
                    )
                    .col(ColumnDef::new(Tasks::Status).string().not_null())
                    .col(fk_id_nullable_col(manager, Tasks::StatusId))
                    .col(
                        ColumnDef::new(Tasks::Level)
                            .integer()
                            .not_null()
                            .default(Expr::val(5)),
                    )
                    .col(fk_id_nullable_col(manager, Tasks::LevelId))
                    .col(fk_id_nullable_col(manager, Tasks::WorkflowId))
                    .col(ColumnDef::new(Tasks::DueDate).timestamp())
                    .col(ColumnDef::new(Tasks::CompletedAt).timestamp())
                    .col(timestamp_col(Tasks::CreatedAt))
                    .col(timestamp_col(Tasks::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create().if_not_exists()
                    .name("idx_tasks_uuid")
                    .table(Tasks::Table)
                    .col(Tasks::Uuid)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create().if_not_exists()
                    .name("idx_tasks_user_id_status")
                    .table(Tasks::Table)
                    .col(Tasks::UserId)
                    .col(Tasks::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create().if_not_exists()
                    .name("idx_tasks_user_id_category")
                    .table(Tasks::Table)
                    .col(Tasks::UserId)
                    .col(Tasks::Category)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create().if_not_exists()
                    .name("idx_tasks_user_id_created_at")
                    .table(Tasks::Table)
                    .col(Tasks::UserId)
                    .col(Tasks::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Tasks::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(TaskLevels::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(TaskStatuses::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Workflows::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Categories::Table).to_owned())
            .await?;
        Ok(())
    }
}

fn pk_id_col<T: Iden>(manager: &SchemaManager, col: T) -> ColumnDef {
    let mut col = ColumnDef::new(col);
    match manager.get_database_backend() {
        DatabaseBackend::Sqlite => {
            col.integer();
        }
        _ => {
            col.big_integer();
        }
    }
    col.not_null().auto_increment().primary_key().to_owned()
}

fn fk_id_nullable_col<T: Iden>(manager: &SchemaManager, col: T) -> ColumnDef {
    let mut col = ColumnDef::new(col);
    match manager.get_database_backend() {
        DatabaseBackend::Sqlite => {
            col.integer();
        }
        _ => {
            col.big_integer();
        }
    }
    col.to_owned()
}

fn uuid_col<T: Iden>(col: T) -> ColumnDef {
    ColumnDef::new(col).uuid().not_null().to_owned()
}

fn bool_col<T: Iden>(col: T, default: bool) -> ColumnDef {
    ColumnDef::new(col)
        .boolean()
        .not_null()
        .default(Expr::val(default))
        .to_owned()
}

fn timestamp_col<T: Iden>(col: T) -> ColumnDef {
    ColumnDef::new(col)
        .timestamp()
        .not_null()
        .default(Expr::current_timestamp())
        .to_owned()
}

#[derive(Iden)]
enum Categories {
    Table,
    Id,
    Uuid,
    UserId,
    Name,
    Description,
    Color,
    IsDefault,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum TaskStatuses {
    Table,
    Id,
    Uuid,
    UserId,
    Name,
    Description,
    Color,
    SortOrder,
    IsDefault,
    IsCompleted,
    IsActive,
    WorkflowId,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum TaskLevels {
    Table,
    Id,
    Uuid,
    UserId,
    Name,
    Description,
    Level,
    Color,
    Icon,
    IsDefault,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Workflows {
    Table,
    Id,
    Uuid,
    UserId,
    Name,
    Description,
    IsDefault,
    IsActive,
    Statuses,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Tasks {
    Table,
    Id,
    Uuid,
    UserId,
    Title,
    Description,
    Category,
    Priority,
    Status,
    StatusId,
    Level,
    LevelId,
    WorkflowId,
    DueDate,
    CompletedAt,
    CreatedAt,
    UpdatedAt,
}
