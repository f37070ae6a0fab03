//! Row-id/uuid translation helpers. Entities key on integer row ids while the
//! public models only ever expose UUIDs; lookups in the uuid direction are
//! scoped to the owning user.

use sea_orm::{ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QuerySelect};
use uuid::Uuid;

use crate::entities::{task_level, task_status, workflow};

pub async fn status_id_by_uuid<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
    uuid: Uuid,
) -> Result<Option<i64>, DbErr> {
    task_status::Entity::find()
        .select_only()
        .column(task_status::Column::Id)
        .filter(task_status::Column::Uuid.eq(uuid))
        .filter(task_status::Column::UserId.eq(user_id))
        .into_tuple()
        .one(db)
        .await
}

pub async fn status_uuid_by_id<C: ConnectionTrait>(
    db: &C,
    id: i64,
) -> Result<Option<Uuid>, DbErr> {
    task_status::Entity::find()
        .select_only()
        .column(task_status::Column::Uuid)
        .filter(task_status::Column::Id.eq(id))
        .into_tuple()
        .one(db)
        .await
}

pub async fn level_id_by_uuid<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
    uuid: Uuid,
) -> Result<Option<i64>, DbErr> {
    task_level::Entity::find()
        .select_only()
        .column(task_level::Column::Id)
        .filter(task_level::Column::Uuid.eq(uuid))
        .filter(task_level::Column::UserId.eq(user_id))
        .into_tuple()
        .one(db)
        .await
}

pub async fn level_uuid_by_id<C: ConnectionTrait>(
    db: &C,
    id: i64,
) -> Result<Option<Uuid>, DbErr> {
    task_level::Entity::find()
        .select_only()
        .column(task_level::Column::Uuid)
        .filter(task_level::Column::Id.eq(id))
        .into_tuple()
        .one(db)
        .await
}

pub async fn workflow_id_by_uuid<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
    uuid: Uuid,
) -> Result<Option<i64>, DbErr> {
    workflow::Entity::find()
        .select_only()
        .column(workflow::Column::Id)
        .filter(workflow::Column::Uuid.eq(uuid))
        .filter(workflow::Column::UserId.eq(user_id))
        .into_tuple()
        .one(db)
        .await
}

pub async fn workflow_uuid_by_id<C: ConnectionTrait>(
    db: &C,
    id: i64,
) -> Result<Option<Uuid>, DbErr> {
    workflow::Entity::find()
        .select_only()
        .column(workflow::Column::Uuid)
        .filter(workflow::Column::Id.eq(id))
        .into_tuple()
        .one(db)
        .await
}
