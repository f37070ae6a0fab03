//! Cross-cutting consistency rules between the taxonomy tables and the task
//! table: reference counting before deletes, default-entry protection, legacy
//! status-name normalization, and the completed-status lookup that drives
//! `completed_at` stamping.

use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait, QueryFilter,
    SqlErr,
};
use strum_macros::Display;
use thiserror::Error;
use uuid::Uuid;

use crate::entities::{task, task_status};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum TaxonomyKind {
    #[strum(serialize = "Category")]
    Category,
    #[strum(serialize = "Task status")]
    TaskStatus,
    #[strum(serialize = "Task level")]
    TaskLevel,
    #[strum(serialize = "Workflow")]
    Workflow,
}

#[derive(Debug, Error)]
pub enum TaxonomyError {
    #[error(transparent)]
    Database(#[from] DbErr),
    #[error("{kind} named '{name}' already exists")]
    DuplicateName { kind: TaxonomyKind, name: String },
    #[error("A task level with rank {level} already exists")]
    DuplicateRank { level: i32 },
    #[error("{0} not found")]
    NotFound(TaxonomyKind),
    #[error("Default {0} entries cannot be deleted")]
    ProtectedDefault(TaxonomyKind),
    #[error("{kind} is referenced by {count} task(s); reassign them first")]
    ReferencedEntry { kind: TaxonomyKind, count: u64 },
    #[error("Default {0} entries are already initialized")]
    AlreadyInitialized(TaxonomyKind),
    #[error("{0}")]
    Validation(String),
}

/// Translate a storage-level unique-index violation into the domain duplicate
/// error. The index is the authority under concurrent creates; the
/// application pre-checks only exist for friendlier messages.
pub fn map_unique_violation(err: DbErr, kind: TaxonomyKind, name: &str) -> TaxonomyError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => TaxonomyError::DuplicateName {
            kind,
            name: name.to_string(),
        },
        _ => TaxonomyError::Database(err),
    }
}

/// Task levels carry two per-user unique indexes; disambiguate which one
/// fired by the violated column. The table name appears in the detail too,
/// so matching a bare "level" would classify every violation as a rank clash.
pub fn map_level_unique_violation(err: DbErr, name: &str, level: i32) -> TaxonomyError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) => {
            if detail.contains(".level") {
                TaxonomyError::DuplicateRank { level }
            } else {
                TaxonomyError::DuplicateName {
                    kind: TaxonomyKind::TaskLevel,
                    name: name.to_string(),
                }
            }
        }
        _ => TaxonomyError::Database(err),
    }
}

/// Tasks reference categories by name only.
pub async fn tasks_referencing_category<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
    name: &str,
) -> Result<u64, DbErr> {
    task::Entity::find()
        .filter(task::Column::UserId.eq(user_id))
        .filter(task::Column::Category.eq(name))
        .count(db)
        .await
}

/// Tasks reference statuses by denormalized name and, when resolved at write
/// time, by row id. A renamed status keeps its row id, so both must be
/// checked before a delete.
pub async fn tasks_referencing_status<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
    status_row_id: i64,
    name: &str,
) -> Result<u64, DbErr> {
    task::Entity::find()
        .filter(task::Column::UserId.eq(user_id))
        .filter(
            Condition::any()
                .add(task::Column::StatusId.eq(status_row_id))
                .add(task::Column::Status.eq(name)),
        )
        .count(db)
        .await
}

pub async fn tasks_referencing_level<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
    level_row_id: i64,
) -> Result<u64, DbErr> {
    task::Entity::find()
        .filter(task::Column::UserId.eq(user_id))
        .filter(task::Column::LevelId.eq(level_row_id))
        .count(db)
        .await
}

pub async fn tasks_referencing_workflow<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
    workflow_row_id: i64,
) -> Result<u64, DbErr> {
    task::Entity::find()
        .filter(task::Column::UserId.eq(user_id))
        .filter(task::Column::WorkflowId.eq(workflow_row_id))
        .count(db)
        .await
}

/// Canonical names for the legacy fixed-enum status literals. Older tasks
/// (and older clients) still send these; they map onto the seeded defaults.
pub fn normalize_status_name(name: &str) -> &str {
    let trimmed = name.trim();
    match trimmed.to_ascii_lowercase().replace(['-', '_', ' '], "").as_str() {
        "todo" => "To Do",
        "inprogress" => "In Progress",
        "inreview" => "In Review",
        "completed" | "done" => "Completed",
        "cancelled" | "canceled" => "Cancelled",
        _ => trimmed,
    }
}

/// Look up a status by name for the user, trying the exact name first and
/// the normalized legacy spelling second.
pub async fn resolve_status<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
    name: &str,
) -> Result<Option<task_status::Model>, DbErr> {
    let exact = task_status::Entity::find()
        .filter(task_status::Column::UserId.eq(user_id))
        .filter(task_status::Column::Name.eq(name.trim()))
        .one(db)
        .await?;
    if exact.is_some() {
        return Ok(exact);
    }

    let canonical = normalize_status_name(name);
    if canonical == name.trim() {
        return Ok(None);
    }
    task_status::Entity::find()
        .filter(task_status::Column::UserId.eq(user_id))
        .filter(task_status::Column::Name.eq(canonical))
        .one(db)
        .await
}

/// Condition matching the user's completed tasks: a resolved reference to an
/// `is_completed` status, or a denormalized name in the completed set. The
/// legacy `completed` literal stays in the set for tasks that predate the
/// dynamic taxonomy.
pub async fn completed_condition<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
) -> Result<Condition, DbErr> {
    let completed: Vec<(i64, String)> = {
        use sea_orm::QuerySelect;
        task_status::Entity::find()
            .select_only()
            .column(task_status::Column::Id)
            .column(task_status::Column::Name)
            .filter(task_status::Column::UserId.eq(user_id))
            .filter(task_status::Column::IsCompleted.eq(true))
            .into_tuple()
            .all(db)
            .await?
    };

    let row_ids: Vec<i64> = completed.iter().map(|(id, _)| *id).collect();
    let mut names: Vec<String> = completed.into_iter().map(|(_, name)| name).collect();
    names.push("completed".to_string());
    names.push("done".to_string());

    let mut condition = Condition::any().add(task::Column::Status.is_in(names));
    if !row_ids.is_empty() {
        // `status_id IN (...)` is NULL for the string-only legacy rows,
        // which would poison a negated condition. Anchoring on NOT NULL
        // keeps the whole predicate two-valued.
        condition = condition.add(
            Condition::all()
                .add(task::Column::StatusId.is_not_null())
                .add(task::Column::StatusId.is_in(row_ids)),
        );
    }
    Ok(condition)
}
