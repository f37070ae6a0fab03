use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DbErr, EntityTrait,
    ItemsAndPagesNumber, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;
use uuid::Uuid;

use crate::{
    entities::{category, task, task_status},
    models::{guard, ids},
    types::TaskPriority,
};

#[derive(Debug, Error)]
pub enum TaskError {
    #[error(transparent)]
    Database(#[from] DbErr),
    #[error("Task not found")]
    NotFound,
    #[error("{0}")]
    Validation(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub category: String,
    pub priority: TaskPriority,
    /// Display name of the status. Resolved from `status_id` at read time
    /// when the reference is set, so a renamed status renders under its new
    /// name; string-only legacy tasks keep their stored label.
    pub status: String,
    pub status_id: Option<Uuid>,
    pub level: i32,
    pub level_id: Option<Uuid>,
    pub workflow_id: Option<Uuid>,
    #[ts(type = "Date | null")]
    pub due_date: Option<DateTime<Utc>>,
    pub user_id: Uuid,
    #[ts(type = "Date | null")]
    pub completed_at: Option<DateTime<Utc>>,
    #[ts(type = "Date")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "Date")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, TS)]
pub struct CreateTask {
    pub title: String,
    pub description: Option<String>,
    pub category: String,
    pub priority: Option<TaskPriority>,
    pub status: Option<String>,
    pub level: Option<i32>,
    pub level_id: Option<Uuid>,
    pub workflow_id: Option<Uuid>,
    #[ts(type = "Date | null")]
    pub due_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Deserialize, TS)]
pub struct UpdateTask {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub priority: Option<TaskPriority>,
    pub status: Option<String>,
    pub level: Option<i32>,
    pub level_id: Option<Uuid>,
    pub workflow_id: Option<Uuid>,
    #[ts(type = "Date | null")]
    pub due_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize, TS)]
pub struct TaskFilter {
    pub status: Option<String>,
    pub category: Option<String>,
    pub priority: Option<TaskPriority>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

#[derive(Debug, Clone, Serialize, TS)]
pub struct PaginationMeta {
    pub current_page: u64,
    pub total_pages: u64,
    pub total_tasks: u64,
    pub has_next: bool,
    pub has_prev: bool,
}

#[derive(Debug, Clone, Serialize, TS)]
pub struct TaskPage {
    pub tasks: Vec<Task>,
    pub pagination: PaginationMeta,
}

#[derive(Debug, Clone, Serialize, TS)]
pub struct TaskStats {
    pub total: u64,
    pub completed: u64,
    pub in_progress: u64,
    pub todo: u64,
    pub high_priority: u64,
    pub overdue: u64,
}

const DEFAULT_PAGE_SIZE: u64 = 10;
const MAX_PAGE_SIZE: u64 = 100;

impl Task {
    async fn from_model<C: ConnectionTrait>(db: &C, model: task::Model) -> Result<Self, DbErr> {
        let (status, status_id) = match model.status_id {
            Some(row_id) => {
                let record = task_status::Entity::find_by_id(row_id).one(db).await?;
                match record {
                    Some(status) => (status.name, Some(status.uuid)),
                    // Reference target vanished; fall back to the stored label.
                    None => (model.status.clone(), None),
                }
            }
            None => (model.status.clone(), None),
        };
        let level_id = match model.level_id {
            Some(row_id) => ids::level_uuid_by_id(db, row_id).await?,
            None => None,
        };
        let workflow_id = match model.workflow_id {
            Some(row_id) => ids::workflow_uuid_by_id(db, row_id).await?,
            None => None,
        };

        Ok(Self {
            id: model.uuid,
            title: model.title,
            description: model.description,
            category: model.category,
            priority: model.priority,
            status,
            status_id,
            level: model.level,
            level_id,
            workflow_id,
            due_date: model.due_date.map(Into::into),
            user_id: model.user_id,
            completed_at: model.completed_at.map(Into::into),
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        })
    }

    pub async fn find_by_id<C: ConnectionTrait>(
        db: &C,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Self>, DbErr> {
        let record = task::Entity::find()
            .filter(task::Column::Uuid.eq(id))
            .filter(task::Column::UserId.eq(user_id))
            .one(db)
            .await?;
        match record {
            Some(model) => Ok(Some(Self::from_model(db, model).await?)),
            None => Ok(None),
        }
    }

    pub async fn create<C: ConnectionTrait>(
        db: &C,
        user_id: Uuid,
        data: &CreateTask,
    ) -> Result<Self, TaskError> {
        let title = data.title.trim().to_string();
        if title.is_empty() {
            return Err(TaskError::Validation("Title is required".to_string()));
        }
        let category_name = data.category.trim().to_string();
        if category_name.is_empty() {
            return Err(TaskError::Validation("Category is required".to_string()));
        }
        Self::ensure_category_exists(db, user_id, &category_name).await?;

        let status = match &data.status {
            Some(name) => guard::resolve_status(db, user_id, name)
                .await?
                .ok_or_else(|| TaskError::Validation(format!("Unknown status '{name}'")))?,
            None => Self::initial_status(db, user_id).await?,
        };

        let level = data.level.unwrap_or(5);
        if !(1..=10).contains(&level) {
            return Err(TaskError::Validation(
                "Level must be between 1 and 10".to_string(),
            ));
        }
        let level_row_id = match data.level_id {
            Some(uuid) => ids::level_id_by_uuid(db, user_id, uuid)
                .await?
                .ok_or_else(|| TaskError::Validation(format!("Unknown level {uuid}")))
                .map(Some)?,
            None => None,
        };
        let workflow_row_id = match data.workflow_id {
            Some(uuid) => ids::workflow_id_by_uuid(db, user_id, uuid)
                .await?
                .ok_or_else(|| TaskError::Validation(format!("Unknown workflow {uuid}")))
                .map(Some)?,
            None => None,
        };

        let now = Utc::now();
        let completed_at = status.is_completed.then_some(now);
        let active = task::ActiveModel {
            uuid: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            title: Set(title),
            description: Set(data.description.clone()),
            category: Set(category_name),
            priority: Set(data.priority.clone().unwrap_or_default()),
            status: Set(status.name.clone()),
            status_id: Set(Some(status.id)),
            level: Set(level),
            level_id: Set(level_row_id),
            workflow_id: Set(workflow_row_id),
            due_date: Set(data.due_date.map(Into::into)),
            completed_at: Set(completed_at.map(Into::into)),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
            ..Default::default()
        };
        let model = active.insert(db).await?;
        Ok(Self::from_model(db, model).await?)
    }

    pub async fn update<C: ConnectionTrait>(
        db: &C,
        user_id: Uuid,
        id: Uuid,
        data: &UpdateTask,
    ) -> Result<Self, TaskError> {
        let record = task::Entity::find()
            .filter(task::Column::Uuid.eq(id))
            .filter(task::Column::UserId.eq(user_id))
            .one(db)
            .await?
            .ok_or(TaskError::NotFound)?;

        let new_status = match &data.status {
            Some(name) => Some(
                guard::resolve_status(db, user_id, name)
                    .await?
                    .ok_or_else(|| TaskError::Validation(format!("Unknown status '{name}'")))?,
            ),
            None => None,
        };
        let new_category = match &data.category {
            Some(name) => {
                let name = name.trim().to_string();
                if name.is_empty() {
                    return Err(TaskError::Validation("Category is required".to_string()));
                }
                if name != record.category {
                    Self::ensure_category_exists(db, user_id, &name).await?;
                }
                Some(name)
            }
            None => None,
        };
        if let Some(level) = data.level {
            if !(1..=10).contains(&level) {
                return Err(TaskError::Validation(
                    "Level must be between 1 and 10".to_string(),
                ));
            }
        }
        let level_row_id = match data.level_id {
            Some(uuid) => ids::level_id_by_uuid(db, user_id, uuid)
                .await?
                .ok_or_else(|| TaskError::Validation(format!("Unknown level {uuid}")))
                .map(Some)?,
            None => None,
        };
        let workflow_row_id = match data.workflow_id {
            Some(uuid) => ids::workflow_id_by_uuid(db, user_id, uuid)
                .await?
                .ok_or_else(|| TaskError::Validation(format!("Unknown workflow {uuid}")))
                .map(Some)?,
            None => None,
        };

        let row_id = record.id;
        let mut active: task::ActiveModel = record.into();
        if let Some(title) = &data.title {
            let title = title.trim().to_string();
            if title.is_empty() {
                return Err(TaskError::Validation("Title is required".to_string()));
            }
            active.title = Set(title);
        }
        match &data.description {
            Some(s) if s.trim().is_empty() => active.description = Set(None),
            Some(s) => active.description = Set(Some(s.clone())),
            None => {}
        }
        if let Some(category) = new_category {
            active.category = Set(category);
        }
        if let Some(priority) = data.priority.clone() {
            active.priority = Set(priority);
        }
        if let Some(status) = &new_status {
            active.status = Set(status.name.clone());
            active.status_id = Set(Some(status.id));
        }
        if let Some(level) = data.level {
            active.level = Set(level);
        }
        if let Some(row_id) = level_row_id {
            active.level_id = Set(Some(row_id));
        }
        if let Some(row_id) = workflow_row_id {
            active.workflow_id = Set(Some(row_id));
        }
        if let Some(due_date) = data.due_date {
            active.due_date = Set(Some(due_date.into()));
        }
        active.updated_at = Set(Utc::now().into());

        let mut updated = active.update(db).await?;

        // Completion is monotonic: stamp once, never clear on later
        // transitions. The null guard lives in the statement itself so a
        // concurrent completing update cannot re-stamp from a stale read.
        if new_status.as_ref().is_some_and(|s| s.is_completed) {
            task::Entity::update_many()
                .col_expr(task::Column::CompletedAt, Expr::value(Utc::now()))
                .filter(task::Column::Id.eq(row_id))
                .filter(task::Column::CompletedAt.is_null())
                .exec(db)
                .await?;
            updated = task::Entity::find_by_id(row_id)
                .one(db)
                .await?
                .ok_or(TaskError::NotFound)?;
        }
        Ok(Self::from_model(db, updated).await?)
    }

    pub async fn delete<C: ConnectionTrait>(
        db: &C,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<u64, DbErr> {
        let result = task::Entity::delete_many()
            .filter(task::Column::Uuid.eq(id))
            .filter(task::Column::UserId.eq(user_id))
            .exec(db)
            .await?;
        Ok(result.rows_affected)
    }

    pub async fn find_for_user<C: ConnectionTrait>(
        db: &C,
        user_id: Uuid,
        filter: &TaskFilter,
    ) -> Result<TaskPage, DbErr> {
        let page = filter.page.unwrap_or(1).max(1);
        let limit = filter
            .limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);

        let mut query = task::Entity::find().filter(task::Column::UserId.eq(user_id));
        if let Some(status) = &filter.status {
            let canonical = guard::normalize_status_name(status);
            query = query.filter(
                Condition::any()
                    .add(task::Column::Status.eq(status.trim()))
                    .add(task::Column::Status.eq(canonical)),
            );
        }
        if let Some(category) = &filter.category {
            query = query.filter(task::Column::Category.eq(category.trim()));
        }
        if let Some(priority) = &filter.priority {
            query = query.filter(task::Column::Priority.eq(priority.clone()));
        }

        let paginator = query
            .order_by_desc(task::Column::CreatedAt)
            .paginate(db, limit);
        let ItemsAndPagesNumber {
            number_of_items,
            number_of_pages,
        } = paginator.num_items_and_pages().await?;
        let models = paginator.fetch_page(page - 1).await?;

        let mut tasks = Vec::with_capacity(models.len());
        for model in models {
            tasks.push(Self::from_model(db, model).await?);
        }

        Ok(TaskPage {
            tasks,
            pagination: PaginationMeta {
                current_page: page,
                total_pages: number_of_pages,
                total_tasks: number_of_items,
                has_next: page < number_of_pages,
                has_prev: page > 1 && number_of_items > 0,
            },
        })
    }

    /// Dashboard aggregates. "Completed" resolves through the dynamic
    /// taxonomy (`is_completed` statuses plus the legacy literals);
    /// todo/in-progress match the seeded default names and their legacy
    /// spellings.
    pub async fn stats<C: ConnectionTrait>(db: &C, user_id: Uuid) -> Result<TaskStats, DbErr> {
        let completed_cond = guard::completed_condition(db, user_id).await?;
        let user_tasks = || task::Entity::find().filter(task::Column::UserId.eq(user_id));

        let total = user_tasks().count(db).await?;
        let completed = user_tasks().filter(completed_cond.clone()).count(db).await?;
        let in_progress = user_tasks()
            .filter(task::Column::Status.is_in(["In Progress", "in_progress", "inprogress"]))
            .count(db)
            .await?;
        let todo = user_tasks()
            .filter(task::Column::Status.is_in(["To Do", "todo"]))
            .count(db)
            .await?;
        let high_priority = user_tasks()
            .filter(task::Column::Priority.eq(TaskPriority::High))
            .count(db)
            .await?;
        let overdue = user_tasks()
            .filter(task::Column::DueDate.lt(Utc::now()))
            .filter(completed_cond.not())
            .count(db)
            .await?;

        Ok(TaskStats {
            total,
            completed,
            in_progress,
            todo,
            high_priority,
            overdue,
        })
    }

    async fn initial_status<C: ConnectionTrait>(
        db: &C,
        user_id: Uuid,
    ) -> Result<task_status::Model, TaskError> {
        task_status::Entity::find()
            .filter(task_status::Column::UserId.eq(user_id))
            .filter(task_status::Column::IsCompleted.eq(false))
            .order_by_asc(task_status::Column::SortOrder)
            .order_by_asc(task_status::Column::CreatedAt)
            .one(db)
            .await?
            .ok_or_else(|| {
                TaskError::Validation(
                    "No task statuses defined; initialize defaults first".to_string(),
                )
            })
    }

    async fn ensure_category_exists<C: ConnectionTrait>(
        db: &C,
        user_id: Uuid,
        name: &str,
    ) -> Result<(), TaskError> {
        let count = category::Entity::find()
            .filter(category::Column::UserId.eq(user_id))
            .filter(category::Column::Name.eq(name))
            .count(db)
            .await?;
        if count == 0 {
            return Err(TaskError::Validation(format!("Unknown category '{name}'")));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::{
            category::{Category, CreateCategory},
            defaults,
            guard::{TaxonomyError, TaxonomyKind},
            task_status::TaskStatus,
        },
        test_support::setup_db,
    };
    use sea_orm::DatabaseConnection;

    async fn seed_user(db: &DatabaseConnection) -> Uuid {
        let user = Uuid::new_v4();
        defaults::initialize_default_categories(db, user).await.unwrap();
        defaults::initialize_default_statuses(db, user).await.unwrap();
        defaults::initialize_default_levels(db, user).await.unwrap();
        user
    }

    fn create(title: &str, category: &str) -> CreateTask {
        CreateTask {
            title: title.to_string(),
            description: None,
            category: category.to_string(),
            priority: None,
            status: None,
            level: None,
            level_id: None,
            workflow_id: None,
            due_date: None,
        }
    }

    #[tokio::test]
    async fn create_defaults_to_first_non_completed_status_and_level_five() {
        let db = setup_db().await;
        let user = seed_user(&db).await;

        let task = Task::create(&db, user, &create("Ship report", "Work"))
            .await
            .unwrap();
        assert_eq!(task.status, "To Do");
        assert!(task.status_id.is_some());
        assert_eq!(task.level, 5);
        assert_eq!(task.priority, crate::types::TaskPriority::Medium);
        assert!(task.completed_at.is_none());
    }

    #[tokio::test]
    async fn create_requires_existing_category() {
        let db = setup_db().await;
        let user = seed_user(&db).await;

        let err = Task::create(&db, user, &create("Task", "Nonexistent"))
            .await
            .unwrap_err();
        assert!(matches!(err, TaskError::Validation(_)));
    }

    #[tokio::test]
    async fn create_normalizes_legacy_status_literals() {
        let db = setup_db().await;
        let user = seed_user(&db).await;

        let mut data = create("Legacy", "Work");
        data.status = Some("in_progress".to_string());
        let task = Task::create(&db, user, &data).await.unwrap();
        assert_eq!(task.status, "In Progress");
    }

    #[tokio::test]
    async fn completion_stamp_is_set_once_and_never_cleared() {
        let db = setup_db().await;
        let user = seed_user(&db).await;
        let task = Task::create(&db, user, &create("Ship report", "Work"))
            .await
            .unwrap();

        let before = Utc::now();
        let task = Task::update(
            &db,
            user,
            task.id,
            &UpdateTask {
                status: Some("Completed".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        let stamped = task.completed_at.expect("completed_at set");
        assert!(stamped >= before - chrono::Duration::seconds(1));
        assert!(stamped <= Utc::now() + chrono::Duration::seconds(1));
        assert_eq!(task.status, "Completed");

        // Reopening keeps the original stamp.
        let reopened = Task::update(
            &db,
            user,
            task.id,
            &UpdateTask {
                status: Some("In Progress".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(reopened.completed_at, Some(stamped));
        assert_eq!(reopened.status, "In Progress");
    }

    #[tokio::test]
    async fn repeated_completing_updates_keep_the_first_stamp() {
        let db = setup_db().await;
        let user = seed_user(&db).await;
        let task = Task::create(&db, user, &create("Ship report", "Work"))
            .await
            .unwrap();

        let complete = UpdateTask {
            status: Some("Completed".to_string()),
            ..Default::default()
        };
        let first = Task::update(&db, user, task.id, &complete).await.unwrap();
        let stamp = first.completed_at.expect("completed_at set");

        // The stamp is guarded in storage, so a later completing update
        // writes nothing even though the clock has moved on.
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let second = Task::update(&db, user, task.id, &complete).await.unwrap();
        assert_eq!(second.completed_at, Some(stamp));
    }

    #[tokio::test]
    async fn creating_directly_in_completed_status_stamps_completed_at() {
        let db = setup_db().await;
        let user = seed_user(&db).await;

        let mut data = create("Already done", "Work");
        data.status = Some("Completed".to_string());
        let task = Task::create(&db, user, &data).await.unwrap();
        assert!(task.completed_at.is_some());
    }

    #[tokio::test]
    async fn deleting_referenced_status_reports_exact_count() {
        let db = setup_db().await;
        let user = seed_user(&db).await;
        let statuses = TaskStatus::find_all(&db, user).await.unwrap();
        let in_progress = statuses.iter().find(|s| s.name == "In Progress").unwrap();

        for i in 0..3 {
            let mut data = create(&format!("Task {i}"), "Work");
            data.status = Some("In Progress".to_string());
            Task::create(&db, user, &data).await.unwrap();
        }

        // Default statuses are protected regardless of references, so test
        // via a custom status too.
        let err = TaskStatus::delete(&db, user, in_progress.id).await.unwrap_err();
        assert!(matches!(
            err,
            TaxonomyError::ProtectedDefault(TaxonomyKind::TaskStatus)
        ));

        let custom = TaskStatus::create(
            &db,
            user,
            &crate::models::task_status::CreateTaskStatus {
                name: "Blocked".to_string(),
                description: None,
                color: "#EF4444".to_string(),
                sort_order: Some(9),
                is_completed: None,
                is_active: None,
                workflow_id: None,
            },
        )
        .await
        .unwrap();
        for i in 0..2 {
            let mut data = create(&format!("Blocked {i}"), "Work");
            data.status = Some("Blocked".to_string());
            Task::create(&db, user, &data).await.unwrap();
        }
        let err = TaskStatus::delete(&db, user, custom.id).await.unwrap_err();
        match err {
            TaxonomyError::ReferencedEntry { count, .. } => assert_eq!(count, 2),
            other => panic!("expected ReferencedEntry, got {other:?}"),
        }

        // After reassigning the tasks the delete goes through.
        let page = Task::find_for_user(
            &db,
            user,
            &TaskFilter {
                status: Some("Blocked".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        for t in page.tasks {
            Task::update(
                &db,
                user,
                t.id,
                &UpdateTask {
                    status: Some("To Do".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        }
        TaskStatus::delete(&db, user, custom.id).await.unwrap();
    }

    #[tokio::test]
    async fn deleting_referenced_category_is_rejected() {
        let db = setup_db().await;
        let user = seed_user(&db).await;
        let custom = Category::create(
            &db,
            user,
            &CreateCategory {
                name: "Side project".to_string(),
                description: None,
                color: "#0EA5E9".to_string(),
            },
        )
        .await
        .unwrap();
        Task::create(&db, user, &create("Task", "Side project"))
            .await
            .unwrap();

        let err = Category::delete(&db, user, custom.id).await.unwrap_err();
        match err {
            TaxonomyError::ReferencedEntry { count, .. } => assert_eq!(count, 1),
            other => panic!("expected ReferencedEntry, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn status_rename_does_not_rewrite_task_strings_but_display_follows_id() {
        let db = setup_db().await;
        let user = seed_user(&db).await;
        let task = Task::create(&db, user, &create("Ship report", "Work"))
            .await
            .unwrap();
        let statuses = TaskStatus::find_all(&db, user).await.unwrap();
        let todo = statuses.iter().find(|s| s.name == "To Do").unwrap();

        TaskStatus::update(
            &db,
            user,
            todo.id,
            &crate::models::task_status::UpdateTaskStatus {
                name: Some("Backlog".to_string()),
                description: None,
                color: None,
                sort_order: None,
                is_completed: None,
                is_active: None,
                workflow_id: None,
            },
        )
        .await
        .unwrap();

        // Display string resolves through status_id to the new name.
        let task = Task::find_by_id(&db, user, task.id).await.unwrap().unwrap();
        assert_eq!(task.status, "Backlog");
    }

    #[tokio::test]
    async fn pagination_reports_partial_last_page() {
        let db = setup_db().await;
        let user = seed_user(&db).await;
        for i in 0..15 {
            Task::create(&db, user, &create(&format!("Task {i}"), "Work"))
                .await
                .unwrap();
        }

        let page = Task::find_for_user(
            &db,
            user,
            &TaskFilter {
                page: Some(2),
                limit: Some(10),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(page.tasks.len(), 5);
        assert_eq!(page.pagination.current_page, 2);
        assert_eq!(page.pagination.total_pages, 2);
        assert_eq!(page.pagination.total_tasks, 15);
        assert!(!page.pagination.has_next);
        assert!(page.pagination.has_prev);
    }

    #[tokio::test]
    async fn list_is_scoped_to_the_user() {
        let db = setup_db().await;
        let alice = seed_user(&db).await;
        let bob = seed_user(&db).await;
        Task::create(&db, alice, &create("Mine", "Work")).await.unwrap();
        Task::create(&db, bob, &create("Theirs", "Work")).await.unwrap();

        let page = Task::find_for_user(&db, alice, &TaskFilter::default())
            .await
            .unwrap();
        assert_eq!(page.tasks.len(), 1);
        assert_eq!(page.tasks[0].title, "Mine");
    }

    #[tokio::test]
    async fn stats_resolve_completion_through_the_taxonomy() {
        let db = setup_db().await;
        let user = seed_user(&db).await;

        let mut done = create("Done", "Work");
        done.status = Some("Completed".to_string());
        Task::create(&db, user, &done).await.unwrap();

        let mut doing = create("Doing", "Work");
        doing.status = Some("In Progress".to_string());
        doing.priority = Some(TaskPriority::High);
        Task::create(&db, user, &doing).await.unwrap();

        let mut late = create("Late", "Work");
        late.due_date = Some(Utc::now() - chrono::Duration::days(2));
        Task::create(&db, user, &late).await.unwrap();

        let stats = Task::stats(&db, user).await.unwrap();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.in_progress, 1);
        assert_eq!(stats.todo, 1);
        assert_eq!(stats.high_priority, 1);
        assert_eq!(stats.overdue, 1);
    }

    #[tokio::test]
    async fn overdue_counts_legacy_rows_without_status_references() {
        let db = setup_db().await;
        let user = seed_user(&db).await;

        // A pre-migration row: bare status literal, no resolved reference.
        // The negated completion predicate must not drop it.
        let now = Utc::now();
        task::ActiveModel {
            uuid: Set(Uuid::new_v4()),
            user_id: Set(user),
            title: Set("Old and late".to_string()),
            description: Set(None),
            category: Set("Work".to_string()),
            priority: Set(TaskPriority::Medium),
            status: Set("todo".to_string()),
            status_id: Set(None),
            level: Set(5),
            level_id: Set(None),
            workflow_id: Set(None),
            due_date: Set(Some(now - chrono::Duration::days(3))),
            completed_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&db)
        .await
        .unwrap();

        let stats = Task::stats(&db, user).await.unwrap();
        assert_eq!(stats.overdue, 1);
        assert_eq!(stats.todo, 1);
        assert_eq!(stats.completed, 0);
    }
}
