//! Seeds a new user's taxonomy with the standard starter set. Each kind is
//! seeded at most once; a second call is rejected rather than duplicated.

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, Set};
use sea_orm::ConnectionTrait;
use uuid::Uuid;

use crate::{
    entities::{category, task_level, task_status},
    models::{
        category::Category,
        guard::{TaxonomyError, TaxonomyKind},
        task_level::TaskLevel,
        task_status::TaskStatus,
    },
};

const DEFAULT_CATEGORIES: &[(&str, &str, &str)] = &[
    ("Work", "Job and career tasks", "#3B82F6"),
    ("Personal", "Errands and life admin", "#10B981"),
    ("Shopping", "Things to buy", "#F59E0B"),
    ("Health", "Fitness and appointments", "#EF4444"),
    ("Learning", "Courses, books and practice", "#8B5CF6"),
];

// (name, color, sort_order, is_completed)
const DEFAULT_STATUSES: &[(&str, &str, i32, bool)] = &[
    ("To Do", "#94A3B8", 0, false),
    ("In Progress", "#3B82F6", 1, false),
    ("In Review", "#F59E0B", 2, false),
    ("Completed", "#22C55E", 3, true),
    ("Cancelled", "#6B7280", 4, false),
];

// (name, level, color, icon)
const DEFAULT_LEVELS: &[(&str, i32, &str, &str)] = &[
    ("Critical", 1, "#DC2626", "flame"),
    ("High", 2, "#F97316", "arrow-up"),
    ("Medium", 3, "#EAB308", "minus"),
    ("Low", 4, "#22C55E", "arrow-down"),
    ("Someday", 5, "#94A3B8", "clock"),
];

async fn ensure_uninitialized<C, E>(
    db: &C,
    kind: TaxonomyKind,
    query: sea_orm::Select<E>,
) -> Result<(), TaxonomyError>
where
    C: ConnectionTrait,
    E: EntityTrait,
    E::Model: sea_orm::FromQueryResult + Sized + Send + Sync,
{
    if query.count(db).await? > 0 {
        return Err(TaxonomyError::AlreadyInitialized(kind));
    }
    Ok(())
}

pub async fn initialize_default_categories<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
) -> Result<Vec<Category>, TaxonomyError> {
    ensure_uninitialized(
        db,
        TaxonomyKind::Category,
        category::Entity::find().filter(category::Column::UserId.eq(user_id)),
    )
    .await?;

    let now = Utc::now();
    for (name, description, color) in DEFAULT_CATEGORIES {
        category::ActiveModel {
            uuid: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            name: Set(name.to_string()),
            description: Set(Some(description.to_string())),
            color: Set(color.to_string()),
            is_default: Set(true),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
            ..Default::default()
        }
        .insert(db)
        .await?;
    }
    tracing::info!(%user_id, "Seeded default categories");
    Ok(Category::find_all(db, user_id).await?)
}

pub async fn initialize_default_statuses<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
) -> Result<Vec<TaskStatus>, TaxonomyError> {
    ensure_uninitialized(
        db,
        TaxonomyKind::TaskStatus,
        task_status::Entity::find().filter(task_status::Column::UserId.eq(user_id)),
    )
    .await?;

    let now = Utc::now();
    for (name, color, sort_order, is_completed) in DEFAULT_STATUSES {
        task_status::ActiveModel {
            uuid: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            name: Set(name.to_string()),
            description: Set(None),
            color: Set(color.to_string()),
            sort_order: Set(*sort_order),
            is_default: Set(true),
            is_completed: Set(*is_completed),
            is_active: Set(true),
            workflow_id: Set(None),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
            ..Default::default()
        }
        .insert(db)
        .await?;
    }
    tracing::info!(%user_id, "Seeded default task statuses");
    Ok(TaskStatus::find_all(db, user_id).await?)
}

pub async fn initialize_default_levels<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
) -> Result<Vec<TaskLevel>, TaxonomyError> {
    ensure_uninitialized(
        db,
        TaxonomyKind::TaskLevel,
        task_level::Entity::find().filter(task_level::Column::UserId.eq(user_id)),
    )
    .await?;

    let now = Utc::now();
    for (name, level, color, icon) in DEFAULT_LEVELS {
        task_level::ActiveModel {
            uuid: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            name: Set(name.to_string()),
            description: Set(None),
            level: Set(*level),
            color: Set(color.to_string()),
            icon: Set(Some(icon.to_string())),
            is_default: Set(true),
            is_active: Set(true),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
            ..Default::default()
        }
        .insert(db)
        .await?;
    }
    tracing::info!(%user_id, "Seeded default task levels");
    Ok(TaskLevel::find_all(db, user_id).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::setup_db;

    #[tokio::test]
    async fn second_initialization_is_rejected_without_duplicates() {
        let db = setup_db().await;
        let user = Uuid::new_v4();

        let seeded = initialize_default_categories(&db, user).await.unwrap();
        assert_eq!(seeded.len(), 5);
        assert!(seeded.iter().all(|c| c.is_default));

        let err = initialize_default_categories(&db, user).await.unwrap_err();
        assert!(matches!(
            err,
            TaxonomyError::AlreadyInitialized(TaxonomyKind::Category)
        ));

        let after = Category::find_all(&db, user).await.unwrap();
        assert_eq!(after.len(), 5);
    }

    #[tokio::test]
    async fn default_statuses_span_the_lifecycle() {
        let db = setup_db().await;
        let user = Uuid::new_v4();

        let seeded = initialize_default_statuses(&db, user).await.unwrap();
        assert_eq!(seeded.len(), 5);
        assert_eq!(
            seeded.iter().filter(|s| s.is_completed).count(),
            1,
            "exactly one completion state"
        );
        assert_eq!(seeded[0].name, "To Do");
    }

    #[tokio::test]
    async fn default_levels_are_densely_ranked() {
        let db = setup_db().await;
        let user = Uuid::new_v4();

        let seeded = initialize_default_levels(&db, user).await.unwrap();
        let ranks: Vec<i32> = seeded.iter().map(|l| l.level).collect();
        assert_eq!(ranks, vec![1, 2, 3, 4, 5]);
    }

    #[tokio::test]
    async fn initialization_is_per_user() {
        let db = setup_db().await;
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        initialize_default_statuses(&db, alice).await.unwrap();
        // Bob's taxonomy is still empty, so his seed succeeds.
        initialize_default_statuses(&db, bob).await.unwrap();
    }
}
