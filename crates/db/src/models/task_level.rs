use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::{
    entities::task_level,
    models::guard::{self, TaxonomyError, TaxonomyKind},
};

pub const MIN_LEVEL: i32 = 1;
pub const MAX_LEVEL: i32 = 10;

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct TaskLevel {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    /// Dense priority rank, unique per user. Lower means more urgent.
    pub level: i32,
    pub color: String,
    pub icon: Option<String>,
    pub is_default: bool,
    pub is_active: bool,
    #[ts(type = "Date")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "Date")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, TS)]
pub struct CreateTaskLevel {
    pub name: String,
    pub description: Option<String>,
    pub level: i32,
    pub color: String,
    pub icon: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize, TS)]
pub struct UpdateTaskLevel {
    pub name: Option<String>,
    pub description: Option<String>,
    pub level: Option<i32>,
    pub color: Option<String>,
    pub icon: Option<String>,
    pub is_active: Option<bool>,
}

impl TaskLevel {
    fn from_model(model: task_level::Model) -> Self {
        Self {
            id: model.uuid,
            name: model.name,
            description: model.description,
            level: model.level,
            color: model.color,
            icon: model.icon,
            is_default: model.is_default,
            is_active: model.is_active,
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        }
    }

    fn validate_rank(level: i32) -> Result<(), TaxonomyError> {
        if !(MIN_LEVEL..=MAX_LEVEL).contains(&level) {
            return Err(TaxonomyError::Validation(format!(
                "Level must be between {MIN_LEVEL} and {MAX_LEVEL}"
            )));
        }
        Ok(())
    }

    pub async fn find_all<C: ConnectionTrait>(
        db: &C,
        user_id: Uuid,
    ) -> Result<Vec<Self>, DbErr> {
        let records = task_level::Entity::find()
            .filter(task_level::Column::UserId.eq(user_id))
            .order_by_asc(task_level::Column::Level)
            .all(db)
            .await?;
        Ok(records.into_iter().map(Self::from_model).collect())
    }

    pub async fn find_by_id<C: ConnectionTrait>(
        db: &C,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Self>, DbErr> {
        let record = task_level::Entity::find()
            .filter(task_level::Column::Uuid.eq(id))
            .filter(task_level::Column::UserId.eq(user_id))
            .one(db)
            .await?;
        Ok(record.map(Self::from_model))
    }

    pub async fn create<C: ConnectionTrait>(
        db: &C,
        user_id: Uuid,
        data: &CreateTaskLevel,
    ) -> Result<Self, TaxonomyError> {
        let name = data.name.trim().to_string();
        if name.is_empty() {
            return Err(TaxonomyError::Validation(
                "Level name is required".to_string(),
            ));
        }
        Self::validate_rank(data.level)?;
        Self::ensure_name_free(db, user_id, &name, None).await?;
        Self::ensure_rank_free(db, user_id, data.level, None).await?;

        let now = Utc::now();
        let active = task_level::ActiveModel {
            uuid: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            name: Set(name.clone()),
            description: Set(data.description.clone()),
            level: Set(data.level),
            color: Set(data.color.clone()),
            icon: Set(data.icon.clone()),
            is_default: Set(false),
            is_active: Set(data.is_active.unwrap_or(true)),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
            ..Default::default()
        };
        let model = active
            .insert(db)
            .await
            .map_err(|err| guard::map_level_unique_violation(err, &name, data.level))?;
        Ok(Self::from_model(model))
    }

    pub async fn update<C: ConnectionTrait>(
        db: &C,
        user_id: Uuid,
        id: Uuid,
        data: &UpdateTaskLevel,
    ) -> Result<Self, TaxonomyError> {
        let record = task_level::Entity::find()
            .filter(task_level::Column::Uuid.eq(id))
            .filter(task_level::Column::UserId.eq(user_id))
            .one(db)
            .await?
            .ok_or(TaxonomyError::NotFound(TaxonomyKind::TaskLevel))?;

        let new_name = match &data.name {
            Some(name) if name.trim() != record.name => {
                let name = name.trim().to_string();
                if name.is_empty() {
                    return Err(TaxonomyError::Validation(
                        "Level name is required".to_string(),
                    ));
                }
                Self::ensure_name_free(db, user_id, &name, Some(record.id)).await?;
                Some(name)
            }
            _ => None,
        };
        if let Some(level) = data.level {
            Self::validate_rank(level)?;
            if level != record.level {
                Self::ensure_rank_free(db, user_id, level, Some(record.id)).await?;
            }
        }
        let effective_name = new_name.clone().unwrap_or_else(|| record.name.clone());
        let effective_level = data.level.unwrap_or(record.level);

        let mut active: task_level::ActiveModel = record.into();
        if let Some(name) = new_name {
            active.name = Set(name);
        }
        match &data.description {
            Some(s) if s.trim().is_empty() => active.description = Set(None),
            Some(s) => active.description = Set(Some(s.clone())),
            None => {}
        }
        if let Some(level) = data.level {
            active.level = Set(level);
        }
        if let Some(color) = data.color.clone() {
            active.color = Set(color);
        }
        if let Some(icon) = data.icon.clone() {
            active.icon = Set(Some(icon));
        }
        if let Some(is_active) = data.is_active {
            active.is_active = Set(is_active);
        }
        active.updated_at = Set(Utc::now().into());

        let updated = active.update(db).await.map_err(|err| {
            guard::map_level_unique_violation(err, &effective_name, effective_level)
        })?;
        Ok(Self::from_model(updated))
    }

    pub async fn delete<C: ConnectionTrait>(
        db: &C,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<(), TaxonomyError> {
        let record = task_level::Entity::find()
            .filter(task_level::Column::Uuid.eq(id))
            .filter(task_level::Column::UserId.eq(user_id))
            .one(db)
            .await?
            .ok_or(TaxonomyError::NotFound(TaxonomyKind::TaskLevel))?;

        if record.is_default {
            return Err(TaxonomyError::ProtectedDefault(TaxonomyKind::TaskLevel));
        }
        let count = guard::tasks_referencing_level(db, user_id, record.id).await?;
        if count > 0 {
            return Err(TaxonomyError::ReferencedEntry {
                kind: TaxonomyKind::TaskLevel,
                count,
            });
        }

        task_level::Entity::delete_many()
            .filter(task_level::Column::Id.eq(record.id))
            .exec(db)
            .await?;
        Ok(())
    }

    async fn ensure_name_free<C: ConnectionTrait>(
        db: &C,
        user_id: Uuid,
        name: &str,
        exclude_row_id: Option<i64>,
    ) -> Result<(), TaxonomyError> {
        let mut query = task_level::Entity::find()
            .filter(task_level::Column::UserId.eq(user_id))
            .filter(task_level::Column::Name.eq(name));
        if let Some(row_id) = exclude_row_id {
            query = query.filter(task_level::Column::Id.ne(row_id));
        }
        if query.count(db).await? > 0 {
            return Err(TaxonomyError::DuplicateName {
                kind: TaxonomyKind::TaskLevel,
                name: name.to_string(),
            });
        }
        Ok(())
    }

    async fn ensure_rank_free<C: ConnectionTrait>(
        db: &C,
        user_id: Uuid,
        level: i32,
        exclude_row_id: Option<i64>,
    ) -> Result<(), TaxonomyError> {
        let mut query = task_level::Entity::find()
            .filter(task_level::Column::UserId.eq(user_id))
            .filter(task_level::Column::Level.eq(level));
        if let Some(row_id) = exclude_row_id {
            query = query.filter(task_level::Column::Id.ne(row_id));
        }
        if query.count(db).await? > 0 {
            return Err(TaxonomyError::DuplicateRank { level });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::setup_db;

    fn create(name: &str, level: i32) -> CreateTaskLevel {
        CreateTaskLevel {
            name: name.to_string(),
            description: None,
            level,
            color: "#F59E0B".to_string(),
            icon: None,
            is_active: None,
        }
    }

    #[tokio::test]
    async fn duplicate_rank_rejected_per_user() {
        let db = setup_db().await;
        let user = Uuid::new_v4();
        TaskLevel::create(&db, user, &create("Urgent", 3)).await.unwrap();
        let err = TaskLevel::create(&db, user, &create("Also urgent", 3))
            .await
            .unwrap_err();
        assert!(matches!(err, TaxonomyError::DuplicateRank { level: 3 }));

        // Same rank under another user is fine.
        TaskLevel::create(&db, Uuid::new_v4(), &create("Urgent", 3))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn index_violation_mapping_distinguishes_name_from_rank() {
        let db = setup_db().await;
        let user = Uuid::new_v4();
        TaskLevel::create(&db, user, &create("Urgent", 3)).await.unwrap();

        // A racing create skips the pre-checks and hits the unique index
        // directly; both indexes name the task_levels table, so the mapping
        // must key on the violated column.
        let insert_raw = |name: &str, level: i32| {
            let now = Utc::now();
            task_level::ActiveModel {
                uuid: Set(Uuid::new_v4()),
                user_id: Set(user),
                name: Set(name.to_string()),
                description: Set(None),
                level: Set(level),
                color: Set("#F59E0B".to_string()),
                icon: Set(None),
                is_default: Set(false),
                is_active: Set(true),
                created_at: Set(now.into()),
                updated_at: Set(now.into()),
                ..Default::default()
            }
            .insert(&db)
        };

        let err = insert_raw("Urgent", 6).await.unwrap_err();
        match guard::map_level_unique_violation(err, "Urgent", 6) {
            TaxonomyError::DuplicateName { name, .. } => assert_eq!(name, "Urgent"),
            other => panic!("expected DuplicateName, got {other:?}"),
        }

        let err = insert_raw("Also urgent", 3).await.unwrap_err();
        match guard::map_level_unique_violation(err, "Also urgent", 3) {
            TaxonomyError::DuplicateRank { level } => assert_eq!(level, 3),
            other => panic!("expected DuplicateRank, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn rank_outside_range_rejected() {
        let db = setup_db().await;
        let user = Uuid::new_v4();
        let err = TaskLevel::create(&db, user, &create("Zero", 0))
            .await
            .unwrap_err();
        assert!(matches!(err, TaxonomyError::Validation(_)));
        let err = TaskLevel::create(&db, user, &create("Eleven", 11))
            .await
            .unwrap_err();
        assert!(matches!(err, TaxonomyError::Validation(_)));
    }

    #[tokio::test]
    async fn update_keeping_own_rank_succeeds() {
        let db = setup_db().await;
        let user = Uuid::new_v4();
        let level = TaskLevel::create(&db, user, &create("Urgent", 2)).await.unwrap();

        let patch = UpdateTaskLevel {
            name: Some("Very urgent".to_string()),
            description: None,
            level: Some(2),
            color: None,
            icon: None,
            is_active: None,
        };
        let updated = TaskLevel::update(&db, user, level.id, &patch).await.unwrap();
        assert_eq!(updated.name, "Very urgent");
        assert_eq!(updated.level, 2);
    }

    #[tokio::test]
    async fn find_all_orders_by_rank() {
        let db = setup_db().await;
        let user = Uuid::new_v4();
        TaskLevel::create(&db, user, &create("Low", 7)).await.unwrap();
        TaskLevel::create(&db, user, &create("High", 1)).await.unwrap();
        TaskLevel::create(&db, user, &create("Mid", 4)).await.unwrap();

        let ranks: Vec<i32> = TaskLevel::find_all(&db, user)
            .await
            .unwrap()
            .into_iter()
            .map(|l| l.level)
            .collect();
        assert_eq!(ranks, vec![1, 4, 7]);
    }
}
