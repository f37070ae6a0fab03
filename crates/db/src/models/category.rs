use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::{
    entities::{category, task},
    models::guard::{self, TaxonomyError, TaxonomyKind},
};

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub color: String,
    pub is_default: bool,
    /// Number of the user's tasks currently assigned this category's name.
    /// Derived at read time, never stored.
    pub task_count: i64,
    #[ts(type = "Date")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "Date")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, TS)]
pub struct CreateCategory {
    pub name: String,
    pub description: Option<String>,
    pub color: String,
}

#[derive(Debug, Deserialize, TS)]
pub struct UpdateCategory {
    pub name: Option<String>,
    pub description: Option<String>,
    pub color: Option<String>,
}

impl Category {
    fn from_model(model: category::Model, task_count: i64) -> Self {
        Self {
            id: model.uuid,
            name: model.name,
            description: model.description,
            color: model.color,
            is_default: model.is_default,
            task_count,
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        }
    }

    pub async fn find_all<C: ConnectionTrait>(
        db: &C,
        user_id: Uuid,
    ) -> Result<Vec<Self>, DbErr> {
        let records = category::Entity::find()
            .filter(category::Column::UserId.eq(user_id))
            .all(db)
            .await?;

        let counts: Vec<(String, i64)> = task::Entity::find()
            .select_only()
            .column(task::Column::Category)
            .column_as(task::Column::Id.count(), "count")
            .filter(task::Column::UserId.eq(user_id))
            .group_by(task::Column::Category)
            .into_tuple()
            .all(db)
            .await?;

        let mut categories: Vec<Self> = records
            .into_iter()
            .map(|model| {
                let task_count = counts
                    .iter()
                    .find(|(name, _)| *name == model.name)
                    .map(|(_, count)| *count)
                    .unwrap_or(0);
                Self::from_model(model, task_count)
            })
            .collect();

        categories.sort_by(|a, b| {
            b.is_default
                .cmp(&a.is_default)
                .then(b.task_count.cmp(&a.task_count))
                .then(a.name.cmp(&b.name))
        });
        Ok(categories)
    }

    pub async fn find_by_id<C: ConnectionTrait>(
        db: &C,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Self>, DbErr> {
        let record = category::Entity::find()
            .filter(category::Column::Uuid.eq(id))
            .filter(category::Column::UserId.eq(user_id))
            .one(db)
            .await?;
        match record {
            Some(model) => {
                let count = guard::tasks_referencing_category(db, user_id, &model.name).await?;
                Ok(Some(Self::from_model(model, count as i64)))
            }
            None => Ok(None),
        }
    }

    pub async fn create<C: ConnectionTrait>(
        db: &C,
        user_id: Uuid,
        data: &CreateCategory,
    ) -> Result<Self, TaxonomyError> {
        let name = data.name.trim().to_string();
        if name.is_empty() {
            return Err(TaxonomyError::Validation(
                "Category name is required".to_string(),
            ));
        }
        Self::ensure_name_free(db, user_id, &name, None).await?;

        let now = Utc::now();
        let active = category::ActiveModel {
            uuid: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            name: Set(name.clone()),
            description: Set(data.description.clone()),
            color: Set(data.color.clone()),
            is_default: Set(false),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
            ..Default::default()
        };
        let model = active
            .insert(db)
            .await
            .map_err(|err| guard::map_unique_violation(err, TaxonomyKind::Category, &name))?;
        Ok(Self::from_model(model, 0))
    }

    pub async fn update<C: ConnectionTrait>(
        db: &C,
        user_id: Uuid,
        id: Uuid,
        data: &UpdateCategory,
    ) -> Result<Self, TaxonomyError> {
        let record = category::Entity::find()
            .filter(category::Column::Uuid.eq(id))
            .filter(category::Column::UserId.eq(user_id))
            .one(db)
            .await?
            .ok_or(TaxonomyError::NotFound(TaxonomyKind::Category))?;

        let new_name = match &data.name {
            Some(name) if name.trim() != record.name => {
                let name = name.trim().to_string();
                if name.is_empty() {
                    return Err(TaxonomyError::Validation(
                        "Category name is required".to_string(),
                    ));
                }
                Self::ensure_name_free(db, user_id, &name, Some(record.id)).await?;
                Some(name)
            }
            _ => None,
        };
        let effective_name = new_name.clone().unwrap_or_else(|| record.name.clone());

        let mut active: category::ActiveModel = record.into();
        if let Some(name) = new_name {
            active.name = Set(name);
        }
        match &data.description {
            Some(s) if s.trim().is_empty() => active.description = Set(None),
            Some(s) => active.description = Set(Some(s.clone())),
            None => {}
        }
        if let Some(color) = data.color.clone() {
            active.color = Set(color);
        }
        active.updated_at = Set(Utc::now().into());

        let updated = active.update(db).await.map_err(|err| {
            guard::map_unique_violation(err, TaxonomyKind::Category, &effective_name)
        })?;
        let count = guard::tasks_referencing_category(db, user_id, &updated.name).await?;
        Ok(Self::from_model(updated, count as i64))
    }

    pub async fn delete<C: ConnectionTrait>(
        db: &C,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<(), TaxonomyError> {
        let record = category::Entity::find()
            .filter(category::Column::Uuid.eq(id))
            .filter(category::Column::UserId.eq(user_id))
            .one(db)
            .await?
            .ok_or(TaxonomyError::NotFound(TaxonomyKind::Category))?;

        if record.is_default {
            return Err(TaxonomyError::ProtectedDefault(TaxonomyKind::Category));
        }
        let count = guard::tasks_referencing_category(db, user_id, &record.name).await?;
        if count > 0 {
            return Err(TaxonomyError::ReferencedEntry {
                kind: TaxonomyKind::Category,
                count,
            });
        }

        category::Entity::delete_many()
            .filter(category::Column::Id.eq(record.id))
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
        let mut query = category::Entity::find()
            .filter(category::Column::UserId.eq(user_id))
            .filter(category::Column::Name.eq(name));
        if let Some(row_id) = exclude_row_id {
            query = query.filter(category::Column::Id.ne(row_id));
        }
        if query.count(db).await? > 0 {
            return Err(TaxonomyError::DuplicateName {
                kind: TaxonomyKind::Category,
                name: name.to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::setup_db;

    fn create(name: &str) -> CreateCategory {
        CreateCategory {
            name: name.to_string(),
            description: None,
            color: "#3B82F6".to_string(),
        }
    }

    #[tokio::test]
    async fn duplicate_name_rejected_per_user_only() {
        let db = setup_db().await;
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        Category::create(&db, alice, &create("Work")).await.unwrap();
        let err = Category::create(&db, alice, &create("Work"))
            .await
            .unwrap_err();
        assert!(matches!(err, TaxonomyError::DuplicateName { .. }));

        // Same name under a different user is fine.
        Category::create(&db, bob, &create("Work")).await.unwrap();
    }

    #[tokio::test]
    async fn rename_to_own_name_is_noop_success() {
        let db = setup_db().await;
        let user = Uuid::new_v4();
        let cat = Category::create(&db, user, &create("Work")).await.unwrap();

        let patch = UpdateCategory {
            name: Some("Work".to_string()),
            description: None,
            color: None,
        };
        let updated = Category::update(&db, user, cat.id, &patch).await.unwrap();
        assert_eq!(updated.name, "Work");
    }

    #[tokio::test]
    async fn rename_collision_rejected() {
        let db = setup_db().await;
        let user = Uuid::new_v4();
        Category::create(&db, user, &create("Work")).await.unwrap();
        let personal = Category::create(&db, user, &create("Personal"))
            .await
            .unwrap();

        let patch = UpdateCategory {
            name: Some("Work".to_string()),
            description: None,
            color: None,
        };
        let err = Category::update(&db, user, personal.id, &patch)
            .await
            .unwrap_err();
        assert!(matches!(err, TaxonomyError::DuplicateName { .. }));
    }

    #[tokio::test]
    async fn delete_unknown_category_is_not_found() {
        let db = setup_db().await;
        let user = Uuid::new_v4();
        let err = Category::delete(&db, user, Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            TaxonomyError::NotFound(TaxonomyKind::Category)
        ));
    }
}
