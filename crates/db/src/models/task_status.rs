use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set, TransactionSession, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::{
    entities::task_status,
    models::{
        guard::{self, TaxonomyError, TaxonomyKind},
        ids,
    },
};

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct TaskStatus {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub color: String,
    pub sort_order: i32,
    pub is_default: bool,
    pub is_completed: bool,
    pub is_active: bool,
    pub workflow_id: Option<Uuid>,
    #[ts(type = "Date")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "Date")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, TS)]
pub struct CreateTaskStatus {
    pub name: String,
    pub description: Option<String>,
    pub color: String,
    pub sort_order: Option<i32>,
    pub is_completed: Option<bool>,
    pub is_active: Option<bool>,
    pub workflow_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, TS)]
pub struct UpdateTaskStatus {
    pub name: Option<String>,
    pub description: Option<String>,
    pub color: Option<String>,
    pub sort_order: Option<i32>,
    pub is_completed: Option<bool>,
    pub is_active: Option<bool>,
    pub workflow_id: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize, TS)]
pub struct ReorderEntry {
    pub id: Uuid,
    pub sort_order: i32,
}

impl TaskStatus {
    pub(crate) async fn from_model<C: ConnectionTrait>(
        db: &C,
        model: task_status::Model,
    ) -> Result<Self, DbErr> {
        let workflow_id = match model.workflow_id {
            Some(id) => ids::workflow_uuid_by_id(db, id).await?,
            None => None,
        };
        Ok(Self {
            id: model.uuid,
            name: model.name,
            description: model.description,
            color: model.color,
            sort_order: model.sort_order,
            is_default: model.is_default,
            is_completed: model.is_completed,
            is_active: model.is_active,
            workflow_id,
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        })
    }

    pub async fn find_all<C: ConnectionTrait>(
        db: &C,
        user_id: Uuid,
    ) -> Result<Vec<Self>, DbErr> {
        let records = task_status::Entity::find()
            .filter(task_status::Column::UserId.eq(user_id))
            .order_by_asc(task_status::Column::SortOrder)
            .order_by_asc(task_status::Column::CreatedAt)
            .all(db)
            .await?;
        let mut statuses = Vec::with_capacity(records.len());
        for model in records {
            statuses.push(Self::from_model(db, model).await?);
        }
        Ok(statuses)
    }

    pub async fn find_by_id<C: ConnectionTrait>(
        db: &C,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Self>, DbErr> {
        let record = task_status::Entity::find()
            .filter(task_status::Column::Uuid.eq(id))
            .filter(task_status::Column::UserId.eq(user_id))
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
        data: &CreateTaskStatus,
    ) -> Result<Self, TaxonomyError> {
        let name = data.name.trim().to_string();
        if name.is_empty() {
            return Err(TaxonomyError::Validation(
                "Status name is required".to_string(),
            ));
        }
        let sort_order = data.sort_order.unwrap_or(0);
        if sort_order < 0 {
            return Err(TaxonomyError::Validation(
                "Status order must be non-negative".to_string(),
            ));
        }
        Self::ensure_name_free(db, user_id, &name, None).await?;
        let workflow_row_id = Self::resolve_workflow(db, user_id, data.workflow_id).await?;

        let now = Utc::now();
        let active = task_status::ActiveModel {
            uuid: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            name: Set(name.clone()),
            description: Set(data.description.clone()),
            color: Set(data.color.clone()),
            sort_order: Set(sort_order),
            is_default: Set(false),
            is_completed: Set(data.is_completed.unwrap_or(false)),
            is_active: Set(data.is_active.unwrap_or(true)),
            workflow_id: Set(workflow_row_id),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
            ..Default::default()
        };
        let model = active
            .insert(db)
            .await
            .map_err(|err| guard::map_unique_violation(err, TaxonomyKind::TaskStatus, &name))?;
        Ok(Self::from_model(db, model).await?)
    }

    pub async fn update<C: ConnectionTrait>(
        db: &C,
        user_id: Uuid,
        id: Uuid,
        data: &UpdateTaskStatus,
    ) -> Result<Self, TaxonomyError> {
        let record = task_status::Entity::find()
            .filter(task_status::Column::Uuid.eq(id))
            .filter(task_status::Column::UserId.eq(user_id))
            .one(db)
            .await?
            .ok_or(TaxonomyError::NotFound(TaxonomyKind::TaskStatus))?;

        let new_name = match &data.name {
            Some(name) if name.trim() != record.name => {
                let name = name.trim().to_string();
                if name.is_empty() {
                    return Err(TaxonomyError::Validation(
                        "Status name is required".to_string(),
                    ));
                }
                Self::ensure_name_free(db, user_id, &name, Some(record.id)).await?;
                Some(name)
            }
            _ => None,
        };
        let effective_name = new_name.clone().unwrap_or_else(|| record.name.clone());
        let workflow_row_id = Self::resolve_workflow(db, user_id, data.workflow_id).await?;

        let mut active: task_status::ActiveModel = record.into();
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
        if let Some(sort_order) = data.sort_order {
            if sort_order < 0 {
                return Err(TaxonomyError::Validation(
                    "Status order must be non-negative".to_string(),
                ));
            }
            active.sort_order = Set(sort_order);
        }
        if let Some(is_completed) = data.is_completed {
            active.is_completed = Set(is_completed);
        }
        if let Some(is_active) = data.is_active {
            active.is_active = Set(is_active);
        }
        if let Some(row_id) = workflow_row_id {
            active.workflow_id = Set(Some(row_id));
        }
        active.updated_at = Set(Utc::now().into());

        let updated = active.update(db).await.map_err(|err| {
            guard::map_unique_violation(err, TaxonomyKind::TaskStatus, &effective_name)
        })?;
        Ok(Self::from_model(db, updated).await?)
    }

    /// Best-effort bulk order update: unknown ids are skipped, the rest run
    /// inside one transaction. Returns the number of rows touched.
    pub async fn reorder<C: ConnectionTrait + TransactionTrait>(
        db: &C,
        user_id: Uuid,
        entries: &[ReorderEntry],
    ) -> Result<u64, DbErr> {
        let tx = db.begin().await?;
        let mut updated = 0u64;
        for entry in entries {
            let record = task_status::Entity::find()
                .filter(task_status::Column::Uuid.eq(entry.id))
                .filter(task_status::Column::UserId.eq(user_id))
                .one(&tx)
                .await?;
            let Some(record) = record else {
                tracing::debug!(status_id = %entry.id, "Skipping reorder entry for unknown status");
                continue;
            };
            let mut active: task_status::ActiveModel = record.into();
            active.sort_order = Set(entry.sort_order.max(0));
            active.updated_at = Set(Utc::now().into());
            active.update(&tx).await?;
            updated += 1;
        }
        tx.commit().await?;
        Ok(updated)
    }

    pub async fn delete<C: ConnectionTrait>(
        db: &C,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<(), TaxonomyError> {
        let record = task_status::Entity::find()
            .filter(task_status::Column::Uuid.eq(id))
            .filter(task_status::Column::UserId.eq(user_id))
            .one(db)
            .await?
            .ok_or(TaxonomyError::NotFound(TaxonomyKind::TaskStatus))?;

        if record.is_default {
            return Err(TaxonomyError::ProtectedDefault(TaxonomyKind::TaskStatus));
        }
        let count =
            guard::tasks_referencing_status(db, user_id, record.id, &record.name).await?;
        if count > 0 {
            return Err(TaxonomyError::ReferencedEntry {
                kind: TaxonomyKind::TaskStatus,
                count,
            });
        }

        task_status::Entity::delete_many()
            .filter(task_status::Column::Id.eq(record.id))
            .exec(db)
            .await?;
        Ok(())
    }

    async fn resolve_workflow<C: ConnectionTrait>(
        db: &C,
        user_id: Uuid,
        workflow_id: Option<Uuid>,
    ) -> Result<Option<i64>, TaxonomyError> {
        match workflow_id {
            Some(uuid) => ids::workflow_id_by_uuid(db, user_id, uuid)
                .await?
                .ok_or(TaxonomyError::NotFound(TaxonomyKind::Workflow))
                .map(Some),
            None => Ok(None),
        }
    }

    async fn ensure_name_free<C: ConnectionTrait>(
        db: &C,
        user_id: Uuid,
        name: &str,
        exclude_row_id: Option<i64>,
    ) -> Result<(), TaxonomyError> {
        let mut query = task_status::Entity::find()
            .filter(task_status::Column::UserId.eq(user_id))
            .filter(task_status::Column::Name.eq(name));
        if let Some(row_id) = exclude_row_id {
            query = query.filter(task_status::Column::Id.ne(row_id));
        }
        if query.count(db).await? > 0 {
            return Err(TaxonomyError::DuplicateName {
                kind: TaxonomyKind::TaskStatus,
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

    fn create(name: &str, sort_order: i32) -> CreateTaskStatus {
        CreateTaskStatus {
            name: name.to_string(),
            description: None,
            color: "#64748B".to_string(),
            sort_order: Some(sort_order),
            is_completed: None,
            is_active: None,
            workflow_id: None,
        }
    }

    #[tokio::test]
    async fn find_all_orders_by_sort_order_then_created_at() {
        let db = setup_db().await;
        let user = Uuid::new_v4();
        TaskStatus::create(&db, user, &create("Later", 5)).await.unwrap();
        TaskStatus::create(&db, user, &create("First", 0)).await.unwrap();
        TaskStatus::create(&db, user, &create("Middle", 2)).await.unwrap();

        let names: Vec<String> = TaskStatus::find_all(&db, user)
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, vec!["First", "Middle", "Later"]);
    }

    #[tokio::test]
    async fn duplicate_sort_order_is_allowed() {
        let db = setup_db().await;
        let user = Uuid::new_v4();
        TaskStatus::create(&db, user, &create("One", 3)).await.unwrap();
        TaskStatus::create(&db, user, &create("Two", 3)).await.unwrap();
    }

    #[tokio::test]
    async fn reorder_skips_unknown_ids() {
        let db = setup_db().await;
        let user = Uuid::new_v4();
        let a = TaskStatus::create(&db, user, &create("A", 0)).await.unwrap();
        let b = TaskStatus::create(&db, user, &create("B", 1)).await.unwrap();

        let updated = TaskStatus::reorder(
            &db,
            user,
            &[
                ReorderEntry { id: b.id, sort_order: 0 },
                ReorderEntry { id: a.id, sort_order: 1 },
                ReorderEntry { id: Uuid::new_v4(), sort_order: 9 },
            ],
        )
        .await
        .unwrap();
        assert_eq!(updated, 2);

        let names: Vec<String> = TaskStatus::find_all(&db, user)
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, vec!["B", "A"]);
    }

    #[tokio::test]
    async fn reorder_ignores_other_users_statuses() {
        let db = setup_db().await;
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        let theirs = TaskStatus::create(&db, bob, &create("Theirs", 0)).await.unwrap();

        let updated = TaskStatus::reorder(
            &db,
            alice,
            &[ReorderEntry { id: theirs.id, sort_order: 7 }],
        )
        .await
        .unwrap();
        assert_eq!(updated, 0);

        let statuses = TaskStatus::find_all(&db, bob).await.unwrap();
        assert_eq!(statuses[0].sort_order, 0);
    }
}
