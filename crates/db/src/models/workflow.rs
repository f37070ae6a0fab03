use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, Set,
};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::{
    entities::{task_status, workflow},
    models::{
        guard::{self, TaxonomyError, TaxonomyKind},
        ids,
        task_status::TaskStatus,
    },
};

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct Workflow {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub is_default: bool,
    pub is_active: bool,
    pub statuses: Vec<WorkflowStatusEntry>,
    #[ts(type = "Date")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "Date")]
    pub updated_at: DateTime<Utc>,
}

/// Membership entry: which status belongs to the workflow, where it sits in
/// the workflow's own ordering, and whether it may be skipped.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct WorkflowStatusEntry {
    pub status_id: Uuid,
    pub sort_order: i32,
    pub is_required: bool,
}

#[derive(Debug, Clone, Deserialize, TS)]
pub struct CreateWorkflow {
    pub name: String,
    pub description: Option<String>,
    pub is_active: Option<bool>,
    pub statuses: Option<Vec<WorkflowStatusEntry>>,
}

#[derive(Debug, Deserialize, TS)]
pub struct UpdateWorkflow {
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
    pub statuses: Option<Vec<WorkflowStatusEntry>>,
}

#[derive(Debug, Clone, Serialize, TS)]
pub struct WorkflowWithStatuses {
    #[serde(flatten)]
    #[ts(flatten)]
    pub workflow: Workflow,
    /// Member statuses in rendering order: the workflow's own entry order
    /// first, the status's global `sort_order` as tiebreak.
    pub resolved_statuses: Vec<TaskStatus>,
}

impl Workflow {
    fn from_model(model: workflow::Model) -> Result<Self, DbErr> {
        let statuses: Vec<WorkflowStatusEntry> = serde_json::from_value(model.statuses)
            .map_err(|err| DbErr::Custom(format!("Invalid workflow status list: {err}")))?;
        Ok(Self {
            id: model.uuid,
            name: model.name,
            description: model.description,
            is_default: model.is_default,
            is_active: model.is_active,
            statuses,
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        })
    }

    pub async fn find_all<C: ConnectionTrait>(
        db: &C,
        user_id: Uuid,
    ) -> Result<Vec<Self>, DbErr> {
        let records = workflow::Entity::find()
            .filter(workflow::Column::UserId.eq(user_id))
            .all(db)
            .await?;
        let mut workflows = records
            .into_iter()
            .map(Self::from_model)
            .collect::<Result<Vec<_>, _>>()?;
        workflows.sort_by(|a, b| {
            b.is_default
                .cmp(&a.is_default)
                .then(a.name.cmp(&b.name))
        });
        Ok(workflows)
    }

    pub async fn find_by_id<C: ConnectionTrait>(
        db: &C,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Self>, DbErr> {
        let record = workflow::Entity::find()
            .filter(workflow::Column::Uuid.eq(id))
            .filter(workflow::Column::UserId.eq(user_id))
            .one(db)
            .await?;
        record.map(Self::from_model).transpose()
    }

    pub async fn create<C: ConnectionTrait>(
        db: &C,
        user_id: Uuid,
        data: &CreateWorkflow,
    ) -> Result<Self, TaxonomyError> {
        let name = data.name.trim().to_string();
        if name.is_empty() {
            return Err(TaxonomyError::Validation(
                "Workflow name is required".to_string(),
            ));
        }
        Self::ensure_name_free(db, user_id, &name, None).await?;
        let entries = data.statuses.clone().unwrap_or_default();
        Self::validate_entries(db, user_id, &entries).await?;

        let now = Utc::now();
        let active = workflow::ActiveModel {
            uuid: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            name: Set(name.clone()),
            description: Set(data.description.clone()),
            is_default: Set(false),
            is_active: Set(data.is_active.unwrap_or(true)),
            statuses: Set(serde_json::to_value(&entries)
                .map_err(|err| DbErr::Custom(err.to_string()))?),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
            ..Default::default()
        };
        let model = active
            .insert(db)
            .await
            .map_err(|err| guard::map_unique_violation(err, TaxonomyKind::Workflow, &name))?;
        Ok(Self::from_model(model)?)
    }

    pub async fn update<C: ConnectionTrait>(
        db: &C,
        user_id: Uuid,
        id: Uuid,
        data: &UpdateWorkflow,
    ) -> Result<Self, TaxonomyError> {
        let record = workflow::Entity::find()
            .filter(workflow::Column::Uuid.eq(id))
            .filter(workflow::Column::UserId.eq(user_id))
            .one(db)
            .await?
            .ok_or(TaxonomyError::NotFound(TaxonomyKind::Workflow))?;

        let new_name = match &data.name {
            Some(name) if name.trim() != record.name => {
                let name = name.trim().to_string();
                if name.is_empty() {
                    return Err(TaxonomyError::Validation(
                        "Workflow name is required".to_string(),
                    ));
                }
                Self::ensure_name_free(db, user_id, &name, Some(record.id)).await?;
                Some(name)
            }
            _ => None,
        };
        if let Some(entries) = &data.statuses {
            Self::validate_entries(db, user_id, entries).await?;
        }
        let effective_name = new_name.clone().unwrap_or_else(|| record.name.clone());

        let mut active: workflow::ActiveModel = record.into();
        if let Some(name) = new_name {
            active.name = Set(name);
        }
        match &data.description {
            Some(s) if s.trim().is_empty() => active.description = Set(None),
            Some(s) => active.description = Set(Some(s.clone())),
            None => {}
        }
        if let Some(is_active) = data.is_active {
            active.is_active = Set(is_active);
        }
        if let Some(entries) = &data.statuses {
            active.statuses = Set(serde_json::to_value(entries)
                .map_err(|err| DbErr::Custom(err.to_string()))?);
        }
        active.updated_at = Set(Utc::now().into());

        let updated = active.update(db).await.map_err(|err| {
            guard::map_unique_violation(err, TaxonomyKind::Workflow, &effective_name)
        })?;
        Ok(Self::from_model(updated)?)
    }

    pub async fn delete<C: ConnectionTrait>(
        db: &C,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<(), TaxonomyError> {
        let record = workflow::Entity::find()
            .filter(workflow::Column::Uuid.eq(id))
            .filter(workflow::Column::UserId.eq(user_id))
            .one(db)
            .await?
            .ok_or(TaxonomyError::NotFound(TaxonomyKind::Workflow))?;

        if record.is_default {
            return Err(TaxonomyError::ProtectedDefault(TaxonomyKind::Workflow));
        }
        let count = guard::tasks_referencing_workflow(db, user_id, record.id).await?;
        if count > 0 {
            return Err(TaxonomyError::ReferencedEntry {
                kind: TaxonomyKind::Workflow,
                count,
            });
        }

        // Member statuses stay; they just lose their grouping.
        task_status::Entity::update_many()
            .col_expr(task_status::Column::WorkflowId, Expr::value(None::<i64>))
            .filter(task_status::Column::WorkflowId.eq(record.id))
            .exec(db)
            .await?;

        workflow::Entity::delete_many()
            .filter(workflow::Column::Id.eq(record.id))
            .exec(db)
            .await?;
        Ok(())
    }

    /// Resolve the member entries into full statuses, ordered by the entry's
    /// `sort_order` with the status's own `sort_order` as tiebreak. Entries
    /// whose status has since been deleted are dropped.
    pub async fn with_statuses<C: ConnectionTrait>(
        db: &C,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<Option<WorkflowWithStatuses>, DbErr> {
        let Some(workflow) = Self::find_by_id(db, user_id, id).await? else {
            return Ok(None);
        };

        let mut members: Vec<(WorkflowStatusEntry, task_status::Model)> = Vec::new();
        for entry in &workflow.statuses {
            let record = task_status::Entity::find()
                .filter(task_status::Column::Uuid.eq(entry.status_id))
                .filter(task_status::Column::UserId.eq(user_id))
                .one(db)
                .await?;
            if let Some(model) = record {
                members.push((entry.clone(), model));
            }
        }
        members.sort_by(|(ea, ma), (eb, mb)| {
            ea.sort_order
                .cmp(&eb.sort_order)
                .then(ma.sort_order.cmp(&mb.sort_order))
        });

        let mut resolved_statuses = Vec::with_capacity(members.len());
        for (_, model) in members {
            resolved_statuses.push(TaskStatus::from_model(db, model).await?);
        }
        Ok(Some(WorkflowWithStatuses {
            workflow,
            resolved_statuses,
        }))
    }

    async fn validate_entries<C: ConnectionTrait>(
        db: &C,
        user_id: Uuid,
        entries: &[WorkflowStatusEntry],
    ) -> Result<(), TaxonomyError> {
        for entry in entries {
            if ids::status_id_by_uuid(db, user_id, entry.status_id)
                .await?
                .is_none()
            {
                return Err(TaxonomyError::Validation(format!(
                    "Workflow references unknown status {}",
                    entry.status_id
                )));
            }
        }
        Ok(())
    }

    async fn ensure_name_free<C: ConnectionTrait>(
        db: &C,
        user_id: Uuid,
        name: &str,
        exclude_row_id: Option<i64>,
    ) -> Result<(), TaxonomyError> {
        let mut query = workflow::Entity::find()
            .filter(workflow::Column::UserId.eq(user_id))
            .filter(workflow::Column::Name.eq(name));
        if let Some(row_id) = exclude_row_id {
            query = query.filter(workflow::Column::Id.ne(row_id));
        }
        if query.count(db).await? > 0 {
            return Err(TaxonomyError::DuplicateName {
                kind: TaxonomyKind::Workflow,
                name: name.to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::task_status::{CreateTaskStatus, UpdateTaskStatus},
        test_support::setup_db,
    };

    async fn seed_status(
        db: &sea_orm::DatabaseConnection,
        user: Uuid,
        name: &str,
        sort_order: i32,
    ) -> TaskStatus {
        TaskStatus::create(
            db,
            user,
            &CreateTaskStatus {
                name: name.to_string(),
                description: None,
                color: "#64748B".to_string(),
                sort_order: Some(sort_order),
                is_completed: None,
                is_active: None,
                workflow_id: None,
            },
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn with_statuses_prefers_entry_order_over_status_order() {
        let db = setup_db().await;
        let user = Uuid::new_v4();
        // Global ordering says review < qa, the workflow disagrees.
        let review = seed_status(&db, user, "Review", 1).await;
        let qa = seed_status(&db, user, "QA", 2).await;

        let workflow = Workflow::create(
            &db,
            user,
            &CreateWorkflow {
                name: "Release".to_string(),
                description: None,
                is_active: None,
                statuses: Some(vec![
                    WorkflowStatusEntry { status_id: qa.id, sort_order: 0, is_required: true },
                    WorkflowStatusEntry { status_id: review.id, sort_order: 1, is_required: false },
                ]),
            },
        )
        .await
        .unwrap();

        let resolved = Workflow::with_statuses(&db, user, workflow.id)
            .await
            .unwrap()
            .unwrap();
        let names: Vec<String> = resolved
            .resolved_statuses
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, vec!["QA", "Review"]);
    }

    #[tokio::test]
    async fn create_rejects_unknown_member_status() {
        let db = setup_db().await;
        let user = Uuid::new_v4();
        let err = Workflow::create(
            &db,
            user,
            &CreateWorkflow {
                name: "Broken".to_string(),
                description: None,
                is_active: None,
                statuses: Some(vec![WorkflowStatusEntry {
                    status_id: Uuid::new_v4(),
                    sort_order: 0,
                    is_required: false,
                }]),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, TaxonomyError::Validation(_)));
    }

    #[tokio::test]
    async fn delete_clears_member_status_grouping() {
        let db = setup_db().await;
        let user = Uuid::new_v4();
        let status = seed_status(&db, user, "Review", 0).await;
        let workflow = Workflow::create(
            &db,
            user,
            &CreateWorkflow {
                name: "Release".to_string(),
                description: None,
                is_active: None,
                statuses: Some(vec![]),
            },
        )
        .await
        .unwrap();

        TaskStatus::update(
            &db,
            user,
            status.id,
            &UpdateTaskStatus {
                name: None,
                description: None,
                color: None,
                sort_order: None,
                is_completed: None,
                is_active: None,
                workflow_id: Some(workflow.id),
            },
        )
        .await
        .unwrap();

        Workflow::delete(&db, user, workflow.id).await.unwrap();
        let status = TaskStatus::find_by_id(&db, user, status.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(status.workflow_id, None);
    }
}
