//! # Workflow Repository
//!
//! Database operations for approval-workflow definitions.
//!
//! ## Update Protocol: Replace, Don't Diff
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                  updateWorkflow(id, definition)                         │
//! │                                                                         │
//! │  BEGIN TRANSACTION                                                     │
//! │       │                                                                 │
//! │       ├── UPDATE approval_workflows (name/description/is_active)       │
//! │       │        └── 0 rows? → NotFound, nothing mutated                 │
//! │       │                                                                 │
//! │       ├── DELETE FROM workflow_steps WHERE workflow_id = ?             │
//! │       │        └── conditions/actions cascade                          │
//! │       │                                                                 │
//! │       ├── re-insert the full step tree from the definition             │
//! │       │                                                                 │
//! │  COMMIT (or rollback on any failure)                                   │
//! │                                                                         │
//! │  A reader can never observe the workflow with zero steps mid-update,   │
//! │  and a failed update leaves the previous tree untouched.               │
//! │                                                                         │
//! │  Step ids regenerate on every update; in-flight approvals pointing at  │
//! │  old step ids are not re-linked.                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Concurrency is last-writer-wins at workflow granularity: edits are rare,
//! human-driven administrative actions.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use basil_core::types::{Action, ActionType, ApprovalMode, Condition, ConditionType, MemberRole,
    Step, StepDraft, Workflow};
use basil_core::validation::ValidatedWorkflow;

// =============================================================================
// Row Types
// =============================================================================
// Flat row shapes as stored; assembled into the nested basil-core types after
// loading. Every transferred field is named here, never forwarded blindly.

#[derive(Debug, sqlx::FromRow)]
struct WorkflowRow {
    id: String,
    organization_id: String,
    name: String,
    description: Option<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct StepRow {
    id: String,
    workflow_id: String,
    step_number: i64,
    name: String,
    description: Option<String>,
    all_conditions_must_match: bool,
}

#[derive(Debug, sqlx::FromRow)]
struct ConditionRow {
    id: String,
    step_id: String,
    condition_type: ConditionType,
    min_amount_cents: Option<i64>,
    max_amount_cents: Option<i64>,
    expense_category_id: Option<String>,
    location_id: Option<String>,
}

#[derive(Debug, sqlx::FromRow)]
struct ActionRow {
    id: String,
    step_id: String,
    action_type: ActionType,
    approver_role: Option<MemberRole>,
    specific_member_id: Option<String>,
    approval_mode: ApprovalMode,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for workflow database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = WorkflowRepository::new(pool);
/// let workflow = repo.create(&organization_id, &validated).await?;
/// ```
#[derive(Debug, Clone)]
pub struct WorkflowRepository {
    pool: SqlitePool,
}

impl WorkflowRepository {
    /// Creates a new WorkflowRepository.
    pub fn new(pool: SqlitePool) -> Self {
        WorkflowRepository { pool }
    }

    /// Creates a workflow and its full step tree in one transaction.
    ///
    /// ## Returns
    /// * `Ok(Workflow)` - The persisted workflow, tree loaded
    /// * `Err(DbError::ForeignKeyViolation)` - Organization does not exist
    pub async fn create(
        &self,
        organization_id: &str,
        definition: &ValidatedWorkflow,
    ) -> DbResult<Workflow> {
        let draft = definition.as_draft();
        let workflow_id = Uuid::new_v4().to_string();
        let now = Utc::now();

        debug!(organization_id = %organization_id, name = %draft.name, "Creating workflow");

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO approval_workflows (
                id, organization_id, name, description, is_active,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&workflow_id)
        .bind(organization_id)
        .bind(&draft.name)
        .bind(&draft.description)
        .bind(draft.is_active)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        insert_step_tree(&mut tx, &workflow_id, &draft.steps).await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        match self.get(&workflow_id).await? {
            Some(workflow) => Ok(workflow),
            None => Err(DbError::not_found("Workflow", &workflow_id)),
        }
    }

    /// Replaces a workflow's definition in one transaction.
    ///
    /// Scalar fields are updated, then the entire step tree is deleted and
    /// recreated from the definition. Partial step edits are not supported:
    /// the whole step list is resubmitted and swapped.
    ///
    /// ## Returns
    /// * `Ok(Workflow)` - The updated workflow, tree loaded
    /// * `Err(DbError::NotFound)` - Workflow id does not exist; nothing mutated
    pub async fn update(
        &self,
        workflow_id: &str,
        definition: &ValidatedWorkflow,
    ) -> DbResult<Workflow> {
        let draft = definition.as_draft();
        let now = Utc::now();

        debug!(id = %workflow_id, "Updating workflow");

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let result = sqlx::query(
            r#"
            UPDATE approval_workflows SET
                name = ?2,
                description = ?3,
                is_active = ?4,
                updated_at = ?5
            WHERE id = ?1
            "#,
        )
        .bind(workflow_id)
        .bind(&draft.name)
        .bind(&draft.description)
        .bind(draft.is_active)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Workflow", workflow_id));
        }

        // Conditions and actions cascade with their steps.
        sqlx::query("DELETE FROM workflow_steps WHERE workflow_id = ?1")
            .bind(workflow_id)
            .execute(&mut *tx)
            .await?;

        insert_step_tree(&mut tx, workflow_id, &draft.steps).await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        match self.get(workflow_id).await? {
            Some(workflow) => Ok(workflow),
            None => Err(DbError::not_found("Workflow", workflow_id)),
        }
    }

    /// Deletes a workflow and its step tree.
    ///
    /// ## Returns
    /// * `Err(DbError::WorkflowInUse)` - Some organization's active pointer
    ///   still references this workflow; clear it first
    /// * `Err(DbError::NotFound)` - Workflow id does not exist
    pub async fn delete(&self, workflow_id: &str) -> DbResult<()> {
        debug!(id = %workflow_id, "Deleting workflow");

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let active_refs: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM organizations WHERE active_expense_workflow_id = ?1",
        )
        .bind(workflow_id)
        .fetch_one(&mut *tx)
        .await?;

        if active_refs > 0 {
            return Err(DbError::WorkflowInUse {
                id: workflow_id.to_string(),
            });
        }

        let result = sqlx::query("DELETE FROM approval_workflows WHERE id = ?1")
            .bind(workflow_id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Workflow", workflow_id));
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))
    }

    /// Gets a workflow by id, with its step tree ordered by `step_number`.
    ///
    /// ## Returns
    /// * `Ok(Some(Workflow))` - Workflow found
    /// * `Ok(None)` - Workflow not found
    pub async fn get(&self, workflow_id: &str) -> DbResult<Option<Workflow>> {
        let row: Option<WorkflowRow> = sqlx::query_as(
            r#"
            SELECT id, organization_id, name, description, is_active,
                   created_at, updated_at
            FROM approval_workflows
            WHERE id = ?1
            "#,
        )
        .bind(workflow_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(self.load_tree(row).await?)),
            None => Ok(None),
        }
    }

    /// Lists an organization's workflows, newest first, trees loaded.
    pub async fn list(&self, organization_id: &str) -> DbResult<Vec<Workflow>> {
        let rows: Vec<WorkflowRow> = sqlx::query_as(
            r#"
            SELECT id, organization_id, name, description, is_active,
                   created_at, updated_at
            FROM approval_workflows
            WHERE organization_id = ?1
            ORDER BY created_at DESC
            "#,
        )
        .bind(organization_id)
        .fetch_all(&self.pool)
        .await?;

        let mut workflows = Vec::with_capacity(rows.len());
        for row in rows {
            workflows.push(self.load_tree(row).await?);
        }
        Ok(workflows)
    }

    /// Loads the step/condition/action tree for a workflow row.
    async fn load_tree(&self, row: WorkflowRow) -> DbResult<Workflow> {
        let step_rows: Vec<StepRow> = sqlx::query_as(
            r#"
            SELECT id, workflow_id, step_number, name, description,
                   all_conditions_must_match
            FROM workflow_steps
            WHERE workflow_id = ?1
            ORDER BY step_number ASC
            "#,
        )
        .bind(&row.id)
        .fetch_all(&self.pool)
        .await?;

        let condition_rows: Vec<ConditionRow> = sqlx::query_as(
            r#"
            SELECT c.id, c.step_id, c.condition_type, c.min_amount_cents,
                   c.max_amount_cents, c.expense_category_id, c.location_id
            FROM step_conditions c
            INNER JOIN workflow_steps s ON c.step_id = s.id
            WHERE s.workflow_id = ?1
            ORDER BY c.rowid
            "#,
        )
        .bind(&row.id)
        .fetch_all(&self.pool)
        .await?;

        let action_rows: Vec<ActionRow> = sqlx::query_as(
            r#"
            SELECT a.id, a.step_id, a.action_type, a.approver_role,
                   a.specific_member_id, a.approval_mode
            FROM step_actions a
            INNER JOIN workflow_steps s ON a.step_id = s.id
            WHERE s.workflow_id = ?1
            ORDER BY a.rowid
            "#,
        )
        .bind(&row.id)
        .fetch_all(&self.pool)
        .await?;

        let mut conditions_by_step: HashMap<String, Vec<ConditionRow>> = HashMap::new();
        for condition in condition_rows {
            conditions_by_step
                .entry(condition.step_id.clone())
                .or_default()
                .push(condition);
        }

        let mut actions_by_step: HashMap<String, Vec<ActionRow>> = HashMap::new();
        for action in action_rows {
            actions_by_step
                .entry(action.step_id.clone())
                .or_default()
                .push(action);
        }

        let steps = step_rows
            .into_iter()
            .map(|step| {
                let conditions = conditions_by_step.remove(&step.id).unwrap_or_default();
                let actions = actions_by_step.remove(&step.id).unwrap_or_default();
                assemble_step(step, conditions, actions)
            })
            .collect();

        Ok(Workflow {
            id: row.id,
            organization_id: row.organization_id,
            name: row.name,
            description: row.description,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
            steps,
        })
    }
}

// =============================================================================
// Tree Persistence
// =============================================================================

/// Inserts the step/condition/action tree of a validated definition.
///
/// Every field is mapped explicitly from the draft to its column, so a field
/// added to the draft types can never reach the database unreviewed.
async fn insert_step_tree(
    tx: &mut Transaction<'_, Sqlite>,
    workflow_id: &str,
    steps: &[StepDraft],
) -> DbResult<()> {
    for step in steps {
        let step_id = Uuid::new_v4().to_string();

        sqlx::query(
            r#"
            INSERT INTO workflow_steps (
                id, workflow_id, step_number, name, description,
                all_conditions_must_match
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&step_id)
        .bind(workflow_id)
        .bind(step.step_number)
        .bind(&step.name)
        .bind(&step.description)
        .bind(step.all_conditions_must_match)
        .execute(&mut **tx)
        .await?;

        for condition in &step.conditions {
            sqlx::query(
                r#"
                INSERT INTO step_conditions (
                    id, step_id, condition_type, min_amount_cents,
                    max_amount_cents, expense_category_id, location_id
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&step_id)
            .bind(condition.condition_type)
            .bind(condition.min_amount_cents)
            .bind(condition.max_amount_cents)
            .bind(&condition.expense_category_id)
            .bind(&condition.location_id)
            .execute(&mut **tx)
            .await?;
        }

        for action in &step.actions {
            sqlx::query(
                r#"
                INSERT INTO step_actions (
                    id, step_id, action_type, approver_role,
                    specific_member_id, approval_mode
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&step_id)
            .bind(action.action_type)
            .bind(action.approver_role)
            .bind(&action.specific_member_id)
            .bind(action.approval_mode.unwrap_or_default())
            .execute(&mut **tx)
            .await?;
        }
    }

    Ok(())
}

/// Assembles a step and its rows into the nested domain type.
fn assemble_step(step: StepRow, conditions: Vec<ConditionRow>, actions: Vec<ActionRow>) -> Step {
    Step {
        id: step.id,
        workflow_id: step.workflow_id,
        step_number: step.step_number,
        name: step.name,
        description: step.description,
        all_conditions_must_match: step.all_conditions_must_match,
        conditions: conditions
            .into_iter()
            .map(|row| Condition {
                id: row.id,
                step_id: row.step_id,
                condition_type: row.condition_type,
                min_amount_cents: row.min_amount_cents,
                max_amount_cents: row.max_amount_cents,
                expense_category_id: row.expense_category_id,
                location_id: row.location_id,
            })
            .collect(),
        actions: actions
            .into_iter()
            .map(|row| Action {
                id: row.id,
                step_id: row.step_id,
                action_type: row.action_type,
                approver_role: row.approver_role,
                specific_member_id: row.specific_member_id,
                approval_mode: row.approval_mode,
            })
            .collect(),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
