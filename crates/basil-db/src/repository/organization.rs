//! # Organization Repository
//!
//! Organizations and the active-workflow pointer.
//!
//! ## Pointer, Not Flag
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │            Which workflow applies to a new expense?                     │
//! │                                                                         │
//! │  organizations.active_expense_workflow_id ──► approval_workflows.id    │
//! │                                                                         │
//! │  The pointer is authoritative. Each workflow also carries an           │
//! │  is_active eligibility flag rendered in the settings UI; activating    │
//! │  a different workflow swaps the pointer and touches no flag.           │
//! │                                                                         │
//! │  Being a single column, the pointer can only ever reference one        │
//! │  workflow per organization: setting a new one implicitly deactivates   │
//! │  the previous one.                                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::workflow::WorkflowRepository;
use basil_core::types::{Organization, Workflow};

// =============================================================================
// Row Type
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct OrganizationRow {
    id: String,
    name: String,
    active_expense_workflow_id: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<OrganizationRow> for Organization {
    fn from(row: OrganizationRow) -> Self {
        Organization {
            id: row.id,
            name: row.name,
            active_expense_workflow_id: row.active_expense_workflow_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for organization database operations.
#[derive(Debug, Clone)]
pub struct OrganizationRepository {
    pool: SqlitePool,
}

impl OrganizationRepository {
    /// Creates a new OrganizationRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrganizationRepository { pool }
    }

    /// Creates an organization with no active workflow.
    pub async fn create(&self, name: &str) -> DbResult<Organization> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        debug!(id = %id, name = %name, "Creating organization");

        let organization = Organization {
            id: id.clone(),
            name: name.to_string(),
            active_expense_workflow_id: None,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO organizations (
                id, name, active_expense_workflow_id, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&organization.id)
        .bind(&organization.name)
        .bind(&organization.active_expense_workflow_id)
        .bind(organization.created_at)
        .bind(organization.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(organization)
    }

    /// Gets an organization by id.
    ///
    /// ## Returns
    /// * `Ok(Some(Organization))` - Organization found
    /// * `Ok(None)` - Organization not found
    pub async fn get(&self, id: &str) -> DbResult<Option<Organization>> {
        let row: Option<OrganizationRow> = sqlx::query_as(
            r#"
            SELECT id, name, active_expense_workflow_id, created_at, updated_at
            FROM organizations
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Organization::from))
    }

    /// Counts organizations (for diagnostics and seeding).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM organizations")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Points an organization at the workflow to use for new expenses.
    ///
    /// A single atomic pointer swap: the previously active workflow is
    /// implicitly deactivated, and no workflow's `is_active` flag changes.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - Workflow or organization does not exist
    /// * `Err(DbError::TenantMismatch)` - Workflow belongs to another
    ///   organization; cross-tenant activation is rejected
    pub async fn set_active_workflow(
        &self,
        organization_id: &str,
        workflow_id: &str,
    ) -> DbResult<()> {
        debug!(
            organization_id = %organization_id,
            workflow_id = %workflow_id,
            "Setting active workflow"
        );

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let owner: Option<String> =
            sqlx::query_scalar("SELECT organization_id FROM approval_workflows WHERE id = ?1")
                .bind(workflow_id)
                .fetch_optional(&mut *tx)
                .await?;

        let Some(owner) = owner else {
            return Err(DbError::not_found("Workflow", workflow_id));
        };

        if owner != organization_id {
            return Err(DbError::TenantMismatch {
                workflow_id: workflow_id.to_string(),
                organization_id: organization_id.to_string(),
            });
        }

        let now = Utc::now();
        let result = sqlx::query(
            r#"
            UPDATE organizations
            SET active_expense_workflow_id = ?2, updated_at = ?3
            WHERE id = ?1
            "#,
        )
        .bind(organization_id)
        .bind(workflow_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Organization", organization_id));
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))
    }

    /// Clears the organization's active-workflow pointer.
    pub async fn clear_active_workflow(&self, organization_id: &str) -> DbResult<()> {
        debug!(organization_id = %organization_id, "Clearing active workflow");

        let now = Utc::now();
        let result = sqlx::query(
            r#"
            UPDATE organizations
            SET active_expense_workflow_id = NULL, updated_at = ?2
            WHERE id = ?1
            "#,
        )
        .bind(organization_id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Organization", organization_id));
        }

        Ok(())
    }

    /// Dereferences the active-workflow pointer, tree loaded.
    ///
    /// ## Returns
    /// * `Ok(Some(Workflow))` - The workflow currently in force
    /// * `Ok(None)` - No active workflow configured
    /// * `Err(DbError::NotFound)` - Organization does not exist
    pub async fn get_active_workflow(
        &self,
        organization_id: &str,
    ) -> DbResult<Option<Workflow>> {
        let organization = self
            .get(organization_id)
            .await?
            .ok_or_else(|| DbError::not_found("Organization", organization_id))?;

        let Some(workflow_id) = organization.active_expense_workflow_id else {
            return Ok(None);
        };

        let workflow = WorkflowRepository::new(self.pool.clone())
            .get(&workflow_id)
            .await?;

        if workflow.is_none() {
            // The FK makes this unreachable outside manual surgery
            warn!(
                organization_id = %organization_id,
                workflow_id = %workflow_id,
                "active-workflow pointer is dangling"
            );
        }

        Ok(workflow)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use basil_core::types::{ActionDraft, ActionType, ConditionDraft, ConditionType, MemberRole,
        StepDraft, WorkflowDraft};
    use basil_core::validation::{validate_workflow, ValidatedWorkflow};

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn simple_definition(name: &str, is_active: bool) -> ValidatedWorkflow {
        validate_workflow(WorkflowDraft {
            name: name.to_string(),
            description: None,
            is_active,
            steps: vec![StepDraft {
                step_number: 1,
                name: "Approval".to_string(),
                description: None,
                all_conditions_must_match: true,
                conditions: vec![ConditionDraft {
                    condition_type: ConditionType::AmountRange,
                    min_amount_cents: None,
                    max_amount_cents: Some(10_000),
                    expense_category_id: None,
                    location_id: None,
                }],
                actions: vec![ActionDraft {
                    action_type: ActionType::Role,
                    approver_role: Some(MemberRole::Manager),
                    specific_member_id: None,
                    approval_mode: None,
                }],
            }],
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_create_and_get_organization() {
        let db = test_db().await;
        let repo = db.organizations();

        let created = repo.create("Demo Restaurant Group").await.unwrap();
        assert!(created.active_expense_workflow_id.is_none());

        let loaded = repo.get(&created.id).await.unwrap().unwrap();
        assert_eq!(loaded.id, created.id);
        assert_eq!(loaded.name, "Demo Restaurant Group");
        assert!(loaded.active_expense_workflow_id.is_none());
        assert_eq!(repo.count().await.unwrap(), 1);

        assert!(repo.get("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_pointer_swap_leaves_is_active_untouched() {
        let db = test_db().await;
        let org = db.organizations().create("Org").await.unwrap();
        let workflows = db.workflows();

        // w1 is eligibility-flagged active, w2 is not; the pointer ignores both
        let w1 = workflows
            .create(&org.id, &simple_definition("First", true))
            .await
            .unwrap();
        let w2 = workflows
            .create(&org.id, &simple_definition("Second", false))
            .await
            .unwrap();

        let repo = db.organizations();
        repo.set_active_workflow(&org.id, &w1.id).await.unwrap();
        repo.set_active_workflow(&org.id, &w2.id).await.unwrap();

        let active = repo.get_active_workflow(&org.id).await.unwrap().unwrap();
        assert_eq!(active.id, w2.id);
        assert_eq!(active.steps.len(), 1);

        // Neither workflow's is_active flag moved
        let w1_reloaded = workflows.get(&w1.id).await.unwrap().unwrap();
        let w2_reloaded = workflows.get(&w2.id).await.unwrap().unwrap();
        assert!(w1_reloaded.is_active);
        assert!(!w2_reloaded.is_active);
    }

    #[tokio::test]
    async fn test_get_active_workflow_when_unset() {
        let db = test_db().await;
        let org = db.organizations().create("Org").await.unwrap();

        let active = db.organizations().get_active_workflow(&org.id).await.unwrap();
        assert!(active.is_none());

        let err = db
            .organizations()
            .get_active_workflow("missing-org")
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_cross_tenant_activation_rejected() {
        let db = test_db().await;
        let org_a = db.organizations().create("Org A").await.unwrap();
        let org_b = db.organizations().create("Org B").await.unwrap();

        let foreign = db
            .workflows()
            .create(&org_b.id, &simple_definition("B's workflow", true))
            .await
            .unwrap();

        let err = db
            .organizations()
            .set_active_workflow(&org_a.id, &foreign.id)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::TenantMismatch { .. }));

        // Pointer unchanged
        let org_a = db.organizations().get(&org_a.id).await.unwrap().unwrap();
        assert!(org_a.active_expense_workflow_id.is_none());
    }

    #[tokio::test]
    async fn test_activate_missing_workflow_is_not_found() {
        let db = test_db().await;
        let org = db.organizations().create("Org").await.unwrap();

        let err = db
            .organizations()
            .set_active_workflow(&org.id, "missing-workflow")
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_clear_active_workflow() {
        let db = test_db().await;
        let org = db.organizations().create("Org").await.unwrap();
        let workflow = db
            .workflows()
            .create(&org.id, &simple_definition("Only", true))
            .await
            .unwrap();

        let repo = db.organizations();
        repo.set_active_workflow(&org.id, &workflow.id).await.unwrap();
        repo.clear_active_workflow(&org.id).await.unwrap();

        assert!(repo.get_active_workflow(&org.id).await.unwrap().is_none());

        let err = repo.clear_active_workflow("missing").await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
