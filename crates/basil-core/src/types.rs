//! # Domain Types
//!
//! Core domain types for Basil approval workflows.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  Organization ──(active_expense_workflow_id)──► Workflow                │
//! │                                                     │                   │
//! │                                            Step (1..N, ordered)         │
//! │                                             │              │            │
//! │                                     Condition (1..N)  Action (1..N)     │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  ConditionType  │   │   ActionType    │   │  ApprovalMode   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  AMOUNT_RANGE   │   │  ROLE           │   │  ANY_ONE        │       │
//! │  │  EXPENSE_CATEG. │   │  SPECIFIC_MEMB. │   │  ALL            │       │
//! │  │  LOCATION       │   └─────────────────┘   └─────────────────┘       │
//! │  └─────────────────┘                                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual Shape Pattern
//! Every tree node exists twice:
//! - Persisted form (`Workflow`, `Step`, ...) with ids and timestamps
//! - Draft form (`WorkflowDraft`, `StepDraft`, ...) as submitted by the
//!   settings UI, before validation and before ids exist

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Member Role
// =============================================================================

/// Role held by an organization member.
///
/// `ROLE` actions reference one of these; the membership directory expands
/// the role into concrete members at approval time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MemberRole {
    Owner,
    Admin,
    Manager,
    Staff,
}

// =============================================================================
// Condition Type
// =============================================================================

/// The kind of predicate a condition applies to the transaction context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConditionType {
    /// Transaction amount falls inside an (exclusive-min, inclusive-max] range.
    AmountRange,
    /// Transaction's expense category equals the referenced category.
    ExpenseCategory,
    /// Transaction's location equals the referenced location.
    Location,
}

// =============================================================================
// Action Type
// =============================================================================

/// Who a matched step requires approval from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionType {
    /// Any organization member holding the referenced role.
    Role,
    /// Exactly the referenced member.
    SpecificMember,
}

// =============================================================================
// Approval Mode
// =============================================================================

/// How many of the resolved approvers must approve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApprovalMode {
    /// A single approval from the resolved set suffices.
    AnyOne,
    /// Every resolved approver must approve.
    All,
}

impl Default for ApprovalMode {
    fn default() -> Self {
        ApprovalMode::AnyOne
    }
}

// =============================================================================
// Organization
// =============================================================================

/// A tenant of the platform.
///
/// The `active_expense_workflow_id` pointer, not any workflow-local flag, is
/// authoritative for which workflow applies to new expenses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Organization {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name.
    pub name: String,

    /// Pointer to the workflow currently in force for expense approval.
    /// `None` means no workflow applies (caller policy decides what happens
    /// to submitted expenses).
    pub active_expense_workflow_id: Option<String>,

    /// When the organization was created.
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    /// When the organization was last updated.
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Workflow
// =============================================================================

/// An organization's named, ordered set of approval steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Workflow {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Organization this workflow belongs to.
    pub organization_id: String,

    /// Display name. Not unique, even within an organization.
    pub name: String,

    /// Optional description shown in the settings UI.
    pub description: Option<String>,

    /// Eligibility flag rendered on the workflow card. Independent of the
    /// organization's active-workflow pointer.
    pub is_active: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,

    /// Steps ordered by `step_number` ascending.
    pub steps: Vec<Step>,
}

// =============================================================================
// Step
// =============================================================================

/// One stage of sequential approval, gated by conditions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Step {
    pub id: String,
    pub workflow_id: String,

    /// Position and identity of the step within its workflow. Positive,
    /// unique per workflow; gaps are permitted.
    pub step_number: i64,

    pub name: String,
    pub description: Option<String>,

    /// `true` combines this step's conditions with AND, `false` with OR.
    pub all_conditions_must_match: bool,

    /// Predicates gating this step (1..N after validation).
    pub conditions: Vec<Condition>,

    /// Approval requirements emitted when this step matches (1..N).
    pub actions: Vec<Action>,
}

// =============================================================================
// Condition
// =============================================================================

/// A predicate evaluated against the transaction context.
///
/// Payload columns are nullable; which ones must be present depends on
/// `condition_type` and is enforced by validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Condition {
    pub id: String,
    pub step_id: String,
    pub condition_type: ConditionType,

    /// Exclusive lower bound in cents (AMOUNT_RANGE).
    pub min_amount_cents: Option<i64>,

    /// Inclusive upper bound in cents (AMOUNT_RANGE).
    pub max_amount_cents: Option<i64>,

    /// Referenced expense category (EXPENSE_CATEGORY).
    pub expense_category_id: Option<String>,

    /// Referenced location (LOCATION).
    pub location_id: Option<String>,
}

impl Condition {
    /// Returns the lower bound as Money.
    #[inline]
    pub fn min_amount(&self) -> Option<Money> {
        self.min_amount_cents.map(Money::from_cents)
    }

    /// Returns the upper bound as Money.
    #[inline]
    pub fn max_amount(&self) -> Option<Money> {
        self.max_amount_cents.map(Money::from_cents)
    }
}

// =============================================================================
// Action
// =============================================================================

/// An approval requirement emitted when a step's conditions match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Action {
    pub id: String,
    pub step_id: String,
    pub action_type: ActionType,

    /// Required role (ROLE actions).
    pub approver_role: Option<MemberRole>,

    /// Required member (SPECIFIC_MEMBER actions).
    pub specific_member_id: Option<String>,

    pub approval_mode: ApprovalMode,
}

// =============================================================================
// Draft Types (unvalidated input)
// =============================================================================

/// A workflow definition as submitted by the settings UI, before validation.
///
/// Ids and timestamps do not exist yet; the repository generates them when
/// the validated draft is persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct WorkflowDraft {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_active: bool,
    pub steps: Vec<StepDraft>,
}

/// Draft form of [`Step`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StepDraft {
    pub step_number: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub all_conditions_must_match: bool,
    pub conditions: Vec<ConditionDraft>,
    pub actions: Vec<ActionDraft>,
}

/// Draft form of [`Condition`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ConditionDraft {
    pub condition_type: ConditionType,
    #[serde(default)]
    pub min_amount_cents: Option<i64>,
    #[serde(default)]
    pub max_amount_cents: Option<i64>,
    #[serde(default)]
    pub expense_category_id: Option<String>,
    #[serde(default)]
    pub location_id: Option<String>,
}

/// Draft form of [`Action`].
///
/// `approval_mode` may be omitted; validation normalizes it to `ANY_ONE`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ActionDraft {
    pub action_type: ActionType,
    #[serde(default)]
    pub approver_role: Option<MemberRole>,
    #[serde(default)]
    pub specific_member_id: Option<String>,
    #[serde(default)]
    pub approval_mode: Option<ApprovalMode>,
}

// =============================================================================
// Evaluation Types
// =============================================================================

/// The transaction being evaluated against a workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TransactionContext {
    /// Transaction amount in cents.
    pub amount_cents: i64,

    /// Expense category of the transaction, when known.
    #[serde(default)]
    pub expense_category_id: Option<String>,

    /// Location the transaction originated from, when known.
    #[serde(default)]
    pub location_id: Option<String>,

    /// Member who submitted the transaction.
    pub submitter_id: String,
}

impl TransactionContext {
    /// Builds a context carrying only an amount and a submitter.
    ///
    /// ## Example
    /// ```rust
    /// use basil_core::types::TransactionContext;
    ///
    /// let ctx = TransactionContext::for_amount(7_500, "member-uuid");
    /// assert_eq!(ctx.amount().to_string(), "$75.00");
    /// ```
    pub fn for_amount(amount_cents: i64, submitter_id: impl Into<String>) -> Self {
        TransactionContext {
            amount_cents,
            expense_category_id: None,
            location_id: None,
            submitter_id: submitter_id.into(),
        }
    }

    /// Returns the transaction amount as Money.
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

/// Reference to who must approve, before membership expansion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApproverRef {
    /// Any member holding `role`; expanded by the membership directory.
    Role { role: MemberRole },
    /// Exactly this member.
    Member { member_id: String },
}

/// One approval requirement emitted by a matched step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ApprovalRequirement {
    pub approver: ApproverRef,
    pub mode: ApprovalMode,
}

/// One applying step and the requirements it emits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StepMatch {
    pub step_number: i64,
    pub requirements: Vec<ApprovalRequirement>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_approval_mode_default() {
        assert_eq!(ApprovalMode::default(), ApprovalMode::AnyOne);
    }

    #[test]
    fn test_condition_amount_accessors() {
        let condition = Condition {
            id: "c1".to_string(),
            step_id: "s1".to_string(),
            condition_type: ConditionType::AmountRange,
            min_amount_cents: Some(10_000),
            max_amount_cents: None,
            expense_category_id: None,
            location_id: None,
        };
        assert_eq!(condition.min_amount(), Some(Money::from_cents(10_000)));
        assert_eq!(condition.max_amount(), None);
    }

    #[test]
    fn test_context_for_amount() {
        let ctx = TransactionContext::for_amount(15_000, "m1");
        assert_eq!(ctx.amount_cents, 15_000);
        assert_eq!(ctx.submitter_id, "m1");
        assert!(ctx.expense_category_id.is_none());
        assert!(ctx.location_id.is_none());
    }
}
