//! # Rule Evaluation Engine
//!
//! Walks a workflow's steps against a transaction context and emits the
//! approval requirements of every applying step.
//!
//! ## Evaluation Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Evaluating an Expense                                │
//! │                                                                         │
//! │  Expense submitted: $150.00, category "Travel", location "Downtown"    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Steps ordered by step_number ascending                                │
//! │       │                                                                 │
//! │       ├── Step 1: AMOUNT_RANGE max=$100      → no match                │
//! │       ├── Step 2: AMOUNT_RANGE $100-$1000    → MATCH                   │
//! │       │      └── emits { ROLE: ADMIN, mode: ANY_ONE }                  │
//! │       └── Step 3: LOCATION "Downtown"        → MATCH                   │
//! │              └── emits { ROLE: MANAGER, mode: ANY_ONE }                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  [StepMatch{2, ...}, StepMatch{3, ...}]  (ALL applying steps, ordered) │
//! │                                                                         │
//! │  The approval-request lifecycle (out of scope) turns each requirement  │
//! │  into pending-approval records.                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Guarantees
//! - Pure and deterministic: no I/O, no hidden state, same input same output
//! - Never panics, never errors: a malformed condition (payload missing for
//!   its declared type) is treated as non-matching and logged at warn level,
//!   so one bad row can never block evaluation of sibling steps

use tracing::warn;

use crate::types::{Action, ActionType, ApprovalRequirement, ApproverRef, Condition,
    ConditionType, Step, StepMatch, TransactionContext, Workflow};

// =============================================================================
// Entry Point
// =============================================================================

/// Evaluates a workflow against a transaction context.
///
/// Returns one [`StepMatch`] per applying step, in `step_number` ascending
/// order. The engine does not stop at the first match: tiered workflows
/// routinely have several applying steps. An empty result means no step
/// applied; what to do then (auto-approve vs reject-as-unconfigured) is the
/// caller's policy.
///
/// ## Example
/// ```rust
/// # use basil_core::evaluate::evaluate_workflow;
/// # use basil_core::types::TransactionContext;
/// # fn demo(workflow: &basil_core::types::Workflow) {
/// let context = TransactionContext::for_amount(7_500, "submitter-uuid");
/// for matched in evaluate_workflow(workflow, &context) {
///     println!("step {} requires {} approval(s)",
///         matched.step_number, matched.requirements.len());
/// }
/// # }
/// ```
pub fn evaluate_workflow(workflow: &Workflow, context: &TransactionContext) -> Vec<StepMatch> {
    let mut steps: Vec<&Step> = workflow.steps.iter().collect();
    steps.sort_by_key(|step| step.step_number);

    steps
        .into_iter()
        .filter(|step| step_applies(step, context))
        .map(|step| StepMatch {
            step_number: step.step_number,
            requirements: step
                .actions
                .iter()
                .filter_map(|action| action_requirement(step, action))
                .collect(),
        })
        .collect()
}

// =============================================================================
// Step Matching
// =============================================================================

/// Combines a step's condition results per its `all_conditions_must_match`
/// flag: AND when true, OR when false.
fn step_applies(step: &Step, context: &TransactionContext) -> bool {
    if step.conditions.is_empty() {
        // Cannot pass validation; may arrive through legacy rows. A step
        // with no conditions must not silently match every transaction.
        warn!(
            step_number = step.step_number,
            "step has no conditions, treating as non-matching"
        );
        return false;
    }

    if step.all_conditions_must_match {
        step.conditions
            .iter()
            .all(|condition| condition_matches(condition, context))
    } else {
        step.conditions
            .iter()
            .any(|condition| condition_matches(condition, context))
    }
}

/// Evaluates a single condition to a boolean per its type.
///
/// ## Amount Boundary Semantics
/// Lower bound exclusive, upper bound inclusive: a $100.00 expense falls in
/// the "up to $100" tier, not the "$100 to $1000" tier.
fn condition_matches(condition: &Condition, context: &TransactionContext) -> bool {
    match condition.condition_type {
        ConditionType::AmountRange => {
            if condition.min_amount_cents.is_none() && condition.max_amount_cents.is_none() {
                warn!(
                    condition_id = %condition.id,
                    "amount-range condition has no bounds, treating as non-matching"
                );
                return false;
            }

            let above_min = condition
                .min_amount_cents
                .map_or(true, |min| context.amount_cents > min);
            let below_max = condition
                .max_amount_cents
                .map_or(true, |max| context.amount_cents <= max);
            above_min && below_max
        }

        ConditionType::ExpenseCategory => match &condition.expense_category_id {
            Some(category_id) => context.expense_category_id.as_deref() == Some(category_id.as_str()),
            None => {
                warn!(
                    condition_id = %condition.id,
                    "expense-category condition has no category, treating as non-matching"
                );
                false
            }
        },

        ConditionType::Location => match &condition.location_id {
            Some(location_id) => context.location_id.as_deref() == Some(location_id.as_str()),
            None => {
                warn!(
                    condition_id = %condition.id,
                    "location condition has no location, treating as non-matching"
                );
                false
            }
        },
    }
}

// =============================================================================
// Requirement Resolution
// =============================================================================

/// Resolves an action into the approval requirement it emits.
///
/// Malformed actions (payload missing for the declared type) are dropped
/// with a warning; an applying step whose actions are all malformed yields
/// an empty requirement list the caller must treat as unconfigured.
fn action_requirement(step: &Step, action: &Action) -> Option<ApprovalRequirement> {
    let approver = match action.action_type {
        ActionType::Role => match action.approver_role {
            Some(role) => ApproverRef::Role { role },
            None => {
                warn!(
                    step_number = step.step_number,
                    action_id = %action.id,
                    "role action has no role, dropping requirement"
                );
                return None;
            }
        },
        ActionType::SpecificMember => match &action.specific_member_id {
            Some(member_id) => ApproverRef::Member {
                member_id: member_id.clone(),
            },
            None => {
                warn!(
                    step_number = step.step_number,
                    action_id = %action.id,
                    "specific-member action has no member, dropping requirement"
                );
                return None;
            }
        },
    };

    Some(ApprovalRequirement {
        approver,
        mode: action.approval_mode,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
