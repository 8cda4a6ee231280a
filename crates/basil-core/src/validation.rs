//! # Validation Module
//!
//! Structural validation for workflow definitions.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Frontend (TypeScript)                                        │
//! │  ├── Basic format checks (empty, length)                               │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE (Rust)                                           │
//! │  ├── Whole-tree structural validation                                  │
//! │  └── Collects EVERY violation with a field path                        │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL constraints                                              │
//! │  ├── UNIQUE (workflow_id, step_number)                                 │
//! │  └── Foreign key constraints                                           │
//! │                                                                         │
//! │  Defense in depth: Multiple layers catch different errors              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust,no_run
//! use basil_core::validation::validate_workflow;
//! # let draft: basil_core::types::WorkflowDraft = unimplemented!();
//!
//! match validate_workflow(draft) {
//!     Ok(validated) => { /* persist via the workflow repository */ }
//!     Err(errors) => { /* annotate the form using error.field() */ }
//! }
//! ```

use std::collections::HashSet;

use crate::error::{ValidationError, ValidationResult};
use crate::types::{ActionDraft, ActionType, ApprovalMode, ConditionDraft, ConditionType,
    StepDraft, WorkflowDraft};
use crate::{MAX_NAME_LEN, MAX_RULES_PER_STEP, MAX_STEPS_PER_WORKFLOW};

// =============================================================================
// Validated Workflow
// =============================================================================

/// A workflow definition that passed [`validate_workflow`].
///
/// The repository layer only accepts this type, so an unvalidated draft can
/// never reach the database through the normal path.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedWorkflow(WorkflowDraft);

impl ValidatedWorkflow {
    /// Borrows the normalized draft (trimmed name, approval modes filled in).
    pub fn as_draft(&self) -> &WorkflowDraft {
        &self.0
    }

    /// Consumes the wrapper, yielding the normalized draft.
    pub fn into_draft(self) -> WorkflowDraft {
        self.0
    }

    /// Wraps a draft without re-running validation.
    ///
    /// The caller asserts the draft already passed validation, e.g. when
    /// replaying a definition that was validated on the way in. Handing an
    /// invalid draft to the repository shifts enforcement to the database
    /// constraints.
    pub fn assume_valid(draft: WorkflowDraft) -> Self {
        ValidatedWorkflow(draft)
    }
}

// =============================================================================
// Entry Point
// =============================================================================

/// Validates a submitted workflow definition.
///
/// ## Rules
/// - workflow name non-empty after trimming, at most [`MAX_NAME_LEN`] chars
/// - 1..=[`MAX_STEPS_PER_WORKFLOW`] steps
/// - step numbers positive and unique across the array (gaps permitted)
/// - step names non-empty
/// - every step has at least one condition and one action
/// - condition payloads match their declared type (see [`ConditionType`])
/// - action payloads match their declared type (see [`ActionType`])
/// - reference ids are UUID-format
/// - `approval_mode` defaults to `ANY_ONE` when omitted
///
/// Returns the normalized definition, or **every** violation found so the
/// whole form can be annotated in one round trip. Pure function of its input.
pub fn validate_workflow(mut draft: WorkflowDraft) -> ValidationResult<ValidatedWorkflow> {
    let mut errors = Vec::new();

    draft.name = draft.name.trim().to_string();
    if draft.name.is_empty() {
        errors.push(ValidationError::Required {
            field: "name".to_string(),
        });
    } else if draft.name.len() > MAX_NAME_LEN {
        errors.push(ValidationError::TooLong {
            field: "name".to_string(),
            max: MAX_NAME_LEN,
        });
    }

    if draft.steps.is_empty() {
        errors.push(ValidationError::Empty {
            field: "steps".to_string(),
        });
    } else if draft.steps.len() > MAX_STEPS_PER_WORKFLOW {
        errors.push(ValidationError::OutOfRange {
            field: "steps".to_string(),
            min: 1,
            max: MAX_STEPS_PER_WORKFLOW as i64,
        });
    }

    let mut seen_numbers: HashSet<i64> = HashSet::new();
    for (i, step) in draft.steps.iter_mut().enumerate() {
        validate_step(i, step, &mut seen_numbers, &mut errors);
    }

    if errors.is_empty() {
        Ok(ValidatedWorkflow(draft))
    } else {
        Err(errors)
    }
}

// =============================================================================
// Step Validation
// =============================================================================

fn validate_step(
    index: usize,
    step: &mut StepDraft,
    seen_numbers: &mut HashSet<i64>,
    errors: &mut Vec<ValidationError>,
) {
    let prefix = format!("steps[{index}]");

    if step.step_number < 1 {
        errors.push(ValidationError::MustBePositive {
            field: format!("{prefix}.step_number"),
        });
    } else if !seen_numbers.insert(step.step_number) {
        errors.push(ValidationError::Duplicate {
            field: format!("{prefix}.step_number"),
            value: step.step_number.to_string(),
        });
    }

    step.name = step.name.trim().to_string();
    if step.name.is_empty() {
        errors.push(ValidationError::Required {
            field: format!("{prefix}.name"),
        });
    } else if step.name.len() > MAX_NAME_LEN {
        errors.push(ValidationError::TooLong {
            field: format!("{prefix}.name"),
            max: MAX_NAME_LEN,
        });
    }

    if step.conditions.is_empty() {
        errors.push(ValidationError::Empty {
            field: format!("{prefix}.conditions"),
        });
    } else if step.conditions.len() > MAX_RULES_PER_STEP {
        errors.push(ValidationError::OutOfRange {
            field: format!("{prefix}.conditions"),
            min: 1,
            max: MAX_RULES_PER_STEP as i64,
        });
    }

    if step.actions.is_empty() {
        errors.push(ValidationError::Empty {
            field: format!("{prefix}.actions"),
        });
    } else if step.actions.len() > MAX_RULES_PER_STEP {
        errors.push(ValidationError::OutOfRange {
            field: format!("{prefix}.actions"),
            min: 1,
            max: MAX_RULES_PER_STEP as i64,
        });
    }

    for (j, condition) in step.conditions.iter().enumerate() {
        validate_condition(&format!("{prefix}.conditions[{j}]"), condition, errors);
    }

    for (j, action) in step.actions.iter_mut().enumerate() {
        validate_action(&format!("{prefix}.actions[{j}]"), action, errors);
    }
}

// =============================================================================
// Condition Validation
// =============================================================================

/// Cross-field check: the payload required by the declared type must be set.
fn validate_condition(
    prefix: &str,
    condition: &ConditionDraft,
    errors: &mut Vec<ValidationError>,
) {
    match condition.condition_type {
        ConditionType::AmountRange => {
            if condition.min_amount_cents.is_none() && condition.max_amount_cents.is_none() {
                errors.push(ValidationError::MissingBounds {
                    field: prefix.to_string(),
                });
                return;
            }

            if let Some(min) = condition.min_amount_cents {
                if min < 0 {
                    errors.push(ValidationError::OutOfRange {
                        field: format!("{prefix}.min_amount_cents"),
                        min: 0,
                        max: i64::MAX,
                    });
                }
            }
            if let Some(max) = condition.max_amount_cents {
                if max < 0 {
                    errors.push(ValidationError::OutOfRange {
                        field: format!("{prefix}.max_amount_cents"),
                        min: 0,
                        max: i64::MAX,
                    });
                }
            }

            // A range with min >= max can never match any amount.
            if let (Some(min), Some(max)) = (condition.min_amount_cents, condition.max_amount_cents)
            {
                if min >= max {
                    errors.push(ValidationError::InvalidFormat {
                        field: format!("{prefix}.min_amount_cents"),
                        reason: "must be less than max_amount_cents".to_string(),
                    });
                }
            }
        }

        ConditionType::ExpenseCategory => {
            validate_reference_id(
                &format!("{prefix}.expense_category_id"),
                condition.expense_category_id.as_deref(),
                errors,
            );
        }

        ConditionType::Location => {
            validate_reference_id(
                &format!("{prefix}.location_id"),
                condition.location_id.as_deref(),
                errors,
            );
        }
    }
}

// =============================================================================
// Action Validation
// =============================================================================

/// Cross-field check plus `approval_mode` normalization.
fn validate_action(prefix: &str, action: &mut ActionDraft, errors: &mut Vec<ValidationError>) {
    match action.action_type {
        ActionType::Role => {
            if action.approver_role.is_none() {
                errors.push(ValidationError::Required {
                    field: format!("{prefix}.approver_role"),
                });
            }
        }
        ActionType::SpecificMember => {
            validate_reference_id(
                &format!("{prefix}.specific_member_id"),
                action.specific_member_id.as_deref(),
                errors,
            );
        }
    }

    // ANY_ONE when the settings UI omits the mode
    action.approval_mode.get_or_insert(ApprovalMode::AnyOne);
}

// =============================================================================
// Reference-Id Validation
// =============================================================================

/// Validates a reference id: present, non-empty, UUID-format.
///
/// ## Example
/// Every entity id in the platform is a UUID v4 string, so a malformed
/// reference is always client error, never a lookup miss.
fn validate_reference_id(field: &str, value: Option<&str>, errors: &mut Vec<ValidationError>) {
    let Some(value) = value else {
        errors.push(ValidationError::Required {
            field: field.to_string(),
        });
        return;
    };

    if value.trim().is_empty() {
        errors.push(ValidationError::Required {
            field: field.to_string(),
        });
        return;
    }

    if uuid::Uuid::parse_str(value).is_err() {
        errors.push(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "must be a valid UUID".to_string(),
        });
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MemberRole;

    const CATEGORY_ID: &str = "7c9e6679-7425-40de-944b-e07fc1f90ae7";
    const LOCATION_ID: &str = "550e8400-e29b-41d4-a716-446655440000";
    const MEMBER_ID: &str = "f47ac10b-58cc-4372-a567-0e02b2c3d479";

    fn amount_condition(min: Option<i64>, max: Option<i64>) -> ConditionDraft {
        ConditionDraft {
            condition_type: ConditionType::AmountRange,
            min_amount_cents: min,
            max_amount_cents: max,
            expense_category_id: None,
            location_id: None,
        }
    }

    fn category_condition(id: Option<&str>) -> ConditionDraft {
        ConditionDraft {
            condition_type: ConditionType::ExpenseCategory,
            min_amount_cents: None,
            max_amount_cents: None,
            expense_category_id: id.map(String::from),
            location_id: None,
        }
    }

    fn role_action(role: MemberRole) -> ActionDraft {
        ActionDraft {
            action_type: ActionType::Role,
            approver_role: Some(role),
            specific_member_id: None,
            approval_mode: None,
        }
    }

    fn step(number: i64, conditions: Vec<ConditionDraft>, actions: Vec<ActionDraft>) -> StepDraft {
        StepDraft {
            step_number: number,
            name: format!("Step {number}"),
            description: None,
            all_conditions_must_match: true,
            conditions,
            actions,
        }
    }

    fn draft(steps: Vec<StepDraft>) -> WorkflowDraft {
        WorkflowDraft {
            name: "Expense Approval".to_string(),
            description: None,
            is_active: true,
            steps,
        }
    }

    fn fields(errors: &[ValidationError]) -> Vec<&str> {
        errors.iter().map(|e| e.field()).collect()
    }

    #[test]
    fn test_valid_draft_passes_and_normalizes_mode() {
        let validated = validate_workflow(draft(vec![step(
            1,
            vec![amount_condition(None, Some(10_000))],
            vec![role_action(MemberRole::Manager)],
        )]))
        .unwrap();

        let mode = validated.as_draft().steps[0].actions[0].approval_mode;
        assert_eq!(mode, Some(ApprovalMode::AnyOne));
    }

    #[test]
    fn test_workflow_name_required_and_trimmed() {
        let mut d = draft(vec![step(
            1,
            vec![amount_condition(None, Some(100))],
            vec![role_action(MemberRole::Manager)],
        )]);
        d.name = "   ".to_string();
        let errors = validate_workflow(d.clone()).unwrap_err();
        assert!(fields(&errors).contains(&"name"));

        d.name = "  Trimmed  ".to_string();
        let validated = validate_workflow(d).unwrap();
        assert_eq!(validated.as_draft().name, "Trimmed");
    }

    #[test]
    fn test_steps_required() {
        let errors = validate_workflow(draft(vec![])).unwrap_err();
        assert_eq!(
            errors,
            vec![ValidationError::Empty {
                field: "steps".to_string()
            }]
        );
    }

    #[test]
    fn test_duplicate_step_numbers_rejected() {
        let errors = validate_workflow(draft(vec![
            step(
                1,
                vec![amount_condition(None, Some(100))],
                vec![role_action(MemberRole::Manager)],
            ),
            step(
                1,
                vec![amount_condition(Some(100), None)],
                vec![role_action(MemberRole::Admin)],
            ),
        ]))
        .unwrap_err();

        assert_eq!(
            errors,
            vec![ValidationError::Duplicate {
                field: "steps[1].step_number".to_string(),
                value: "1".to_string(),
            }]
        );
    }

    #[test]
    fn test_step_number_gaps_permitted() {
        let result = validate_workflow(draft(vec![
            step(
                1,
                vec![amount_condition(None, Some(100))],
                vec![role_action(MemberRole::Manager)],
            ),
            step(
                5,
                vec![amount_condition(Some(100), None)],
                vec![role_action(MemberRole::Admin)],
            ),
        ]));
        assert!(result.is_ok());
    }

    #[test]
    fn test_step_number_must_be_positive() {
        let errors = validate_workflow(draft(vec![step(
            0,
            vec![amount_condition(None, Some(100))],
            vec![role_action(MemberRole::Manager)],
        )]))
        .unwrap_err();
        assert!(fields(&errors).contains(&"steps[0].step_number"));
    }

    #[test]
    fn test_step_needs_conditions_and_actions() {
        let errors = validate_workflow(draft(vec![step(1, vec![], vec![])])).unwrap_err();
        let fields = fields(&errors);
        assert!(fields.contains(&"steps[0].conditions"));
        assert!(fields.contains(&"steps[0].actions"));
    }

    #[test]
    fn test_amount_range_needs_at_least_one_bound() {
        let errors = validate_workflow(draft(vec![step(
            1,
            vec![amount_condition(None, None)],
            vec![role_action(MemberRole::Manager)],
        )]))
        .unwrap_err();
        assert_eq!(
            errors,
            vec![ValidationError::MissingBounds {
                field: "steps[0].conditions[0]".to_string()
            }]
        );
    }

    #[test]
    fn test_amount_range_rejects_negative_and_inverted_bounds() {
        let errors = validate_workflow(draft(vec![step(
            1,
            vec![amount_condition(Some(-5), Some(100))],
            vec![role_action(MemberRole::Manager)],
        )]))
        .unwrap_err();
        assert!(fields(&errors).contains(&"steps[0].conditions[0].min_amount_cents"));

        let errors = validate_workflow(draft(vec![step(
            1,
            vec![amount_condition(Some(1000), Some(100))],
            vec![role_action(MemberRole::Manager)],
        )]))
        .unwrap_err();
        assert!(fields(&errors).contains(&"steps[0].conditions[0].min_amount_cents"));
    }

    #[test]
    fn test_category_condition_requires_valid_reference() {
        let errors = validate_workflow(draft(vec![step(
            1,
            vec![category_condition(None)],
            vec![role_action(MemberRole::Manager)],
        )]))
        .unwrap_err();
        assert!(fields(&errors).contains(&"steps[0].conditions[0].expense_category_id"));

        let errors = validate_workflow(draft(vec![step(
            1,
            vec![category_condition(Some("not-a-uuid"))],
            vec![role_action(MemberRole::Manager)],
        )]))
        .unwrap_err();
        assert!(matches!(errors[0], ValidationError::InvalidFormat { .. }));

        let result = validate_workflow(draft(vec![step(
            1,
            vec![category_condition(Some(CATEGORY_ID))],
            vec![role_action(MemberRole::Manager)],
        )]));
        assert!(result.is_ok());
    }

    #[test]
    fn test_location_condition_requires_reference() {
        let condition = ConditionDraft {
            condition_type: ConditionType::Location,
            min_amount_cents: None,
            max_amount_cents: None,
            expense_category_id: None,
            location_id: None,
        };
        let errors = validate_workflow(draft(vec![step(
            1,
            vec![condition],
            vec![role_action(MemberRole::Manager)],
        )]))
        .unwrap_err();
        assert!(fields(&errors).contains(&"steps[0].conditions[0].location_id"));
    }

    #[test]
    fn test_role_action_requires_role() {
        let action = ActionDraft {
            action_type: ActionType::Role,
            approver_role: None,
            specific_member_id: None,
            approval_mode: None,
        };
        let errors = validate_workflow(draft(vec![step(
            1,
            vec![amount_condition(None, Some(100))],
            vec![action],
        )]))
        .unwrap_err();
        assert!(fields(&errors).contains(&"steps[0].actions[0].approver_role"));
    }

    #[test]
    fn test_member_action_requires_member_reference() {
        let action = ActionDraft {
            action_type: ActionType::SpecificMember,
            approver_role: None,
            specific_member_id: None,
            approval_mode: None,
        };
        let errors = validate_workflow(draft(vec![step(
            1,
            vec![amount_condition(None, Some(100))],
            vec![action],
        )]))
        .unwrap_err();
        assert!(fields(&errors).contains(&"steps[0].actions[0].specific_member_id"));

        let action = ActionDraft {
            action_type: ActionType::SpecificMember,
            approver_role: None,
            specific_member_id: Some(MEMBER_ID.to_string()),
            approval_mode: Some(ApprovalMode::All),
        };
        let result = validate_workflow(draft(vec![step(
            1,
            vec![amount_condition(None, Some(100))],
            vec![action],
        )]));
        assert!(result.is_ok());
    }

    #[test]
    fn test_all_violations_collected_at_once() {
        let mut d = draft(vec![
            step(0, vec![], vec![]),
            step(
                2,
                vec![amount_condition(None, None)],
                vec![role_action(MemberRole::Manager)],
            ),
        ]);
        d.name = "".to_string();

        let errors = validate_workflow(d).unwrap_err();
        let fields = fields(&errors);
        assert!(fields.contains(&"name"));
        assert!(fields.contains(&"steps[0].step_number"));
        assert!(fields.contains(&"steps[0].conditions"));
        assert!(fields.contains(&"steps[0].actions"));
        assert!(fields.contains(&"steps[1].conditions[0]"));
        assert!(errors.len() >= 5);
    }

    #[test]
    fn test_json_draft_round_trip() {
        // The settings UI submits JSON; approval_mode omitted defaults to ANY_ONE.
        let json = format!(
            r#"{{
                "name": "Branch Office Approval",
                "steps": [{{
                    "step_number": 1,
                    "name": "Location check",
                    "all_conditions_must_match": false,
                    "conditions": [
                        {{ "condition_type": "LOCATION", "location_id": "{LOCATION_ID}" }},
                        {{ "condition_type": "AMOUNT_RANGE", "max_amount_cents": 50000 }}
                    ],
                    "actions": [
                        {{ "action_type": "ROLE", "approver_role": "MANAGER" }}
                    ]
                }}]
            }}"#
        );

        let parsed: WorkflowDraft = serde_json::from_str(&json).unwrap();
        let validated = validate_workflow(parsed).unwrap();
        let action = &validated.as_draft().steps[0].actions[0];
        assert_eq!(action.approval_mode, Some(ApprovalMode::AnyOne));
        assert!(!validated.as_draft().is_active);
    }
}
