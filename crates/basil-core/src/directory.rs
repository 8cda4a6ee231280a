//! # Membership Directory Contract
//!
//! The evaluation engine emits abstract approver references (`ROLE: MANAGER`,
//! `MEMBER: <id>`). Turning a role into concrete member identities requires
//! the organization's membership directory, which lives outside this crate
//! (it is a database/identity concern). This module defines the contract the
//! directory must satisfy and the expansion step callers run after
//! evaluation.
//!
//! Keeping resolution out of [`crate::evaluate`] keeps the engine pure: it
//! can be tested exhaustively without any membership data, and a directory
//! implementation can be as clever as it needs to be (e.g. resolving the
//! manager *of the transaction's location*, which is why the context is part
//! of the contract).

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::types::{ApprovalMode, ApproverRef, MemberRole, StepMatch, TransactionContext};

// =============================================================================
// Contract
// =============================================================================

/// Resolves abstract role references into concrete organization members.
///
/// Implemented by the platform's membership service; tests use an in-memory
/// double.
pub trait MembershipDirectory {
    /// Returns the ids of members eligible to approve on behalf of `role`.
    ///
    /// The transaction context is provided so implementations can narrow the
    /// set, e.g. to the manager of the context's location.
    fn resolve_approvers_for_role(
        &self,
        organization_id: &str,
        role: MemberRole,
        context: &TransactionContext,
    ) -> Vec<String>;
}

// =============================================================================
// Resolved Output
// =============================================================================

/// One approval requirement with its approver set fully expanded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedApproval {
    /// Concrete members eligible to approve. Empty when the directory knows
    /// nobody holding the required role; the caller must treat that step as
    /// unconfigured rather than approved.
    pub member_ids: Vec<String>,
    pub mode: ApprovalMode,
}

/// One applying step with all requirements expanded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedStepApprovers {
    pub step_number: i64,
    pub approvals: Vec<ResolvedApproval>,
}

// =============================================================================
// Expansion
// =============================================================================

/// Expands evaluation output into concrete approver sets.
///
/// `ROLE` requirements go through the directory; `SPECIFIC_MEMBER`
/// requirements pass through as a single-member set. Step order and approval
/// modes are preserved.
pub fn resolve_approvers(
    matches: &[StepMatch],
    directory: &dyn MembershipDirectory,
    organization_id: &str,
    context: &TransactionContext,
) -> Vec<ResolvedStepApprovers> {
    matches
        .iter()
        .map(|matched| ResolvedStepApprovers {
            step_number: matched.step_number,
            approvals: matched
                .requirements
                .iter()
                .map(|requirement| {
                    let member_ids = match &requirement.approver {
                        ApproverRef::Role { role } => {
                            let members = directory.resolve_approvers_for_role(
                                organization_id,
                                *role,
                                context,
                            );
                            if members.is_empty() {
                                warn!(
                                    step_number = matched.step_number,
                                    role = ?role,
                                    "no members hold the required approver role"
                                );
                            }
                            members
                        }
                        ApproverRef::Member { member_id } => vec![member_id.clone()],
                    };
                    ResolvedApproval {
                        member_ids,
                        mode: requirement.mode,
                    }
                })
                .collect(),
        })
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ApprovalRequirement;
    use std::collections::HashMap;

    /// In-memory directory: role -> members, with an optional location-bound
    /// manager override.
    struct StaticDirectory {
        by_role: HashMap<MemberRole, Vec<String>>,
        manager_by_location: HashMap<String, String>,
    }

    impl MembershipDirectory for StaticDirectory {
        fn resolve_approvers_for_role(
            &self,
            _organization_id: &str,
            role: MemberRole,
            context: &TransactionContext,
        ) -> Vec<String> {
            if role == MemberRole::Manager {
                if let Some(location_id) = &context.location_id {
                    if let Some(manager) = self.manager_by_location.get(location_id) {
                        return vec![manager.clone()];
                    }
                }
            }
            self.by_role.get(&role).cloned().unwrap_or_default()
        }
    }

    fn role_match(step_number: i64, role: MemberRole, mode: ApprovalMode) -> StepMatch {
        StepMatch {
            step_number,
            requirements: vec![ApprovalRequirement {
                approver: ApproverRef::Role { role },
                mode,
            }],
        }
    }

    #[test]
    fn test_role_expansion() {
        let directory = StaticDirectory {
            by_role: HashMap::from([(
                MemberRole::Admin,
                vec!["admin-1".to_string(), "admin-2".to_string()],
            )]),
            manager_by_location: HashMap::new(),
        };

        let matches = vec![role_match(1, MemberRole::Admin, ApprovalMode::All)];
        let resolved = resolve_approvers(
            &matches,
            &directory,
            "org",
            &TransactionContext::for_amount(1_000, "m"),
        );

        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].step_number, 1);
        assert_eq!(
            resolved[0].approvals,
            vec![ResolvedApproval {
                member_ids: vec!["admin-1".to_string(), "admin-2".to_string()],
                mode: ApprovalMode::All,
            }]
        );
    }

    #[test]
    fn test_location_aware_manager_resolution() {
        let directory = StaticDirectory {
            by_role: HashMap::from([(MemberRole::Manager, vec!["hq-manager".to_string()])]),
            manager_by_location: HashMap::from([(
                "loc-downtown".to_string(),
                "downtown-manager".to_string(),
            )]),
        };

        let matches = vec![role_match(1, MemberRole::Manager, ApprovalMode::AnyOne)];

        let mut context = TransactionContext::for_amount(1_000, "m");
        context.location_id = Some("loc-downtown".to_string());
        let resolved = resolve_approvers(&matches, &directory, "org", &context);
        assert_eq!(resolved[0].approvals[0].member_ids, vec!["downtown-manager"]);

        let context = TransactionContext::for_amount(1_000, "m");
        let resolved = resolve_approvers(&matches, &directory, "org", &context);
        assert_eq!(resolved[0].approvals[0].member_ids, vec!["hq-manager"]);
    }

    #[test]
    fn test_specific_member_passes_through() {
        let directory = StaticDirectory {
            by_role: HashMap::new(),
            manager_by_location: HashMap::new(),
        };

        let matches = vec![StepMatch {
            step_number: 3,
            requirements: vec![ApprovalRequirement {
                approver: ApproverRef::Member {
                    member_id: "cfo".to_string(),
                },
                mode: ApprovalMode::AnyOne,
            }],
        }];

        let resolved = resolve_approvers(
            &matches,
            &directory,
            "org",
            &TransactionContext::for_amount(1_000, "m"),
        );
        assert_eq!(resolved[0].approvals[0].member_ids, vec!["cfo"]);
    }

    #[test]
    fn test_unknown_role_yields_empty_set() {
        let directory = StaticDirectory {
            by_role: HashMap::new(),
            manager_by_location: HashMap::new(),
        };

        let matches = vec![role_match(1, MemberRole::Owner, ApprovalMode::AnyOne)];
        let resolved = resolve_approvers(
            &matches,
            &directory,
            "org",
            &TransactionContext::for_amount(1_000, "m"),
        );
        assert!(resolved[0].approvals[0].member_ids.is_empty());
    }
}
