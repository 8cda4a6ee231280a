//! # basil-core: Pure Business Logic for Basil Approval Workflows
//!
//! Every decision the expense-approval subsystem makes (is this definition
//! well-formed, which steps apply to this transaction, who has to approve)
//! is computed in this crate, as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Basil Architecture                               │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Web Application (out of scope)                  │   │
//! │  │    Workflow settings UI ──► Expense submission ──► Approvals    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ basil-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │ validation│  │ evaluate  │  │ directory │  │   │
//! │  │   │ Workflow  │  │  schema   │  │ rule walk │  │  approver │  │   │
//! │  │   │   Step    │  │  checks   │  │ matching  │  │ expansion │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    basil-db (Database Layer)                    │   │
//! │  │          SQLite queries, migrations, repositories               │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Workflow, Step, Condition, Action, etc.)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`error`] - Validation error types
//! - [`validation`] - Workflow definition validation
//! - [`evaluate`] - Rule evaluation against a transaction context
//! - [`directory`] - Membership-directory contract for approver expansion
//!
//! ## Design Principles
//!
//! 1. **Deterministic**: evaluating the same `(workflow, context)` twice
//!    yields identical output; there is no hidden state anywhere
//! 2. **No I/O**: database, network, and filesystem access are forbidden
//!    here, which is what makes the engine exhaustively testable
//! 3. **Integer money**: amounts and tier bounds are i64 cents, so tier
//!    boundaries are exact comparisons
//! 4. **Typed failures**: validation returns an error list, evaluation
//!    cannot fail at all; nothing panics

// =============================================================================
// Module Declarations
// =============================================================================

pub mod directory;
pub mod error;
pub mod evaluate;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use basil_core::Money` instead of
// `use basil_core::money::Money`

pub use error::ValidationError;
pub use money::Money;
pub use types::*;
pub use validation::{validate_workflow, ValidatedWorkflow};

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum length of a workflow or step name.
pub const MAX_NAME_LEN: usize = 200;

/// Maximum steps allowed in a single workflow.
///
/// ## Business Reason
/// Approval chains beyond a few tiers are an administrative mistake, not a
/// real policy. Keeps the settings UI and evaluation output bounded.
pub const MAX_STEPS_PER_WORKFLOW: usize = 50;

/// Maximum conditions or actions allowed on a single step.
pub const MAX_RULES_PER_STEP: usize = 20;
