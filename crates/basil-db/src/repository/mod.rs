//! # Repository Module
//!
//! Database repository implementations for Basil approval workflows.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  API handler / server action                                           │
//! │       │                                                                 │
//! │       │  db.workflows().update(&id, &validated)                        │
//! │       ▼                                                                 │
//! │  WorkflowRepository                                                    │
//! │  ├── create(&self, organization_id, definition)                        │
//! │  ├── update(&self, workflow_id, definition)   ← atomic step replace    │
//! │  ├── delete(&self, workflow_id)               ← active-pointer guard   │
//! │  ├── get(&self, workflow_id)                                           │
//! │  └── list(&self, organization_id)                                      │
//! │       │                                                                 │
//! │       │  SQL, one transaction per mutation                              │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`workflow::WorkflowRepository`] - Workflow definition CRUD
//! - [`organization::OrganizationRepository`] - Organizations and the
//!   active-workflow pointer

pub mod organization;
pub mod workflow;
