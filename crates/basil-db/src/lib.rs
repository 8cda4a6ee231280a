//! # basil-db: Database Layer for Basil Approval Workflows
//!
//! SQLite persistence for workflow definitions and the per-organization
//! active-workflow pointer, via sqlx. Repositories accept only definitions
//! already validated by basil-core and own all transaction boundaries.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Basil Data Flow                                  │
//! │                                                                         │
//! │  API handler (save workflow / activate workflow)                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     basil-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────┐   ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories  │   │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │ (workflow.rs,  │   │  (embedded)  │  │   │
//! │  │   │               │◄───│  organization) │   │ 001_init.sql │  │   │
//! │  │   └───────────────┘    └────────────────┘   └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations (workflow, organization)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use basil_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("path/to/basil.db")).await?;
//!
//! let workflow = db.workflows().create(&org_id, &validated).await?;
//! db.organizations().set_active_workflow(&org_id, &workflow.id).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::organization::OrganizationRepository;
pub use repository::workflow::WorkflowRepository;
