//! # Seed Data Generator
//!
//! Populates the database with a demo organization and approval workflows
//! for development.
//!
//! ## Usage
//! ```bash
//! cargo run -p basil-db --bin seed
//!
//! # Specify database path
//! cargo run -p basil-db --bin seed -- --db ./data/basil.db
//! ```
//!
//! ## Generated Data
//! - Organization "Demo Restaurant Group"
//! - Workflow "Low Value Expense Approval": one step, expenses up to $100
//!   need any one MANAGER
//! - Workflow "Tiered Expense Approval" (set as the organization's active
//!   workflow):
//!   - up to $100          → any one MANAGER
//!   - over $100 to $1000  → any one ADMIN
//!   - over $1000          → OWNER and ADMIN, everyone must approve

use std::env;

use basil_core::money::Money;
use basil_core::types::{ActionDraft, ActionType, ApprovalMode, ConditionDraft, ConditionType,
    MemberRole, StepDraft, WorkflowDraft};
use basil_core::validation::{validate_workflow, ValidatedWorkflow};
use basil_db::{Database, DbConfig};

fn amount_condition(min_cents: Option<i64>, max_cents: Option<i64>) -> ConditionDraft {
    ConditionDraft {
        condition_type: ConditionType::AmountRange,
        min_amount_cents: min_cents,
        max_amount_cents: max_cents,
        expense_category_id: None,
        location_id: None,
    }
}

fn role_action(role: MemberRole, mode: Option<ApprovalMode>) -> ActionDraft {
    ActionDraft {
        action_type: ActionType::Role,
        approver_role: Some(role),
        specific_member_id: None,
        approval_mode: mode,
    }
}

fn tier(
    number: i64,
    name: &str,
    min_cents: Option<i64>,
    max_cents: Option<i64>,
    actions: Vec<ActionDraft>,
) -> StepDraft {
    StepDraft {
        step_number: number,
        name: name.to_string(),
        description: None,
        all_conditions_must_match: true,
        conditions: vec![amount_condition(min_cents, max_cents)],
        actions,
    }
}

fn low_value_workflow() -> ValidatedWorkflow {
    let draft = WorkflowDraft {
        name: "Low Value Expense Approval".to_string(),
        description: Some("Single manager sign-off for small expenses".to_string()),
        is_active: true,
        steps: vec![tier(
            1,
            "Manager approval",
            None,
            Some(10_000),
            vec![role_action(MemberRole::Manager, None)],
        )],
    };
    validate_workflow(draft).expect("seed definition must validate")
}

fn tiered_workflow() -> ValidatedWorkflow {
    let draft = WorkflowDraft {
        name: "Tiered Expense Approval".to_string(),
        description: Some("Escalating sign-off by expense amount".to_string()),
        is_active: true,
        steps: vec![
            tier(
                1,
                "Up to $100",
                None,
                Some(10_000),
                vec![role_action(MemberRole::Manager, None)],
            ),
            tier(
                2,
                "Over $100 to $1000",
                Some(10_000),
                Some(100_000),
                vec![role_action(MemberRole::Admin, None)],
            ),
            tier(
                3,
                "Over $1000",
                Some(100_000),
                None,
                vec![
                    role_action(MemberRole::Owner, Some(ApprovalMode::All)),
                    role_action(MemberRole::Admin, Some(ApprovalMode::All)),
                ],
            ),
        ],
    };
    validate_workflow(draft).expect("seed definition must validate")
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./basil_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Basil Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./basil_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Basil Seed Data Generator");
    println!("============================");
    println!("Database: {}", db_path);
    println!();

    // Connect to database
    let config = DbConfig::new(&db_path);
    let db = Database::new(config).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    // Check existing data
    let existing = db.organizations().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} organization(s)", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    println!();
    println!("Seeding demo data...");

    let organization = db.organizations().create("Demo Restaurant Group").await?;
    println!("✓ Organization: {} ({})", organization.name, organization.id);

    let low_value = db
        .workflows()
        .create(&organization.id, &low_value_workflow())
        .await?;
    println!(
        "✓ Workflow: {} ({} step)",
        low_value.name,
        low_value.steps.len()
    );

    let tiered = db
        .workflows()
        .create(&organization.id, &tiered_workflow())
        .await?;
    println!("✓ Workflow: {} ({} steps)", tiered.name, tiered.steps.len());
    for step in &tiered.steps {
        let min = step.conditions[0]
            .min_amount()
            .map(|m| m.to_string())
            .unwrap_or_else(|| "-".to_string());
        let max = step.conditions[0]
            .max_amount()
            .map(|m| m.to_string())
            .unwrap_or_else(|| "∞".to_string());
        println!("    step {}: {} ({} to {}]", step.step_number, step.name, min, max);
    }

    db.organizations()
        .set_active_workflow(&organization.id, &tiered.id)
        .await?;
    println!("✓ Active workflow: {}", tiered.name);

    println!();
    println!("Done. Expenses over {} now require every OWNER and ADMIN approval.",
        Money::from_cents(100_000));

    Ok(())
}
