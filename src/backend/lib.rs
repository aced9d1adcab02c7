// src/backend/lib.rs

pub mod adapter;
pub mod api;
pub mod error;
pub mod metrics;
pub mod models;
pub mod services;
pub mod storage;
pub mod utils;

use crate::models::init::InitArgs;
use std::time::Duration;

// Bring the Candid endpoint types into scope for `export_candid!()`, which
// expands here and references them by their unqualified names.
use crate::api::*;
use crate::error::TuitionError;
use crate::models::common::{EnrollmentId, PaymentId};
use crate::models::enrollment::Enrollment;
use crate::models::init::Settings;
use crate::models::ledger::LedgerEntry;
use crate::models::notification::Notification;
use crate::models::registration_fee::RegistrationFee;
use crate::models::transfer_session::BankTransferSession;
use crate::services::plan_service::PlanBalance;
use crate::services::scheduler::MaintenanceReport;

#[ic_cdk::init]
fn init(args: Option<InitArgs>) {
    if let Some(args) = args {
        storage::config::init_settings(args);
    }
    start_maintenance_timer();
    ic_cdk::println!("Tuition reconciliation canister initialized.");
}

#[ic_cdk::post_upgrade]
fn post_upgrade(args: Option<InitArgs>) {
    if let Some(args) = args {
        storage::config::init_settings(args);
    }
    // Interval timers do not survive upgrades; re-register.
    start_maintenance_timer();
    ic_cdk::println!("Tuition reconciliation canister upgraded.");
}

fn start_maintenance_timer() {
    let _timer = ic_cdk_timers::set_timer_interval(
        Duration::from_secs(services::scheduler::MAINTENANCE_INTERVAL_SECS),
        || {
            services::scheduler::run_maintenance(ic_cdk::api::time());
        },
    );
}

// Export Candid interface
ic_cdk::export_candid!();
