// src/backend/services/scheduler.rs
// Periodic maintenance. Lazy expiry on the read path remains the
// correctness guarantee; this tick only adds liveness so sessions nobody
// polls still end up Expired in listings.
use crate::metrics;
use crate::models::common::Timestamp;
use crate::services::transfer_service;
use crate::utils::{log, rate_limit};
use candid::CandidType;
use serde::Deserialize;

/// Interval of the timer registered at canister init.
pub const MAINTENANCE_INTERVAL_SECS: u64 = 10 * 60;

#[derive(CandidType, Deserialize, Clone, Debug)]
pub struct MaintenanceReport {
    pub sessions_expired: u32,
}

pub fn run_maintenance(now: Timestamp) -> MaintenanceReport {
    let sessions_expired = transfer_service::sweep_expired(now);
    rate_limit::prune_submission_windows(now);
    metrics::record_scheduler_run(now);
    log::info(format!(
        "SCHEDULER: maintenance tick expired {} transfer sessions",
        sessions_expired
    ));
    MaintenanceReport { sessions_expired }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::gateway_adapter::VirtualAccount;
    use crate::models::common::NANOS_PER_SEC;
    use crate::services::testutil::{learner, seed_enrollment, T0};
    use crate::services::transfer_service::open_session;
    use crate::storage;
    use crate::utils::reference;

    #[test]
    fn maintenance_reports_swept_sessions_and_stamps_metrics() {
        let (enrollment_id, _) = seed_enrollment(learner(1), 10, 1_000_00);
        let sequence = storage::cursor::next_id().unwrap();
        let session_reference = reference::session_reference(sequence, enrollment_id, T0);
        open_session(
            enrollment_id,
            500_00,
            session_reference,
            VirtualAccount {
                account_number: String::from("8808000011112222"),
                bank_name: String::from("BCA"),
            },
            T0,
            60 * NANOS_PER_SEC,
        )
        .unwrap();

        let report = run_maintenance(T0 + 120 * NANOS_PER_SEC);
        assert_eq!(report.sessions_expired, 1);
        let metrics = storage::metrics::get_metrics();
        assert_eq!(metrics.transfer_sessions_expired, 1);
        assert_eq!(metrics.scheduler_last_run, Some(T0 + 120 * NANOS_PER_SEC));
    }
}
