// src/backend/api.rs
// Candid endpoints. Identity (caller) and time are resolved here and
// passed into the services as explicit parameters; the engine itself
// carries no ambient state.
use crate::{
    error::TuitionError,
    metrics::EngineMetrics,
    models::common::{Amount, CourseId, EnrollmentId, EnrollmentStatus, PaymentId, Timestamp},
    models::enrollment::Enrollment,
    models::init::Settings,
    models::ledger::LedgerEntry,
    models::notification::Notification,
    models::registration_fee::RegistrationFee,
    models::transfer_session::BankTransferSession,
    services::{
        access, enrollment_service,
        plan_service::{self, PlanBalance},
        proof_service, registration_service,
        scheduler::{self, MaintenanceReport},
        transfer_service,
    },
    storage,
    utils::guards::{admin_guard, check_cycles, gateway_or_admin_guard},
    utils::rate_limit::rate_guard,
    utils::time,
};
use candid::{CandidType, Principal};
use ic_cdk::caller;
use ic_cdk_macros::{query, update};
use serde::Deserialize;
use validator::Validate;

// --- Helpers ---

fn validate_request<T: Validate>(req: &T) -> Result<(), TuitionError> {
    req.validate()
        .map_err(|e| TuitionError::InvalidInput(e.to_string()))
}

fn ensure_cycles() -> Result<(), TuitionError> {
    check_cycles().map_err(|_| TuitionError::CycleLow)
}

fn caller_is_admin() -> bool {
    caller() == storage::config::get_settings().admin
}

// --- Request/Response Structs ---

#[derive(CandidType, Deserialize, Clone, Debug, Validate)]
pub struct CreateEnrollmentRequest {
    #[validate(range(min = 1))]
    pub course_id: CourseId,
}

#[derive(CandidType, Deserialize, Clone, Debug)]
pub struct SetEnrollmentStatusRequest {
    pub enrollment_id: EnrollmentId,
    pub status: EnrollmentStatus,
}

#[derive(CandidType, Deserialize, Clone, Debug, Validate)]
pub struct SubmitRegistrationFeeRequest {
    #[validate(range(min = 1))]
    pub amount: Amount,
    #[validate(length(min = 1, max = 64))]
    pub bank_reference: String,
    pub deposit_date: Timestamp,
}

#[derive(CandidType, Deserialize, Clone, Debug)]
pub struct ReviewRegistrationFeeRequest {
    pub user: Principal,
    pub approve: bool,
}

#[derive(CandidType, Deserialize, Clone, Debug, Validate)]
pub struct SubmitProofRequest {
    pub enrollment_id: EnrollmentId,
    #[validate(range(min = 1))]
    pub amount: Amount,
    #[validate(length(min = 1, max = 64))]
    pub transaction_ref: String,
    pub payment_date: Timestamp,
    #[validate(length(min = 1, max = 256))]
    pub proof_ref: String,
}

#[derive(CandidType, Deserialize, Clone, Debug)]
pub struct ReviewManualPaymentRequest {
    pub payment_id: PaymentId,
    pub approve: bool,
}

#[derive(CandidType, Deserialize, Clone, Debug)]
pub struct RefundPaymentRequest {
    pub payment_id: PaymentId,
}

#[derive(CandidType, Deserialize, Clone, Debug, Validate)]
pub struct CreateTransferSessionRequest {
    pub enrollment_id: EnrollmentId,
    #[validate(range(min = 1))]
    pub amount: Amount,
}

#[derive(CandidType, Deserialize, Clone, Debug, Validate)]
pub struct GatewayResultRequest {
    #[validate(length(min = 1, max = 64))]
    pub reference: String,
    pub success: bool,
}

#[derive(CandidType, Deserialize, Clone, Debug, Validate)]
pub struct CancelTransferSessionRequest {
    #[validate(length(min = 1, max = 64))]
    pub reference: String,
}

#[derive(CandidType, Deserialize, Clone, Debug)]
pub struct SetCoursePriceRequest {
    pub course_id: CourseId,
    /// Zero is a valid price: free courses are always accessible.
    pub price: Amount,
}

#[derive(CandidType, Deserialize, Clone, Debug, Validate)]
pub struct UpdateSettingsRequest {
    pub admin: Option<Principal>,
    pub gateway_principal: Option<Principal>,
    #[validate(length(min = 1, max = 256))]
    pub gateway_base_url: Option<String>,
    pub registration_fee_required: Option<bool>,
    pub registration_fee_amount: Option<Amount>,
    #[validate(range(min = 0, max = 10_000))]
    pub deposit_fraction_bps: Option<u16>,
    #[validate(range(min = 60))]
    pub transfer_session_ttl_secs: Option<u64>,
}

#[derive(CandidType, Deserialize, Clone, Debug, Validate)]
pub struct ListRequest {
    #[validate(range(min = 0))]
    pub offset: Option<u32>,
    #[validate(range(min = 1, max = 100))]
    pub limit: Option<u32>,
}

#[derive(CandidType, Deserialize, Clone, Debug)]
pub struct ListPaymentsResponse {
    pub entries: Vec<LedgerEntry>,
    pub total: u64,
}

#[derive(CandidType, Deserialize, Clone, Debug)]
pub struct GetMetricsResponse {
    pub metrics: EngineMetrics,
    pub pending_notifications: u64,
    pub cycle_balance: u128,
}

// --- Enrollment Endpoints ---

#[update(guard = "rate_guard")]
fn create_enrollment(req: CreateEnrollmentRequest) -> Result<Enrollment, TuitionError> {
    validate_request(&req)?;
    ensure_cycles()?;
    enrollment_service::create_enrollment(caller(), req.course_id, time::now_ns())
}

#[update]
fn set_enrollment_status(req: SetEnrollmentStatusRequest) -> Result<Enrollment, TuitionError> {
    ensure_cycles()?;
    enrollment_service::set_enrollment_status(
        req.enrollment_id,
        req.status,
        caller(),
        caller_is_admin(),
        time::now_ns(),
    )
}

// --- Registration Fee Endpoints ---

#[update(guard = "rate_guard")]
fn submit_registration_fee(
    req: SubmitRegistrationFeeRequest,
) -> Result<RegistrationFee, TuitionError> {
    validate_request(&req)?;
    ensure_cycles()?;
    registration_service::submit(
        caller(),
        req.amount,
        req.bank_reference,
        req.deposit_date,
        time::now_ns(),
    )
}

#[query]
fn get_registration_fee() -> Option<RegistrationFee> {
    registration_service::get_fee(&caller())
}

#[update(guard = "admin_guard")]
fn review_registration_fee(
    req: ReviewRegistrationFeeRequest,
) -> Result<RegistrationFee, TuitionError> {
    ensure_cycles()?;
    registration_service::review(req.user, req.approve, time::now_ns())
}

// --- Manual Proof Endpoints ---

#[update(guard = "rate_guard")]
fn submit_payment_proof(req: SubmitProofRequest) -> Result<PaymentId, TuitionError> {
    validate_request(&req)?;
    ensure_cycles()?;
    proof_service::submit_proof(
        caller(),
        req.enrollment_id,
        req.amount,
        req.transaction_ref,
        req.payment_date,
        req.proof_ref,
        time::now_ns(),
    )
}

#[update(guard = "admin_guard")]
fn review_manual_payment(req: ReviewManualPaymentRequest) -> Result<LedgerEntry, TuitionError> {
    ensure_cycles()?;
    proof_service::review_manual_payment(req.payment_id, req.approve, time::now_ns())
}

#[update(guard = "admin_guard")]
fn refund_payment(req: RefundPaymentRequest) -> Result<LedgerEntry, TuitionError> {
    ensure_cycles()?;
    proof_service::mark_refunded(req.payment_id, time::now_ns())
}

// --- Bank-Transfer Session Endpoints ---

#[update(guard = "rate_guard")]
async fn create_transfer_session(
    req: CreateTransferSessionRequest,
) -> Result<BankTransferSession, TuitionError> {
    validate_request(&req)?;
    ensure_cycles()?;
    transfer_service::create_session(caller(), req.enrollment_id, req.amount, time::now_ns()).await
}

/// An update call, not a query: the lazy Pending -> Expired transition on
/// the read path must persist.
#[update]
fn get_transfer_session_status(reference: String) -> Result<BankTransferSession, TuitionError> {
    transfer_service::get_status(&reference, time::now_ns())
}

#[update(guard = "rate_guard")]
async fn poll_transfer_session(reference: String) -> Result<BankTransferSession, TuitionError> {
    ensure_cycles()?;
    transfer_service::poll_session(&reference, time::now_ns()).await
}

#[update(guard = "gateway_or_admin_guard")]
fn report_gateway_result(req: GatewayResultRequest) -> Result<BankTransferSession, TuitionError> {
    validate_request(&req)?;
    transfer_service::report_gateway_result(&req.reference, req.success, time::now_ns())
}

#[update(guard = "rate_guard")]
fn cancel_transfer_session(
    req: CancelTransferSessionRequest,
) -> Result<BankTransferSession, TuitionError> {
    validate_request(&req)?;
    transfer_service::cancel(&req.reference, caller(), time::now_ns())
}

// --- Balance & Access Read Surface ---

#[query]
fn get_plan_balance(enrollment_id: EnrollmentId) -> Result<PlanBalance, TuitionError> {
    plan_service::get_plan_balance(enrollment_id)
}

#[query]
fn can_access_content(enrollment_id: EnrollmentId) -> Result<bool, TuitionError> {
    access::can_access_enrollment(enrollment_id)
}

#[query]
fn get_payment_history() -> Vec<LedgerEntry> {
    enrollment_service::get_payment_history(caller())
}

// --- Admin & Maintenance Endpoints ---

#[update(guard = "admin_guard")]
fn set_course_price(req: SetCoursePriceRequest) -> Result<(), TuitionError> {
    storage::courses::set_course_price(req.course_id, req.price);
    Ok(())
}

#[update(guard = "admin_guard")]
fn update_settings(req: UpdateSettingsRequest) -> Result<Settings, TuitionError> {
    validate_request(&req)?;
    let mut settings = storage::config::get_settings();
    if let Some(admin) = req.admin {
        settings.admin = admin;
    }
    if req.gateway_principal.is_some() {
        settings.gateway_principal = req.gateway_principal;
    }
    if let Some(url) = req.gateway_base_url {
        settings.gateway_base_url = url;
    }
    if let Some(required) = req.registration_fee_required {
        settings.registration_fee_required = required;
    }
    if let Some(amount) = req.registration_fee_amount {
        settings.registration_fee_amount = amount;
    }
    if let Some(bps) = req.deposit_fraction_bps {
        settings.deposit_fraction_bps = bps;
    }
    if let Some(ttl) = req.transfer_session_ttl_secs {
        settings.transfer_session_ttl_secs = ttl;
    }
    storage::config::set_settings(settings.clone());
    Ok(settings)
}

#[query(guard = "admin_guard")]
fn get_settings() -> Settings {
    storage::config::get_settings()
}

#[update(guard = "admin_guard")]
fn run_maintenance() -> Result<MaintenanceReport, TuitionError> {
    ensure_cycles()?;
    Ok(scheduler::run_maintenance(time::now_ns()))
}

#[update(guard = "admin_guard")]
fn drain_notifications(limit: Option<u32>) -> Result<Vec<Notification>, TuitionError> {
    storage::notifications::drain_notifications(limit.unwrap_or(50).min(200) as usize)
}

#[query(guard = "admin_guard")]
fn list_payments(req: ListRequest) -> Result<ListPaymentsResponse, TuitionError> {
    validate_request(&req)?;
    let offset = req.offset.unwrap_or(0) as u64;
    let limit = req.limit.unwrap_or(10) as usize;
    let (entries, total) = storage::ledger::list_entries(offset, limit);
    Ok(ListPaymentsResponse { entries, total })
}

#[query(guard = "admin_guard")]
fn get_metrics() -> GetMetricsResponse {
    GetMetricsResponse {
        metrics: storage::metrics::get_metrics(),
        pending_notifications: storage::notifications::pending_notification_count(),
        cycle_balance: ic_cdk::api::canister_balance128(),
    }
}
