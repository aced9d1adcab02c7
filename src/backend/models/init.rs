// src/backend/models/init.rs
use crate::models::common::{Amount, NANOS_PER_SEC};
use candid::{CandidType, Principal};
use serde::{Deserialize, Serialize};

/// Minimum paid fraction of the total fee that unlocks content access,
/// in basis points (3000 = 30%). Institution-wide, not per course.
pub const DEFAULT_DEPOSIT_FRACTION_BPS: u16 = 3_000;

/// Time-to-live of a bank-transfer session.
pub const DEFAULT_SESSION_TTL_SECS: u64 = 2 * 60 * 60;

/// Canister installation/upgrade arguments. Absent optional fields keep
/// their defaults (or, on upgrade, the previously stored value).
#[derive(CandidType, Deserialize, Serialize, Clone, Debug)]
pub struct InitArgs {
    pub admin: Principal,
    /// Principal allowed to push gateway webhook results, if any.
    pub gateway_principal: Option<Principal>,
    pub gateway_base_url: Option<String>,
    pub registration_fee_required: bool,
    pub registration_fee_amount: Amount,
    pub deposit_fraction_bps: Option<u16>,
    pub transfer_session_ttl_secs: Option<u64>,
}

/// Engine configuration, persisted in a stable cell.
#[derive(CandidType, Deserialize, Serialize, Clone, Debug)]
pub struct Settings {
    pub admin: Principal,
    pub gateway_principal: Option<Principal>,
    pub gateway_base_url: String,
    pub currency: String,
    pub registration_fee_required: bool,
    pub registration_fee_amount: Amount,
    pub deposit_fraction_bps: u16,
    pub transfer_session_ttl_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            admin: Principal::management_canister(),
            gateway_principal: None,
            gateway_base_url: String::from("https://gateway.invalid"),
            currency: String::from("IDR"),
            registration_fee_required: false,
            registration_fee_amount: 0,
            deposit_fraction_bps: DEFAULT_DEPOSIT_FRACTION_BPS,
            transfer_session_ttl_secs: DEFAULT_SESSION_TTL_SECS,
        }
    }
}

impl Settings {
    pub fn apply(&mut self, args: InitArgs) {
        self.admin = args.admin;
        self.gateway_principal = args.gateway_principal;
        if let Some(url) = args.gateway_base_url {
            self.gateway_base_url = url;
        }
        self.registration_fee_required = args.registration_fee_required;
        self.registration_fee_amount = args.registration_fee_amount;
        if let Some(bps) = args.deposit_fraction_bps {
            self.deposit_fraction_bps = bps;
        }
        if let Some(ttl) = args.transfer_session_ttl_secs {
            self.transfer_session_ttl_secs = ttl;
        }
    }

    pub fn session_ttl_ns(&self) -> u64 {
        self.transfer_session_ttl_secs.saturating_mul(NANOS_PER_SEC)
    }
}
