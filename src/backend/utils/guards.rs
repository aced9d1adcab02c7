// src/backend/utils/guards.rs
// Candid guard functions. These resolve the caller from the canister
// environment, so they live at the API boundary; services receive the
// already-resolved principal as an explicit parameter.
use crate::storage::config::get_settings;

const MIN_CYCLES_THRESHOLD: u128 = 10_000_000_000;

/// Refuses work when the canister is about to run out of cycles.
pub fn check_cycles() -> Result<(), String> {
    let balance = ic_cdk::api::canister_balance128();
    if balance < MIN_CYCLES_THRESHOLD {
        ic_cdk::println!(
            "Cycle balance low: {} cycles, threshold: {}",
            balance,
            MIN_CYCLES_THRESHOLD
        );
        Err(String::from("Canister cycle balance too low for operation"))
    } else {
        Ok(())
    }
}

/// Caller must be the configured admin principal.
pub fn admin_guard() -> Result<(), String> {
    let caller = ic_cdk::caller();
    if caller == get_settings().admin {
        Ok(())
    } else {
        Err(String::from("Caller is not the configured admin"))
    }
}

/// Caller must be the configured gateway webhook principal or the admin.
pub fn gateway_or_admin_guard() -> Result<(), String> {
    let caller = ic_cdk::caller();
    let settings = get_settings();
    if caller == settings.admin || settings.gateway_principal == Some(caller) {
        Ok(())
    } else {
        Err(String::from(
            "Caller is not the authorized gateway or an admin",
        ))
    }
}
