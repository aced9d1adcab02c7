// src/backend/storage/registration_fees.rs
use crate::error::TuitionError;
use crate::models::common::UserId;
use crate::models::registration_fee::RegistrationFee;
use crate::storage::memory::{get_registration_fees_memory, Memory};
use crate::storage::storable::Cbor;
use ic_stable_structures::StableBTreeMap;
use std::cell::RefCell;

type StorableRegistrationFee = Cbor<RegistrationFee>;

thread_local! {
    /// Keyed by user principal text: one effective fee record per user.
    static REGISTRATION_FEES: RefCell<StableBTreeMap<String, StorableRegistrationFee, Memory>> = RefCell::new(
        StableBTreeMap::init(get_registration_fees_memory())
    );
}

pub fn get_fee(user_id: &UserId) -> Option<RegistrationFee> {
    REGISTRATION_FEES.with(|map| map.borrow().get(&user_id.to_text()).map(|cbor| cbor.0))
}

/// Inserts or replaces the user's fee record.
pub fn put_fee(fee: RegistrationFee) {
    REGISTRATION_FEES.with(|map| {
        map.borrow_mut().insert(fee.user_id.to_text(), Cbor(fee));
    });
}

pub fn with_fee_mut<F, R>(user_id: &UserId, f: F) -> Result<R, TuitionError>
where
    F: FnOnce(&mut RegistrationFee) -> Result<R, TuitionError>,
{
    REGISTRATION_FEES.with(|map| {
        let mut map = map.borrow_mut();
        let key = user_id.to_text();
        let mut fee = map
            .get(&key)
            .map(|cbor| cbor.0)
            .ok_or_else(|| TuitionError::NotFound(format!("registration fee for {}", user_id)))?;
        let result = f(&mut fee)?;
        map.insert(key, Cbor(fee));
        Ok(result)
    })
}
