// src/backend/storage/sessions.rs
use crate::error::TuitionError;
use crate::models::common::{SessionReference, Timestamp};
use crate::models::transfer_session::BankTransferSession;
use crate::storage::memory::{get_transfer_sessions_memory, Memory};
use crate::storage::storable::Cbor;
use ic_stable_structures::StableBTreeMap;
use std::cell::RefCell;

type StorableSession = Cbor<BankTransferSession>;

thread_local! {
    static TRANSFER_SESSIONS: RefCell<StableBTreeMap<SessionReference, StorableSession, Memory>> = RefCell::new(
        StableBTreeMap::init(get_transfer_sessions_memory())
    );
}

pub fn insert_session(session: BankTransferSession) -> Result<(), TuitionError> {
    TRANSFER_SESSIONS.with(|map| {
        let mut map = map.borrow_mut();
        if map.contains_key(&session.reference) {
            // References are sequence-derived; a collision means the id
            // cursor went backwards.
            return Err(TuitionError::InternalError(format!(
                "transfer session reference {} already exists",
                session.reference
            )));
        }
        map.insert(session.reference.clone(), Cbor(session));
        Ok(())
    })
}

pub fn get_session(reference: &str) -> Option<BankTransferSession> {
    TRANSFER_SESSIONS.with(|map| map.borrow().get(&reference.to_string()).map(|cbor| cbor.0))
}

pub fn with_session_mut<F, R>(reference: &str, f: F) -> Result<R, TuitionError>
where
    F: FnOnce(&mut BankTransferSession) -> Result<R, TuitionError>,
{
    TRANSFER_SESSIONS.with(|map| {
        let mut map = map.borrow_mut();
        let key = reference.to_string();
        let mut session = map
            .get(&key)
            .map(|cbor| cbor.0)
            .ok_or_else(|| TuitionError::NotFound(format!("transfer session {}", reference)))?;
        let result = f(&mut session)?;
        map.insert(key, Cbor(session));
        Ok(result)
    })
}

/// References of sessions past their TTL and still Pending. Used by the
/// maintenance sweep; the sweep re-checks state under `with_session_mut`.
pub fn expired_references(now: Timestamp) -> Vec<SessionReference> {
    TRANSFER_SESSIONS.with(|map| {
        map.borrow()
            .iter()
            .filter(|(_, cbor)| cbor.0.is_expired(now))
            .map(|(reference, _)| reference)
            .collect()
    })
}
