// src/backend/storage/config.rs
use crate::models::init::{InitArgs, Settings};
use crate::storage::memory::{get_settings_memory, Memory};
use crate::storage::storable::Cbor;
use ic_stable_structures::StableCell;
use std::cell::RefCell;

thread_local! {
    static SETTINGS: RefCell<StableCell<Cbor<Settings>, Memory>> = RefCell::new(
        StableCell::init(get_settings_memory(), Cbor(Settings::default()))
            .expect("Failed to initialize settings cell")
    );
}

/// Apply installation/upgrade arguments on top of the stored settings.
/// Called from canister init and post_upgrade only.
pub fn init_settings(args: InitArgs) {
    SETTINGS.with(|cell| {
        let mut settings = cell.borrow().get().0.clone();
        settings.apply(args);
        cell.borrow_mut()
            .set(Cbor(settings))
            .expect("Failed to persist settings");
    });
}

pub fn get_settings() -> Settings {
    SETTINGS.with(|cell| cell.borrow().get().0.clone())
}

pub fn set_settings(settings: Settings) {
    SETTINGS.with(|cell| {
        cell.borrow_mut()
            .set(Cbor(settings))
            .expect("Failed to persist settings");
    });
}
