// src/backend/storage/metrics.rs
use crate::metrics::EngineMetrics;
use crate::storage::memory::{get_metrics_memory, Memory};
use crate::storage::storable::Cbor;
use crate::utils::log;
use ic_stable_structures::StableCell;
use std::cell::RefCell;

thread_local! {
    static METRICS: RefCell<StableCell<Cbor<EngineMetrics>, Memory>> = RefCell::new(
        StableCell::init(get_metrics_memory(), Cbor(EngineMetrics::default()))
            .expect("Failed to initialize metrics cell")
    );
}

pub fn get_metrics() -> EngineMetrics {
    METRICS.with(|cell| cell.borrow().get().0.clone())
}

/// Metrics are advisory; a failed write is logged and swallowed rather
/// than failing the payment operation that triggered it.
pub fn update_metrics<F>(f: F)
where
    F: FnOnce(&mut EngineMetrics),
{
    METRICS.with(|cell| {
        let mut metrics = cell.borrow().get().0.clone();
        f(&mut metrics);
        if let Err(e) = cell.borrow_mut().set(Cbor(metrics)) {
            log::error(format!("Failed to persist metrics: {:?}", e));
        }
    });
}
