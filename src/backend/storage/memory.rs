// src/backend/storage/memory.rs
use ic_stable_structures::memory_manager::{MemoryId, MemoryManager, VirtualMemory};
use ic_stable_structures::DefaultMemoryImpl;
use std::cell::RefCell;

// Memory IDs for stable structures. Id 0 is reserved.
const ENROLLMENTS_MEM_ID: MemoryId = MemoryId::new(1);
const ENROLLMENT_INDEX_MEM_ID: MemoryId = MemoryId::new(2);
const PLANS_MEM_ID: MemoryId = MemoryId::new(3);
const PLAN_BY_ENROLLMENT_MEM_ID: MemoryId = MemoryId::new(4);
const PAYMENTS_MEM_ID: MemoryId = MemoryId::new(5);
const REGISTRATION_FEES_MEM_ID: MemoryId = MemoryId::new(6);
const TRANSFER_SESSIONS_MEM_ID: MemoryId = MemoryId::new(7);
const COURSE_PRICES_MEM_ID: MemoryId = MemoryId::new(8);
const METRICS_MEM_ID: MemoryId = MemoryId::new(9);
const NOTIFICATIONS_INDEX_MEM_ID: MemoryId = MemoryId::new(10);
const NOTIFICATIONS_DATA_MEM_ID: MemoryId = MemoryId::new(11);
const NOTIFY_CURSOR_MEM_ID: MemoryId = MemoryId::new(12);
// Reserve 13-19 for future structures.
const SETTINGS_MEM_ID: MemoryId = MemoryId::new(20);
const ID_CURSOR_MEM_ID: MemoryId = MemoryId::new(21);

pub type Memory = VirtualMemory<DefaultMemoryImpl>;

thread_local! {
    static MEMORY_MANAGER: RefCell<MemoryManager<DefaultMemoryImpl>> = RefCell::new(
        MemoryManager::init(DefaultMemoryImpl::default())
    );
}

/// Get memory instance for a specific MemoryId.
pub fn get_memory(id: MemoryId) -> Memory {
    MEMORY_MANAGER.with(|m| m.borrow().get(id))
}

pub fn get_enrollments_memory() -> Memory {
    get_memory(ENROLLMENTS_MEM_ID)
}

pub fn get_enrollment_index_memory() -> Memory {
    get_memory(ENROLLMENT_INDEX_MEM_ID)
}

pub fn get_plans_memory() -> Memory {
    get_memory(PLANS_MEM_ID)
}

pub fn get_plan_by_enrollment_memory() -> Memory {
    get_memory(PLAN_BY_ENROLLMENT_MEM_ID)
}

pub fn get_payments_memory() -> Memory {
    get_memory(PAYMENTS_MEM_ID)
}

pub fn get_registration_fees_memory() -> Memory {
    get_memory(REGISTRATION_FEES_MEM_ID)
}

pub fn get_transfer_sessions_memory() -> Memory {
    get_memory(TRANSFER_SESSIONS_MEM_ID)
}

pub fn get_course_prices_memory() -> Memory {
    get_memory(COURSE_PRICES_MEM_ID)
}

pub fn get_metrics_memory() -> Memory {
    get_memory(METRICS_MEM_ID)
}

pub fn get_notifications_index_memory() -> Memory {
    get_memory(NOTIFICATIONS_INDEX_MEM_ID)
}

pub fn get_notifications_data_memory() -> Memory {
    get_memory(NOTIFICATIONS_DATA_MEM_ID)
}

pub fn get_notify_cursor_memory() -> Memory {
    get_memory(NOTIFY_CURSOR_MEM_ID)
}

pub fn get_settings_memory() -> Memory {
    get_memory(SETTINGS_MEM_ID)
}

pub fn get_id_cursor_memory() -> Memory {
    get_memory(ID_CURSOR_MEM_ID)
}
