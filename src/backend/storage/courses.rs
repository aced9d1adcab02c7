// src/backend/storage/courses.rs
use crate::models::common::{Amount, CourseId};
use crate::storage::memory::{get_course_prices_memory, Memory};
use ic_stable_structures::StableBTreeMap;
use std::cell::RefCell;

thread_local! {
    /// Admin-seeded course price table. The catalog itself lives outside
    /// this canister; only the tuition price is needed for the fee
    /// snapshot at enrollment time.
    static COURSE_PRICES: RefCell<StableBTreeMap<CourseId, Amount, Memory>> = RefCell::new(
        StableBTreeMap::init(get_course_prices_memory())
    );
}

pub fn set_course_price(course_id: CourseId, price: Amount) {
    COURSE_PRICES.with(|map| {
        map.borrow_mut().insert(course_id, price);
    });
}

pub fn get_course_price(course_id: CourseId) -> Option<Amount> {
    COURSE_PRICES.with(|map| map.borrow().get(&course_id))
}
