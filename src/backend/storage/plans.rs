// src/backend/storage/plans.rs
use crate::error::TuitionError;
use crate::models::common::{EnrollmentId, PlanId};
use crate::models::payment_plan::PaymentPlan;
use crate::storage::memory::{get_plan_by_enrollment_memory, get_plans_memory, Memory};
use crate::storage::storable::Cbor;
use ic_stable_structures::StableBTreeMap;
use std::cell::RefCell;

type StorablePlan = Cbor<PaymentPlan>;

thread_local! {
    static PLANS: RefCell<StableBTreeMap<PlanId, StorablePlan, Memory>> = RefCell::new(
        StableBTreeMap::init(get_plans_memory())
    );

    /// 1:1 index enrollment -> plan; also the DuplicatePlan check.
    static PLAN_BY_ENROLLMENT: RefCell<StableBTreeMap<EnrollmentId, PlanId, Memory>> = RefCell::new(
        StableBTreeMap::init(get_plan_by_enrollment_memory())
    );
}

pub fn insert_plan(plan: PaymentPlan) {
    PLAN_BY_ENROLLMENT.with(|index| {
        index.borrow_mut().insert(plan.enrollment_id, plan.plan_id);
    });
    PLANS.with(|map| {
        map.borrow_mut().insert(plan.plan_id, Cbor(plan));
    });
}

pub fn get_plan(plan_id: PlanId) -> Option<PaymentPlan> {
    PLANS.with(|map| map.borrow().get(&plan_id).map(|cbor| cbor.0))
}

pub fn plan_for_enrollment(enrollment_id: EnrollmentId) -> Option<PlanId> {
    PLAN_BY_ENROLLMENT.with(|index| index.borrow().get(&enrollment_id))
}

pub fn with_plan_mut<F, R>(plan_id: PlanId, f: F) -> Result<R, TuitionError>
where
    F: FnOnce(&mut PaymentPlan) -> Result<R, TuitionError>,
{
    PLANS.with(|map| {
        let mut map = map.borrow_mut();
        let mut plan = map
            .get(&plan_id)
            .map(|cbor| cbor.0)
            .ok_or_else(|| TuitionError::NotFound(format!("payment plan {}", plan_id)))?;
        let result = f(&mut plan)?;
        map.insert(plan_id, Cbor(plan));
        Ok(result)
    })
}
