//! Pass 2: seat each request in the first section with room, by index.

use sched_core::prep::Preprocessed;
use sched_core::rules::Rules;
use tracing::debug;
use types::{PendingRequest, SectionKey, UnresolvedReason, UnresolvedRequest};

use crate::state::{AllocatorState, SectionSlot};

enum Outcome {
    Seat(SectionKey),
    Unresolved(UnresolvedReason),
}

fn first_fit(state: &AllocatorState, req: &PendingRequest) -> Outcome {
    let mut any_placed = false;
    let mut any_open = false;
    for (key, slot) in state.course_sections(&req.course_code) {
        let SectionSlot::Placed {
            block,
            capacity,
            roster,
            ..
        } = slot
        else {
            continue;
        };
        any_placed = true;
        if roster.len() >= *capacity as usize {
            continue;
        }
        any_open = true;
        if state.student_busy(&req.student_id, block) {
            continue;
        }
        return Outcome::Seat(key.clone());
    }
    Outcome::Unresolved(if any_open {
        UnresolvedReason::BlockConflict
    } else if any_placed {
        UnresolvedReason::CapacityExhausted
    } else {
        UnresolvedReason::NoSection
    })
}

fn unresolved(state: &mut AllocatorState, req: PendingRequest, reason: UnresolvedReason) {
    debug!(student = %req.student_id, course = %req.course_code, ?reason, "request unresolved");
    state.unresolved.push(UnresolvedRequest {
        request: req,
        reason,
    });
}

pub(crate) fn place_students(state: &mut AllocatorState, rules: &Rules, prep: &Preprocessed) {
    for &tier in &rules.priority_order {
        for requests in prep.requests.values() {
            for req in requests.iter().filter(|r| r.kind == tier) {
                match first_fit(state, req) {
                    Outcome::Seat(key) => {
                        if let Err(req) = state.seat(&key, req.clone()) {
                            unresolved(state, req, UnresolvedReason::NoSection);
                        }
                    }
                    Outcome::Unresolved(reason) => unresolved(state, req.clone(), reason),
                }
            }
        }
    }
}
