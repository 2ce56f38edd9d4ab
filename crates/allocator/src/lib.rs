//! Two-pass greedy block allocator.
//!
//! Pass 1 binds sections to blocks tier by tier (Required, Requested,
//! Recommended), pass 2 seats requests into those sections in the same tier
//! order. Both passes visit courses in code order, so a run is a pure
//! function of its input.

mod sections;
mod state;
mod students;

use async_trait::async_trait;
use sched_core::prep::{preprocess, Preprocessed};
use sched_core::rules::{extract_rules, Rules};
use sched_core::{analysis, validate, Scheduler};
use tracing::{info, warn};
use types::{Allocation, Dataset, ScheduleRun};

use state::AllocatorState;

#[derive(Clone, Copy, Debug, Default)]
pub struct BlockAllocator;

impl BlockAllocator {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Scheduler for BlockAllocator {
    async fn schedule(&self, dataset: Dataset) -> anyhow::Result<ScheduleRun> {
        Ok(run(&dataset))
    }
}

/// Runs both passes over preprocessed demand.
pub fn allocate(rules: &Rules, prep: &Preprocessed) -> Allocation {
    let mut state = AllocatorState::default();
    sections::place_sections(&mut state, rules, prep);
    students::place_students(&mut state, rules, prep);
    state.finish(prep, rules)
}

/// Full pipeline: rules, preprocessing, allocation and analysis.
pub fn run(dataset: &Dataset) -> ScheduleRun {
    info!(
        courses = dataset.courses.len(),
        listings = dataset.listings.len(),
        requests = dataset.requests.len(),
        "received dataset"
    );
    if let Err(e) = validate(dataset) {
        warn!(%e, "dataset failed validation; scheduling anyway");
    }

    let rules = extract_rules(dataset);
    let prep = preprocess(dataset, &rules);
    let allocation = allocate(&rules, &prep);
    let analysis = analysis::analyze(&allocation, &prep.courses);

    info!(
        sections = allocation.sections.len(),
        unplaced = allocation.unplaced_sections.len(),
        resolved = allocation.resolved.len(),
        unresolved = allocation.unresolved.len(),
        malformed = allocation.malformed.len(),
        satisfaction = analysis.satisfaction_rate,
        "schedule complete"
    );

    ScheduleRun {
        blocks: rules.blocks.clone(),
        required_courses: rules.required_courses_list(),
        allocation,
        analysis,
    }
}
