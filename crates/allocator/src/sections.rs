//! Pass 1: bind each needed section to a conflict-free block.

use sched_core::prep::Preprocessed;
use sched_core::rules::Rules;
use tracing::{debug, warn};
use types::SectionKey;

use crate::state::{AllocatorState, SectionSlot};

pub(crate) fn place_sections(state: &mut AllocatorState, rules: &Rules, prep: &Preprocessed) {
    for &tier in &rules.priority_order {
        // BTreeMap iteration: course code ascending decides contested blocks.
        for (code, requests) in &prep.requests {
            let demand = requests.iter().filter(|r| r.kind == tier).count();
            if demand == 0 {
                continue;
            }
            let course = prep.detail_for(code, rules);
            let needed = course.sections_needed(demand);

            for index in 1..=needed {
                let key = SectionKey::new(code.clone(), index);
                if state.sections.contains_key(&key) {
                    continue;
                }
                let lecturer = prep.lecturer_for(&key);
                let used = state.course_blocks(code);
                let block = course
                    .open_blocks()
                    .find(|b| !used.contains(*b) && !state.lecturer_busy(&lecturer, b))
                    .cloned();

                match block {
                    Some(block) => {
                        debug!(section = %key, %block, %lecturer, ?tier, "section placed");
                        state.place_section(key, block, lecturer, course.max_size);
                    }
                    None => {
                        warn!(section = %key, %lecturer, ?tier, "no available block for section");
                        state.sections.insert(key, SectionSlot::Unplaceable);
                    }
                }
            }
        }
    }
}

