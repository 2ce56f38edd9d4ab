use std::collections::{BTreeMap, BTreeSet};

use sched_core::prep::Preprocessed;
use sched_core::rules::Rules;
use types::{
    Allocation, Block, CapacityShortage, CourseCode, Lecturer, LecturerTimetable, PendingRequest,
    PlacedSection, SectionKey, StudentId, UnresolvedRequest,
};

#[derive(Clone, Debug)]
pub(crate) enum SectionSlot {
    Placed {
        block: Block,
        lecturer: Lecturer,
        capacity: u32,
        roster: Vec<StudentId>,
    },
    /// No block qualified. Never retried.
    Unplaceable,
}

/// Working schedules of one run, owned by the allocator across both passes.
#[derive(Debug, Default)]
pub(crate) struct AllocatorState {
    pub sections: BTreeMap<SectionKey, SectionSlot>,
    pub lecturer_blocks: BTreeMap<Lecturer, BTreeMap<Block, SectionKey>>,
    pub student_blocks: BTreeMap<StudentId, BTreeMap<Block, SectionKey>>,
    pub resolved: Vec<PendingRequest>,
    pub unresolved: Vec<UnresolvedRequest>,
}

impl AllocatorState {
    pub fn lecturer_busy(&self, lecturer: &Lecturer, block: &Block) -> bool {
        self.lecturer_blocks
            .get(lecturer)
            .is_some_and(|m| m.contains_key(block))
    }

    pub fn student_busy(&self, student: &StudentId, block: &Block) -> bool {
        self.student_blocks
            .get(student)
            .is_some_and(|m| m.contains_key(block))
    }

    /// Slots of `course` in section-index order.
    pub fn course_sections<'a>(
        &'a self,
        course: &CourseCode,
    ) -> impl Iterator<Item = (&'a SectionKey, &'a SectionSlot)> + 'a {
        self.sections
            .range(SectionKey::new(course.clone(), 0)..=SectionKey::new(course.clone(), u32::MAX))
    }

    /// Blocks already bound to placed sections of `course`.
    pub fn course_blocks(&self, course: &CourseCode) -> BTreeSet<Block> {
        self.course_sections(course)
            .filter_map(|(_, slot)| match slot {
                SectionSlot::Placed { block, .. } => Some(block.clone()),
                SectionSlot::Unplaceable => None,
            })
            .collect()
    }

    pub fn place_section(&mut self, key: SectionKey, block: Block, lecturer: Lecturer, capacity: u32) {
        self.lecturer_blocks
            .entry(lecturer.clone())
            .or_default()
            .insert(block.clone(), key.clone());
        self.sections.insert(
            key,
            SectionSlot::Placed {
                block,
                lecturer,
                capacity,
                roster: Vec::new(),
            },
        );
    }

    /// Seats `req` in section `key`; the caller has checked capacity and the
    /// student's blocks. A key without a placed section hands the request back.
    pub fn seat(&mut self, key: &SectionKey, req: PendingRequest) -> Result<(), PendingRequest> {
        let Some(SectionSlot::Placed { block, roster, .. }) = self.sections.get_mut(key) else {
            return Err(req);
        };
        roster.push(req.student_id.clone());
        self.student_blocks
            .entry(req.student_id.clone())
            .or_default()
            .insert(block.clone(), key.clone());
        self.resolved.push(req);
        Ok(())
    }

    pub fn finish(self, prep: &Preprocessed, rules: &Rules) -> Allocation {
        let mut sections = Vec::new();
        let mut unplaced_sections = Vec::new();
        let mut placed_capacity: BTreeMap<&CourseCode, u64> = BTreeMap::new();
        for (key, slot) in &self.sections {
            match slot {
                SectionSlot::Placed {
                    block,
                    lecturer,
                    capacity,
                    roster,
                } => {
                    *placed_capacity.entry(&key.course).or_default() += u64::from(*capacity);
                    sections.push(PlacedSection {
                        key: key.clone(),
                        block: block.clone(),
                        lecturer: lecturer.clone(),
                        capacity: *capacity,
                        roster: roster.clone(),
                    });
                }
                SectionSlot::Unplaceable => unplaced_sections.push(key.clone()),
            }
        }

        let mut shortages = Vec::new();
        for (code, list) in &prep.requests {
            let placed = placed_capacity.get(code).copied().unwrap_or(0);
            let demand = list.len();
            if demand as u64 > placed {
                shortages.push(CapacityShortage {
                    course: code.clone(),
                    demand,
                    placed_capacity: placed,
                    declared_capacity: prep.detail_for(code, rules).declared_capacity(),
                    overflow: demand - placed as usize,
                });
            }
        }

        Allocation {
            student_schedule: self.student_blocks,
            teacher_schedule: self
                .lecturer_blocks
                .into_iter()
                .map(|(lecturer, blocks)| LecturerTimetable { lecturer, blocks })
                .collect(),
            sections,
            unplaced_sections,
            resolved: self.resolved,
            unresolved: self.unresolved,
            malformed: prep.malformed.clone(),
            malformed_listings: prep.malformed_listings.clone(),
            uncoded_courses: prep.uncoded_courses,
            shortages,
        }
    }
}
