pub mod analysis;
pub mod audit;
pub mod prep;
pub mod rules;

use async_trait::async_trait;
use thiserror::Error;

pub use types::{
    Allocation, Analysis, Block, CourseCode, CourseRecord, Dataset, DemandAudit, ListingRecord,
    RequestRecord, RequestType, ScheduleRun, SectionKey,
};

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("invalid dataset: {0}")]
    Msg(String),
}

/// Consistency checks on a dataset. The allocator tolerates every problem
/// reported here; this exists to surface them before a run.
pub fn validate(ds: &Dataset) -> Result<(), ValidationError> {
    let mut errors: Vec<String> = Vec::new();

    use std::collections::{HashMap, HashSet};
    let mut seen = HashSet::new();
    for c in &ds.courses {
        let Some(code) = c.code.as_ref().filter(|c| !c.is_blank()) else {
            errors.push("course record without a code".into());
            continue;
        };
        if !seen.insert(code.0.as_str()) {
            errors.push(format!("duplicate course code: {code}"));
        }

        let max = c.max_size.unwrap_or(prep::DEFAULT_MAX_SIZE);
        let min = c.min_size.unwrap_or(prep::DEFAULT_MIN_SIZE);
        let target = c.target_size.unwrap_or(prep::DEFAULT_TARGET_SIZE);
        if max == 0 {
            errors.push(format!("course {code} has maxSize=0"));
        }
        if min > max {
            errors.push(format!("course {code} has minSize {min} > maxSize {max}"));
        }
        if target < min || target > max {
            errors.push(format!(
                "course {code} has targetSize {target} outside [{min}, {max}]"
            ));
        }
        if c.num_sections == Some(0) {
            errors.push(format!("course {code} has numSections=0"));
        }

        let avail = c.available_blocks.as_deref().unwrap_or(&[]);
        for b in avail.iter().chain(&c.unavailable_blocks) {
            if b.is_blank() {
                errors.push(format!("course {code} declares a blank block label"));
            }
        }
        for b in avail {
            if c.unavailable_blocks.contains(b) {
                errors.push(format!(
                    "course {code} lists block {b} as both available and unavailable"
                ));
            }
        }
    }

    let mut section_lecturer: HashMap<(&str, u32), &str> = HashMap::new();
    for l in &ds.listings {
        let (Some(code), Some(lecturer)) = (&l.course_code, &l.lecturer_id) else {
            continue;
        };
        let section = l.section_number.unwrap_or(1);
        if section == 0 {
            errors.push(format!("listing for course {code} has sectionNumber=0"));
            continue;
        }
        if let Some(prev) = section_lecturer.insert((code.as_str(), section), lecturer.as_str()) {
            if prev != lecturer.as_str() {
                errors.push(format!(
                    "section {code}/{section} is listed for both {prev} and {lecturer}"
                ));
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::Msg(errors.join("; ")))
    }
}

#[async_trait]
pub trait Scheduler: Send + Sync + 'static {
    async fn schedule(&self, dataset: Dataset) -> anyhow::Result<ScheduleRun>;
}
