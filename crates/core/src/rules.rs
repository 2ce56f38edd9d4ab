use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;
use types::{Block, CourseCode, Dataset, RequestType};

/// Blocks used when no course declares any.
pub const DEFAULT_BLOCKS: [&str; 9] = ["1A", "1B", "2A", "2B", "3", "4A", "4B", "5A", "5B"];

const DEFAULT_REQUIRED: [(&str, &str); 4] = [
    ("1st Year", "BIB9"),
    ("2nd Year", "BIB10"),
    ("3rd Year", "BIB11"),
    ("4th Year", "BIB12"),
];

/// Global constraints shared by every stage of a run.
#[derive(Clone, Debug, PartialEq)]
pub struct Rules {
    /// Valid blocks, ascending.
    pub blocks: Vec<Block>,
    /// College year -> courses every student of that year must take.
    pub required_courses: BTreeMap<String, BTreeSet<CourseCode>>,
    pub priority_order: [RequestType; 3],
}

impl Rules {
    pub fn required_courses_list(&self) -> BTreeMap<String, Vec<CourseCode>> {
        self.required_courses
            .iter()
            .map(|(year, codes)| (year.clone(), codes.iter().cloned().collect()))
            .collect()
    }
}

pub fn extract_rules(ds: &Dataset) -> Rules {
    let mut blocks: BTreeSet<Block> = BTreeSet::new();
    for c in &ds.courses {
        if let Some(avail) = &c.available_blocks {
            blocks.extend(avail.iter().filter(|b| !b.is_blank()).cloned());
        }
    }
    if blocks.is_empty() {
        debug!("no course declares available blocks; using default block set");
        blocks = DEFAULT_BLOCKS.iter().map(|&b| Block::from(b)).collect();
    }

    let mut required_courses: BTreeMap<String, BTreeSet<CourseCode>> = BTreeMap::new();
    for r in &ds.requests {
        if r.kind.known() != Some(RequestType::Required) {
            continue;
        }
        let (Some(year), Some(code)) = (&r.year, &r.course_code) else {
            continue;
        };
        if year.trim().is_empty() || code.is_blank() {
            continue;
        }
        required_courses
            .entry(year.clone())
            .or_default()
            .insert(code.clone());
    }
    if required_courses.is_empty() {
        required_courses = DEFAULT_REQUIRED
            .iter()
            .map(|&(year, code)| (year.to_string(), BTreeSet::from([CourseCode::from(code)])))
            .collect();
    }

    Rules {
        blocks: blocks.into_iter().collect(),
        required_courses,
        priority_order: RequestType::PRIORITY_ORDER,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::{CourseRecord, RequestRecord};

    fn course(code: &str, blocks: Option<&[&str]>) -> CourseRecord {
        CourseRecord {
            code: Some(code.into()),
            available_blocks: blocks.map(|b| b.iter().map(|&x| Block::from(x)).collect()),
            ..Default::default()
        }
    }

    #[test]
    fn blocks_are_union_of_declared_sorted() {
        let ds = Dataset {
            courses: vec![
                course("A", Some(&["2B", "1A"])),
                course("B", Some(&["1A", "3"])),
                course("C", None),
            ],
            ..Default::default()
        };
        let rules = extract_rules(&ds);
        let got: Vec<&str> = rules.blocks.iter().map(|b| b.as_str()).collect();
        assert_eq!(got, vec!["1A", "2B", "3"]);
    }

    #[test]
    fn falls_back_to_default_blocks() {
        let ds = Dataset {
            courses: vec![course("A", None), course("B", Some(&[]))],
            ..Default::default()
        };
        let rules = extract_rules(&ds);
        assert_eq!(rules.blocks.len(), DEFAULT_BLOCKS.len());
        assert_eq!(rules.blocks[0], Block::from("1A"));
    }

    #[test]
    fn required_courses_come_from_required_requests() {
        let req = |year: &str, code: &str, kind: RequestType| RequestRecord {
            student_id: Some("S".into()),
            year: Some(year.into()),
            course_code: Some(code.into()),
            kind: kind.into(),
        };
        let ds = Dataset {
            requests: vec![
                req("1st Year", "MATH1", RequestType::Required),
                req("1st Year", "ART", RequestType::Recommended),
                req("2nd Year", "MATH2", RequestType::Required),
            ],
            ..Default::default()
        };
        let rules = extract_rules(&ds);
        assert_eq!(rules.required_courses.len(), 2);
        assert!(rules.required_courses["1st Year"].contains(&CourseCode::from("MATH1")));
        assert!(!rules.required_courses["1st Year"].contains(&CourseCode::from("ART")));
    }

    #[test]
    fn default_required_courses_when_none_declared() {
        let rules = extract_rules(&Dataset::default());
        assert_eq!(
            rules.required_courses_list()["4th Year"],
            vec![CourseCode::from("BIB12")]
        );
        assert_eq!(rules.priority_order, RequestType::PRIORITY_ORDER);
    }
}
