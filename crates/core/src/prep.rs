//! Demand/supply normalization: turns raw records into the lookups the
//! allocator consumes.

use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use tracing::{debug, warn};
use types::{
    Block, CourseCode, CourseRecord, Dataset, Lecturer, LecturerId, ListingRecord,
    MalformedListing, MalformedRequest, MissingField, PendingRequest, RequestRecord, SectionKey,
};

use crate::rules::Rules;

pub const DEFAULT_LENGTH: u32 = 4;
pub const DEFAULT_MIN_SIZE: u32 = 5;
pub const DEFAULT_TARGET_SIZE: u32 = 20;
pub const DEFAULT_MAX_SIZE: u32 = 25;
pub const DEFAULT_SECTIONS: u32 = 1;

/// A course record with every field resolved.
#[derive(Clone, Debug, PartialEq)]
pub struct CourseDetail {
    pub code: CourseCode,
    pub title: String,
    pub length: u32,
    pub priority: i32,
    /// Candidate blocks in declared order.
    pub available_blocks: Vec<Block>,
    pub unavailable_blocks: BTreeSet<Block>,
    pub min_size: u32,
    pub target_size: u32,
    pub max_size: u32,
    pub num_sections: u32,
}

impl CourseDetail {
    pub fn from_record(code: CourseCode, rec: &CourseRecord, rules: &Rules) -> Self {
        Self {
            code,
            title: rec.title.clone().unwrap_or_default(),
            length: rec.length.unwrap_or(DEFAULT_LENGTH),
            priority: rec.priority.unwrap_or(0),
            available_blocks: rec
                .available_blocks
                .clone()
                .unwrap_or_else(|| rules.blocks.clone()),
            unavailable_blocks: rec.unavailable_blocks.iter().cloned().collect(),
            min_size: rec.min_size.unwrap_or(DEFAULT_MIN_SIZE),
            target_size: rec.target_size.unwrap_or(DEFAULT_TARGET_SIZE),
            max_size: rec.max_size.unwrap_or(DEFAULT_MAX_SIZE),
            num_sections: rec.num_sections.unwrap_or(DEFAULT_SECTIONS),
        }
    }

    /// Detail for a course that is requested but never declared.
    pub fn fallback(code: CourseCode, rules: &Rules) -> Self {
        Self::from_record(code, &CourseRecord::default(), rules)
    }

    /// Blocks a section of this course may occupy, in declared order.
    pub fn open_blocks(&self) -> impl Iterator<Item = &Block> + '_ {
        self.available_blocks
            .iter()
            .filter(move |b| !self.unavailable_blocks.contains(*b))
    }

    pub fn declared_capacity(&self) -> u64 {
        u64::from(self.num_sections) * u64::from(self.max_size)
    }

    /// Sections required to seat `demand` students, capped by `num_sections`.
    pub fn sections_needed(&self, demand: usize) -> u32 {
        if self.max_size == 0 || demand == 0 {
            return 0;
        }
        let needed = demand.div_ceil(self.max_size as usize);
        u32::try_from(needed)
            .unwrap_or(u32::MAX)
            .min(self.num_sections)
    }
}

#[derive(Clone, Debug, Default)]
pub struct Preprocessed {
    pub lecturers: HashMap<SectionKey, LecturerId>,
    pub courses: BTreeMap<CourseCode, CourseDetail>,
    /// Valid requests per course, stably sorted by priority rank.
    pub requests: BTreeMap<CourseCode, Vec<PendingRequest>>,
    pub malformed: Vec<MalformedRequest>,
    pub malformed_listings: Vec<MalformedListing>,
    pub uncoded_courses: usize,
    pub total_requests: usize,
}

impl Preprocessed {
    pub fn lecturer_for(&self, key: &SectionKey) -> Lecturer {
        match self.lecturers.get(key) {
            Some(id) => Lecturer::Known(id.clone()),
            None => Lecturer::Unknown(key.course.clone()),
        }
    }

    pub fn detail_for<'a>(&'a self, code: &CourseCode, rules: &Rules) -> Cow<'a, CourseDetail> {
        match self.courses.get(code) {
            Some(d) => Cow::Borrowed(d),
            None => Cow::Owned(CourseDetail::fallback(code.clone(), rules)),
        }
    }
}

fn present<T, F: Fn(&T) -> bool>(v: &Option<T>, blank: F) -> Option<&T> {
    v.as_ref().filter(|&x| !blank(x))
}

pub fn classify_request(index: usize, rec: &RequestRecord) -> Result<PendingRequest, MalformedRequest> {
    let malformed = |missing| MalformedRequest {
        index,
        missing,
        record: rec.clone(),
    };
    let Some(course_code) = present(&rec.course_code, |c| c.is_blank()) else {
        return Err(malformed(MissingField::CourseCode));
    };
    let Some(student_id) = present(&rec.student_id, |s| s.is_blank()) else {
        return Err(malformed(MissingField::StudentId));
    };
    let Some(kind) = rec.kind.known() else {
        return Err(malformed(MissingField::UnrecognizedType));
    };
    Ok(PendingRequest {
        index,
        student_id: student_id.clone(),
        year: rec.year.clone(),
        course_code: course_code.clone(),
        kind,
    })
}

pub fn classify_listing(
    index: usize,
    rec: &ListingRecord,
) -> Result<(SectionKey, LecturerId), MalformedListing> {
    let malformed = |missing| MalformedListing {
        index,
        missing,
        record: rec.clone(),
    };
    let Some(code) = present(&rec.course_code, |c| c.is_blank()) else {
        return Err(malformed(MissingField::CourseCode));
    };
    let Some(lecturer) = present(&rec.lecturer_id, |l| l.is_blank()) else {
        return Err(malformed(MissingField::LecturerId));
    };
    let section = rec.section_number.unwrap_or(1);
    Ok((SectionKey::new(code.clone(), section), lecturer.clone()))
}

pub fn preprocess(ds: &Dataset, rules: &Rules) -> Preprocessed {
    let mut out = Preprocessed {
        total_requests: ds.requests.len(),
        ..Default::default()
    };

    for (i, l) in ds.listings.iter().enumerate() {
        match classify_listing(i, l) {
            Ok((key, lecturer)) => {
                if let Some(prev) = out.lecturers.insert(key.clone(), lecturer) {
                    debug!(section = %key, previous = %prev, "listing overrides earlier lecturer");
                }
            }
            Err(m) => out.malformed_listings.push(m),
        }
    }

    for c in &ds.courses {
        let Some(code) = present(&c.code, |c| c.is_blank()) else {
            out.uncoded_courses += 1;
            continue;
        };
        out.courses
            .insert(code.clone(), CourseDetail::from_record(code.clone(), c, rules));
    }
    if out.uncoded_courses > 0 {
        warn!(count = out.uncoded_courses, "course records without a code were skipped");
    }

    for (i, r) in ds.requests.iter().enumerate() {
        match classify_request(i, r) {
            Ok(p) => out.requests.entry(p.course_code.clone()).or_default().push(p),
            Err(m) => out.malformed.push(m),
        }
    }
    for list in out.requests.values_mut() {
        list.sort_by_key(|r| r.kind.rank());
    }

    if !out.malformed.is_empty() || !out.malformed_listings.is_empty() {
        warn!(
            requests = out.malformed.len(),
            listings = out.malformed_listings.len(),
            "malformed records excluded from scheduling"
        );
    }
    debug!(
        courses = out.courses.len(),
        requested_courses = out.requests.len(),
        lecturers = out.lecturers.len(),
        "preprocessed dataset"
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::extract_rules;
    use types::{RequestType, StudentId};

    fn req(student: Option<&str>, code: Option<&str>, kind: RequestType) -> RequestRecord {
        RequestRecord {
            student_id: student.map(StudentId::from),
            year: None,
            course_code: code.map(CourseCode::from),
            kind: kind.into(),
        }
    }

    #[test]
    fn requests_are_stably_sorted_by_priority() {
        let ds = Dataset {
            requests: vec![
                req(Some("s1"), Some("C"), RequestType::Recommended),
                req(Some("s2"), Some("C"), RequestType::Required),
                req(Some("s3"), Some("C"), RequestType::Recommended),
                req(Some("s4"), Some("C"), RequestType::Requested),
                req(Some("s5"), Some("C"), RequestType::Required),
            ],
            ..Default::default()
        };
        let rules = extract_rules(&ds);
        let p = preprocess(&ds, &rules);
        let order: Vec<&str> = p.requests[&CourseCode::from("C")]
            .iter()
            .map(|r| r.student_id.as_str())
            .collect();
        assert_eq!(order, vec!["s2", "s5", "s4", "s1", "s3"]);
    }

    #[test]
    fn malformed_requests_are_counted_not_dropped() {
        let ds = Dataset {
            requests: vec![
                req(None, Some("C"), RequestType::Required),
                req(Some("s1"), None, RequestType::Required),
                req(Some("  "), Some("C"), RequestType::Required),
                req(Some("s2"), Some("C"), RequestType::Required),
            ],
            ..Default::default()
        };
        let p = preprocess(&ds, &extract_rules(&ds));
        assert_eq!(p.total_requests, 4);
        assert_eq!(p.malformed.len(), 3);
        assert_eq!(p.malformed[0].missing, MissingField::StudentId);
        assert_eq!(p.malformed[1].missing, MissingField::CourseCode);
        assert_eq!(p.malformed[2].index, 2);
        assert_eq!(p.requests[&CourseCode::from("C")].len(), 1);
    }

    #[test]
    fn course_defaults_are_applied() {
        let ds = Dataset {
            courses: vec![CourseRecord {
                code: Some("X".into()),
                ..Default::default()
            }],
            ..Default::default()
        };
        let rules = extract_rules(&ds);
        let p = preprocess(&ds, &rules);
        let d = &p.courses[&CourseCode::from("X")];
        assert_eq!(d.length, 4);
        assert_eq!((d.min_size, d.target_size, d.max_size), (5, 20, 25));
        assert_eq!(d.num_sections, 1);
        assert_eq!(d.available_blocks, rules.blocks);
    }

    #[test]
    fn unknown_lecturer_gets_course_scoped_placeholder() {
        let ds = Dataset {
            listings: vec![
                ListingRecord {
                    lecturer_id: Some("L1".into()),
                    course_code: Some("A".into()),
                    section_number: None,
                },
                ListingRecord {
                    lecturer_id: None,
                    course_code: Some("B".into()),
                    section_number: Some(1),
                },
            ],
            ..Default::default()
        };
        let p = preprocess(&ds, &extract_rules(&ds));
        assert_eq!(
            p.lecturer_for(&SectionKey::new("A".into(), 1)),
            Lecturer::Known("L1".into())
        );
        assert_eq!(
            p.lecturer_for(&SectionKey::new("A".into(), 2)),
            Lecturer::Unknown("A".into())
        );
        assert_eq!(p.malformed_listings.len(), 1);
        assert_eq!(p.malformed_listings[0].missing, MissingField::LecturerId);
    }

    #[test]
    fn sections_needed_is_capped_and_handles_zero_capacity() {
        let rules = extract_rules(&Dataset::default());
        let mut d = CourseDetail::fallback("A".into(), &rules);
        d.max_size = 2;
        d.num_sections = 3;
        assert_eq!(d.sections_needed(0), 0);
        assert_eq!(d.sections_needed(3), 2);
        assert_eq!(d.sections_needed(100), 3);
        d.max_size = 0;
        assert_eq!(d.sections_needed(5), 0);
    }

    #[test]
    fn open_blocks_skip_unavailable() {
        let rules = extract_rules(&Dataset::default());
        let mut d = CourseDetail::fallback("A".into(), &rules);
        d.available_blocks = vec!["1A".into(), "1B".into(), "2A".into()];
        d.unavailable_blocks = BTreeSet::from([Block::from("1B")]);
        let open: Vec<&str> = d.open_blocks().map(|b| b.as_str()).collect();
        assert_eq!(open, vec!["1A", "2A"]);
    }

    #[test]
    fn later_listing_for_same_section_wins() {
        let listing = |lecturer: &str, section| ListingRecord {
            lecturer_id: Some(lecturer.into()),
            course_code: Some("A".into()),
            section_number: section,
        };
        let ds = Dataset {
            listings: vec![listing("L1", Some(1)), listing("L2", None)],
            ..Default::default()
        };
        let p = preprocess(&ds, &extract_rules(&ds));
        assert_eq!(p.lecturers.len(), 1);
        assert_eq!(
            p.lecturer_for(&SectionKey::new("A".into(), 1)),
            Lecturer::Known("L2".into())
        );
    }

    #[test]
    fn later_course_record_wins() {
        let record = |max| CourseRecord {
            code: Some("A".into()),
            max_size: Some(max),
            ..Default::default()
        };
        let ds = Dataset {
            courses: vec![record(10), record(30)],
            ..Default::default()
        };
        let p = preprocess(&ds, &extract_rules(&ds));
        assert_eq!(p.courses.len(), 1);
        assert_eq!(p.courses[&CourseCode::from("A")].max_size, 30);
    }

    #[test]
    fn uncoded_courses_are_counted_and_skipped() {
        let ds = Dataset {
            courses: vec![
                CourseRecord::default(),
                CourseRecord {
                    code: Some(" ".into()),
                    ..Default::default()
                },
                CourseRecord {
                    code: Some("A".into()),
                    ..Default::default()
                },
            ],
            ..Default::default()
        };
        let p = preprocess(&ds, &extract_rules(&ds));
        assert_eq!(p.uncoded_courses, 2);
        assert_eq!(p.courses.keys().collect::<Vec<_>>(), vec![&CourseCode::from("A")]);
    }

    #[test]
    fn unrecognized_type_is_malformed() {
        let rec = RequestRecord {
            student_id: Some("s1".into()),
            course_code: Some("C".into()),
            kind: types::TypeLabel::Other("Elective".into()),
            ..Default::default()
        };
        let err = classify_request(3, &rec).unwrap_err();
        assert_eq!((err.index, err.missing), (3, MissingField::UnrecognizedType));
    }
}
