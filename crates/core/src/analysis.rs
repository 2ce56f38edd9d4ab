use std::collections::BTreeMap;

use types::{Allocation, Analysis, CourseCode, RequestType, SectionFill, TypeCounts};

use crate::prep::CourseDetail;

fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

fn mean(values: impl Iterator<Item = usize>) -> f64 {
    let (sum, n) = values.fold((0usize, 0usize), |(s, n), v| (s + v, n + 1));
    if n == 0 {
        0.0
    } else {
        sum as f64 / n as f64
    }
}

/// Quality metrics for a finished allocation. Sections whose course has no
/// declared detail are left out of the fill rates.
pub fn analyze(alloc: &Allocation, courses: &BTreeMap<CourseCode, CourseDetail>) -> Analysis {
    let resolved = alloc.resolved.len();
    let unresolved = alloc.unresolved.len();
    let satisfaction_rate = if resolved + unresolved == 0 {
        100.0
    } else {
        percent(resolved, resolved + unresolved)
    };

    let mut per_type: BTreeMap<RequestType, TypeCounts> = BTreeMap::new();
    for r in &alloc.resolved {
        per_type.entry(r.kind).or_default().resolved += 1;
    }
    for u in &alloc.unresolved {
        per_type.entry(u.request.kind).or_default().unresolved += 1;
    }
    for c in per_type.values_mut() {
        c.success_rate = percent(c.resolved, c.resolved + c.unresolved);
    }

    let section_fill = alloc
        .sections
        .iter()
        .filter(|s| courses.contains_key(&s.key.course))
        .map(|s| SectionFill {
            key: s.key.clone(),
            students: s.roster.len(),
            capacity: s.capacity,
            fill_rate: percent(s.roster.len(), s.capacity as usize),
        })
        .collect();

    let mut students_per_block = BTreeMap::new();
    for blocks in alloc.student_schedule.values() {
        for b in blocks.keys() {
            *students_per_block.entry(b.clone()).or_insert(0usize) += 1;
        }
    }

    Analysis {
        satisfaction_rate,
        per_type,
        section_fill,
        avg_sections_per_student: mean(alloc.student_schedule.values().map(|b| b.len())),
        avg_sections_per_teacher: mean(alloc.teacher_schedule.iter().map(|t| t.blocks.len())),
        students_per_block,
        malformed_requests: alloc.malformed.len(),
        uncoded_courses: alloc.uncoded_courses,
        capacity_shortages: alloc.shortages.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::extract_rules;
    use types::{
        Block, Dataset, Lecturer, LecturerTimetable, PendingRequest, PlacedSection, SectionKey,
        StudentId, UnresolvedReason, UnresolvedRequest,
    };

    fn pending(student: &str, course: &str, kind: RequestType) -> PendingRequest {
        PendingRequest {
            index: 0,
            student_id: student.into(),
            year: None,
            course_code: course.into(),
            kind,
        }
    }

    #[test]
    fn empty_allocation_is_fully_satisfied() {
        let a = analyze(&Allocation::default(), &BTreeMap::new());
        assert_eq!(a.satisfaction_rate, 100.0);
        assert!(a.per_type.is_empty());
        assert_eq!(a.avg_sections_per_student, 0.0);
        assert_eq!(a.avg_sections_per_teacher, 0.0);
    }

    #[test]
    fn counts_rates_and_loads() {
        let key = SectionKey::new("A".into(), 1);
        let mut alloc = Allocation::default();
        alloc.resolved = vec![
            pending("s1", "A", RequestType::Required),
            pending("s2", "A", RequestType::Required),
        ];
        alloc.unresolved = vec![
            UnresolvedRequest {
                request: pending("s3", "A", RequestType::Required),
                reason: UnresolvedReason::CapacityExhausted,
            },
            UnresolvedRequest {
                request: pending("s4", "Z", RequestType::Recommended),
                reason: UnresolvedReason::NoSection,
            },
        ];
        alloc.sections = vec![
            PlacedSection {
                key: key.clone(),
                block: "1A".into(),
                lecturer: Lecturer::Known("L1".into()),
                capacity: 4,
                roster: vec![StudentId::from("s1"), StudentId::from("s2")],
            },
            PlacedSection {
                key: SectionKey::new("UNDECLARED".into(), 1),
                block: "1B".into(),
                lecturer: Lecturer::Unknown("UNDECLARED".into()),
                capacity: 25,
                roster: vec![],
            },
        ];
        for s in ["s1", "s2"] {
            alloc
                .student_schedule
                .entry(s.into())
                .or_default()
                .insert(Block::from("1A"), key.clone());
        }
        alloc.teacher_schedule = vec![
            LecturerTimetable {
                lecturer: Lecturer::Known("L1".into()),
                blocks: BTreeMap::from([(Block::from("1A"), key.clone())]),
            },
            LecturerTimetable {
                lecturer: Lecturer::Unknown("UNDECLARED".into()),
                blocks: BTreeMap::from([
                    (Block::from("1B"), SectionKey::new("UNDECLARED".into(), 1)),
                    (Block::from("2A"), SectionKey::new("UNDECLARED".into(), 2)),
                ]),
            },
        ];

        let rules = extract_rules(&Dataset::default());
        let courses = BTreeMap::from([(
            CourseCode::from("A"),
            CourseDetail::fallback("A".into(), &rules),
        )]);
        let a = analyze(&alloc, &courses);

        assert_eq!(a.satisfaction_rate, 50.0);
        assert_eq!(a.per_type[&RequestType::Required].resolved, 2);
        assert_eq!(a.per_type[&RequestType::Required].unresolved, 1);
        assert_eq!(a.per_type[&RequestType::Recommended].resolved, 0);
        assert_eq!(a.per_type[&RequestType::Recommended].success_rate, 0.0);
        assert!(!a.per_type.contains_key(&RequestType::Requested));

        assert_eq!(a.section_fill.len(), 1);
        assert_eq!(a.section_fill[0].fill_rate, 50.0);

        assert_eq!(a.avg_sections_per_student, 1.0);
        assert_eq!(a.avg_sections_per_teacher, 1.5);
        assert_eq!(a.students_per_block[&Block::from("1A")], 2);
    }
}
