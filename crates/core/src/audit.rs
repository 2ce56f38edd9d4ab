//! Demand-vs-supply audit of a dataset, run before scheduling.

use std::collections::{BTreeMap, BTreeSet};

use types::{
    CourseCode, CourseLoad, Dataset, DemandAudit, RequestType, RequiredCoverage, StudentId,
};

use crate::prep::{preprocess, Preprocessed};
use crate::rules::Rules;

pub fn audit(ds: &Dataset, rules: &Rules) -> DemandAudit {
    let prep = preprocess(ds, rules);
    audit_preprocessed(&prep, rules)
}

pub fn audit_preprocessed(prep: &Preprocessed, rules: &Rules) -> DemandAudit {
    let mut out = DemandAudit {
        total_requests: prep.total_requests,
        ..Default::default()
    };

    let mut students: BTreeSet<&StudentId> = BTreeSet::new();
    let mut by_year: BTreeMap<&str, BTreeSet<&StudentId>> = BTreeMap::new();
    for r in prep.requests.values().flatten() {
        *out.requests_by_type.entry(r.kind).or_default() += 1;
        students.insert(&r.student_id);
        if let Some(year) = &r.year {
            by_year.entry(year.as_str()).or_default().insert(&r.student_id);
        }
    }
    out.unique_students = students.len();
    out.students_by_year = by_year
        .iter()
        .map(|(y, s)| (y.to_string(), s.len()))
        .collect();

    for (code, detail) in &prep.courses {
        let demand = prep.requests.get(code).map_or(0, Vec::len);
        let capacity = detail.declared_capacity();
        let load = || CourseLoad {
            course: code.clone(),
            demand,
            capacity,
        };
        if demand as u64 > capacity {
            out.oversubscribed.push(load());
        } else if demand > 0 && (demand as f64) < 0.5 * capacity as f64 {
            out.undersubscribed.push(load());
        } else if demand == 0 && detail.num_sections > 0 {
            out.idle_courses.push(code.clone());
        }
    }

    out.undeclared_courses = prep
        .requests
        .keys()
        .filter(|c| !prep.courses.contains_key(*c))
        .cloned()
        .collect();

    for (year, courses) in &rules.required_courses {
        let year_students = by_year.get(year.as_str()).map_or(0, BTreeSet::len);
        for course in courses {
            out.required_coverage.push(RequiredCoverage {
                year: year.clone(),
                course: course.clone(),
                requested: required_requests(prep, year, course),
                students: year_students,
            });
        }
    }
    out
}

fn required_requests(prep: &Preprocessed, year: &str, course: &CourseCode) -> usize {
    prep.requests.get(course).map_or(0, |list| {
        list.iter()
            .filter(|r| r.kind == RequestType::Required && r.year.as_deref() == Some(year))
            .count()
    })
}
