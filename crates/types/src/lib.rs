use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use utoipa::ToSchema;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(
            Clone,
            Debug,
            Serialize,
            ToSchema,
            JsonSchema,
            Eq,
            PartialEq,
            Hash,
            Ord,
            PartialOrd,
        )]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn is_blank(&self) -> bool {
                self.0.trim().is_empty()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_owned())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
                d.deserialize_any(IdVisitor).map(Self)
            }
        }
    };
}

/// Accepts ids as strings or as the bare numbers spreadsheet exports produce.
struct IdVisitor;

impl<'de> serde::de::Visitor<'de> for IdVisitor {
    type Value = String;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a string or numeric id")
    }

    fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<String, E> {
        Ok(v.to_owned())
    }

    fn visit_string<E: serde::de::Error>(self, v: String) -> Result<String, E> {
        Ok(v)
    }

    fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<String, E> {
        Ok(v.to_string())
    }

    fn visit_i64<E: serde::de::Error>(self, v: i64) -> Result<String, E> {
        Ok(v.to_string())
    }

    fn visit_f64<E: serde::de::Error>(self, v: f64) -> Result<String, E> {
        // 1234.0 from a numeric cell is the id "1234"
        if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e15 {
            Ok(format!("{}", v as i64))
        } else {
            Ok(v.to_string())
        }
    }
}

id_newtype!(StudentId);
id_newtype!(LecturerId);
id_newtype!(CourseCode);
id_newtype!(Block);

/// Priority tier of a request. Declaration order is scheduling order.
#[derive(
    Clone,
    Copy,
    Debug,
    Serialize,
    Deserialize,
    ToSchema,
    JsonSchema,
    Eq,
    PartialEq,
    Hash,
    Ord,
    PartialOrd,
    Default,
)]
pub enum RequestType {
    Required,
    Requested,
    #[default]
    Recommended,
}

impl RequestType {
    pub const PRIORITY_ORDER: [RequestType; 3] = [
        RequestType::Required,
        RequestType::Requested,
        RequestType::Recommended,
    ];

    pub fn rank(self) -> usize {
        match self {
            RequestType::Required => 0,
            RequestType::Requested => 1,
            RequestType::Recommended => 2,
        }
    }
}

/// The `type` column of a request as delivered. Labels outside the known
/// tiers are kept verbatim so the record can be reported as malformed.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema, Eq, PartialEq)]
#[serde(untagged)]
pub enum TypeLabel {
    Known(RequestType),
    Other(String),
}

impl TypeLabel {
    pub fn known(&self) -> Option<RequestType> {
        match self {
            TypeLabel::Known(t) => Some(*t),
            TypeLabel::Other(_) => None,
        }
    }
}

impl Default for TypeLabel {
    fn default() -> Self {
        TypeLabel::Known(RequestType::default())
    }
}

impl From<RequestType> for TypeLabel {
    fn from(t: RequestType) -> Self {
        TypeLabel::Known(t)
    }
}

// ---- input records, as delivered by the data-loading collaborator ----

#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CourseRecord {
    #[serde(default)]
    pub code: Option<CourseCode>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub length: Option<u32>,
    #[serde(default)]
    pub priority: Option<i32>,
    /// `None` means "every valid block"; an empty list means "no block".
    #[serde(default)]
    pub available_blocks: Option<Vec<Block>>,
    #[serde(default)]
    pub unavailable_blocks: Vec<Block>,
    #[serde(default)]
    pub min_size: Option<u32>,
    #[serde(default)]
    pub target_size: Option<u32>,
    #[serde(default)]
    pub max_size: Option<u32>,
    #[serde(default)]
    pub num_sections: Option<u32>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ListingRecord {
    #[serde(default)]
    pub lecturer_id: Option<LecturerId>,
    #[serde(default)]
    pub course_code: Option<CourseCode>,
    #[serde(default)]
    pub section_number: Option<u32>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RequestRecord {
    #[serde(default)]
    pub student_id: Option<StudentId>,
    #[serde(default)]
    pub year: Option<String>,
    #[serde(default)]
    pub course_code: Option<CourseCode>,
    #[serde(rename = "type", default)]
    pub kind: TypeLabel,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema, JsonSchema)]
pub struct Dataset {
    #[serde(default)]
    pub courses: Vec<CourseRecord>,
    #[serde(default)]
    pub listings: Vec<ListingRecord>,
    #[serde(default)]
    pub requests: Vec<RequestRecord>,
}

// ---- allocation output ----

/// Structured `(course, section index)` key. Section indices start at 1.
#[derive(
    Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema, Eq, PartialEq, Hash, Ord, PartialOrd,
)]
pub struct SectionKey {
    pub course: CourseCode,
    pub index: u32,
}

impl SectionKey {
    pub fn new(course: CourseCode, index: u32) -> Self {
        Self { course, index }
    }
}

impl fmt::Display for SectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (Section {})", self.course, self.index)
    }
}

/// Who teaches a section. Sections without a listing get a placeholder
/// identity scoped to their course.
#[derive(
    Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema, Eq, PartialEq, Hash, Ord, PartialOrd,
)]
#[serde(rename_all = "lowercase")]
pub enum Lecturer {
    Known(LecturerId),
    Unknown(CourseCode),
}

impl fmt::Display for Lecturer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lecturer::Known(id) => id.fmt(f),
            Lecturer::Unknown(code) => write!(f, "unassigned ({code})"),
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, ToSchema, JsonSchema, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub enum MissingField {
    StudentId,
    CourseCode,
    LecturerId,
    /// `type` is present but names no known request tier.
    UnrecognizedType,
}

/// A validated request waiting for (or done with) student placement.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PendingRequest {
    /// Position in the input request list.
    pub index: usize,
    pub student_id: StudentId,
    #[serde(default)]
    pub year: Option<String>,
    pub course_code: CourseCode,
    #[serde(rename = "type")]
    pub kind: RequestType,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MalformedRequest {
    pub index: usize,
    pub missing: MissingField,
    pub record: RequestRecord,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MalformedListing {
    pub index: usize,
    pub missing: MissingField,
    pub record: ListingRecord,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, ToSchema, JsonSchema, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub enum UnresolvedReason {
    /// The course has no placed section.
    NoSection,
    /// Every placed section is at capacity.
    CapacityExhausted,
    /// Open seats exist only in blocks the student already occupies.
    BlockConflict,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UnresolvedRequest {
    pub request: PendingRequest,
    pub reason: UnresolvedReason,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlacedSection {
    pub key: SectionKey,
    pub block: Block,
    pub lecturer: Lecturer,
    pub capacity: u32,
    pub roster: Vec<StudentId>,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LecturerTimetable {
    pub lecturer: Lecturer,
    pub blocks: BTreeMap<Block, SectionKey>,
}

/// Demand for a course that exceeded the seats actually placed for it.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CapacityShortage {
    pub course: CourseCode,
    pub demand: usize,
    pub placed_capacity: u64,
    pub declared_capacity: u64,
    pub overflow: usize,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Allocation {
    pub student_schedule: BTreeMap<StudentId, BTreeMap<Block, SectionKey>>,
    pub teacher_schedule: Vec<LecturerTimetable>,
    pub sections: Vec<PlacedSection>,
    pub unplaced_sections: Vec<SectionKey>,
    pub resolved: Vec<PendingRequest>,
    pub unresolved: Vec<UnresolvedRequest>,
    pub malformed: Vec<MalformedRequest>,
    pub malformed_listings: Vec<MalformedListing>,
    /// Course records skipped for lacking a code.
    #[serde(default)]
    pub uncoded_courses: usize,
    pub shortages: Vec<CapacityShortage>,
}

impl Allocation {
    pub fn total_requests(&self) -> usize {
        self.resolved.len() + self.unresolved.len() + self.malformed.len()
    }
}

// ---- quality analysis ----

#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TypeCounts {
    pub resolved: usize,
    pub unresolved: usize,
    pub success_rate: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SectionFill {
    pub key: SectionKey,
    pub students: usize,
    pub capacity: u32,
    pub fill_rate: f64,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    pub satisfaction_rate: f64,
    pub per_type: BTreeMap<RequestType, TypeCounts>,
    pub section_fill: Vec<SectionFill>,
    pub avg_sections_per_student: f64,
    pub avg_sections_per_teacher: f64,
    pub students_per_block: BTreeMap<Block, usize>,
    pub malformed_requests: usize,
    pub uncoded_courses: usize,
    pub capacity_shortages: usize,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleRun {
    pub blocks: Vec<Block>,
    pub required_courses: BTreeMap<String, Vec<CourseCode>>,
    pub allocation: Allocation,
    pub analysis: Analysis,
}

// ---- demand audit ----

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CourseLoad {
    pub course: CourseCode,
    pub demand: usize,
    pub capacity: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RequiredCoverage {
    pub year: String,
    pub course: CourseCode,
    pub requested: usize,
    pub students: usize,
}

impl RequiredCoverage {
    pub fn is_complete(&self) -> bool {
        self.requested >= self.students
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DemandAudit {
    pub total_requests: usize,
    pub unique_students: usize,
    pub requests_by_type: BTreeMap<RequestType, usize>,
    pub students_by_year: BTreeMap<String, usize>,
    pub oversubscribed: Vec<CourseLoad>,
    pub undersubscribed: Vec<CourseLoad>,
    pub idle_courses: Vec<CourseCode>,
    pub undeclared_courses: Vec<CourseCode>,
    pub required_coverage: Vec<RequiredCoverage>,
}
