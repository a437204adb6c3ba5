//! Course catalogue and semester registrations.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;

use super::{Error, UserId};

/// Most credits a student may take in one semester.
pub const MAX_SEMESTER_CREDITS: u32 = 18;

/// Catalogue entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    #[schema(example = "CS201")]
    pub code: String,
    #[schema(example = "Data Structures and Algorithms")]
    pub name: String,
    pub credits: u32,
    pub instructor: String,
    pub schedule: String,
    pub prerequisites: Vec<String>,
    pub capacity: u32,
    pub enrolled: u32,
}

impl Course {
    /// Whether every seat is taken.
    pub fn is_full(&self) -> bool {
        self.enrolled >= self.capacity
    }
}

struct CatalogueEntry {
    code: &'static str,
    name: &'static str,
    credits: u32,
    instructor: &'static str,
    schedule: &'static str,
    prerequisites: &'static [&'static str],
    capacity: u32,
    enrolled: u32,
}

macro_rules! catalogue {
    ($( $code:literal, $name:literal, $credits:literal, $instructor:literal,
        $schedule:literal, [$($pre:literal),*], $capacity:literal, $enrolled:literal; )*) => {
        &[$(CatalogueEntry {
            code: $code,
            name: $name,
            credits: $credits,
            instructor: $instructor,
            schedule: $schedule,
            prerequisites: &[$($pre),*],
            capacity: $capacity,
            enrolled: $enrolled,
        }),*]
    };
}

const CATALOGUE: &[CatalogueEntry] = catalogue! {
    "CS201", "Data Structures and Algorithms", 4, "Dr. Smith", "Mon, Wed, Fri 10:00-11:00", ["CS101"], 50, 35;
    "CS301", "Database Management Systems", 3, "Prof. Johnson", "Tue, Thu 14:00-15:30", ["CS201"], 40, 28;
    "CS350", "Web Development", 3, "Dr. Wilson", "Mon, Wed 16:00-17:30", ["CS201"], 45, 40;
    "CS401", "Machine Learning", 4, "Dr. Brown", "Tue, Thu, Fri 11:00-12:00", ["CS301", "MATH201"], 30, 25;
    "CS302", "Software Engineering", 3, "Prof. Davis", "Wed, Fri 13:00-14:30", ["CS201"], 35, 20;
    "CS305", "Computer Networks", 3, "Dr. Garcia", "Mon, Wed 14:00-15:30", ["CS201"], 40, 32;
    "CS303", "Operating Systems", 4, "Prof. Martinez", "Tue, Thu 09:00-11:00", ["CS201", "CS202"], 45, 38;
    "CS360", "Mobile App Development", 3, "Dr. Lee", "Mon, Fri 15:00-16:30", ["CS201"], 35, 30;
    "CS370", "Cybersecurity Fundamentals", 3, "Prof. Chen", "Wed, Fri 10:00-11:30", ["CS201", "CS305"], 30, 25;
    "CS402", "Artificial Intelligence", 4, "Dr. Patel", "Tue, Thu 13:00-15:00", ["CS301", "MATH201"], 25, 22;
    "MATH101", "Calculus I", 4, "Prof. Thompson", "Mon, Wed, Fri 08:00-09:00", [], 60, 45;
    "MATH102", "Calculus II", 4, "Dr. Anderson", "Mon, Wed, Fri 09:00-10:00", ["MATH101"], 55, 40;
    "MATH201", "Linear Algebra", 3, "Prof. White", "Tue, Thu 10:00-11:30", ["MATH101"], 50, 35;
    "MATH205", "Discrete Mathematics", 3, "Dr. Kumar", "Mon, Wed 11:00-12:30", ["MATH101"], 45, 30;
    "MATH301", "Statistics", 3, "Prof. Taylor", "Tue, Thu 15:00-16:30", ["MATH102"], 40, 28;
    "PHYS101", "Physics I", 4, "Dr. Robinson", "Mon, Wed, Fri 13:00-14:00", [], 50, 42;
    "PHYS102", "Physics II", 4, "Prof. Clark", "Mon, Wed, Fri 14:00-15:00", ["PHYS101", "MATH102"], 45, 35;
    "BUS101", "Business Communication", 3, "Prof. Adams", "Tue, Thu 11:00-12:30", [], 60, 50;
    "BUS301", "Project Management", 3, "Dr. Miller", "Wed, Fri 09:00-10:30", [], 40, 32;
    "BUS350", "Entrepreneurship", 3, "Prof. Young", "Mon, Wed 17:00-18:30", [], 35, 28;
    "ENG201", "Technical Writing", 3, "Dr. Green", "Tue, Thu 16:00-17:30", [], 50, 38;
    "ENG301", "Public Speaking", 2, "Prof. Hall", "Fri 14:00-17:00", [], 25, 20;
    "ART201", "Digital Design", 3, "Dr. Parker", "Mon, Wed 12:00-13:30", [], 30, 25;
    "PHIL301", "Ethics in Technology", 3, "Prof. Lewis", "Tue, Thu 17:00-18:30", [], 40, 30;
    "RES401", "Research Methodology", 2, "Dr. Walker", "Wed 15:00-17:00", ["Junior Standing"], 20, 15;
};

/// Courses offered when the store is first initialised.
pub fn seed_catalogue() -> Vec<Course> {
    CATALOGUE
        .iter()
        .map(|entry| Course {
            code: entry.code.to_owned(),
            name: entry.name.to_owned(),
            credits: entry.credits,
            instructor: entry.instructor.to_owned(),
            schedule: entry.schedule.to_owned(),
            prerequisites: entry.prerequisites.iter().map(|p| (*p).to_owned()).collect(),
            capacity: entry.capacity,
            enrolled: entry.enrolled,
        })
        .collect()
}

/// Reasons a registration is refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistrationRejection {
    #[error("Please fill in all required fields")]
    MissingField { field: &'static str },
    #[error("Please select at least one course")]
    NoCourses,
    #[error("course {code} was selected more than once")]
    DuplicateCourse { code: String },
    #[error("course {code} is not offered")]
    UnknownCourse { code: String },
    #[error("Maximum credit limit is {max}. Current selection: {total}")]
    CreditLimit { total: u32, max: u32 },
    #[error("course {code} is full")]
    CourseFull { code: String },
    #[error("already registered for {semester} {year}")]
    AlreadyRegistered { semester: String, year: String },
}

impl RegistrationRejection {
    /// Request field the rejection refers to.
    pub fn field(&self) -> &'static str {
        match self {
            Self::MissingField { field } => *field,
            Self::NoCourses
            | Self::DuplicateCourse { .. }
            | Self::UnknownCourse { .. }
            | Self::CreditLimit { .. }
            | Self::CourseFull { .. } => "courseCodes",
            Self::AlreadyRegistered { .. } => "semester",
        }
    }

    /// Stable machine-readable reason.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingField { .. } => "missing",
            Self::NoCourses => "empty",
            Self::DuplicateCourse { .. } => "duplicate",
            Self::UnknownCourse { .. } => "unknown_course",
            Self::CreditLimit { .. } => "credit_limit",
            Self::CourseFull { .. } => "course_full",
            Self::AlreadyRegistered { .. } => "already_registered",
        }
    }
}

/// Raw registration inputs from an adapter.
#[derive(Debug, Clone, Default)]
pub struct RegistrationParts {
    pub student_id: String,
    pub student_name: String,
    pub semester: String,
    pub year: String,
    pub course_codes: Vec<String>,
}

/// Registration whose shape has been checked; catalogue checks come later.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationRequest {
    pub student_id: String,
    pub student_name: String,
    pub semester: String,
    pub year: String,
    pub course_codes: Vec<String>,
}

impl RegistrationRequest {
    /// Trim inputs, upper-case codes and reject blanks or duplicates.
    pub fn try_new(parts: RegistrationParts) -> Result<Self, RegistrationRejection> {
        let required = |value: String, field: &'static str| {
            let trimmed = value.trim().to_owned();
            if trimmed.is_empty() {
                Err(RegistrationRejection::MissingField { field })
            } else {
                Ok(trimmed)
            }
        };
        let student_id = required(parts.student_id, "studentId")?;
        let student_name = required(parts.student_name, "studentName")?;
        let semester = required(parts.semester, "semester")?;
        let year = required(parts.year, "year")?;

        let mut seen = HashSet::new();
        let mut course_codes = Vec::with_capacity(parts.course_codes.len());
        for raw in parts.course_codes {
            let code = raw.trim().to_ascii_uppercase();
            if code.is_empty() {
                continue;
            }
            if !seen.insert(code.clone()) {
                return Err(RegistrationRejection::DuplicateCourse { code });
            }
            course_codes.push(code);
        }
        if course_codes.is_empty() {
            return Err(RegistrationRejection::NoCourses);
        }
        Ok(Self {
            student_id,
            student_name,
            semester,
            year,
            course_codes,
        })
    }

    /// Resolve codes against the catalogue and enforce seat and credit limits.
    ///
    /// Returns the total credit load.
    pub fn check_against(&self, catalogue: &[Course]) -> Result<u32, RegistrationRejection> {
        let mut total = 0;
        for code in &self.course_codes {
            let course = catalogue
                .iter()
                .find(|course| &course.code == code)
                .ok_or_else(|| RegistrationRejection::UnknownCourse { code: code.clone() })?;
            if course.is_full() {
                return Err(RegistrationRejection::CourseFull { code: code.clone() });
            }
            total += course.credits;
        }
        if total > MAX_SEMESTER_CREDITS {
            return Err(RegistrationRejection::CreditLimit {
                total,
                max: MAX_SEMESTER_CREDITS,
            });
        }
        Ok(total)
    }
}

/// Values persisted for a new registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRegistration {
    pub id: Uuid,
    pub user_id: UserId,
    pub request: RegistrationRequest,
    pub total_credits: u32,
    pub created_at: DateTime<Utc>,
}

/// Stored registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CourseRegistration {
    pub id: Uuid,
    #[schema(value_type = String)]
    pub user_id: UserId,
    pub student_id: String,
    pub student_name: String,
    pub semester: String,
    pub year: String,
    pub course_codes: Vec<String>,
    pub total_credits: u32,
    pub created_at: DateTime<Utc>,
}

impl From<NewRegistration> for CourseRegistration {
    fn from(value: NewRegistration) -> Self {
        Self {
            id: value.id,
            user_id: value.user_id,
            student_id: value.request.student_id,
            student_name: value.request.student_name,
            semester: value.request.semester,
            year: value.request.year,
            course_codes: value.request.course_codes,
            total_credits: value.total_credits,
            created_at: value.created_at,
        }
    }
}

impl From<RegistrationRejection> for Error {
    fn from(rejection: RegistrationRejection) -> Self {
        Self::invalid_request(rejection.to_string()).with_details(json!({
            "field": rejection.field(),
            "code": rejection.code(),
        }))
    }
}
