//! Mid-term instructor feedback: the fixed questionnaire and its submissions.
//!
//! A submission stores one content document holding up to seven
//! course/instructor entries, each rated on the same nineteen questions.
//! Content is validated on every write; rows written before validation existed
//! are still readable because [`Feedback::content`] keeps the stored JSON.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use utoipa::ToSchema;
use uuid::Uuid;

use super::{Error, UserId};

/// Questionnaire shown for every instructor, in order.
pub const FEEDBACK_QUESTIONS: [&str; 19] = [
    "Ability to plan and organize the classroom or lab periods",
    "Enthusiasm in the class",
    "Communication ability",
    "Treatment of the students",
    "Attitude to listening or responding to student's questions and efforts to answer them completely",
    "Knowledge of the subject",
    "Efforts to make difficult ideas clear without distorting or over simplifying them",
    "Efforts to emphasize the importance of the course material and to make it interesting",
    "Efforts to encourage student participation in the class",
    "Fairness in evaluating student performance and awarding grades",
    "Ability for consultation during the hours fixed for it and by appointment",
    "Regularity and punctuality in attendance",
    "Regularity in taking analytical responses from students",
    "Coverage of the syllabus",
    "Ability to complete the course on time",
    "Ability for and eagerness in providing sufficient books, reference and study materials",
    "Enthusiasm for discussing and solving problems on a regular basis",
    "What is your overall rating of this instructor?",
    "Not considering your instructor, but only the course and course material, what is your overall rating of this course?",
];

/// Number of rated questions per instructor.
pub const QUESTION_COUNT: usize = FEEDBACK_QUESTIONS.len();
/// Most course/instructor entries a single submission may hold.
pub const MAX_INSTRUCTORS: usize = 7;
/// Longest accepted comment, in characters.
pub const MAX_COMMENT_CHARS: usize = 2000;
/// Star rating bounds.
pub const RATING_RANGE: std::ops::RangeInclusive<u8> = 1..=5;

/// Reasons a feedback document is refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FeedbackValidationError {
    #[error("feedback content is not a valid document: {message}")]
    Malformed { message: String },
    #[error("feedback needs at least one course code and instructor name")]
    NoInstructors,
    #[error("feedback may list at most {max} instructors")]
    TooManyInstructors { max: usize },
    #[error("instructor {index} must have {expected} ratings, found {found}")]
    RatingCount {
        index: usize,
        expected: usize,
        found: usize,
    },
    #[error("instructor {index} question {question} must be rated 1 to 5")]
    RatingOutOfRange { index: usize, question: usize },
    #[error("instructor {index} comments must not exceed {max} characters")]
    CommentTooLong { index: usize, max: usize },
}

impl FeedbackValidationError {
    /// Stable machine-readable reason.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Malformed { .. } => "malformed",
            Self::NoInstructors => "no_instructors",
            Self::TooManyInstructors { .. } => "too_many_instructors",
            Self::RatingCount { .. } => "rating_count",
            Self::RatingOutOfRange { .. } => "rating_range",
            Self::CommentTooLong { .. } => "comment_length",
        }
    }
}

/// One course/instructor entry inside a submission.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InstructorFeedback {
    #[serde(default)]
    #[schema(example = "CS201")]
    pub course_code: String,
    #[serde(default)]
    #[schema(example = "Dr. Smith")]
    pub name: String,
    #[serde(default)]
    pub ratings: Vec<u8>,
    #[serde(default)]
    pub comments_instructor: String,
    #[serde(default)]
    pub comments_course: String,
}

impl InstructorFeedback {
    fn is_blank(&self) -> bool {
        self.course_code.trim().is_empty() && self.name.trim().is_empty()
    }

    fn is_identified(&self) -> bool {
        !self.course_code.trim().is_empty() && !self.name.trim().is_empty()
    }

    fn check(&self, index: usize) -> Result<(), FeedbackValidationError> {
        if self.ratings.len() != QUESTION_COUNT {
            return Err(FeedbackValidationError::RatingCount {
                index,
                expected: QUESTION_COUNT,
                found: self.ratings.len(),
            });
        }
        if let Some(question) = self
            .ratings
            .iter()
            .position(|rating| !RATING_RANGE.contains(rating))
        {
            return Err(FeedbackValidationError::RatingOutOfRange {
                index,
                question: question + 1,
            });
        }
        let too_long = |text: &str| text.chars().count() > MAX_COMMENT_CHARS;
        if too_long(&self.comments_instructor) || too_long(&self.comments_course) {
            return Err(FeedbackValidationError::CommentTooLong {
                index,
                max: MAX_COMMENT_CHARS,
            });
        }
        Ok(())
    }
}

/// Validated feedback document.
///
/// # Examples
/// ```
/// use portal::domain::FeedbackContent;
/// use serde_json::json;
///
/// let raw = json!({
///     "programme": "B.Tech",
///     "instructors": [
///         {"courseCode": "CS201", "name": "Dr. Smith", "ratings": vec![4; 19]},
///         {"courseCode": "", "name": "", "ratings": []}
///     ]
/// });
/// let content = FeedbackContent::from_value(raw).unwrap();
/// assert_eq!(content.instructors.len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackContent {
    #[serde(default)]
    #[schema(example = "B.Tech")]
    pub programme: String,
    #[serde(default)]
    #[schema(example = "CS")]
    pub department: String,
    #[serde(default)]
    #[schema(example = "1st")]
    pub semester: String,
    #[serde(default)]
    pub instructors: Vec<InstructorFeedback>,
}

impl FeedbackContent {
    /// Parse and validate a document.
    ///
    /// Accepts either a JSON object or a string holding serialised JSON, since
    /// older clients send the document pre-stringified.
    pub fn from_value(value: Value) -> Result<Self, FeedbackValidationError> {
        let value = match value {
            Value::String(text) => serde_json::from_str(&text).map_err(malformed)?,
            other => other,
        };
        let content: Self = serde_json::from_value(value).map_err(malformed)?;
        content.validated()
    }

    /// Drop blank entries and enforce the questionnaire rules.
    pub fn validated(mut self) -> Result<Self, FeedbackValidationError> {
        if self.instructors.len() > MAX_INSTRUCTORS {
            return Err(FeedbackValidationError::TooManyInstructors {
                max: MAX_INSTRUCTORS,
            });
        }
        self.instructors.retain(|entry| !entry.is_blank());
        if !self.instructors.iter().any(InstructorFeedback::is_identified) {
            return Err(FeedbackValidationError::NoInstructors);
        }
        for (index, entry) in self.instructors.iter_mut().enumerate() {
            entry.check(index + 1)?;
            entry.course_code = entry.course_code.trim().to_owned();
            entry.name = entry.name.trim().to_owned();
        }
        Ok(self)
    }

    /// Stored JSON form.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

fn malformed(err: serde_json::Error) -> FeedbackValidationError {
    FeedbackValidationError::Malformed {
        message: err.to_string(),
    }
}

/// Feedback row identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
#[schema(value_type = String, example = "3fa85f64-5717-4562-b3fc-2c963f66afa6")]
pub struct FeedbackId(Uuid);

impl FeedbackId {
    /// Parse a textual identifier.
    pub fn parse(raw: &str) -> Result<Self, uuid::Error> {
        Uuid::parse_str(raw.trim()).map(Self)
    }

    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for FeedbackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Stored feedback row, serialised with snake_case column names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Feedback {
    pub id: FeedbackId,
    #[schema(value_type = String)]
    pub user_id: UserId,
    #[schema(value_type = Object)]
    pub content: Value,
    pub attachment_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Parse stored content, which older rows may hold as a JSON string.
pub(crate) fn content_document(content: &Value) -> Option<Value> {
    match content {
        Value::String(text) => serde_json::from_str(text).ok(),
        Value::Object(_) => Some(content.clone()),
        _ => None,
    }
}

/// Whether an entry's instructor name refers to `instructor`.
///
/// Names compare case-insensitively and match when either contains the
/// other. Blank names never match.
pub fn instructor_matches(entry_name: &str, instructor: &str) -> bool {
    let entry_name = entry_name.trim().to_lowercase();
    let instructor = instructor.trim().to_lowercase();
    if entry_name.is_empty() || instructor.is_empty() {
        return false;
    }
    entry_name.contains(&instructor) || instructor.contains(&entry_name)
}

impl Feedback {
    /// This submission narrowed to the entries naming `instructor`.
    ///
    /// Returns `None` when no entry does.
    pub fn for_instructor(&self, instructor: &str) -> Option<Self> {
        let mut document = content_document(&self.content)?;
        let entries = document.get_mut("instructors")?.as_array_mut()?;
        entries.retain(|entry| {
            entry
                .get("name")
                .and_then(Value::as_str)
                .is_some_and(|name| instructor_matches(name, instructor))
        });
        if entries.is_empty() {
            return None;
        }
        Some(Self {
            content: document,
            ..self.clone()
        })
    }
}

/// Values for a new submission.
#[derive(Debug, Clone, PartialEq)]
pub struct NewFeedback {
    pub user_id: UserId,
    pub content: FeedbackContent,
    pub attachment_url: Option<String>,
}

impl NewFeedback {
    /// Build the stored row, with both timestamps set to `now`.
    pub fn into_feedback(self, id: FeedbackId, now: DateTime<Utc>) -> Feedback {
        Feedback {
            id,
            user_id: self.user_id,
            content: self.content.to_value(),
            attachment_url: self.attachment_url,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update to a submission. Absent fields are left untouched.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeedbackPatch {
    pub content: Option<FeedbackContent>,
    pub attachment_url: Option<String>,
}

impl FeedbackPatch {
    pub fn is_empty(&self) -> bool {
        self.content.is_none() && self.attachment_url.is_none()
    }

    /// Apply the patch to an existing row.
    pub fn apply_to(&self, feedback: &mut Feedback, now: DateTime<Utc>) {
        if let Some(content) = &self.content {
            feedback.content = content.to_value();
        }
        if let Some(url) = &self.attachment_url {
            feedback.attachment_url = Some(url.clone());
        }
        feedback.updated_at = now;
    }
}

/// Which submissions a caller may read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedbackScope {
    /// Every submission (faculty and admins).
    All,
    /// Only the caller's own submissions.
    OwnedBy(UserId),
}

impl From<FeedbackValidationError> for Error {
    fn from(error: FeedbackValidationError) -> Self {
        Self::invalid_request(error.to_string()).with_details(json!({
            "field": "content",
            "code": error.code(),
        }))
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::{fixture, rstest};
    use serde_json::json;

    #[fixture]
    fn entry() -> Value {
        json!({
            "courseCode": " CS201 ",
            "name": "Dr. Smith ",
            "ratings": vec![5; QUESTION_COUNT],
            "commentsInstructor": "Clear lectures",
            "commentsCourse": ""
        })
    }

    #[rstest]
    fn accepts_stringified_documents(entry: Value) {
        let raw = json!({"programme": "B.Tech", "instructors": [entry]}).to_string();
        let content = FeedbackContent::from_value(Value::String(raw)).expect("valid content");
        assert_eq!(content.programme, "B.Tech");
        assert_eq!(content.instructors[0].course_code, "CS201");
        assert_eq!(content.instructors[0].name, "Dr. Smith");
    }

    #[rstest]
    fn drops_blank_entries(entry: Value) {
        let blank = json!({"courseCode": " ", "name": "", "ratings": [0, 0]});
        let content = FeedbackContent::from_value(json!({"instructors": [blank, entry]}))
            .expect("valid content");
        assert_eq!(content.instructors.len(), 1);
    }

    #[rstest]
    fn requires_an_identified_instructor() {
        let blank = json!({"courseCode": "", "name": "", "ratings": []});
        let err = FeedbackContent::from_value(json!({"instructors": [blank]}))
            .expect_err("blank feedback must fail");
        assert_eq!(err, FeedbackValidationError::NoInstructors);
    }

    #[rstest]
    fn caps_instructor_count(entry: Value) {
        let entries = vec![entry; MAX_INSTRUCTORS + 1];
        let err = FeedbackContent::from_value(json!({"instructors": entries}))
            .expect_err("too many instructors");
        assert_eq!(err.code(), "too_many_instructors");
    }

    #[rstest]
    #[case(vec![5; 18], "rating_count")]
    #[case(vec![5; 20], "rating_count")]
    #[case({ let mut r = vec![5; 19]; r[3] = 0; r }, "rating_range")]
    #[case({ let mut r = vec![5; 19]; r[18] = 6; r }, "rating_range")]
    fn enforces_ratings(mut entry: Value, #[case] ratings: Vec<u8>, #[case] code: &str) {
        entry["ratings"] = json!(ratings);
        let err = FeedbackContent::from_value(json!({"instructors": [entry]}))
            .expect_err("ratings must be checked");
        assert_eq!(err.code(), code);
    }

    #[rstest]
    fn reports_the_first_unrated_question(mut entry: Value) {
        let mut ratings = vec![3; QUESTION_COUNT];
        ratings[6] = 0;
        entry["ratings"] = json!(ratings);
        let err = FeedbackContent::from_value(json!({"instructors": [entry]}))
            .expect_err("unrated question");
        assert_eq!(
            err,
            FeedbackValidationError::RatingOutOfRange {
                index: 1,
                question: 7
            }
        );
    }

    #[rstest]
    fn caps_comment_length(mut entry: Value) {
        entry["commentsCourse"] = json!("é".repeat(MAX_COMMENT_CHARS + 1));
        let err = FeedbackContent::from_value(json!({"instructors": [entry]}))
            .expect_err("comment too long");
        assert_eq!(err.code(), "comment_length");
    }

    #[rstest]
    fn rejects_non_documents() {
        let err = FeedbackContent::from_value(json!("not json")).expect_err("garbage");
        assert_eq!(err.code(), "malformed");
    }

    #[rstest]
    fn questionnaire_ends_with_overall_ratings() {
        assert_eq!(QUESTION_COUNT, 19);
        assert!(FEEDBACK_QUESTIONS[17].contains("overall rating of this instructor"));
        assert!(FEEDBACK_QUESTIONS[18].contains("overall rating of this course"));
    }

    #[rstest]
    #[case("Dr. Smith", "dr. smith", true)]
    #[case("Dr. Smith", "Smith", true)]
    #[case("Smith", "Dr. Smith", true)]
    #[case(" Dr. Rao ", "Dr. Smith", false)]
    #[case("", "Dr. Smith", false)]
    #[case("Dr. Smith", "  ", false)]
    fn instructor_names_match_loosely(
        #[case] entry_name: &str,
        #[case] instructor: &str,
        #[case] expected: bool,
    ) {
        assert_eq!(instructor_matches(entry_name, instructor), expected);
    }

    fn stored(content: Value) -> Feedback {
        let now = Utc::now();
        Feedback {
            id: FeedbackId::random(),
            user_id: UserId::random(),
            content,
            attachment_url: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[rstest]
    fn narrows_a_submission_to_one_instructor(entry: Value) {
        let other = json!({"courseCode": "MA201", "name": "Dr. Rao", "ratings": []});
        let feedback = stored(json!({"programme": "B.Tech", "instructors": [entry, other.clone()]}));

        let narrowed = feedback.for_instructor("dr. rao").expect("entry for Dr. Rao");
        assert_eq!(narrowed.id, feedback.id);
        assert_eq!(narrowed.content["programme"], "B.Tech");
        assert_eq!(narrowed.content["instructors"], json!([other]));
    }

    #[rstest]
    fn narrowing_reads_stringified_content(entry: Value) {
        let raw = json!({"instructors": [entry]}).to_string();
        let feedback = stored(Value::String(raw));

        let narrowed = feedback.for_instructor("Smith").expect("entry for Smith");
        assert!(narrowed.content.is_object());
        assert!(feedback.for_instructor("Dr. Rao").is_none());
    }
}
