//! Per course/instructor aggregation of star ratings.
//!
//! Submissions are grouped by `"{courseCode or 'unknown'}|{trimmed name}"`.
//! Stored documents are read leniently: entries that fail to parse are
//! skipped, and missing ratings count as zero.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;
use utoipa::ToSchema;

use super::feedback::content_document;
use super::{FEEDBACK_QUESTIONS, QUESTION_COUNT};

/// Ratings summary for one course/instructor pair.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InstructorRatingSummary {
    #[schema(example = "CS201|Dr. Smith")]
    pub key: String,
    pub course_code: Option<String>,
    pub instructor_name: String,
    pub responses: usize,
    /// Mean rating per question, rounded to two decimals.
    pub question_averages: Vec<f64>,
    /// Mean over every rating in the group, rounded to two decimals.
    pub overall_average: f64,
}

/// Analysis report returned to staff dashboards.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackAnalysis {
    pub questions: Vec<String>,
    pub groups: Vec<InstructorRatingSummary>,
}

#[derive(Default)]
struct Accumulator {
    course_code: Option<String>,
    name: String,
    responses: usize,
    sums: [u64; QUESTION_COUNT],
}

fn text_field<'a>(entry: &'a Value, key: &str) -> &'a str {
    entry.get(key).and_then(Value::as_str).unwrap_or_default()
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Group ratings from stored feedback documents.
///
/// Groups are ordered by key; a group only exists once it has a response.
pub fn analyse_feedback<'a>(contents: impl IntoIterator<Item = &'a Value>) -> FeedbackAnalysis {
    let mut groups: BTreeMap<String, Accumulator> = BTreeMap::new();
    for document in contents.into_iter().filter_map(content_document) {
        let Some(entries) = document.get("instructors").and_then(Value::as_array) else {
            continue;
        };
        for entry in entries {
            let code = text_field(entry, "courseCode");
            let name = text_field(entry, "name").trim();
            let key_code = if code.is_empty() { "unknown" } else { code };
            let key = format!("{key_code}|{name}");
            let group = groups.entry(key).or_insert_with(|| Accumulator {
                course_code: Some(code.to_owned()).filter(|c| !c.is_empty()),
                name: name.to_owned(),
                ..Accumulator::default()
            });
            group.responses += 1;
            let ratings = entry.get("ratings").and_then(Value::as_array);
            for (question, sum) in group.sums.iter_mut().enumerate() {
                let rating = ratings
                    .and_then(|values| values.get(question))
                    .and_then(Value::as_u64)
                    .unwrap_or(0);
                *sum += rating;
            }
        }
    }

    let groups = groups
        .into_iter()
        .map(|(key, group)| summarise(key, group))
        .collect();
    FeedbackAnalysis {
        questions: FEEDBACK_QUESTIONS.iter().map(|q| (*q).to_owned()).collect(),
        groups,
    }
}

#[expect(
    clippy::cast_precision_loss,
    reason = "rating sums and response counts are far below 2^52"
)]
fn summarise(key: String, group: Accumulator) -> InstructorRatingSummary {
    let responses = group.responses as f64;
    let question_averages = group
        .sums
        .iter()
        .map(|sum| round2(*sum as f64 / responses))
        .collect();
    let total: u64 = group.sums.iter().sum();
    let overall_average = round2(total as f64 / (responses * QUESTION_COUNT as f64));
    InstructorRatingSummary {
        key,
        course_code: group.course_code,
        instructor_name: group.name,
        responses: group.responses,
        question_averages,
        overall_average,
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn entry(code: &str, name: &str, rating: u8) -> Value {
        json!({"courseCode": code, "name": name, "ratings": vec![rating; QUESTION_COUNT]})
    }

    #[rstest]
    fn groups_by_code_and_trimmed_name() {
        let first = json!({"instructors": [entry("CS201", "Dr. Smith", 5)]});
        let second = json!({"instructors": [entry("CS201", " Dr. Smith ", 4)]});
        let report = analyse_feedback([&first, &second]);

        assert_eq!(report.groups.len(), 1);
        let group = &report.groups[0];
        assert_eq!(group.key, "CS201|Dr. Smith");
        assert_eq!(group.responses, 2);
        assert_eq!(group.question_averages, vec![4.5; QUESTION_COUNT]);
        assert!((group.overall_average - 4.5).abs() < f64::EPSILON);
    }

    #[rstest]
    fn rounds_to_two_decimals() {
        let docs: Vec<Value> = [5, 4, 4]
            .into_iter()
            .map(|r| json!({"instructors": [entry("MATH101", "Prof. Thompson", r)]}))
            .collect();
        let report = analyse_feedback(&docs);
        assert_eq!(report.groups[0].question_averages[0], 4.33);
    }

    #[rstest]
    fn reads_stringified_documents_and_skips_garbage() {
        let stringified = Value::String(
            json!({"instructors": [entry("CS301", "Prof. Johnson", 3)]}).to_string(),
        );
        let garbage = Value::String("{not json".to_owned());
        let number = json!(42);
        let report = analyse_feedback([&stringified, &garbage, &number]);
        assert_eq!(report.groups.len(), 1);
        assert_eq!(report.groups[0].responses, 1);
    }

    #[rstest]
    fn missing_codes_and_ratings_fall_back() {
        let doc = json!({"instructors": [{"name": "Dr. Lee", "ratings": [5, 5]}]});
        let report = analyse_feedback([&doc]);
        let group = &report.groups[0];
        assert_eq!(group.key, "unknown|Dr. Lee");
        assert_eq!(group.course_code, None);
        assert_eq!(group.question_averages[0], 5.0);
        assert_eq!(group.question_averages[2], 0.0);
    }

    #[rstest]
    fn sorts_groups_by_key() {
        let doc = json!({"instructors": [
            entry("MATH101", "Prof. Thompson", 3),
            entry("CS201", "Dr. Smith", 4),
        ]});
        let report = analyse_feedback([&doc]);
        let keys: Vec<_> = report.groups.iter().map(|g| g.key.as_str()).collect();
        assert_eq!(keys, ["CS201|Dr. Smith", "MATH101|Prof. Thompson"]);
        assert_eq!(report.questions.len(), QUESTION_COUNT);
    }

    #[rstest]
    fn empty_input_has_no_groups() {
        let report = analyse_feedback(std::iter::empty::<&Value>());
        assert!(report.groups.is_empty());
    }
}
