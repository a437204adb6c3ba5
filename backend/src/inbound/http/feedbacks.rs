//! Feedback handlers.
//!
//! ```text
//! GET  /api/feedbacks
//! POST /api/feedbacks {"content":{...},"attachmentUrl":"/uploads/..."}
//! PUT  /api/feedbacks/{id} {"content":{...}}
//! GET  /api/feedbacks/analysis
//! GET  /api/feedbacks/instructor?instructor=Dr.%20Rao
//! GET  /api/feedbacks/students/{student_id}
//! ```

use actix_web::{get, post, put, web};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{Error, Feedback, FeedbackAnalysis, FeedbackContent, FeedbackPatch};
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, missing_field_error, parse_feedback_id, parse_user_id,
};

const CONTENT: FieldName = FieldName::new("content");
const ID: FieldName = FieldName::new("id");
const STUDENT_ID: FieldName = FieldName::new("student_id");

/// Submission body; `content` may be an object or a JSON string.
#[derive(Debug, Default, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackBody {
    #[schema(value_type = Option<FeedbackContent>)]
    pub content: Option<Value>,
    #[schema(example = "/uploads/1700000000000-notes.pdf")]
    pub attachment_url: Option<String>,
}

impl FeedbackBody {
    fn patch(self) -> Result<FeedbackPatch, Error> {
        let content = self
            .content
            .filter(|value| !value.is_null())
            .map(FeedbackContent::from_value)
            .transpose()?;
        Ok(FeedbackPatch {
            content,
            attachment_url: self.attachment_url,
        })
    }
}

/// Query for the instructor view.
#[derive(Debug, Default, Deserialize)]
pub struct InstructorQuery {
    pub instructor: Option<String>,
}

/// `{count}` of rows a write touched.
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct CountResponse {
    pub count: usize,
}

/// Feedback visible to the caller, newest first; `[]` without a session.
#[utoipa::path(
    get,
    path = "/api/feedbacks",
    responses(
        (status = 200, description = "Visible feedback", body = [Feedback]),
        (status = 503, description = "Storage unavailable", body = Error)
    ),
    tags = ["feedbacks"],
    operation_id = "listFeedbacks"
)]
#[get("/feedbacks")]
pub async fn list_feedbacks(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<Vec<Feedback>>> {
    let Some(caller) = session.user_id() else {
        return Ok(web::Json(Vec::new()));
    };
    Ok(web::Json(state.feedback_query.visible_to(&caller).await?))
}

/// Store a validated submission owned by the caller.
#[utoipa::path(
    post,
    path = "/api/feedbacks",
    request_body = FeedbackBody,
    responses(
        (status = 200, description = "Stored feedback", body = Feedback),
        (status = 400, description = "Invalid content", body = Error),
        (status = 401, description = "No session", body = Error)
    ),
    tags = ["feedbacks"],
    operation_id = "createFeedback"
)]
#[post("/feedbacks")]
pub async fn create_feedback(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<FeedbackBody>,
) -> ApiResult<web::Json<Feedback>> {
    let caller = session.require_user_id()?;
    let FeedbackBody {
        content,
        attachment_url,
    } = payload.into_inner();
    let content = content
        .filter(|value| !value.is_null())
        .ok_or_else(|| missing_field_error(CONTENT))?;
    let content = FeedbackContent::from_value(content)?;
    let stored = state
        .feedback
        .submit(&caller, content, attachment_url)
        .await?;
    Ok(web::Json(stored))
}

/// Amend one of the caller's submissions.
#[utoipa::path(
    put,
    path = "/api/feedbacks/{id}",
    params(("id" = String, Path, description = "Feedback id")),
    request_body = FeedbackBody,
    responses(
        (status = 200, description = "Rows updated; 0 when not owned", body = CountResponse),
        (status = 400, description = "Malformed id, content or empty update", body = Error),
        (status = 401, description = "No session", body = Error)
    ),
    tags = ["feedbacks"],
    operation_id = "updateFeedback"
)]
#[put("/feedbacks/{id}")]
pub async fn update_feedback(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<FeedbackBody>,
) -> ApiResult<web::Json<CountResponse>> {
    let caller = session.require_user_id()?;
    let id = parse_feedback_id(&path.into_inner(), ID)?;
    let patch = payload.into_inner().patch()?;
    let count = state.feedback.amend(&caller, id, patch).await?;
    Ok(web::Json(CountResponse { count }))
}

/// Ratings grouped by course and instructor, for staff.
#[utoipa::path(
    get,
    path = "/api/feedbacks/analysis",
    responses(
        (status = 200, description = "Grouped averages", body = FeedbackAnalysis),
        (status = 401, description = "No session", body = Error),
        (status = 403, description = "Caller is not faculty or admin", body = Error)
    ),
    tags = ["feedbacks"],
    operation_id = "feedbackAnalysis"
)]
#[get("/feedbacks/analysis")]
pub async fn feedback_analysis(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<FeedbackAnalysis>> {
    let caller = session.require_user_id()?;
    Ok(web::Json(state.feedback_query.analysis(&caller).await?))
}

/// Submissions naming an instructor, narrowed to that instructor's entries.
#[utoipa::path(
    get,
    path = "/api/feedbacks/instructor",
    params((
        "instructor" = Option<String>,
        Query,
        description = "Name matched loosely against each entry; defaults to the caller's profile name"
    )),
    responses(
        (status = 200, description = "Matching feedback, newest first", body = [Feedback]),
        (status = 400, description = "No instructor name to match", body = Error),
        (status = 401, description = "No session", body = Error),
        (status = 403, description = "Caller is not faculty or admin", body = Error)
    ),
    tags = ["feedbacks"],
    operation_id = "instructorFeedback"
)]
#[get("/feedbacks/instructor")]
pub async fn instructor_feedback(
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<InstructorQuery>,
) -> ApiResult<web::Json<Vec<Feedback>>> {
    let caller = session.require_user_id()?;
    let InstructorQuery { instructor } = query.into_inner();
    Ok(web::Json(
        state.feedback_query.for_instructor(&caller, instructor).await?,
    ))
}

/// One student's submissions; students may only read their own.
#[utoipa::path(
    get,
    path = "/api/feedbacks/students/{student_id}",
    params(("student_id" = String, Path, description = "Student user id")),
    responses(
        (status = 200, description = "The student's feedback, newest first", body = [Feedback]),
        (status = 400, description = "Malformed id", body = Error),
        (status = 401, description = "No session", body = Error),
        (status = 403, description = "Another student's feedback", body = Error)
    ),
    tags = ["feedbacks"],
    operation_id = "studentFeedback"
)]
#[get("/feedbacks/students/{student_id}")]
pub async fn student_feedback(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<Vec<Feedback>>> {
    let caller = session.require_user_id()?;
    let student = parse_user_id(&path.into_inner(), STUDENT_ID)?;
    Ok(web::Json(
        state.feedback_query.by_student(&caller, &student).await?,
    ))
}
