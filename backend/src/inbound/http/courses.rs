//! Course catalogue and semester registration.
//!
//! ```text
//! GET  /api/courses
//! GET  /api/courses/registrations
//! POST /api/courses/registrations {"studentId":"b22cs001","semester":"Fall","year":"2025","courseCodes":["CS201"]}
//! ```

use actix_web::{get, post, web};
use serde::{Deserialize, Serialize};

use crate::domain::{Course, CourseRegistration, Error, RegistrationParts, RegistrationRequest};
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Registration form; blank or absent fields are reported together.
#[derive(Debug, Default, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationBody {
    #[schema(example = "b22cs001")]
    pub student_id: Option<String>,
    pub student_name: Option<String>,
    #[schema(example = "Fall")]
    pub semester: Option<String>,
    #[schema(example = "2025")]
    pub year: Option<String>,
    #[serde(default)]
    pub course_codes: Vec<String>,
}

impl From<RegistrationBody> for RegistrationParts {
    fn from(body: RegistrationBody) -> Self {
        Self {
            student_id: body.student_id.unwrap_or_default(),
            student_name: body.student_name.unwrap_or_default(),
            semester: body.semester.unwrap_or_default(),
            year: body.year.unwrap_or_default(),
            course_codes: body.course_codes,
        }
    }
}

/// Catalogue sorted by course code.
#[utoipa::path(
    get,
    path = "/api/courses",
    responses(
        (status = 200, description = "Course catalogue", body = [Course]),
        (status = 503, description = "Storage unavailable", body = Error)
    ),
    tags = ["courses"],
    operation_id = "listCourses"
)]
#[get("/courses")]
pub async fn list_courses(state: web::Data<HttpState>) -> ApiResult<web::Json<Vec<Course>>> {
    Ok(web::Json(state.courses_query.catalogue().await?))
}

/// The caller's registrations, newest first.
#[utoipa::path(
    get,
    path = "/api/courses/registrations",
    responses(
        (status = 200, description = "Registrations", body = [CourseRegistration]),
        (status = 401, description = "No session", body = Error)
    ),
    tags = ["courses"],
    operation_id = "listRegistrations"
)]
#[get("/courses/registrations")]
pub async fn list_registrations(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<Vec<CourseRegistration>>> {
    let caller = session.require_user_id()?;
    Ok(web::Json(state.courses_query.registrations(&caller).await?))
}

/// Register for a semester's courses, taking a seat in each.
#[utoipa::path(
    post,
    path = "/api/courses/registrations",
    request_body = RegistrationBody,
    responses(
        (status = 200, description = "Stored registration", body = CourseRegistration),
        (status = 400, description = "Incomplete form, unknown or full course, credit limit or repeat term", body = Error),
        (status = 401, description = "No session", body = Error)
    ),
    tags = ["courses"],
    operation_id = "registerCourses"
)]
#[post("/courses/registrations")]
pub async fn register(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<RegistrationBody>,
) -> ApiResult<web::Json<CourseRegistration>> {
    let caller = session.require_user_id()?;
    let request = RegistrationRequest::try_new(payload.into_inner().into())?;
    Ok(web::Json(state.courses.register(&caller, request).await?))
}
