//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers every REST endpoint, the domain types they exchange
//! and the session cookie security scheme. Swagger UI serves it in debug
//! builds and `cargo run --bin openapi-dump` prints it for external tooling.

use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::domain::{
    Course, CourseRegistration, DataRequest, Error, ErrorCode, Feedback, FeedbackAnalysis,
    FeedbackContent, InstructorFeedback, InstructorRatingSummary, Profile, Role, User,
};
use crate::inbound::http::session_config::SESSION_COOKIE_NAME;

/// Enrich the generated document with the session cookie security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                SESSION_COOKIE_NAME,
                "Encrypted session cookie issued by POST /api/auth/signup or /api/auth/signin.",
            ))),
        );
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "College portal API",
        description = "Accounts, course feedback, course registration and the dashboard table proxy."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("SessionCookie" = [])),
    paths(
        crate::inbound::http::auth::sign_up,
        crate::inbound::http::auth::sign_in,
        crate::inbound::http::auth::sign_out,
        crate::inbound::http::auth::current_user,
        crate::inbound::http::profile::current_profile,
        crate::inbound::http::feedbacks::list_feedbacks,
        crate::inbound::http::feedbacks::create_feedback,
        crate::inbound::http::feedbacks::update_feedback,
        crate::inbound::http::feedbacks::feedback_analysis,
        crate::inbound::http::feedbacks::instructor_feedback,
        crate::inbound::http::feedbacks::student_feedback,
        crate::inbound::http::functions::send_otp,
        crate::inbound::http::functions::verify_otp,
        crate::inbound::http::functions::submit_hash,
        crate::inbound::http::storage::upload,
        crate::inbound::http::storage::serve_upload,
        crate::inbound::http::db::proxy,
        crate::inbound::http::courses::list_courses,
        crate::inbound::http::courses::list_registrations,
        crate::inbound::http::courses::register,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        Error,
        ErrorCode,
        User,
        Profile,
        Role,
        Feedback,
        FeedbackContent,
        InstructorFeedback,
        FeedbackAnalysis,
        InstructorRatingSummary,
        Course,
        CourseRegistration,
        DataRequest,
    )),
    tags(
        (name = "auth", description = "Sign-up, sign-in and the session user"),
        (name = "profile", description = "The caller's profile"),
        (name = "feedbacks", description = "Course feedback and its analysis"),
        (name = "functions", description = "OTP delivery and payload hashing"),
        (name = "storage", description = "Feedback attachments"),
        (name = "db", description = "Table proxy used by the dashboards"),
        (name = "courses", description = "Catalogue and semester registration"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
