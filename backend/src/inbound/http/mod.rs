//! HTTP inbound adapter exposing the portal's REST endpoints.

pub mod auth;
pub mod courses;
pub mod db;
pub mod error;
pub mod feedbacks;
pub mod functions;
pub mod health;
pub mod profile;
pub mod session;
pub mod session_config;
pub mod state;
pub mod storage;
#[cfg(test)]
pub mod test_utils;
pub(crate) mod validation;

use actix_web::web;

pub use error::{ApiResult, json_config, path_config};

/// Register every portal route: the `/api` scope and `/uploads`.
///
/// Callers provide the session middleware, [`state::HttpState`] and the
/// extractor configs.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .service(auth::sign_up)
            .service(auth::sign_in)
            .service(auth::sign_out)
            .service(auth::current_user)
            .service(profile::current_profile)
            .service(feedbacks::list_feedbacks)
            .service(feedbacks::feedback_analysis)
            .service(feedbacks::instructor_feedback)
            .service(feedbacks::student_feedback)
            .service(feedbacks::create_feedback)
            .service(feedbacks::update_feedback)
            .service(functions::send_otp)
            .service(functions::verify_otp)
            .service(functions::submit_hash)
            .service(storage::upload)
            .service(db::proxy)
            .service(courses::list_courses)
            .service(courses::list_registrations)
            .service(courses::register),
    )
    .service(storage::serve_upload);
}
