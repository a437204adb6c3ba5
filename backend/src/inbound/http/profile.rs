//! `GET /api/profile`: the caller's profile row, or JSON `null`.

use actix_web::{get, web};

use crate::domain::{Error, Profile};
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// The signed-in user's profile; `null` without a session or profile.
#[utoipa::path(
    get,
    path = "/api/profile",
    responses(
        (status = 200, description = "Profile row or null", body = Option<Profile>),
        (status = 503, description = "Storage unavailable", body = Error)
    ),
    tags = ["profile"],
    operation_id = "currentProfile"
)]
#[get("/profile")]
pub async fn current_profile(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<Option<Profile>>> {
    let Some(id) = session.user_id() else {
        return Ok(web::Json(None));
    };
    Ok(web::Json(state.accounts.profile(&id).await?))
}
