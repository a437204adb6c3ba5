//! Account handlers.
//!
//! ```text
//! POST /api/auth/signup {"email":"asha@nitm.ac.in","password":"password123"}
//! POST /api/auth/signin {"email":"asha@nitm.ac.in","password":"password123"}
//! POST /api/auth/signout
//! GET  /api/auth/user
//! ```

use std::str::FromStr;

use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use crate::domain::{
    Error, NewProfile, Role, SignInCredentials, SignUpParts, SignUpRequest, User,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Sign-up body. Only `email` and `password` are required.
#[derive(Debug, Default, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignUpBody {
    #[schema(example = "asha@nitm.ac.in")]
    pub email: Option<String>,
    #[schema(example = "password123")]
    pub password: Option<String>,
    pub name: Option<String>,
    #[schema(example = "student")]
    pub role: Option<String>,
    pub department: Option<String>,
    pub roll_number: Option<String>,
    pub faculty_id: Option<String>,
    pub admin_id: Option<String>,
    #[schema(example = "123456")]
    pub otp_code: Option<String>,
}

impl SignUpBody {
    fn profile(&self) -> Result<NewProfile, Error> {
        let role = match self.role.as_deref().map(str::trim) {
            None | Some("") => Role::default(),
            Some(raw) => Role::from_str(raw).map_err(|err| {
                Error::invalid_request(err.to_string())
                    .with_details(json!({ "field": "role", "code": "unknown_role" }))
            })?,
        };
        Ok(NewProfile {
            name: self.name.clone(),
            role,
            department: self.department.clone(),
            roll_number: self.roll_number.clone(),
            faculty_id: self.faculty_id.clone(),
            admin_id: self.admin_id.clone(),
            ..NewProfile::default()
        })
    }
}

/// Sign-in body.
#[derive(Debug, Default, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignInBody {
    #[schema(example = "asha@nitm.ac.in")]
    pub email: Option<String>,
    #[schema(example = "password123")]
    pub password: Option<String>,
}

/// `{user: {id, email}}` returned after sign-up and sign-in.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct UserEnvelope {
    pub user: User,
}

/// `{ok: true}` acknowledgement.
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct OkResponse {
    pub ok: bool,
}

impl OkResponse {
    pub(crate) fn ok() -> Self {
        Self { ok: true }
    }
}

/// Create an account and its profile, then start a session.
#[utoipa::path(
    post,
    path = "/api/auth/signup",
    request_body = SignUpBody,
    responses(
        (status = 200, description = "Account created", body = UserEnvelope,
            headers(("Set-Cookie" = String, description = "Session cookie"))),
        (status = 400, description = "Invalid request, existing user or bad OTP", body = Error),
        (status = 503, description = "Storage unavailable", body = Error)
    ),
    tags = ["auth"],
    operation_id = "signUp",
    security([])
)]
#[post("/auth/signup")]
pub async fn sign_up(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<SignUpBody>,
) -> ApiResult<web::Json<UserEnvelope>> {
    let body = payload.into_inner();
    let profile = body.profile()?;
    let request = SignUpRequest::try_new(
        SignUpParts {
            email: body.email.as_deref().unwrap_or_default(),
            password: body.password.as_deref().unwrap_or_default(),
            profile,
            otp_code: body.otp_code.as_deref(),
        },
        &state.email_policy,
    )?;
    let user = state.auth.sign_up(request).await?;
    session.persist_user(user.id())?;
    info!(user_id = %user.id(), "session started after sign-up");
    Ok(web::Json(UserEnvelope { user }))
}

/// Check credentials and start a session.
#[utoipa::path(
    post,
    path = "/api/auth/signin",
    request_body = SignInBody,
    responses(
        (status = 200, description = "Signed in", body = UserEnvelope,
            headers(("Set-Cookie" = String, description = "Session cookie"))),
        (status = 400, description = "Missing or invalid credentials", body = Error),
        (status = 503, description = "Storage unavailable", body = Error)
    ),
    tags = ["auth"],
    operation_id = "signIn",
    security([])
)]
#[post("/auth/signin")]
pub async fn sign_in(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<SignInBody>,
) -> ApiResult<web::Json<UserEnvelope>> {
    let body = payload.into_inner();
    let credentials = SignInCredentials::try_from_parts(
        body.email.as_deref().unwrap_or_default(),
        body.password.as_deref().unwrap_or_default(),
    )?;
    let user = state.auth.sign_in(&credentials).await?;
    session.persist_user(user.id())?;
    Ok(web::Json(UserEnvelope { user }))
}

/// End the session.
#[utoipa::path(
    post,
    path = "/api/auth/signout",
    responses((status = 200, description = "Session cleared", body = OkResponse)),
    tags = ["auth"],
    operation_id = "signOut"
)]
#[post("/auth/signout")]
pub async fn sign_out(session: SessionContext) -> web::Json<OkResponse> {
    session.clear();
    web::Json(OkResponse::ok())
}

/// The signed-in user as `{id, email}`, or `{user: null}`.
#[utoipa::path(
    get,
    path = "/api/auth/user",
    responses(
        (status = 200, description = "Current user or `{user: null}`", body = User),
        (status = 503, description = "Storage unavailable", body = Error)
    ),
    tags = ["auth"],
    operation_id = "currentUser"
)]
#[get("/auth/user")]
pub async fn current_user(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<HttpResponse> {
    let user = match session.user_id() {
        Some(id) => state.accounts.current_user(&id).await?,
        None => None,
    };
    Ok(match user {
        Some(user) => HttpResponse::Ok().json(user),
        None => HttpResponse::Ok().json(json!({ "user": null })),
    })
}
