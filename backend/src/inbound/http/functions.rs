//! Edge-function style endpoints.
//!
//! ```text
//! POST /api/functions/send-otp    {"email":"asha@nitm.ac.in","name":"Asha"}
//! POST /api/functions/verify-otp  {"email":"asha@nitm.ac.in","otpCode":"123456"}
//! POST /api/functions/submit-hash {"payload":{...}}
//! ```

use actix_web::{post, web};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::otp_service::invalid_otp;
use crate::domain::{Error, OtpCode, digest_payload};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::OkResponse;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, parse_email, required};

const EMAIL: FieldName = FieldName::new("email");
const OTP_CODE: FieldName = FieldName::new("otpCode");

#[derive(Debug, Default, Deserialize, Serialize, utoipa::ToSchema)]
pub struct SendOtpBody {
    #[schema(example = "asha@nitm.ac.in")]
    pub email: Option<String>,
    pub name: Option<String>,
}

/// Dispatch outcome; `otp` is echoed only in development mode.
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SendOtpResponse {
    pub dev_mode: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "482913")]
    pub otp: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerifyOtpBody {
    pub email: Option<String>,
    #[schema(example = "482913")]
    pub otp_code: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize, utoipa::ToSchema)]
pub struct SubmitHashBody {
    #[schema(value_type = Option<Object>)]
    pub payload: Option<Value>,
}

/// Payload digest; `txId` is always `null`.
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitHashResponse {
    pub hash: String,
    #[schema(value_type = Option<String>)]
    pub tx_id: Option<String>,
}

/// Issue a fresh code for the email, replacing any pending one.
#[utoipa::path(
    post,
    path = "/api/functions/send-otp",
    request_body = SendOtpBody,
    responses(
        (status = 200, description = "Code dispatched", body = SendOtpResponse),
        (status = 400, description = "Missing or foreign email", body = Error),
        (status = 503, description = "Storage unavailable", body = Error)
    ),
    tags = ["functions"],
    operation_id = "sendOtp"
)]
#[post("/functions/send-otp")]
pub async fn send_otp(
    state: web::Data<HttpState>,
    payload: web::Json<SendOtpBody>,
) -> ApiResult<web::Json<SendOtpResponse>> {
    let SendOtpBody { email, name } = payload.into_inner();
    let email = parse_email(email.as_deref().unwrap_or_default(), &state.email_policy, EMAIL)?;
    let dispatch = state.otp.send(email, name).await?;
    let otp = dispatch.dev_code.map(|code| code.as_ref().to_owned());
    Ok(web::Json(SendOtpResponse {
        dev_mode: otp.is_some(),
        otp,
    }))
}

/// Check a pending code and mark the email verified.
#[utoipa::path(
    post,
    path = "/api/functions/verify-otp",
    request_body = VerifyOtpBody,
    responses(
        (status = 200, description = "Code accepted", body = OkResponse),
        (status = 400, description = "Missing fields or invalid/expired code", body = Error)
    ),
    tags = ["functions"],
    operation_id = "verifyOtp"
)]
#[post("/functions/verify-otp")]
pub async fn verify_otp(
    state: web::Data<HttpState>,
    payload: web::Json<VerifyOtpBody>,
) -> ApiResult<web::Json<OkResponse>> {
    let VerifyOtpBody { email, otp_code } = payload.into_inner();
    let email = required(email, EMAIL)?;
    let code = required(otp_code, OTP_CODE)?;
    let email = parse_email(&email, &state.email_policy, EMAIL)?;
    let code = OtpCode::parse(&code).map_err(|_| invalid_otp())?;
    state.otp.verify(&email, &code).await?;
    Ok(web::Json(OkResponse::ok()))
}

/// SHA-256 of the payload's compact JSON; no ledger is written.
#[utoipa::path(
    post,
    path = "/api/functions/submit-hash",
    request_body = SubmitHashBody,
    responses(
        (status = 200, description = "Payload digest", body = SubmitHashResponse)
    ),
    tags = ["functions"],
    operation_id = "submitHash"
)]
#[post("/functions/submit-hash")]
pub async fn submit_hash(payload: web::Json<SubmitHashBody>) -> web::Json<SubmitHashResponse> {
    web::Json(SubmitHashResponse {
        hash: digest_payload(payload.payload.as_ref()),
        tx_id: None,
    })
}
