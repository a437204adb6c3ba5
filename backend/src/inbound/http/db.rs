//! `POST /api/db`: the table proxy used by the dashboards.
//!
//! ```text
//! POST /api/db {"table":"profiles","op":"select","filters":[{"k":"role","op":"eq","v":"faculty"}]}
//! ```

use actix_web::{post, web};

use crate::domain::{DataCommand, DataOutcome, DataRequest, Error};
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Run a validated proxy command as the signed-in caller.
///
/// Selects answer with a row list, or one row (`null` when none) when
/// `single` is set. Writes answer with the row they created or `{count}`.
#[utoipa::path(
    post,
    path = "/api/db",
    request_body = DataRequest,
    responses(
        (status = 200, description = "Rows, a single row or {count}", body = Object),
        (status = 400, description = "Unknown table, column, operator or bad payload", body = Error),
        (status = 401, description = "No session", body = Error),
        (status = 403, description = "Table or write not permitted", body = Error)
    ),
    tags = ["db"],
    operation_id = "dataProxy"
)]
#[post("/db")]
pub async fn proxy(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<DataRequest>,
) -> ApiResult<web::Json<DataOutcome>> {
    let caller = session.require_user_id()?;
    let command = DataCommand::parse(payload.into_inner())?;
    Ok(web::Json(state.data.execute(&caller, command).await?))
}
