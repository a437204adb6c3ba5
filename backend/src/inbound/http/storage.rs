//! Attachment upload and download.
//!
//! ```text
//! POST /api/storage/upload   multipart/form-data, field `file`
//! GET  /uploads/{name}
//! ```

use actix_multipart::{Field, Multipart, MultipartError};
use actix_web::http::header::{CacheControl, CacheDirective, ContentType};
use actix_web::{HttpResponse, get, mime, post, web};
use futures_util::TryStreamExt;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::domain::{AttachmentError, AttachmentName, Error, MAX_ATTACHMENT_BYTES};
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

const FILE_FIELD: &str = "file";
const DEFAULT_FILE_NAME: &str = "file";

/// Where a stored attachment is served from.
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct UploadResponse {
    #[schema(example = "/uploads/1700000000000-notes.pdf")]
    pub url: String,
}

fn malformed_multipart(error: &MultipartError) -> Error {
    Error::invalid_request(format!("malformed multipart body: {error}"))
        .with_details(json!({ "field": FILE_FIELD, "code": "malformed_multipart" }))
}

/// Buffer a field, failing as soon as it exceeds the attachment limit.
async fn read_limited(field: &mut Field) -> Result<Vec<u8>, Error> {
    let mut bytes = Vec::new();
    while let Some(chunk) = field.try_next().await.map_err(|err| malformed_multipart(&err))? {
        if bytes.len() + chunk.len() > MAX_ATTACHMENT_BYTES {
            return Err(AttachmentError::TooLarge {
                max: MAX_ATTACHMENT_BYTES,
            }
            .into());
        }
        bytes.extend_from_slice(&chunk);
    }
    Ok(bytes)
}

/// The `file` part's client file name and contents.
async fn read_file_part(mut payload: Multipart) -> Result<(String, Vec<u8>), Error> {
    while let Some(mut field) = payload
        .try_next()
        .await
        .map_err(|err| malformed_multipart(&err))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let file_name = field
            .content_disposition()
            .and_then(|disposition| disposition.get_filename())
            .unwrap_or(DEFAULT_FILE_NAME)
            .to_owned();
        let bytes = read_limited(&mut field).await?;
        return Ok((file_name, bytes));
    }
    Err(AttachmentError::Missing.into())
}

fn content_type_for(name: &AttachmentName) -> ContentType {
    let extension = name
        .as_ref()
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase());
    let mime = match extension.as_deref() {
        Some("pdf") => mime::APPLICATION_PDF,
        Some("png") => mime::IMAGE_PNG,
        Some("jpg" | "jpeg") => mime::IMAGE_JPEG,
        Some("gif") => mime::IMAGE_GIF,
        Some("txt") => mime::TEXT_PLAIN_UTF_8,
        Some("csv") => mime::TEXT_CSV_UTF_8,
        Some("json") => mime::APPLICATION_JSON,
        _ => mime::APPLICATION_OCTET_STREAM,
    };
    ContentType(mime)
}

/// Store the `file` part for the signed-in caller.
#[utoipa::path(
    post,
    path = "/api/storage/upload",
    request_body(content = String, content_type = "multipart/form-data", description = "Form with a `file` part"),
    responses(
        (status = 200, description = "Stored attachment URL", body = UploadResponse),
        (status = 400, description = "No file, oversized file or malformed body", body = Error),
        (status = 401, description = "No session", body = Error)
    ),
    tags = ["storage"],
    operation_id = "uploadAttachment"
)]
#[post("/storage/upload")]
pub async fn upload(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: Multipart,
) -> ApiResult<web::Json<UploadResponse>> {
    session.require_user_id()?;
    let (file_name, bytes) = read_file_part(payload).await?;
    let name = state.attachments.upload(&file_name, bytes).await?;
    Ok(web::Json(UploadResponse { url: name.url() }))
}

/// Serve a stored attachment.
#[utoipa::path(
    get,
    path = "/uploads/{name}",
    params(("name" = String, Path, description = "Stored attachment name")),
    responses(
        (status = 200, description = "Attachment bytes", body = Vec<u8>, content_type = "application/octet-stream"),
        (status = 400, description = "Invalid name", body = Error),
        (status = 404, description = "Unknown attachment", body = Error)
    ),
    tags = ["storage"],
    operation_id = "serveAttachment"
)]
#[get("/uploads/{name}")]
pub async fn serve_upload(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let name = AttachmentName::parse(&path.into_inner())?;
    let bytes = state.attachments.fetch(&name).await?;
    Ok(HttpResponse::Ok()
        .insert_header(content_type_for(&name))
        .insert_header(CacheControl(vec![CacheDirective::Private]))
        .body(bytes))
}
