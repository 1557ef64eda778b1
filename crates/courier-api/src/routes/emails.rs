use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use base64::Engine;
use std::sync::Arc;

use courier_core::{AttachmentInput, ClientInfo, SendEmailParams};

use crate::error::{ApiError, ApiResult};
use crate::routes::dto::{EmailResponse, SendEmailRequest};
use crate::state::AppState;

/// Send an email now, or schedule it when `schedule_at` is set
#[utoipa::path(
    post,
    path = "/emails",
    request_body = SendEmailRequest,
    responses(
        (status = 201, description = "Email sent or scheduled", body = EmailResponse),
        (status = 400, description = "Invalid request"),
        (status = 404, description = "Parent message not found"),
        (status = 502, description = "Attachment upload failed")
    ),
    tag = "emails"
)]
pub async fn send_email(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<SendEmailRequest>,
) -> ApiResult<(StatusCode, Json<EmailResponse>)> {
    let params = into_params(req, client_info(&headers))?;
    let message = state.service.send_email(params).await?;
    Ok((StatusCode::CREATED, Json(EmailResponse::from(&message))))
}

/// Get a single email by message id
#[utoipa::path(
    get,
    path = "/emails/{message_id}",
    params(("message_id" = String, Path, description = "Message id")),
    responses(
        (status = 200, description = "Email found", body = EmailResponse),
        (status = 404, description = "Email not found")
    ),
    tag = "emails"
)]
pub async fn get_email(
    State(state): State<Arc<AppState>>,
    Path(message_id): Path<String>,
) -> ApiResult<Json<EmailResponse>> {
    let message = state.service.get_email(&message_id).await?;
    Ok(Json(EmailResponse::from(&message)))
}

/// Download the raw bytes of an attachment
#[utoipa::path(
    get,
    path = "/emails/{message_id}/attachments/{index}",
    params(
        ("message_id" = String, Path, description = "Message id"),
        ("index" = usize, Path, description = "Zero-based attachment position")
    ),
    responses(
        (status = 200, description = "Attachment bytes", content_type = "application/octet-stream"),
        (status = 404, description = "Attachment not found")
    ),
    tag = "emails"
)]
pub async fn download_attachment(
    State(state): State<Arc<AppState>>,
    Path((message_id, index)): Path<(String, usize)>,
) -> ApiResult<Response> {
    let (attachment, object) = state.service.download_attachment(&message_id, index).await?;

    let content_type = HeaderValue::from_str(&object.content_type)
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));
    let disposition = HeaderValue::from_str(&format!(
        "attachment; filename=\"{}\"",
        attachment.filename.replace('"', "")
    ))
    .unwrap_or_else(|_| HeaderValue::from_static("attachment"));

    Ok((
        [(header::CONTENT_TYPE, content_type), (header::CONTENT_DISPOSITION, disposition)],
        object.data,
    )
        .into_response())
}

fn into_params(req: SendEmailRequest, client: ClientInfo) -> ApiResult<SendEmailParams> {
    let attachments = req
        .attachments
        .into_iter()
        .map(|upload| {
            let content = base64::engine::general_purpose::STANDARD
                .decode(upload.content_base64.as_bytes())
                .map_err(|e| {
                    ApiError::BadRequest(format!("attachment '{}' is not valid base64: {}", upload.filename, e))
                })?;
            Ok(AttachmentInput {
                filename: upload.filename,
                content,
                content_type: upload.content_type,
            })
        })
        .collect::<ApiResult<Vec<_>>>()?;

    Ok(SendEmailParams {
        from: req.from,
        to: req.to,
        cc: req.cc,
        bcc: req.bcc,
        subject: req.subject,
        text: req.text,
        html: req.html,
        attachments,
        thread_id: req.thread_id,
        in_reply_to: req.in_reply_to,
        schedule: req.schedule_at,
        client,
    })
}

/// Caller address as reported by the edge proxy, then by any forwarder
fn client_info(headers: &HeaderMap) -> ClientInfo {
    let header_str = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());

    let ip = header_str("cf-connecting-ip")
        .or_else(|| header_str("x-forwarded-for").and_then(|v| v.split(',').next()))
        .or_else(|| header_str("x-real-ip"))
        .map(|v| v.trim().to_string())
        .unwrap_or_default();

    ClientInfo {
        ip,
        user_agent: header_str(header::USER_AGENT.as_str()).unwrap_or_default().to_string(),
    }
}
