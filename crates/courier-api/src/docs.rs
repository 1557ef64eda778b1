use utoipa::OpenApi;

use crate::routes::{dto, emails, events, health, metrics, search, threads};

#[derive(OpenApi)]
#[openapi(
    info(title = "Courier API", description = "Thread-aware email delivery"),
    paths(
        health::health_check,
        metrics::render,
        emails::send_email,
        emails::get_email,
        emails::download_attachment,
        threads::get_thread,
        threads::list_messages,
        search::search,
        events::subscribe,
    ),
    components(schemas(
        dto::SendEmailRequest,
        dto::AttachmentUpload,
        dto::EmailResponse,
        dto::ParticipantResponse,
        dto::AttachmentResponse,
        dto::LineageResponse,
        dto::ThreadResponse,
        dto::LastMessageResponse,
        dto::SearchResponse,
        dto::SearchHitResponse,
        dto::HealthResponse,
    )),
    tags(
        (name = "emails", description = "Send and read emails"),
        (name = "threads", description = "Conversation threads"),
        (name = "search", description = "Full-text search"),
        (name = "events", description = "Live notifications"),
        (name = "health", description = "Liveness and metrics")
    )
)]
pub struct ApiDoc;
