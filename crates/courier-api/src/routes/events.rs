use axum::{
    extract::{Path, State},
    response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::{self, Stream};
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;

use crate::state::AppState;

/// Live notifications for one address as Server-Sent Events
#[utoipa::path(
    get,
    path = "/users/{address}/events",
    params(("address" = String, Path, description = "Recipient email address")),
    responses(
        (status = 200, description = "Event stream", content_type = "text/event-stream")
    ),
    tag = "events"
)]
pub async fn subscribe(
    State(state): State<Arc<AppState>>,
    Path(address): Path<String>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    tracing::info!(address = %address, "Live channel opened");
    let subscription = state.hub.subscribe_owned(&address);

    let stream = stream::unfold((subscription, address), |(mut subscription, address)| async move {
        loop {
            match subscription.recv().await {
                Ok(notification) => {
                    match Event::default().event(notification.event_type.clone()).json_data(&notification) {
                        Ok(event) => return Some((Ok::<_, Infallible>(event), (subscription, address))),
                        Err(e) => tracing::error!(address = %address, error = %e, "Failed to encode event"),
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(address = %address, skipped, "Live channel lagged");
                }
                Err(RecvError::Closed) => {
                    tracing::info!(address = %address, "Live channel closed");
                    return None;
                }
            }
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)))
}
