use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};

use courier_persist::{EmailStore, PersistError, SearchHit, SearchIndex, StaffDirectory, TaskQueue, ThreadAppend};
use courier_storage::{ObjectStore, StoredObject};
use courier_types::{Attachment, EmailContent, EmailMessage, MessageStatus, ThreadAggregate};

use crate::attachments::AttachmentProcessor;
use crate::config::ServiceConfig;
use crate::dispatcher::Dispatcher;
use crate::error::{Degradation, SendError};
use crate::fanout::NotificationFanout;
use crate::linker::ThreadLinker;
use crate::params::SendEmailParams;
use crate::realtime::Notifier;
use crate::resolver::ParticipantResolver;
use crate::scheduler::DeliveryScheduler;
use crate::telemetry;
use crate::Result;

const SCHEDULED_LABEL: &str = "scheduled";

/// Capabilities the service is built on
#[derive(Clone)]
pub struct EmailServiceDeps {
    pub store: Arc<dyn EmailStore>,
    pub directory: Arc<dyn StaffDirectory>,
    pub search: Arc<dyn SearchIndex>,
    pub notifier: Arc<dyn Notifier>,
    pub tasks: Arc<dyn TaskQueue>,
    pub objects: Arc<dyn ObjectStore>,
}

/// How a delivered message reaches the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Write {
    /// A fresh message
    Insert,
    /// A stored draft replacing itself
    Replace,
}

/// Email delivery orchestrator
///
/// Owns the consistency contract of a send: the message is either fully
/// persisted or not at all, while the thread aggregate, the search index and
/// live notifications are projections that may lag or degrade without
/// affecting the result.
pub struct EmailService {
    store: Arc<dyn EmailStore>,
    search: Arc<dyn SearchIndex>,
    tasks: Arc<dyn TaskQueue>,
    resolver: ParticipantResolver,
    linker: ThreadLinker,
    attachments: AttachmentProcessor,
    scheduler: DeliveryScheduler,
    fanout: NotificationFanout,
    dispatcher: Arc<Dispatcher>,
    config: ServiceConfig,
}

impl EmailService {
    /// Build the service and start its background workers
    ///
    /// Must be called inside a Tokio runtime.
    pub fn new(deps: EmailServiceDeps, config: ServiceConfig) -> Self {
        let dispatcher = Arc::new(Dispatcher::new(config.dispatcher.clone()));

        Self {
            resolver: ParticipantResolver::new(deps.directory, config.directory_cache_ttl),
            linker: ThreadLinker::new(Arc::clone(&deps.store)),
            attachments: AttachmentProcessor::new(deps.objects),
            scheduler: DeliveryScheduler::new(Arc::clone(&deps.tasks)),
            fanout: NotificationFanout::new(deps.notifier, Arc::clone(&dispatcher)),
            store: deps.store,
            search: deps.search,
            tasks: deps.tasks,
            dispatcher,
            config,
        }
    }

    /// Send an email now, or store it as a draft for later delivery
    pub async fn send_email(self: &Arc<Self>, params: SendEmailParams) -> Result<EmailMessage> {
        let started = Instant::now();
        let result = self.send_inner(params).await;
        record_outcome("send", started, &result);
        result
    }

    async fn send_inner(self: &Arc<Self>, params: SendEmailParams) -> Result<EmailMessage> {
        params.validate(Utc::now())?;

        let mut message = self.build_message(&params).await;

        if !params.attachments.is_empty() {
            message.attachments = self.attachments.process_all(&params.attachments).await?;
        }

        if let Some(run_at) = params.schedule {
            return self.schedule_draft(message, run_at).await;
        }

        self.deliver(message, Write::Insert).await
    }

    /// Deliver a previously scheduled draft
    ///
    /// A draft that is no longer scheduled is returned untouched, so a task
    /// that fires twice delivers once.
    pub async fn deliver_scheduled(self: &Arc<Self>, message_id: &str) -> Result<EmailMessage> {
        let started = Instant::now();
        let result = self.deliver_scheduled_inner(message_id).await;
        record_outcome("deliver_scheduled", started, &result);
        result
    }

    async fn deliver_scheduled_inner(self: &Arc<Self>, message_id: &str) -> Result<EmailMessage> {
        let mut message = self
            .store
            .find_message(message_id)
            .await?
            .ok_or_else(|| SendError::MessageNotFound(message_id.to_string()))?;

        if message.status != MessageStatus::Scheduled {
            tracing::info!(
                message_id = %message_id,
                status = message.status.as_str(),
                "Scheduled message already handled, skipping"
            );
            return Ok(message);
        }

        message.flags.is_draft = false;
        message.labels.retain(|label| label != SCHEDULED_LABEL);
        message.created_at = Utc::now();

        self.deliver(message, Write::Replace).await
    }

    pub async fn get_email(&self, message_id: &str) -> Result<EmailMessage> {
        self.store
            .find_message(message_id)
            .await?
            .ok_or_else(|| SendError::MessageNotFound(message_id.to_string()))
    }

    pub async fn list_thread_messages(&self, thread_id: &str, limit: Option<i64>) -> Result<Vec<EmailMessage>> {
        Ok(self.store.list_thread_messages(thread_id, limit).await?)
    }

    pub async fn get_thread(&self, thread_id: &str) -> Result<ThreadAggregate> {
        self.store
            .get_thread(thread_id)
            .await?
            .ok_or_else(|| SendError::ThreadNotFound(thread_id.to_string()))
    }

    pub async fn search(&self, query: &str, limit: i64) -> Result<Vec<SearchHit>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(SendError::ValidationFailed("search query is required".to_string()));
        }
        let limit = limit.clamp(1, self.config.max_search_results);
        Ok(self.search.search(query, limit).await?)
    }

    /// Fetch the bytes of the `index`-th attachment of a message
    pub async fn download_attachment(&self, message_id: &str, index: usize) -> Result<(Attachment, StoredObject)> {
        let message = self.get_email(message_id).await?;
        let attachment = message
            .attachments
            .get(index)
            .cloned()
            .ok_or_else(|| SendError::AttachmentNotFound {
                message_id: message_id.to_string(),
                index,
            })?;

        let object = self.attachments.download(&attachment.storage_key).await?;
        Ok((attachment, object))
    }

    pub fn tasks(&self) -> Arc<dyn TaskQueue> {
        Arc::clone(&self.tasks)
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    /// Resolve once every background job has finished
    pub async fn wait_idle(&self) {
        self.dispatcher.wait_idle().await;
    }

    pub async fn shutdown(&self) {
        self.dispatcher.shutdown().await;
    }

    async fn build_message(&self, params: &SendEmailParams) -> EmailMessage {
        let (from, to, cc, bcc) = tokio::join!(
            self.resolver.resolve(&params.from),
            self.resolver.resolve_all(&params.to),
            self.resolver.resolve_all(&params.cc),
            self.resolver.resolve_all(&params.bcc),
        );

        let mut content = EmailContent::text(params.text.clone());
        content.html = params.html.clone();

        let mut message = EmailMessage::pending(from, params.subject.clone(), content);
        message.to = to;
        message.cc = cc;
        message.bcc = bcc;
        message.thread_id = params.thread_id.clone();
        message.parent_message_id = params.in_reply_to.clone();
        message.metadata.client_ip = params.client.ip.clone();
        message.metadata.user_agent = params.client.user_agent.clone();
        message
    }

    async fn schedule_draft(&self, mut message: EmailMessage, run_at: DateTime<Utc>) -> Result<EmailMessage> {
        message.flags.is_scheduled = true;
        message.flags.is_draft = true;
        message.labels.push(SCHEDULED_LABEL.to_string());
        message.status = MessageStatus::Scheduled;
        message.metadata.scheduled_for = Some(run_at);

        match self.store.insert_message(&message).await {
            Ok(id) => message.id = id,
            Err(e) => {
                tracing::error!(message_id = %message.message_id, error = %e, "Failed to save scheduled draft");
                self.attachments.discard(&message.attachments).await;
                return Err(SendError::PersistenceFailed(e));
            }
        }

        if let Err(e) = self.scheduler.schedule(&message, run_at).await {
            tracing::error!(message_id = %message.message_id, error = %e, "Failed to schedule email");
            self.compensate_draft(&message).await;
            return Err(SendError::SchedulingFailed(e));
        }

        Ok(message)
    }

    /// Remove a draft whose task could not be enqueued
    async fn compensate_draft(&self, message: &EmailMessage) {
        if let Err(e) = self.store.delete_message(&message.message_id).await {
            tracing::error!(
                message_id = %message.message_id,
                error = %e,
                "Failed to delete unscheduled draft; it will never be delivered"
            );
        }
        self.attachments.discard(&message.attachments).await;
    }

    /// Link, persist and project a message on a task of its own
    ///
    /// The caller only joins the task, so dropping the request future
    /// cannot stop a message between persist and its projections.
    async fn deliver(self: &Arc<Self>, message: EmailMessage, write: Write) -> Result<EmailMessage> {
        let service = Arc::clone(self);
        let message_id = message.message_id.clone();

        match tokio::spawn(async move { service.commit(message, write).await }).await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!(message_id = %message_id, error = %e, "Delivery task failed");
                Err(SendError::PersistenceFailed(PersistError::Internal(format!(
                    "delivery task failed: {}",
                    e
                ))))
            }
        }
    }

    async fn commit(&self, mut message: EmailMessage, write: Write) -> Result<EmailMessage> {
        if let Err(e) = self.linker.link(&mut message).await {
            self.release(&message, write).await;
            return Err(e);
        }

        message.status = MessageStatus::Sent;
        message.updated_at = Utc::now();

        let persisted = match write {
            Write::Insert => self.store.insert_message(&message).await.map(|id| message.id = id),
            Write::Replace => self.store.update_message(&message).await,
        };
        if let Err(e) = persisted {
            tracing::error!(message_id = %message.message_id, error = %e, "Failed to save email");
            self.release(&message, write).await;
            return Err(SendError::PersistenceFailed(e));
        }

        tracing::info!(
            message_id = %message.message_id,
            thread_id = message.thread_id.as_deref().unwrap_or_default(),
            depth = message.thread_info.depth,
            attachments = message.attachments.len(),
            "Email persisted"
        );

        self.dispatch_index(&message);
        self.fanout.fan_out(&message);

        if let Some(parent_id) = message.parent_message_id.as_deref() {
            self.linker.record_reply(parent_id, message.created_at).await;
        }

        if let Some(append) = ThreadAppend::from_message(&message) {
            if let Err(e) = self.store.append_to_thread(&append).await {
                tracing::warn!(
                    message_id = %message.message_id,
                    thread_id = %append.thread_id,
                    error = %e,
                    "Failed to update thread aggregate"
                );
                Degradation::ThreadAggregate.record();
            }
        }

        Ok(message)
    }

    /// Drop the uploads of a fresh message that never made it to the store
    async fn release(&self, message: &EmailMessage, write: Write) {
        if write == Write::Insert {
            self.attachments.discard(&message.attachments).await;
        }
    }

    fn dispatch_index(&self, message: &EmailMessage) {
        let search = Arc::clone(&self.search);
        let indexed = message.clone();

        let accepted = self.dispatcher.submit("index", async move {
            if let Err(e) = search.index(&indexed).await {
                tracing::error!(message_id = %indexed.message_id, error = %e, "Failed to index email");
                Degradation::Indexing.record();
            }
        });
        if !accepted {
            Degradation::Indexing.record();
        }
    }
}

fn record_outcome<T>(operation: &'static str, started: Instant, result: &Result<T>) {
    let status = match result {
        Ok(_) => "ok",
        Err(e) => e.kind(),
    };
    metrics::counter!(telemetry::EMAIL_REQUESTS_TOTAL, "operation" => operation, "status" => status)
        .increment(1);
    metrics::histogram!(telemetry::EMAIL_LATENCY_SECONDS, "operation" => operation)
        .record(started.elapsed().as_secs_f64());
}
