//! Thread-aware email delivery
//!
//! [`EmailService::send_email`] runs the whole pipeline: participant
//! resolution, attachment upload, optional deferral, thread linking, the
//! durable insert, the thread aggregate and finally search indexing and live
//! notifications on the [`Dispatcher`]. Everything after the insert is
//! best-effort and never fails the send.

pub mod attachments;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod fanout;
pub mod linker;
pub mod params;
pub mod realtime;
pub mod resolver;
pub mod scheduler;
pub mod service;
pub mod telemetry;
pub mod worker;

pub use attachments::AttachmentProcessor;
pub use config::ServiceConfig;
pub use dispatcher::{Dispatcher, DispatcherConfig};
pub use error::{Degradation, SendError};
pub use fanout::NotificationFanout;
pub use linker::ThreadLinker;
pub use params::{AttachmentInput, ClientInfo, SendEmailParams};
pub use realtime::{ChannelHub, Notifier, NotifyError, Subscription};
pub use resolver::ParticipantResolver;
pub use scheduler::DeliveryScheduler;
pub use service::{EmailService, EmailServiceDeps};
pub use worker::ScheduledDeliveryWorker;

pub type Result<T> = std::result::Result<T, SendError>;
