pub mod email;
pub mod thread;
pub mod staff;
pub mod events;
pub mod task;
pub mod text;

pub use email::{
    Attachment, EmailContent, EmailFlags, EmailMessage, EmailMetadata, MessageStatus, Participant,
};
pub use thread::{LastMessage, ThreadAggregate, ThreadLineage};
pub use staff::StaffProfile;
pub use events::{NotificationEvent, NEW_EMAIL_EVENT};
pub use task::{ScheduledTask, TaskPriority, TaskStatus, SEND_SCHEDULED_EMAIL};
pub use text::{truncate_text, PREVIEW_MAX_CHARS};
