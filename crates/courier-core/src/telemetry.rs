//! Metric names emitted through the `metrics` facade

pub const EMAIL_REQUESTS_TOTAL: &str = "courier_email_requests_total";
pub const EMAIL_LATENCY_SECONDS: &str = "courier_email_latency_seconds";
pub const DIRECTORY_CACHE_HITS_TOTAL: &str = "courier_directory_cache_hits_total";
pub const DIRECTORY_CACHE_MISSES_TOTAL: &str = "courier_directory_cache_misses_total";
pub const DEGRADED_TOTAL: &str = "courier_degraded_total";
pub const DISPATCH_DROPPED_TOTAL: &str = "courier_dispatch_dropped_total";
pub const DISPATCH_TIMEOUT_TOTAL: &str = "courier_dispatch_timeout_total";
pub const DISPATCH_PANICKED_TOTAL: &str = "courier_dispatch_panicked_total";
pub const NOTIFICATIONS_SENT_TOTAL: &str = "courier_notifications_sent_total";
pub const SCHEDULED_DELIVERIES_TOTAL: &str = "courier_scheduled_deliveries_total";

/// Register descriptions with whichever recorder is installed
pub fn describe() {
    metrics::describe_counter!(EMAIL_REQUESTS_TOTAL, "Email operations by operation and outcome");
    metrics::describe_histogram!(EMAIL_LATENCY_SECONDS, metrics::Unit::Seconds, "Email operation latency");
    metrics::describe_counter!(DIRECTORY_CACHE_HITS_TOTAL, "Participant lookups served from cache");
    metrics::describe_counter!(DIRECTORY_CACHE_MISSES_TOTAL, "Participant lookups that reached the directory");
    metrics::describe_counter!(DEGRADED_TOTAL, "Best-effort delivery steps that failed, by kind");
    metrics::describe_counter!(DISPATCH_DROPPED_TOTAL, "Background jobs dropped because the queue was full");
    metrics::describe_counter!(DISPATCH_TIMEOUT_TOTAL, "Background jobs abandoned after their timeout");
    metrics::describe_counter!(DISPATCH_PANICKED_TOTAL, "Background jobs that panicked");
    metrics::describe_counter!(NOTIFICATIONS_SENT_TOTAL, "Live notifications delivered to a subscriber");
    metrics::describe_counter!(SCHEDULED_DELIVERIES_TOTAL, "Scheduled tasks processed, by outcome");
}
