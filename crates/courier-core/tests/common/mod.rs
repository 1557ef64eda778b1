#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};

use courier_core::{
    DispatcherConfig, EmailService, EmailServiceDeps, Notifier, NotifyError, SendEmailParams,
    ServiceConfig,
};
use courier_persist::{
    EmailStore, PersistError, Result as PersistResult, SearchHit, SearchIndex, StaffDirectory,
    TaskQueue, ThreadAppend,
};
use courier_storage::{MemoryObjectStore, ObjectStore, Result as StorageResult, StorageError, StoredObject};
use courier_types::{
    EmailMessage, LastMessage, NotificationEvent, ScheduledTask, StaffProfile, TaskStatus,
    ThreadAggregate,
};

// Email store

#[derive(Default)]
pub struct MemoryEmailStore {
    messages: Mutex<HashMap<String, EmailMessage>>,
    threads: Mutex<HashMap<String, ThreadAggregate>>,
    next_id: AtomicUsize,
    pub fail_inserts: AtomicBool,
    pub fail_thread_appends: AtomicBool,
    pub fail_reads: AtomicBool,
    /// Delay before an insert is acknowledged, after it is stored
    pub insert_ack_delay_ms: AtomicU64,
}

impl MemoryEmailStore {
    pub fn message(&self, message_id: &str) -> Option<EmailMessage> {
        self.messages.lock().unwrap().get(message_id).cloned()
    }

    pub fn message_count(&self) -> usize {
        self.messages.lock().unwrap().len()
    }

    pub fn thread(&self, thread_id: &str) -> Option<ThreadAggregate> {
        self.threads.lock().unwrap().get(thread_id).cloned()
    }
}

#[async_trait]
impl EmailStore for MemoryEmailStore {
    async fn insert_message(&self, message: &EmailMessage) -> PersistResult<String> {
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(PersistError::Connection("store unavailable".into()));
        }
        let id = format!("{:024x}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        let mut stored = message.clone();
        stored.id = id.clone();

        {
            let mut messages = self.messages.lock().unwrap();
            if messages.contains_key(&stored.message_id) {
                return Err(PersistError::Internal(format!("duplicate message id {}", stored.message_id)));
            }
            messages.insert(stored.message_id.clone(), stored);
        }

        let delay = self.insert_ack_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        Ok(id)
    }

    async fn find_message(&self, message_id: &str) -> PersistResult<Option<EmailMessage>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(PersistError::Connection("store unavailable".into()));
        }
        Ok(self.message(message_id))
    }

    async fn update_message(&self, message: &EmailMessage) -> PersistResult<()> {
        let mut messages = self.messages.lock().unwrap();
        match messages.get_mut(&message.message_id) {
            Some(existing) => {
                *existing = message.clone();
                Ok(())
            }
            None => Err(PersistError::MessageNotFound(message.message_id.clone())),
        }
    }

    async fn delete_message(&self, message_id: &str) -> PersistResult<()> {
        self.messages.lock().unwrap().remove(message_id);
        Ok(())
    }

    async fn record_reply(&self, parent_message_id: &str, replied_at: DateTime<Utc>) -> PersistResult<()> {
        let mut messages = self.messages.lock().unwrap();
        let parent = messages
            .get_mut(parent_message_id)
            .ok_or_else(|| PersistError::MessageNotFound(parent_message_id.to_string()))?;

        parent.thread_info.reply_count += 1;
        parent.thread_info.last_reply_at = Some(match parent.thread_info.last_reply_at {
            Some(existing) if existing > replied_at => existing,
            _ => replied_at,
        });
        Ok(())
    }

    async fn list_thread_messages(&self, thread_id: &str, limit: Option<i64>) -> PersistResult<Vec<EmailMessage>> {
        let mut found: Vec<EmailMessage> = self
            .messages
            .lock()
            .unwrap()
            .values()
            .filter(|m| m.thread_id.as_deref() == Some(thread_id))
            .cloned()
            .collect();
        found.sort_by_key(|m| m.created_at);
        if let Some(limit) = limit {
            found.truncate(limit.max(0) as usize);
        }
        Ok(found)
    }

    async fn append_to_thread(&self, append: &ThreadAppend) -> PersistResult<()> {
        if self.fail_thread_appends.load(Ordering::SeqCst) {
            return Err(PersistError::Connection("threads unavailable".into()));
        }
        let mut threads = self.threads.lock().unwrap();
        let thread = threads
            .entry(append.thread_id.clone())
            .or_insert_with(|| ThreadAggregate {
                thread_id: append.thread_id.clone(),
                subject: append.subject.clone(),
                participants: Vec::new(),
                last_message: None,
                message_count: 0,
                created_at: append.appended_at,
                updated_at: append.appended_at,
            });

        thread.message_count += 1;
        for participant in &append.participants {
            if !thread.participants.contains(participant) {
                thread.participants.push(participant.clone());
            }
        }
        thread.updated_at = thread.updated_at.max(append.appended_at);
        let newer = thread
            .last_message
            .as_ref()
            .map_or(true, |last: &LastMessage| last.sent_at < append.last_message.sent_at);
        if newer {
            thread.last_message = Some(append.last_message.clone());
        }
        Ok(())
    }

    async fn get_thread(&self, thread_id: &str) -> PersistResult<Option<ThreadAggregate>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(PersistError::Connection("store unavailable".into()));
        }
        Ok(self.thread(thread_id))
    }
}

// Staff directory

#[derive(Default)]
pub struct MemoryDirectory {
    profiles: Mutex<HashMap<String, StaffProfile>>,
    pub lookups: AtomicUsize,
}

impl MemoryDirectory {
    pub fn with_staff(entries: &[(&str, &str)]) -> Self {
        let directory = Self::default();
        {
            let mut profiles = directory.profiles.lock().unwrap();
            for (email, name) in entries {
                profiles.insert(
                    email.to_lowercase(),
                    StaffProfile {
                        email: email.to_string(),
                        full_name: name.to_string(),
                        role: "staff".into(),
                        department: "operations".into(),
                        profile_photo_url: format!("https://cdn.example.com/{}.png", name),
                        status: "active".into(),
                    },
                );
            }
        }
        directory
    }
}

#[async_trait]
impl StaffDirectory for MemoryDirectory {
    async fn find_by_email(&self, email: &str) -> PersistResult<Option<StaffProfile>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self.profiles.lock().unwrap().get(&email.to_lowercase()).cloned())
    }
}

// Search index

#[derive(Default)]
pub struct MemorySearch {
    indexed: Mutex<Vec<EmailMessage>>,
    pub failing: AtomicBool,
    pub attempts: AtomicUsize,
}

impl MemorySearch {
    pub fn failing() -> Self {
        let search = Self::default();
        search.failing.store(true, Ordering::SeqCst);
        search
    }

    pub fn indexed_ids(&self) -> Vec<String> {
        self.indexed.lock().unwrap().iter().map(|m| m.message_id.clone()).collect()
    }
}

#[async_trait]
impl SearchIndex for MemorySearch {
    async fn index(&self, message: &EmailMessage) -> PersistResult<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(PersistError::Connection("search cluster unreachable".into()));
        }
        self.indexed.lock().unwrap().push(message.clone());
        Ok(())
    }

    async fn search(&self, query: &str, limit: i64) -> PersistResult<Vec<SearchHit>> {
        let query = query.to_lowercase();
        Ok(self
            .indexed
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.subject.to_lowercase().contains(&query) || m.content.text.to_lowercase().contains(&query))
            .take(limit.max(0) as usize)
            .map(|m| SearchHit {
                message_id: m.message_id.clone(),
                thread_id: m.thread_id.clone(),
                subject: m.subject.clone(),
                from: m.from.email.clone(),
                snippet: m.content.text.clone(),
                score: 1.0,
                created_at: m.created_at,
            })
            .collect())
    }
}

// Notifier

#[derive(Default)]
pub struct RecordingNotifier {
    delivered: Mutex<Vec<(String, NotificationEvent)>>,
    failing: Mutex<HashSet<String>>,
    hanging: Mutex<HashSet<String>>,
}

impl RecordingNotifier {
    pub fn fail_for(&self, address: &str) {
        self.failing.lock().unwrap().insert(address.to_string());
    }

    pub fn hang_for(&self, address: &str) {
        self.hanging.lock().unwrap().insert(address.to_string());
    }

    pub fn delivered_to(&self) -> Vec<String> {
        let mut addresses: Vec<String> = self.delivered.lock().unwrap().iter().map(|(a, _)| a.clone()).collect();
        addresses.sort();
        addresses
    }

    pub fn events(&self) -> Vec<NotificationEvent> {
        self.delivered.lock().unwrap().iter().map(|(_, e)| e.clone()).collect()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify_user(&self, address: &str, event: &NotificationEvent) -> Result<(), NotifyError> {
        let hangs = self.hanging.lock().unwrap().contains(address);
        if hangs {
            tokio::time::sleep(Duration::from_secs(60)).await;
        }
        if self.failing.lock().unwrap().contains(address) {
            return Err(NotifyError::Closed(address.to_string()));
        }
        self.delivered.lock().unwrap().push((address.to_string(), event.clone()));
        Ok(())
    }
}

// Task queue

#[derive(Default)]
pub struct MemoryTaskQueue {
    tasks: Mutex<Vec<ScheduledTask>>,
    pub failing: AtomicBool,
}

impl MemoryTaskQueue {
    pub fn failing() -> Self {
        let queue = Self::default();
        queue.failing.store(true, Ordering::SeqCst);
        queue
    }

    pub fn all(&self) -> Vec<ScheduledTask> {
        self.tasks.lock().unwrap().clone()
    }

    /// Pull every task's run time into the past
    pub fn make_all_due(&self) {
        for task in self.tasks.lock().unwrap().iter_mut() {
            task.run_at = Utc::now() - chrono::Duration::seconds(1);
        }
    }
}

#[async_trait]
impl TaskQueue for MemoryTaskQueue {
    async fn schedule(&self, mut task: ScheduledTask) -> PersistResult<String> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(PersistError::Connection("queue unavailable".into()));
        }
        let mut tasks = self.tasks.lock().unwrap();
        task.id = format!("task-{}", tasks.len() + 1);
        let id = task.id.clone();
        tasks.push(task);
        Ok(id)
    }

    async fn claim_due(
        &self,
        now: DateTime<Utc>,
        lease_until: DateTime<Utc>,
        limit: usize,
    ) -> PersistResult<Vec<ScheduledTask>> {
        let mut tasks = self.tasks.lock().unwrap();
        let mut due: Vec<&mut ScheduledTask> = tasks.iter_mut().filter(|t| t.is_claimable(now)).collect();
        due.sort_by(|a, b| b.priority.cmp(&a.priority).then(a.run_at.cmp(&b.run_at)));

        Ok(due
            .into_iter()
            .take(limit)
            .map(|task| {
                task.status = TaskStatus::Running;
                task.lease_until = Some(lease_until);
                task.attempts += 1;
                task.clone()
            })
            .collect())
    }

    async fn complete(&self, task_id: &str) -> PersistResult<()> {
        self.set_status(task_id, TaskStatus::Done, None)
    }

    async fn fail(&self, task_id: &str, error: &str) -> PersistResult<()> {
        self.set_status(task_id, TaskStatus::Failed, Some(error))
    }
}

impl MemoryTaskQueue {
    fn set_status(&self, task_id: &str, status: TaskStatus, error: Option<&str>) -> PersistResult<()> {
        let mut tasks = self.tasks.lock().unwrap();
        let task = tasks
            .iter_mut()
            .find(|t| t.id == task_id)
            .ok_or_else(|| PersistError::TaskNotFound(task_id.to_string()))?;
        task.status = status;
        task.lease_until = None;
        task.last_error = error.map(str::to_string);
        Ok(())
    }
}

// Object store

/// Memory store whose `fail_on`-th put (1-based) fails
#[derive(Default)]
pub struct FlakyObjectStore {
    pub inner: MemoryObjectStore,
    puts: AtomicUsize,
    fail_on: Option<usize>,
}

impl FlakyObjectStore {
    pub fn failing_on(put_number: usize) -> Self {
        Self {
            fail_on: Some(put_number),
            ..Self::default()
        }
    }
}

#[async_trait]
impl ObjectStore for FlakyObjectStore {
    async fn put(&self, key: &str, data: Bytes, content_type: &str) -> StorageResult<()> {
        let n = self.puts.fetch_add(1, Ordering::SeqCst) + 1;
        if Some(n) == self.fail_on {
            return Err(StorageError::Upload {
                key: key.to_string(),
                message: "connection reset".into(),
            });
        }
        self.inner.put(key, data, content_type).await
    }

    async fn get(&self, key: &str) -> StorageResult<StoredObject> {
        self.inner.get(key).await
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        self.inner.delete(key).await
    }

    async fn list_by_prefix(&self, prefix: &str) -> StorageResult<Vec<String>> {
        self.inner.list_by_prefix(prefix).await
    }
}

// Harness

pub struct Harness {
    pub store: Arc<MemoryEmailStore>,
    pub directory: Arc<MemoryDirectory>,
    pub search: Arc<MemorySearch>,
    pub notifier: Arc<RecordingNotifier>,
    pub tasks: Arc<MemoryTaskQueue>,
    pub objects: Arc<FlakyObjectStore>,
    pub service: Arc<EmailService>,
}

pub struct HarnessBuilder {
    store: MemoryEmailStore,
    directory: MemoryDirectory,
    search: MemorySearch,
    notifier: RecordingNotifier,
    tasks: MemoryTaskQueue,
    objects: FlakyObjectStore,
    config: ServiceConfig,
}

impl Default for HarnessBuilder {
    fn default() -> Self {
        let mut config = ServiceConfig::default();
        config.dispatcher = DispatcherConfig {
            workers: 4,
            queue_capacity: 256,
            job_timeout: Duration::from_millis(200),
        };
        Self {
            store: MemoryEmailStore::default(),
            directory: MemoryDirectory::with_staff(&[
                ("alice@example.com", "Alice Archer"),
                ("bob@example.com", "Bob Baker"),
            ]),
            search: MemorySearch::default(),
            notifier: RecordingNotifier::default(),
            tasks: MemoryTaskQueue::default(),
            objects: FlakyObjectStore::default(),
            config,
        }
    }
}

impl HarnessBuilder {
    pub fn store(mut self, store: MemoryEmailStore) -> Self {
        self.store = store;
        self
    }

    pub fn search(mut self, search: MemorySearch) -> Self {
        self.search = search;
        self
    }

    pub fn notifier(mut self, notifier: RecordingNotifier) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn tasks(mut self, tasks: MemoryTaskQueue) -> Self {
        self.tasks = tasks;
        self
    }

    pub fn objects(mut self, objects: FlakyObjectStore) -> Self {
        self.objects = objects;
        self
    }

    pub fn build(self) -> Harness {
        let store = Arc::new(self.store);
        let directory = Arc::new(self.directory);
        let search = Arc::new(self.search);
        let notifier = Arc::new(self.notifier);
        let tasks = Arc::new(self.tasks);
        let objects = Arc::new(self.objects);

        let service = Arc::new(EmailService::new(
            EmailServiceDeps {
                store: store.clone(),
                directory: directory.clone(),
                search: search.clone(),
                notifier: notifier.clone(),
                tasks: tasks.clone(),
                objects: objects.clone(),
            },
            self.config,
        ));

        Harness {
            store,
            directory,
            search,
            notifier,
            tasks,
            objects,
            service,
        }
    }
}

impl Harness {
    pub fn new() -> Self {
        HarnessBuilder::default().build()
    }

    pub fn builder() -> HarnessBuilder {
        HarnessBuilder::default()
    }
}

pub fn params(to: &[&str]) -> SendEmailParams {
    SendEmailParams {
        from: "alice@example.com".into(),
        to: to.iter().map(|s| s.to_string()).collect(),
        subject: "Quarterly planning".into(),
        text: "Let's meet on Thursday to go over the numbers.".into(),
        ..Default::default()
    }
}

pub fn reply_to(parent: &EmailMessage) -> SendEmailParams {
    let mut params = params(&["bob@example.com"]);
    params.subject = format!("Re: {}", parent.subject);
    params.in_reply_to = Some(parent.message_id.clone());
    params
}
