use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mongodb::bson::doc;
use mongodb::Client;

use courier_types::{EmailMessage, ScheduledTask, StaffProfile, TaskStatus, ThreadAggregate};

use crate::dbs::mongo::models::{MongoEmail, MongoSearchDoc, MongoTask};
use crate::dbs::mongo::repositories::{
    MongoMessageRepository, MongoSearchRepository, MongoStaffRepository, MongoTaskRepository,
    MongoThreadRepository,
};
use crate::error::{PersistError, Result};
use crate::models::{SearchHit, ThreadAppend};
use crate::trait_client::{EmailStore, SearchIndex, StaffDirectory, TaskQueue};

/// MongoDB-backed implementation of every persistence trait
#[derive(Clone)]
pub struct MongoStore {
    client: Client,
    database: String,
    message_repo: MongoMessageRepository,
    thread_repo: MongoThreadRepository,
    staff_repo: MongoStaffRepository,
    task_repo: MongoTaskRepository,
    search_repo: MongoSearchRepository,
}

impl MongoStore {
    /// Connect to MongoDB and create client
    pub async fn connect(mongodb_uri: &str, database: &str) -> Result<Self> {
        let client = Client::with_uri_str(mongodb_uri)
            .await
            .map_err(|e| PersistError::Connection(e.to_string()))?;

        Ok(Self {
            message_repo: MongoMessageRepository::new(&client, database),
            thread_repo: MongoThreadRepository::new(&client, database),
            staff_repo: MongoStaffRepository::new(&client, database),
            task_repo: MongoTaskRepository::new(&client, database),
            search_repo: MongoSearchRepository::new(&client, database),
            database: database.to_string(),
            client,
        })
    }

    pub async fn ping(&self) -> Result<()> {
        self.client
            .database(&self.database)
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| PersistError::Connection(e.to_string()))?;
        Ok(())
    }

    /// Create the indexes every collection relies on
    pub async fn ensure_indexes(&self) -> Result<()> {
        self.message_repo.ensure_indexes().await?;
        self.staff_repo.ensure_indexes().await?;
        self.task_repo.ensure_indexes().await?;
        self.search_repo.ensure_indexes().await?;
        tracing::info!(database = %self.database, "MongoDB indexes ensured");
        Ok(())
    }
}

#[async_trait]
impl EmailStore for MongoStore {
    async fn insert_message(&self, message: &EmailMessage) -> Result<String> {
        let mongo_message = MongoEmail::from(message);
        self.message_repo.save_message(&mongo_message).await
    }

    async fn find_message(&self, message_id: &str) -> Result<Option<EmailMessage>> {
        let found = self.message_repo.find_by_message_id(message_id).await?;
        Ok(found.map(Into::into))
    }

    async fn update_message(&self, message: &EmailMessage) -> Result<()> {
        if !message.is_persisted() {
            return Err(PersistError::MessageNotFound(message.message_id.clone()));
        }
        let mongo_message = MongoEmail::from(message);
        self.message_repo.replace_message(&mongo_message).await
    }

    async fn delete_message(&self, message_id: &str) -> Result<()> {
        self.message_repo.delete_message(message_id).await
    }

    async fn record_reply(&self, parent_message_id: &str, replied_at: DateTime<Utc>) -> Result<()> {
        self.message_repo.record_reply(parent_message_id, replied_at).await
    }

    async fn list_thread_messages(
        &self,
        thread_id: &str,
        limit: Option<i64>,
    ) -> Result<Vec<EmailMessage>> {
        let messages = self.message_repo.get_thread_messages(thread_id, limit).await?;
        Ok(messages.into_iter().map(Into::into).collect())
    }

    async fn append_to_thread(&self, append: &ThreadAppend) -> Result<()> {
        self.thread_repo.append(append).await
    }

    async fn get_thread(&self, thread_id: &str) -> Result<Option<ThreadAggregate>> {
        let thread = self.thread_repo.get_thread(thread_id).await?;
        Ok(thread.map(Into::into))
    }
}

#[async_trait]
impl StaffDirectory for MongoStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<StaffProfile>> {
        let staff = self.staff_repo.find_by_email(email).await?;
        Ok(staff.map(Into::into))
    }
}

#[async_trait]
impl TaskQueue for MongoStore {
    async fn schedule(&self, task: ScheduledTask) -> Result<String> {
        let mongo_task = MongoTask::from(&task);
        self.task_repo.insert(&mongo_task).await
    }

    async fn claim_due(
        &self,
        now: DateTime<Utc>,
        lease_until: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<ScheduledTask>> {
        let mut claimed = Vec::new();
        while claimed.len() < limit {
            match self.task_repo.claim_next(now, lease_until).await? {
                Some(task) => claimed.push(task.into()),
                None => break,
            }
        }
        Ok(claimed)
    }

    async fn complete(&self, task_id: &str) -> Result<()> {
        self.task_repo.set_status(task_id, TaskStatus::Done.as_str(), None).await
    }

    async fn fail(&self, task_id: &str, error: &str) -> Result<()> {
        self.task_repo
            .set_status(task_id, TaskStatus::Failed.as_str(), Some(error))
            .await
    }
}

#[async_trait]
impl SearchIndex for MongoStore {
    async fn index(&self, message: &EmailMessage) -> Result<()> {
        let document = MongoSearchDoc::from(message);
        self.search_repo.upsert(&document).await
    }

    async fn search(&self, query: &str, limit: i64) -> Result<Vec<SearchHit>> {
        let hits = self.search_repo.search(query, limit).await?;
        Ok(hits
            .into_iter()
            .map(|doc| SearchHit {
                message_id: doc.message_id,
                thread_id: doc.thread_id,
                subject: doc.subject,
                from: doc.from,
                snippet: doc.snippet,
                score: doc.score.unwrap_or_default(),
                created_at: doc.created_at.to_chrono(),
            })
            .collect())
    }
}
