use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::bson::{self, doc};
use mongodb::options::IndexOptions;
use mongodb::{Client, Collection, IndexModel};

use crate::dbs::mongo::models::MongoEmail;
use crate::error::{PersistError, Result};

#[derive(Clone)]
pub struct MongoMessageRepository {
    collection: Collection<MongoEmail>,
}

impl MongoMessageRepository {
    pub fn new(client: &Client, db_name: &str) -> Self {
        let collection = client.database(db_name).collection("emails");
        Self { collection }
    }

    pub async fn ensure_indexes(&self) -> Result<()> {
        let unique_message_id = IndexModel::builder()
            .keys(doc! { "message_id": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        let by_thread = IndexModel::builder()
            .keys(doc! { "thread_id": 1, "created_at": 1 })
            .build();

        self.collection.create_index(unique_message_id).await?;
        self.collection.create_index(by_thread).await?;
        Ok(())
    }

    /// Save a single message
    pub async fn save_message(&self, message: &MongoEmail) -> Result<String> {
        self.collection.insert_one(message).await?;
        Ok(message.id.to_hex())
    }

    pub async fn find_by_message_id(&self, message_id: &str) -> Result<Option<MongoEmail>> {
        let filter = doc! { "message_id": message_id };
        Ok(self.collection.find_one(filter).await?)
    }

    pub async fn replace_message(&self, message: &MongoEmail) -> Result<()> {
        let filter = doc! { "message_id": &message.message_id };
        let result = self.collection.replace_one(filter, message).await?;
        if result.matched_count == 0 {
            return Err(PersistError::MessageNotFound(message.message_id.clone()));
        }
        Ok(())
    }

    pub async fn delete_message(&self, message_id: &str) -> Result<()> {
        let filter = doc! { "message_id": message_id };
        self.collection.delete_one(filter).await?;
        Ok(())
    }

    /// Increment reply count and advance last-reply time in one update
    pub async fn record_reply(&self, parent_message_id: &str, replied_at: DateTime<Utc>) -> Result<()> {
        let filter = doc! { "message_id": parent_message_id };
        let update = doc! {
            "$inc": { "thread_info.reply_count": 1_i64 },
            "$max": { "thread_info.last_reply_at": bson::DateTime::from_chrono(replied_at) },
        };

        let result = self.collection.update_one(filter, update).await?;
        if result.matched_count == 0 {
            return Err(PersistError::MessageNotFound(parent_message_id.to_string()));
        }
        Ok(())
    }

    /// Get messages for a thread in creation order
    pub async fn get_thread_messages(
        &self,
        thread_id: &str,
        limit: Option<i64>,
    ) -> Result<Vec<MongoEmail>> {
        let filter = doc! { "thread_id": thread_id };
        let mut find = self.collection
            .find(filter)
            .sort(doc! { "created_at": 1 });

        if let Some(limit) = limit {
            find = find.limit(limit);
        }

        let messages = find
            .await?
            .try_collect()
            .await?;
        Ok(messages)
    }
}
