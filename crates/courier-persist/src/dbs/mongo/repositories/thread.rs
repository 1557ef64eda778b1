use mongodb::bson::{self, doc, Bson};
use mongodb::{Client, Collection};

use crate::dbs::mongo::models::{MongoLastMessage, MongoThread};
use crate::error::Result;
use crate::models::ThreadAppend;

#[derive(Clone)]
pub struct MongoThreadRepository {
    collection: Collection<MongoThread>,
}

impl MongoThreadRepository {
    pub fn new(client: &Client, db_name: &str) -> Self {
        let collection = client.database(db_name).collection("threads");
        Self { collection }
    }

    /// Get thread by ID
    pub async fn get_thread(&self, thread_id: &str) -> Result<Option<MongoThread>> {
        let filter = doc! { "_id": thread_id };
        Ok(self.collection.find_one(filter).await?)
    }

    /// Upsert the aggregate, then advance the last-message snapshot
    ///
    /// The second update only matches while the stored snapshot is older, so
    /// appends arriving out of order never move it backwards.
    pub async fn append(&self, append: &ThreadAppend) -> Result<()> {
        let appended_at = bson::DateTime::from_chrono(append.appended_at);
        let participants = bson::to_bson(&append.participants)?;

        let filter = doc! { "_id": &append.thread_id };
        let update = doc! {
            "$inc": { "message_count": 1_i64 },
            "$addToSet": { "participants": { "$each": participants } },
            "$setOnInsert": {
                "subject": &append.subject,
                "created_at": appended_at,
            },
            "$max": { "updated_at": appended_at },
        };
        self.collection.update_one(filter, update).upsert(true).await?;

        let last_message = bson::to_bson(&MongoLastMessage::from(&append.last_message))?;
        let filter = doc! {
            "_id": &append.thread_id,
            "$or": [
                { "last_message": Bson::Null },
                { "last_message.sent_at": { "$lt": appended_at } },
            ],
        };
        let update = doc! { "$set": { "last_message": last_message } };
        self.collection.update_one(filter, update).await?;

        Ok(())
    }
}
