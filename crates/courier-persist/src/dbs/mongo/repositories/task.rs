use chrono::{DateTime, Utc};
use mongodb::bson::{self, doc, oid::ObjectId};
use mongodb::options::ReturnDocument;
use mongodb::{Client, Collection, IndexModel};

use crate::dbs::mongo::models::MongoTask;
use crate::error::{PersistError, Result};

#[derive(Clone)]
pub struct MongoTaskRepository {
    collection: Collection<MongoTask>,
}

impl MongoTaskRepository {
    pub fn new(client: &Client, db_name: &str) -> Self {
        let collection = client.database(db_name).collection("scheduled_tasks");
        Self { collection }
    }

    pub async fn ensure_indexes(&self) -> Result<()> {
        let due = IndexModel::builder()
            .keys(doc! { "status": 1, "priority": -1, "run_at": 1 })
            .build();
        let expired = IndexModel::builder()
            .keys(doc! { "status": 1, "lease_until": 1 })
            .build();
        let by_payload = IndexModel::builder()
            .keys(doc! { "task_type": 1, "payload": 1 })
            .build();

        self.collection.create_index(due).await?;
        self.collection.create_index(expired).await?;
        self.collection.create_index(by_payload).await?;
        Ok(())
    }

    pub async fn insert(&self, task: &MongoTask) -> Result<String> {
        self.collection.insert_one(task).await?;
        Ok(task.id.to_hex())
    }

    /// Atomically claim one due task, or one whose lease has expired
    pub async fn claim_next(&self, now: DateTime<Utc>, lease_until: DateTime<Utc>) -> Result<Option<MongoTask>> {
        let now = bson::DateTime::from_chrono(now);
        let lease_until = bson::DateTime::from_chrono(lease_until);
        let filter = doc! {
            "$or": [
                { "status": "pending", "run_at": { "$lte": now } },
                { "status": "running", "lease_until": { "$lte": now } },
            ]
        };
        let update = doc! {
            "$set": { "status": "running", "lease_until": lease_until, "updated_at": now },
            "$inc": { "attempts": 1 },
        };

        let task = self.collection
            .find_one_and_update(filter, update)
            .sort(doc! { "priority": -1, "run_at": 1 })
            .return_document(ReturnDocument::After)
            .await?;
        Ok(task)
    }

    pub async fn set_status(&self, task_id: &str, status: &str, error: Option<&str>) -> Result<()> {
        let object_id = ObjectId::parse_str(task_id)
            .map_err(|e| PersistError::InvalidObjectId(e.to_string()))?;

        let mut set = doc! { "status": status, "updated_at": bson::DateTime::now() };
        if let Some(error) = error {
            set.insert("last_error", error);
        }

        let update = doc! { "$set": set, "$unset": { "lease_until": "" } };
        let result = self.collection
            .update_one(doc! { "_id": object_id }, update)
            .await?;
        if result.matched_count == 0 {
            return Err(PersistError::TaskNotFound(task_id.to_string()));
        }
        Ok(())
    }
}
