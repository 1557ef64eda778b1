use futures::TryStreamExt;
use mongodb::bson::doc;
use mongodb::options::IndexOptions;
use mongodb::{Client, Collection, IndexModel};

use crate::dbs::mongo::models::MongoSearchDoc;
use crate::error::Result;

#[derive(Clone)]
pub struct MongoSearchRepository {
    collection: Collection<MongoSearchDoc>,
}

impl MongoSearchRepository {
    pub fn new(client: &Client, db_name: &str) -> Self {
        let collection = client.database(db_name).collection("email_search");
        Self { collection }
    }

    pub async fn ensure_indexes(&self) -> Result<()> {
        let text = IndexModel::builder()
            .keys(doc! {
                "subject": "text",
                "body": "text",
                "from": "text",
                "recipients": "text",
            })
            .options(
                IndexOptions::builder()
                    .name("email_text".to_string())
                    .weights(doc! { "subject": 10, "from": 5, "recipients": 3, "body": 1 })
                    .build(),
            )
            .build();
        self.collection.create_index(text).await?;
        Ok(())
    }

    /// Insert or overwrite the search document for a message
    pub async fn upsert(&self, document: &MongoSearchDoc) -> Result<()> {
        let filter = doc! { "_id": &document.message_id };
        self.collection
            .replace_one(filter, document)
            .upsert(true)
            .await?;
        Ok(())
    }

    pub async fn search(&self, query: &str, limit: i64) -> Result<Vec<MongoSearchDoc>> {
        let filter = doc! { "$text": { "$search": query } };
        let score = doc! { "score": { "$meta": "textScore" } };

        let hits = self.collection
            .find(filter)
            .projection(score.clone())
            .sort(score)
            .limit(limit)
            .await?
            .try_collect()
            .await?;
        Ok(hits)
    }
}
