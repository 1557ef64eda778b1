use mongodb::bson::doc;
use mongodb::options::IndexOptions;
use mongodb::{Client, Collection, IndexModel};

use crate::dbs::mongo::models::MongoStaff;
use crate::error::Result;

#[derive(Clone)]
pub struct MongoStaffRepository {
    collection: Collection<MongoStaff>,
}

impl MongoStaffRepository {
    pub fn new(client: &Client, db_name: &str) -> Self {
        let collection = client.database(db_name).collection("staff");
        Self { collection }
    }

    pub async fn ensure_indexes(&self) -> Result<()> {
        let unique_email = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        self.collection.create_index(unique_email).await?;
        Ok(())
    }

    /// Addresses are stored lower-cased
    pub async fn find_by_email(&self, email: &str) -> Result<Option<MongoStaff>> {
        let filter = doc! { "email": email.to_lowercase() };
        Ok(self.collection.find_one(filter).await?)
    }
}
