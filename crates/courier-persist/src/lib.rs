pub mod models;
pub mod trait_client;
pub mod error;
pub mod dbs;

pub use models::{SearchHit, ThreadAppend};
pub use trait_client::{EmailStore, SearchIndex, StaffDirectory, TaskQueue};
pub use error::{PersistError, Result};

#[cfg(feature = "mongodb")]
pub use dbs::mongo::MongoStore;
