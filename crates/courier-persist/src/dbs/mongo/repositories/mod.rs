pub mod message;
pub mod thread;
pub mod staff;
pub mod task;
pub mod search;

pub use message::MongoMessageRepository;
pub use thread::MongoThreadRepository;
pub use staff::MongoStaffRepository;
pub use task::MongoTaskRepository;
pub use search::MongoSearchRepository;
