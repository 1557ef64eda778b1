pub mod dto;
pub mod emails;
pub mod events;
pub mod health;
pub mod metrics;
pub mod search;
pub mod threads;
