mod client;

pub use client::{S3ObjectStore, S3Settings};
