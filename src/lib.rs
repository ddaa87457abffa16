// Library for the binary and for tests

pub mod aggregation;
pub mod blob_store;
pub mod codec;
pub mod config;
pub mod ingestion;
pub mod job;
pub mod models;
pub mod paths;
pub mod rows;
pub mod staging;
