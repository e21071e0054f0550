pub mod config;
pub mod domain;
pub mod error;
pub mod ingest;
pub mod observe;
pub mod storage;
pub mod strategy;
pub mod time;

pub use error::{AdvisorError, RemoteStoreError};
