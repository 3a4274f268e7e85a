//! strongroom-storage: blob store abstraction over OpenDAL
//!
//! One capability set (put/get/delete/list/info/health_check) over
//! interchangeable backends: local filesystem, S3-compatible object
//! storage, and an in-memory store for tests.

pub mod health;
pub mod operator;
pub mod store;

pub use health::{check_health, is_healthy};
pub use operator::build_operator;
pub use store::{BlobInfo, BlobStore};
