//! SeaORM entity definitions for the harvest database schema.
//!
//! Rows carry sequential `i64` primary keys: the fetcher enumerates
//! repositories in id order and resumes from the last persisted id, so the
//! key space must be monotonically increasing.

pub mod github_organization;
pub mod github_repository;
pub mod github_user;
pub mod github_user_organization;
pub mod prelude;
pub mod repository;
pub mod user;
pub mod user_repository;
