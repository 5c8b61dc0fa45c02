//! Metadata writes and reads against the relational store.
//!
//! All writes are idempotent upserts keyed on the GitHub-native id: look
//! up the existing row by that key, update in place on a hit, insert and
//! return the fresh id on a miss. Database errors surface as
//! [`StoreError`]; callers log and move on, they never abort a crawl over
//! a single record.

pub mod enumerate;
mod errors;
pub mod link;
pub mod organization;
pub mod repository;
pub mod user;
mod validate;

pub use enumerate::{RepoTask, repos_to_fetch};
pub use errors::{Result, StoreError};
pub use validate::{ValidationError, VerifiedRepo, clone_path, verify_repo};
