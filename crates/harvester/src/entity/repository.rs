//! Repository entity - the provider-agnostic repository row.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A recorded repository.
///
/// `clone_path` is the lowercased `language/owner/name` triple relative to
/// the configured clone root; it doubles as the on-disk location of the
/// working tree and is therefore unique, as is `clone_url`.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "repositories")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    /// Repository name (URL-safe slug).
    pub name: String,

    /// Primary programming language.
    pub primary_language: String,

    /// URL used for cloning and updating the working tree.
    #[sea_orm(unique)]
    pub clone_url: String,

    /// Working-tree location relative to the clone root.
    #[sea_orm(unique)]
    pub clone_path: String,

    /// Version control system ("git").
    pub vcs: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Provider-side detail row, one-to-one.
    #[sea_orm(has_one = "super::github_repository::Entity")]
    GithubRepository,
}

impl Related<super::github_repository::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::GithubRepository.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        super::user_repository::Relation::User.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::user_repository::Relation::Repository.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
