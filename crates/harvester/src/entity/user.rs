//! User entity - the provider-agnostic contributor row.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    /// Provider login.
    #[sea_orm(unique)]
    pub username: String,

    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_one = "super::github_user::Entity")]
    GithubUser,
}

impl Related<super::github_user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::GithubUser.def()
    }
}

impl Related<super::repository::Entity> for Entity {
    fn to() -> RelationDef {
        super::user_repository::Relation::Repository.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::user_repository::Relation::User.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
