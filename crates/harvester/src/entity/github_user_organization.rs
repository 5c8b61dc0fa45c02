//! Join table linking GitHub users to the organizations they belong to.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "gh_users_organizations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub gh_user_id: i64,
    #[sea_orm(primary_key, auto_increment = false)]
    pub gh_organization_id: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::github_user::Entity",
        from = "Column::GhUserId",
        to = "super::github_user::Column::Id"
    )]
    GithubUser,
    #[sea_orm(
        belongs_to = "super::github_organization::Entity",
        from = "Column::GhOrganizationId",
        to = "super::github_organization::Column::Id"
    )]
    GithubOrganization,
}

impl ActiveModelBehavior for ActiveModel {}
