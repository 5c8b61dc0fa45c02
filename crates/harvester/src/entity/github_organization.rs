//! GithubOrganization entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A GitHub organization, keyed by the GitHub-native numeric id.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "gh_organizations")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    /// GitHub's numeric organization id.
    #[sea_orm(unique)]
    pub github_id: i64,

    #[sea_orm(unique)]
    pub login: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub avatar_url: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub html_url: Option<String>,
    pub name: Option<String>,
    pub company: Option<String>,
    pub blog: Option<String>,
    pub location: Option<String>,
    pub email: Option<String>,

    pub collaborators_count: Option<i32>,

    pub created_at: Option<DateTimeWithTimeZone>,
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl Related<super::github_user::Entity> for Entity {
    fn to() -> RelationDef {
        super::github_user_organization::Relation::GithubUser.def()
    }

    fn via() -> Option<RelationDef> {
        Some(
            super::github_user_organization::Relation::GithubOrganization
                .def()
                .rev(),
        )
    }
}

impl ActiveModelBehavior for ActiveModel {}
