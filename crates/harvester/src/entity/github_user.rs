//! GithubUser entity - GitHub-native details for a user row.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// GitHub detail row, one-to-one with [`super::user`] and keyed by the
/// GitHub-native numeric id.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "gh_users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    /// The owning generic user row.
    #[sea_orm(unique)]
    pub user_id: i64,

    /// GitHub's numeric user id.
    #[sea_orm(unique)]
    pub github_id: i64,

    #[sea_orm(unique)]
    pub login: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub bio: Option<String>,
    pub blog: Option<String>,
    pub company: Option<String>,
    pub email: Option<String>,
    pub hireable: Option<bool>,
    pub location: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub avatar_url: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub html_url: Option<String>,

    pub followers_count: Option<i32>,
    pub following_count: Option<i32>,
    pub collaborators_count: Option<i32>,

    pub created_at: Option<DateTimeWithTimeZone>,
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::github_organization::Entity> for Entity {
    fn to() -> RelationDef {
        super::github_user_organization::Relation::GithubOrganization.def()
    }

    fn via() -> Option<RelationDef> {
        Some(
            super::github_user_organization::Relation::GithubUser
                .def()
                .rev(),
        )
    }
}

impl ActiveModelBehavior for ActiveModel {}
