//! GithubRepository entity - GitHub-native details for a repository row.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// GitHub detail row, one-to-one with [`super::repository`] and keyed by
/// the GitHub-native numeric id.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "gh_repositories")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    /// The owning generic repository row.
    #[sea_orm(unique)]
    pub repository_id: i64,

    /// GitHub's numeric repository id.
    #[sea_orm(unique)]
    pub github_id: i64,

    pub full_name: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub homepage: Option<String>,
    pub fork: bool,
    pub default_branch: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub html_url: Option<String>,

    pub forks_count: Option<i32>,
    pub open_issues_count: Option<i32>,
    pub stargazers_count: Option<i32>,
    pub subscribers_count: Option<i32>,
    pub watchers_count: Option<i32>,
    pub size_in_kb: Option<i64>,

    /// When the repository was created on GitHub.
    pub created_at: Option<DateTimeWithTimeZone>,
    /// When the repository metadata last changed.
    pub updated_at: Option<DateTimeWithTimeZone>,
    /// When code was last pushed.
    pub pushed_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::repository::Entity",
        from = "Column::RepositoryId",
        to = "super::repository::Column::Id"
    )]
    Repository,
}

impl Related<super::repository::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Repository.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
