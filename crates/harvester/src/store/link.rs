//! Many-to-many link maintenance.
//!
//! Links are written at most once per pair; re-linking an existing pair
//! is a no-op rather than a duplicate row.

use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};

use crate::entity::github_user_organization::{
    ActiveModel as GithubUserOrganizationActiveModel, Entity as GithubUserOrganization,
};
use crate::entity::user_repository::{
    ActiveModel as UserRepositoryActiveModel, Entity as UserRepository,
};

use super::errors::Result;

/// Link a user to a repository they contribute to.
pub async fn link_user_repository(
    db: &DatabaseConnection,
    user_id: i64,
    repository_id: i64,
) -> Result<()> {
    let existing = UserRepository::find_by_id((user_id, repository_id))
        .one(db)
        .await?;
    if existing.is_some() {
        return Ok(());
    }

    UserRepositoryActiveModel {
        user_id: Set(user_id),
        repository_id: Set(repository_id),
    }
    .insert(db)
    .await?;

    Ok(())
}

/// Link a GitHub user to an organization they belong to.
pub async fn link_github_user_organization(
    db: &DatabaseConnection,
    gh_user_id: i64,
    gh_organization_id: i64,
) -> Result<()> {
    let existing = GithubUserOrganization::find_by_id((gh_user_id, gh_organization_id))
        .one(db)
        .await?;
    if existing.is_some() {
        return Ok(());
    }

    GithubUserOrganizationActiveModel {
        gh_user_id: Set(gh_user_id),
        gh_organization_id: Set(gh_organization_id),
    }
    .insert(db)
    .await?;

    Ok(())
}
