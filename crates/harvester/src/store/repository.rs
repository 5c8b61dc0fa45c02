//! Repository upserts.

use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

use crate::entity::github_repository::{
    ActiveModel as GithubRepositoryActiveModel, Column as GithubRepositoryColumn,
    Entity as GithubRepository,
};
use crate::entity::repository::ActiveModel as RepositoryActiveModel;
use crate::repo::VcsKind;

use super::errors::Result;
use super::validate::{VerifiedRepo, clone_path};

/// Insert or update the generic repository row for a verified record,
/// returning the row id.
///
/// The natural key is the GitHub-native repository id, resolved through
/// the detail table: a matching detail row means the generic row already
/// exists and is updated in place.
pub async fn upsert_repository(db: &DatabaseConnection, repo: &VerifiedRepo<'_>) -> Result<i64> {
    let path = clone_path(repo.language, repo.owner_login, repo.name);

    let existing = GithubRepository::find()
        .filter(GithubRepositoryColumn::GithubId.eq(repo.github_id))
        .one(db)
        .await?;

    let model = RepositoryActiveModel {
        name: Set(repo.name.to_string()),
        primary_language: Set(repo.language.to_string()),
        clone_url: Set(repo.clone_url.to_string()),
        clone_path: Set(path),
        vcs: Set(VcsKind::Git.as_str().to_string()),
        ..Default::default()
    };

    match existing {
        Some(detail) => {
            let mut update = model;
            update.id = Set(detail.repository_id);
            Ok(update.update(db).await?.id)
        }
        None => Ok(model.insert(db).await?.id),
    }
}

/// Insert or update the GitHub detail row for a repository, returning the
/// detail row id.
pub async fn upsert_github_repository(
    db: &DatabaseConnection,
    repository_id: i64,
    repo: &VerifiedRepo<'_>,
) -> Result<i64> {
    let raw = repo.raw;

    let existing = GithubRepository::find()
        .filter(GithubRepositoryColumn::GithubId.eq(repo.github_id))
        .one(db)
        .await?;

    let model = GithubRepositoryActiveModel {
        repository_id: Set(repository_id),
        github_id: Set(repo.github_id),
        full_name: Set(raw.full_name.clone()),
        description: Set(raw.description.clone()),
        homepage: Set(raw.homepage.clone()),
        fork: Set(repo.fork),
        default_branch: Set(raw.default_branch.clone()),
        html_url: Set(raw.html_url.clone()),
        forks_count: Set(raw.forks_count),
        open_issues_count: Set(raw.open_issues_count),
        stargazers_count: Set(raw.stargazers_count),
        subscribers_count: Set(raw.subscribers_count),
        watchers_count: Set(raw.watchers_count),
        size_in_kb: Set(raw.size),
        created_at: Set(raw.created_at.map(|dt| dt.fixed_offset())),
        updated_at: Set(raw.updated_at.map(|dt| dt.fixed_offset())),
        pushed_at: Set(raw.pushed_at.map(|dt| dt.fixed_offset())),
        ..Default::default()
    };

    match existing {
        Some(found) => {
            let mut update = model;
            update.id = Set(found.id);
            Ok(update.update(db).await?.id)
        }
        None => Ok(model.insert(db).await?.id),
    }
}
