//! User upserts.

use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

use crate::entity::github_user::{
    ActiveModel as GithubUserActiveModel, Column as GithubUserColumn, Entity as GithubUser,
};
use crate::entity::user::ActiveModel as UserActiveModel;
use crate::github::types::GhUser;

use super::errors::Result;
use super::validate::ValidationError;

fn require_identity(user: &GhUser) -> Result<(i64, &str)> {
    let mut fields = Vec::new();
    if user.id.is_none() {
        fields.push("id");
    }
    if user.login.is_none() {
        fields.push("login");
    }

    if !fields.is_empty() {
        return Err(ValidationError {
            github_id: user.id,
            fields,
        }
        .into());
    }

    Ok((
        user.id.expect("id checked above"),
        user.login.as_deref().expect("login checked above"),
    ))
}

/// Insert or update the generic user row for a GitHub user record,
/// returning the row id.
///
/// Keyed on the GitHub-native user id through the detail table, exactly
/// like repository upserts.
pub async fn upsert_user(db: &DatabaseConnection, user: &GhUser) -> Result<i64> {
    let (github_id, login) = require_identity(user)?;

    let existing = GithubUser::find()
        .filter(GithubUserColumn::GithubId.eq(github_id))
        .one(db)
        .await?;

    let model = UserActiveModel {
        username: Set(login.to_string()),
        name: Set(user.name.clone()),
        email: Set(user.email.clone()),
        ..Default::default()
    };

    match existing {
        Some(detail) => {
            let mut update = model;
            update.id = Set(detail.user_id);
            Ok(update.update(db).await?.id)
        }
        None => Ok(model.insert(db).await?.id),
    }
}

/// Insert or update the GitHub detail row for a user, returning the
/// detail row id.
pub async fn upsert_github_user(
    db: &DatabaseConnection,
    user_id: i64,
    user: &GhUser,
) -> Result<i64> {
    let (github_id, login) = require_identity(user)?;

    let existing = GithubUser::find()
        .filter(GithubUserColumn::GithubId.eq(github_id))
        .one(db)
        .await?;

    let model = GithubUserActiveModel {
        user_id: Set(user_id),
        github_id: Set(github_id),
        login: Set(login.to_string()),
        bio: Set(user.bio.clone()),
        blog: Set(user.blog.clone()),
        company: Set(user.company.clone()),
        email: Set(user.email.clone()),
        hireable: Set(user.hireable),
        location: Set(user.location.clone()),
        avatar_url: Set(user.avatar_url.clone()),
        html_url: Set(user.html_url.clone()),
        followers_count: Set(user.followers),
        following_count: Set(user.following),
        collaborators_count: Set(user.collaborators),
        created_at: Set(user.created_at.map(|dt| dt.fixed_offset())),
        updated_at: Set(user.updated_at.map(|dt| dt.fixed_offset())),
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
