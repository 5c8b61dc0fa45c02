//! Organization upserts.

use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

use crate::entity::github_organization::{
    ActiveModel as GithubOrganizationActiveModel, Column as GithubOrganizationColumn,
    Entity as GithubOrganization,
};
use crate::github::types::GhOrg;

use super::errors::Result;
use super::validate::ValidationError;

/// Insert or update a GitHub organization, returning the row id.
pub async fn upsert_github_organization(db: &DatabaseConnection, org: &GhOrg) -> Result<i64> {
    let mut fields = Vec::new();
    if org.id.is_none() {
        fields.push("id");
    }
    if org.login.is_none() {
        fields.push("login");
    }
    if !fields.is_empty() {
        return Err(ValidationError {
            github_id: org.id,
            fields,
        }
        .into());
    }

    let github_id = org.id.expect("id checked above");
    let login = org.login.as_deref().expect("login checked above");

    let existing = GithubOrganization::find()
        .filter(GithubOrganizationColumn::GithubId.eq(github_id))
        .one(db)
        .await?;

    let model = GithubOrganizationActiveModel {
        github_id: Set(github_id),
        login: Set(login.to_string()),
        avatar_url: Set(org.avatar_url.clone()),
        html_url: Set(org.html_url.clone()),
        name: Set(org.name.clone()),
        company: Set(org.company.clone()),
        blog: Set(org.blog.clone()),
        location: Set(org.location.clone()),
        email: Set(org.email.clone()),
        collaborators_count: Set(org.collaborators),
        created_at: Set(org.created_at.map(|dt| dt.fixed_offset())),
        updated_at: Set(org.updated_at.map(|dt| dt.fixed_offset())),
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
