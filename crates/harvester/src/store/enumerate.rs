//! The fetch-cycle enumeration query.

use std::path::{Path, PathBuf};

use sea_orm::sea_query::{Expr, Func};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};

use crate::entity::repository::{Column, Entity as Repository};
use crate::repo::VcsKind;

use super::errors::Result;

/// One unit of fetcher work: a recorded repository and where its working
/// tree lives on disk.
#[derive(Debug, Clone)]
pub struct RepoTask {
    /// Repository row id, emitted to the progress channel on success.
    pub id: i64,
    pub vcs: VcsKind,
    /// Absolute working-tree path (clone root + `clone_path`).
    pub abs_path: PathBuf,
    pub clone_url: String,
}

/// Enumerate the repositories a fetch cycle must visit, in ascending id
/// order starting at `resume_id`.
///
/// With a non-empty language list the enumeration is restricted to rows
/// whose lowercased primary language is in the list. Rows with an
/// unsupported `vcs` value are logged and skipped.
pub async fn repos_to_fetch(
    db: &DatabaseConnection,
    resume_id: i64,
    languages: &[String],
    clone_root: &Path,
) -> Result<Vec<RepoTask>> {
    let mut query = Repository::find().filter(Column::Id.gte(resume_id));

    if !languages.is_empty() {
        let lowered: Vec<String> = languages.iter().map(|l| l.to_lowercase()).collect();
        let lowered_language = Expr::expr(Func::lower(Expr::col(Column::PrimaryLanguage)));
        query = query.filter(lowered_language.is_in(lowered));
    }

    let rows = query.order_by_asc(Column::Id).all(db).await?;

    let mut tasks = Vec::with_capacity(rows.len());
    for row in rows {
        let vcs = match row.vcs.parse::<VcsKind>() {
            Ok(vcs) => vcs,
            Err(err) => {
                tracing::error!(repository_id = row.id, error = %err, "skipping repository");
                continue;
            }
        };

        tasks.push(RepoTask {
            id: row.id,
            vcs,
            abs_path: clone_root.join(&row.clone_path),
            clone_url: row.clone_url,
        });
    }

    Ok(tasks)
}
