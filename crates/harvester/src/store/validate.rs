//! Validation of inbound provider records.

use std::fmt;

use crate::github::types::GhRepo;

/// A record was missing fields the schema requires. Carries the full list
/// of absent fields so a single log line tells the whole story.
#[derive(Debug)]
pub struct ValidationError {
    /// The provider-native id, when the record at least had one.
    pub github_id: Option<i64>,
    /// The missing fields.
    pub fields: Vec<&'static str>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.github_id {
            Some(id) => write!(f, "record #{id} is missing required fields: {{ ")?,
            None => write!(f, "record is missing required fields: {{ ")?,
        }
        write!(f, "{}", self.fields.join(", "))?;
        write!(f, " }}")
    }
}

impl std::error::Error for ValidationError {}

/// A repository record whose required fields have all been checked.
///
/// Borrowed views into the underlying [`GhRepo`]; the raw record stays
/// available for the detail-row upsert.
#[derive(Debug, Clone, Copy)]
pub struct VerifiedRepo<'a> {
    pub github_id: i64,
    pub name: &'a str,
    pub language: &'a str,
    pub clone_url: &'a str,
    pub owner_login: &'a str,
    pub owner_is_org: bool,
    pub fork: bool,
    pub raw: &'a GhRepo,
}

/// Check all fields the store requires on a repository record.
///
/// Refuses records missing any of {id, name, language, clone URL, owner,
/// owner login, fork flag}; the error lists every absent field at once.
pub fn verify_repo(repo: &GhRepo) -> Result<VerifiedRepo<'_>, ValidationError> {
    let mut fields = Vec::new();

    if repo.id.is_none() {
        fields.push("id");
    }
    if repo.name.is_none() {
        fields.push("name");
    }
    if repo.language.is_none() {
        fields.push("language");
    }
    if repo.clone_url.is_none() {
        fields.push("clone_url");
    }
    match &repo.owner {
        None => fields.push("owner"),
        Some(owner) if owner.login.is_none() => fields.push("owner.login"),
        Some(_) => {}
    }
    if repo.fork.is_none() {
        fields.push("fork");
    }

    if !fields.is_empty() {
        return Err(ValidationError {
            github_id: repo.id,
            fields,
        });
    }

    let owner = repo.owner.as_ref().expect("owner checked above");

    Ok(VerifiedRepo {
        github_id: repo.id.expect("id checked above"),
        name: repo.name.as_deref().expect("name checked above"),
        language: repo.language.as_deref().expect("language checked above"),
        clone_url: repo.clone_url.as_deref().expect("clone_url checked above"),
        owner_login: owner.login.as_deref().expect("owner.login checked above"),
        owner_is_org: owner.is_organization(),
        fork: repo.fork.expect("fork checked above"),
        raw: repo,
    })
}

/// The working-tree location for a repository, relative to the clone
/// root: the lowercased `language/owner/name` triple. This string is both
/// the `clone_path` column and the on-disk path, coupling crawler and
/// fetcher.
pub fn clone_path(language: &str, owner_login: &str, name: &str) -> String {
    format!("{language}/{owner_login}/{name}").to_lowercase()
}

#[cfg(test)]
mod tests {
    use crate::github::types::GhAccount;

    use super::*;

    fn full_repo() -> GhRepo {
        GhRepo {
            id: Some(42),
            name: Some("Hello-World".to_string()),
            language: Some("Rust".to_string()),
            clone_url: Some("https://github.com/octocat/Hello-World.git".to_string()),
            owner: Some(GhAccount {
                id: Some(1),
                login: Some("Octocat".to_string()),
                kind: Some("User".to_string()),
            }),
            fork: Some(false),
            ..GhRepo::default()
        }
    }

    #[test]
    fn complete_record_verifies() {
        let repo = full_repo();
        let verified = verify_repo(&repo).expect("valid record");
        assert_eq!(verified.github_id, 42);
        assert_eq!(verified.owner_login, "Octocat");
        assert!(!verified.owner_is_org);
        assert!(!verified.fork);
    }

    #[test]
    fn missing_fields_are_all_reported() {
        let mut repo = full_repo();
        repo.language = None;
        repo.clone_url = None;
        repo.fork = None;

        let err = verify_repo(&repo).expect_err("invalid record");
        assert_eq!(err.github_id, Some(42));
        assert_eq!(err.fields, vec!["language", "clone_url", "fork"]);
        let message = err.to_string();
        assert!(message.contains("#42"));
        assert!(message.contains("language, clone_url, fork"));
    }

    #[test]
    fn owner_login_is_checked_separately() {
        let mut repo = full_repo();
        repo.owner = Some(GhAccount::default());

        let err = verify_repo(&repo).expect_err("invalid record");
        assert_eq!(err.fields, vec!["owner.login"]);
    }

    #[test]
    fn clone_path_is_lowercased_triple() {
        assert_eq!(
            clone_path("Rust", "Octocat", "Hello-World"),
            "rust/octocat/hello-world"
        );
    }
}
