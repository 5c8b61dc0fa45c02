//! Re-exports of all entities for convenient glob imports.

pub use super::github_organization::Entity as GithubOrganization;
pub use super::github_repository::Entity as GithubRepository;
pub use super::github_user::Entity as GithubUser;
pub use super::github_user_organization::Entity as GithubUserOrganization;
pub use super::repository::Entity as Repository;
pub use super::user::Entity as User;
pub use super::user_repository::Entity as UserRepository;
