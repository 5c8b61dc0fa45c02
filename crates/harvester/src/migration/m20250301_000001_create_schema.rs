//! Initial migration to create the harvest database schema.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        self.create_repositories(manager).await?;
        self.create_gh_repositories(manager).await?;
        self.create_users(manager).await?;
        self.create_gh_users(manager).await?;
        self.create_gh_organizations(manager).await?;
        self.create_users_repositories(manager).await?;
        self.create_gh_users_organizations(manager).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for table in [
            GhUsersOrganizations::Table.into_table_ref(),
            UsersRepositories::Table.into_table_ref(),
            GhOrganizations::Table.into_table_ref(),
            GhUsers::Table.into_table_ref(),
            Users::Table.into_table_ref(),
            GhRepositories::Table.into_table_ref(),
            Repositories::Table.into_table_ref(),
        ] {
            manager
                .drop_table(Table::drop().table(table).to_owned())
                .await?;
        }
        Ok(())
    }
}

impl Migration {
    async fn create_repositories(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Repositories::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Repositories::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Repositories::Name).string().not_null())
                    .col(
                        ColumnDef::new(Repositories::PrimaryLanguage)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Repositories::CloneUrl)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Repositories::ClonePath)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Repositories::Vcs).string().not_null())
                    .to_owned(),
            )
            .await
    }

    async fn create_gh_repositories(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(GhRepositories::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(GhRepositories::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(GhRepositories::RepositoryId)
                            .big_integer()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(GhRepositories::GithubId)
                            .big_integer()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(GhRepositories::FullName).string().null())
                    .col(ColumnDef::new(GhRepositories::Description).text().null())
                    .col(ColumnDef::new(GhRepositories::Homepage).text().null())
                    .col(ColumnDef::new(GhRepositories::Fork).boolean().not_null())
                    .col(ColumnDef::new(GhRepositories::DefaultBranch).string().null())
                    .col(ColumnDef::new(GhRepositories::HtmlUrl).text().null())
                    .col(ColumnDef::new(GhRepositories::ForksCount).integer().null())
                    .col(
                        ColumnDef::new(GhRepositories::OpenIssuesCount)
                            .integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(GhRepositories::StargazersCount)
                            .integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(GhRepositories::SubscribersCount)
                            .integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(GhRepositories::WatchersCount)
                            .integer()
                            .null(),
                    )
                    .col(ColumnDef::new(GhRepositories::SizeInKb).big_integer().null())
                    .col(
                        ColumnDef::new(GhRepositories::CreatedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(GhRepositories::UpdatedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(GhRepositories::PushedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(GhRepositories::Table, GhRepositories::RepositoryId)
                            .to(Repositories::Table, Repositories::Id),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn create_users(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Users::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Users::Username)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Users::Name).string().null())
                    .col(ColumnDef::new(Users::Email).string().null())
                    .to_owned(),
            )
            .await
    }

    async fn create_gh_users(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(GhUsers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(GhUsers::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(GhUsers::UserId)
                            .big_integer()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(GhUsers::GithubId)
                            .big_integer()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(GhUsers::Login)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(GhUsers::Bio).text().null())
                    .col(ColumnDef::new(GhUsers::Blog).string().null())
                    .col(ColumnDef::new(GhUsers::Company).string().null())
                    .col(ColumnDef::new(GhUsers::Email).string().null())
                    .col(ColumnDef::new(GhUsers::Hireable).boolean().null())
                    .col(ColumnDef::new(GhUsers::Location).string().null())
                    .col(ColumnDef::new(GhUsers::AvatarUrl).text().null())
                    .col(ColumnDef::new(GhUsers::HtmlUrl).text().null())
                    .col(ColumnDef::new(GhUsers::FollowersCount).integer().null())
                    .col(ColumnDef::new(GhUsers::FollowingCount).integer().null())
                    .col(ColumnDef::new(GhUsers::CollaboratorsCount).integer().null())
                    .col(
                        ColumnDef::new(GhUsers::CreatedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(GhUsers::UpdatedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(GhUsers::Table, GhUsers::UserId)
                            .to(Users::Table, Users::Id),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn create_gh_organizations(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(GhOrganizations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(GhOrganizations::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(GhOrganizations::GithubId)
                            .big_integer()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(GhOrganizations::Login)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(GhOrganizations::AvatarUrl).text().null())
                    .col(ColumnDef::new(GhOrganizations::HtmlUrl).text().null())
                    .col(ColumnDef::new(GhOrganizations::Name).string().null())
                    .col(ColumnDef::new(GhOrganizations::Company).string().null())
                    .col(ColumnDef::new(GhOrganizations::Blog).string().null())
                    .col(ColumnDef::new(GhOrganizations::Location).string().null())
                    .col(ColumnDef::new(GhOrganizations::Email).string().null())
                    .col(
                        ColumnDef::new(GhOrganizations::CollaboratorsCount)
                            .integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(GhOrganizations::CreatedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(GhOrganizations::UpdatedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn create_users_repositories(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(UsersRepositories::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(UsersRepositories::UserId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(UsersRepositories::RepositoryId)
                            .big_integer()
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .col(UsersRepositories::UserId)
                            .col(UsersRepositories::RepositoryId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(UsersRepositories::Table, UsersRepositories::UserId)
                            .to(Users::Table, Users::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(UsersRepositories::Table, UsersRepositories::RepositoryId)
                            .to(Repositories::Table, Repositories::Id),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn create_gh_users_organizations(
        &self,
        manager: &SchemaManager<'_>,
    ) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(GhUsersOrganizations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(GhUsersOrganizations::GhUserId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(GhUsersOrganizations::GhOrganizationId)
                            .big_integer()
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .col(GhUsersOrganizations::GhUserId)
                            .col(GhUsersOrganizations::GhOrganizationId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(GhUsersOrganizations::Table, GhUsersOrganizations::GhUserId)
                            .to(GhUsers::Table, GhUsers::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(
                                GhUsersOrganizations::Table,
                                GhUsersOrganizations::GhOrganizationId,
                            )
                            .to(GhOrganizations::Table, GhOrganizations::Id),
                    )
                    .to_owned(),
            )
            .await
    }
}

#[derive(DeriveIden)]
enum Repositories {
    Table,
    Id,
    Name,
    PrimaryLanguage,
    CloneUrl,
    ClonePath,
    Vcs,
}

#[derive(DeriveIden)]
enum GhRepositories {
    Table,
    Id,
    RepositoryId,
    GithubId,
    FullName,
    Description,
    Homepage,
    Fork,
    DefaultBranch,
    HtmlUrl,
    ForksCount,
    OpenIssuesCount,
    StargazersCount,
    SubscribersCount,
    WatchersCount,
    SizeInKb,
    CreatedAt,
    UpdatedAt,
    PushedAt,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    Username,
    Name,
    Email,
}

#[derive(DeriveIden)]
enum GhUsers {
    Table,
    Id,
    UserId,
    GithubId,
    Login,
    Bio,
    Blog,
    Company,
    Email,
    Hireable,
    Location,
    AvatarUrl,
    HtmlUrl,
    FollowersCount,
    FollowingCount,
    CollaboratorsCount,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum GhOrganizations {
    Table,
    Id,
    GithubId,
    Login,
    AvatarUrl,
    HtmlUrl,
    Name,
    Company,
    Blog,
    Location,
    Email,
    CollaboratorsCount,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum UsersRepositories {
    Table,
    UserId,
    RepositoryId,
}

#[derive(DeriveIden)]
enum GhUsersOrganizations {
    Table,
    GhUserId,
    GhOrganizationId,
}
