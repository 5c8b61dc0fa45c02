//! Database migrations for the harvest schema.
//!
//! This module is only available when the `migrate` feature is enabled.
//! Production deployments normally run against a pre-provisioned schema;
//! the migrator exists for bootstrapping and for the integration tests.

pub use sea_orm_migration::prelude::*;

mod m20250301_000001_create_schema;

/// The migrator that runs all migrations.
pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(m20250301_000001_create_schema::Migration)]
    }

    fn migration_table_name() -> SeaRc<dyn Iden> {
        SeaRc::new(Alias::new("harvest_migrations"))
    }
}
