//! Database configuration module for the cashflow tracker.
//!
//! This module handles the database connection and schema creation using `SeaORM`.
//! Tables are generated from the entity definitions with `Schema::create_table_from_entity`,
//! and the composite uniqueness rules the entities cannot express are added as unique
//! indexes. Every statement is `IF NOT EXISTS`, so [`create_tables`] is an idempotent
//! migration that is safe to run on every start, from several processes at once.
//!
//! The same code path serves the local `SQLite` file and a remote `PostgreSQL` server;
//! only `DATABASE_URL` differs.

use crate::entities::{
    Category, Entry, Ledger, Membership, Plan, Setting, User, category, membership, setting, user,
};
use crate::errors::Result;
use sea_orm::sea_query::{Index, IndexCreateStatement};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema};
use tracing::{debug, info, instrument};

/// Default connection string used when `DATABASE_URL` is not set.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://data/cashflow.sqlite?mode=rwc";

/// Gets the database URL from environment variable or returns default `SQLite` path.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// Establishes a connection to the database named by `DATABASE_URL`.
///
/// Falls back to a local `SQLite` file if no environment variable is set.
pub async fn create_connection() -> Result<DatabaseConnection> {
    let database_url = get_database_url();
    debug!("Connecting to database");
    Database::connect(&database_url).await.map_err(Into::into)
}

async fn create_table<E>(db: &DatabaseConnection, schema: &Schema, entity: E) -> Result<()>
where
    E: EntityTrait,
{
    let builder = db.get_database_backend();
    let mut statement = schema.create_table_from_entity(entity);
    statement.if_not_exists();
    db.execute(builder.build(&statement)).await?;
    Ok(())
}

fn unique_indexes() -> Vec<IndexCreateStatement> {
    vec![
        Index::create()
            .name("idx_users_provider_identity")
            .table(User)
            .col(user::Column::Provider)
            .col(user::Column::ProviderId)
            .unique()
            .if_not_exists()
            .to_owned(),
        Index::create()
            .name("idx_memberships_ledger_user")
            .table(Membership)
            .col(membership::Column::LedgerId)
            .col(membership::Column::UserId)
            .unique()
            .if_not_exists()
            .to_owned(),
        Index::create()
            .name("idx_categories_ledger_name_type")
            .table(Category)
            .col(category::Column::LedgerId)
            .col(category::Column::Name)
            .col(category::Column::Kind)
            .unique()
            .if_not_exists()
            .to_owned(),
        Index::create()
            .name("idx_settings_ledger_key")
            .table(Setting)
            .col(setting::Column::LedgerId)
            .col(setting::Column::Key)
            .unique()
            .if_not_exists()
            .to_owned(),
    ]
}

/// Creates all tables and unique indexes if they do not exist yet.
///
/// Tables are created parent-first so that foreign keys resolve on backends that check
/// them at creation time.
#[instrument(skip(db))]
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    create_table(db, &schema, User).await?;
    create_table(db, &schema, Ledger).await?;
    create_table(db, &schema, Membership).await?;
    create_table(db, &schema, Category).await?;
    create_table(db, &schema, Plan).await?;
    create_table(db, &schema, Entry).await?;
    create_table(db, &schema, Setting).await?;

    for index in unique_indexes() {
        db.execute(builder.build(&index)).await?;
    }

    info!("Database schema ensured");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{
        CategoryKind, category::Model as CategoryModel, entry::Model as EntryModel,
        ledger::Model as LedgerModel, membership::Model as MembershipModel,
        plan::Model as PlanModel, setting::Model as SettingModel, user::Model as UserModel,
    };
    use crate::errors::Error;
    use crate::test_utils::{create_test_ledger, create_test_user};
    use sea_orm::{ActiveModelTrait, QuerySelect, Set};

    #[tokio::test]
    async fn test_create_tables() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;

        // Test that tables exist by querying them
        let _: Vec<UserModel> = User::find().limit(1).all(&db).await?;
        let _: Vec<LedgerModel> = Ledger::find().limit(1).all(&db).await?;
        let _: Vec<MembershipModel> = Membership::find().limit(1).all(&db).await?;
        let _: Vec<CategoryModel> = Category::find().limit(1).all(&db).await?;
        let _: Vec<PlanModel> = Plan::find().limit(1).all(&db).await?;
        let _: Vec<EntryModel> = Entry::find().limit(1).all(&db).await?;
        let _: Vec<SettingModel> = Setting::find().limit(1).all(&db).await?;

        Ok(())
    }

    #[tokio::test]
    async fn test_create_tables_is_idempotent() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;
        create_tables(&db).await?;
        create_tables(&db).await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_category_uniqueness_is_enforced() -> Result<()> {
        let db = crate::test_utils::setup_test_db().await?;
        let owner = create_test_user(&db, "owner@example.com").await?;
        let ledger = create_test_ledger(&db, &owner, "Household").await?;

        let duplicate = category::ActiveModel {
            ledger_id: Set(ledger.id),
            name: Set("Groceries".to_string()),
            kind: Set(CategoryKind::Expense),
            icon: Set(None),
            color: Set(None),
            ..Default::default()
        };
        let result = duplicate.insert(&db).await.map_err(Error::from);
        assert!(matches!(result, Err(Error::Conflict { .. })));

        Ok(())
    }
}
