//! Category business logic.
//!
//! Categories group plans as income or expense. Names are unique per ledger and kind;
//! a second category with the same name and kind surfaces as [`Error::Conflict`].

use crate::{
    core::{
        access::{Capability, Caller, authorize},
        validation::{optional_text, require_name},
    },
    entities::{Category, CategoryKind, Plan, category, plan},
    errors::{Error, Result},
};
use sea_orm::{PaginatorTrait, QueryOrder, Set, TransactionTrait, prelude::*};
use tracing::{info, instrument};

/// Input for [`create_category`].
#[derive(Debug, Clone)]
pub struct NewCategory {
    /// Display name
    pub name: String,
    /// Income or expense
    pub kind: CategoryKind,
    /// Optional icon
    pub icon: Option<String>,
    /// Optional color
    pub color: Option<String>,
}

/// Fields to change in [`update_category`]. `Some(None)` clears icon or color.
#[derive(Debug, Clone, Default)]
pub struct CategoryUpdate {
    /// New name
    pub name: Option<String>,
    /// New kind
    pub kind: Option<CategoryKind>,
    /// New or cleared icon
    pub icon: Option<Option<String>>,
    /// New or cleared color
    pub color: Option<Option<String>>,
}

async fn find_category_in_ledger<C>(
    conn: &C,
    ledger_id: i64,
    category_id: i64,
) -> Result<category::Model>
where
    C: ConnectionTrait,
{
    Category::find_by_id(category_id)
        .filter(category::Column::LedgerId.eq(ledger_id))
        .one(conn)
        .await?
        .ok_or(Error::NotFound {
            resource: "category",
        })
}

/// Lists the categories of the caller's ledger ordered by kind, then name.
pub async fn list_categories(
    db: &DatabaseConnection,
    caller: &Caller<'_>,
) -> Result<Vec<category::Model>> {
    let txn = db.begin().await?;
    let grant = authorize(&txn, caller, Capability::Read).await?;

    let categories = Category::find()
        .filter(category::Column::LedgerId.eq(grant.ledger_id))
        .order_by_asc(category::Column::Kind)
        .order_by_asc(category::Column::Name)
        .all(&txn)
        .await?;

    txn.commit().await?;
    Ok(categories)
}

/// Creates a category in the caller's ledger.
///
/// # Errors
/// * [`Error::InvalidInput`] for a blank name
/// * [`Error::Conflict`] if the ledger already has a category with this name and kind
#[instrument(skip(db, new_category))]
pub async fn create_category(
    db: &DatabaseConnection,
    caller: &Caller<'_>,
    new_category: NewCategory,
) -> Result<category::Model> {
    let name = require_name(&new_category.name, "Category")?;

    let txn = db.begin().await?;
    let grant = authorize(&txn, caller, Capability::Write).await?;

    let created = category::ActiveModel {
        ledger_id: Set(grant.ledger_id),
        name: Set(name),
        kind: Set(new_category.kind),
        icon: Set(optional_text(new_category.icon)),
        color: Set(optional_text(new_category.color)),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;
    info!(category_id = created.id, "Category created");
    Ok(created)
}

/// Applies a partial update to a category of the caller's ledger.
#[instrument(skip(db, update))]
pub async fn update_category(
    db: &DatabaseConnection,
    caller: &Caller<'_>,
    category_id: i64,
    update: CategoryUpdate,
) -> Result<category::Model> {
    let name = update
        .name
        .as_deref()
        .map(|name| require_name(name, "Category"))
        .transpose()?;

    let txn = db.begin().await?;
    let grant = authorize(&txn, caller, Capability::Write).await?;
    let existing = find_category_in_ledger(&txn, grant.ledger_id, category_id).await?;

    let mut active: category::ActiveModel = existing.into();
    if let Some(name) = name {
        active.name = Set(name);
    }
    if let Some(kind) = update.kind {
        active.kind = Set(kind);
    }
    if let Some(icon) = update.icon {
        active.icon = Set(optional_text(icon));
    }
    if let Some(color) = update.color {
        active.color = Set(optional_text(color));
    }

    let updated = active.update(&txn).await?;
    txn.commit().await?;
    Ok(updated)
}

/// Deletes a category of the caller's ledger.
///
/// # Errors
/// * [`Error::InvalidOperation`] while any plan still uses the category
#[instrument(skip(db))]
pub async fn delete_category(
    db: &DatabaseConnection,
    caller: &Caller<'_>,
    category_id: i64,
) -> Result<()> {
    let txn = db.begin().await?;
    let grant = authorize(&txn, caller, Capability::Write).await?;
    let category = find_category_in_ledger(&txn, grant.ledger_id, category_id).await?;

    let plan_count = Plan::find()
        .filter(plan::Column::CategoryId.eq(category.id))
        .count(&txn)
        .await?;
    if plan_count > 0 {
        return Err(Error::invalid_operation(format!(
            "category '{}' is used by {plan_count} plan(s)",
            category.name
        )));
    }

    Category::delete_by_id(category.id).exec(&txn).await?;
    txn.commit().await?;
    info!(category_id, "Category deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::entities::{Frequency, Role};
    use crate::errors::ErrorKind;
    use crate::test_utils::*;

    fn new_category(name: &str, kind: CategoryKind) -> NewCategory {
        NewCategory {
            name: name.to_string(),
            kind,
            icon: Some("🎁".to_string()),
            color: None,
        }
    }

    #[tokio::test]
    async fn test_list_categories_ordered() -> Result<()> {
        let (db, owner, ledger) = setup_with_ledger().await?;
        let caller = Caller::member(principal_of(&owner), ledger.id);

        let categories = list_categories(&db, &caller).await?;
        assert_eq!(categories.len(), 10);
        // "expense" sorts before "income"
        assert_eq!(categories[0].kind, CategoryKind::Expense);
        assert_eq!(categories[9].kind, CategoryKind::Income);
        let expense_names: Vec<&str> = categories
            .iter()
            .filter(|c| c.kind == CategoryKind::Expense)
            .map(|c| c.name.as_str())
            .collect();
        let mut sorted = expense_names.clone();
        sorted.sort_unstable();
        assert_eq!(expense_names, sorted);

        Ok(())
    }

    #[tokio::test]
    async fn test_create_and_duplicate_category() -> Result<()> {
        let (db, owner, ledger) = setup_with_ledger().await?;
        let caller = Caller::member(principal_of(&owner), ledger.id);

        let gifts = create_category(&db, &caller, new_category("Gifts", CategoryKind::Expense)).await?;
        assert_eq!(gifts.ledger_id, ledger.id);
        assert_eq!(gifts.icon.as_deref(), Some("🎁"));

        let duplicate = create_category(&db, &caller, new_category("Gifts", CategoryKind::Expense)).await;
        assert_eq!(duplicate.unwrap_err().kind(), ErrorKind::Conflict);

        // Same name with the other kind is a different category
        create_category(&db, &caller, new_category("Gifts", CategoryKind::Income)).await?;

        let blank = create_category(&db, &caller, new_category("  ", CategoryKind::Income)).await;
        assert!(matches!(blank, Err(Error::InvalidInput { .. })));

        Ok(())
    }

    #[tokio::test]
    async fn test_update_category() -> Result<()> {
        let (db, owner, ledger) = setup_with_ledger().await?;
        let caller = Caller::member(principal_of(&owner), ledger.id);
        let category = first_category(&db, ledger.id, CategoryKind::Expense).await?;

        let updated = update_category(
            &db,
            &caller,
            category.id,
            CategoryUpdate {
                name: Some("Home".to_string()),
                icon: Some(None),
                ..Default::default()
            },
        )
        .await?;
        assert_eq!(updated.name, "Home");
        assert!(updated.icon.is_none());
        assert_eq!(updated.kind, category.kind);
        assert_eq!(updated.color, category.color);

        Ok(())
    }

    #[tokio::test]
    async fn test_delete_category_blocked_by_plans() -> Result<()> {
        let (db, owner, ledger) = setup_with_ledger().await?;
        let caller = Caller::member(principal_of(&owner), ledger.id);
        let plan = create_test_plan(&db, &caller, CategoryKind::Expense, "Rent", Frequency::Monthly)
            .await?;

        let blocked = delete_category(&db, &caller, plan.category_id).await;
        assert!(matches!(blocked, Err(Error::InvalidOperation { .. })));
        assert!(Category::find_by_id(plan.category_id).one(&db).await?.is_some());

        crate::core::plan::delete_plan(&db, &caller, plan.id).await?;
        delete_category(&db, &caller, plan.category_id).await?;
        assert!(Category::find_by_id(plan.category_id).one(&db).await?.is_none());

        Ok(())
    }

    #[tokio::test]
    async fn test_category_of_other_ledger_is_not_found() -> Result<()> {
        let (db, owner, ledger) = setup_with_ledger().await?;
        let other = create_test_ledger(&db, &owner, "Other").await?;
        let foreign = first_category(&db, other.id, CategoryKind::Income).await?;
        let caller = Caller::member(principal_of(&owner), ledger.id);

        let result = delete_category(&db, &caller, foreign.id).await;
        assert!(matches!(result, Err(Error::NotFound { resource: "category" })));

        Ok(())
    }

    #[tokio::test]
    async fn test_viewer_cannot_create_category() -> Result<()> {
        let (db, owner, ledger) = setup_with_ledger().await?;
        let viewer = create_test_user(&db, "viewer@example.com").await?;
        crate::core::membership::invite_member(
            &db,
            principal_of(&owner),
            ledger.id,
            "viewer@example.com",
            Role::Viewer,
        )
        .await?;
        let caller = Caller::member(principal_of(&viewer), ledger.id);

        assert_eq!(list_categories(&db, &caller).await?.len(), 10);
        let result = create_category(&db, &caller, new_category("Gifts", CategoryKind::Expense)).await;
        assert!(matches!(result, Err(Error::Forbidden { .. })));

        Ok(())
    }
}
