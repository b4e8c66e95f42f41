//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the tables of the final schema revision: users, ledgers,
//! memberships, and the financial data each ledger owns (categories, plans, entries, settings).
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod category;
pub mod entry;
pub mod ledger;
pub mod membership;
pub mod plan;
pub mod setting;
pub mod user;

// Re-export specific types to avoid conflicts
pub use category::{
    CategoryKind, Column as CategoryColumn, Entity as Category, Model as CategoryModel,
};
pub use entry::{Column as EntryColumn, Entity as Entry, Model as EntryModel};
pub use ledger::{Column as LedgerColumn, Entity as Ledger, Model as LedgerModel};
pub use membership::{
    Column as MembershipColumn, Entity as Membership, Model as MembershipModel, Role,
};
pub use plan::{
    Column as PlanColumn, Entity as Plan, Frequency, Model as PlanModel, PlanStatus,
};
pub use setting::{Column as SettingColumn, Entity as Setting, Model as SettingModel};
pub use user::{Column as UserColumn, Entity as User, Model as UserModel};
