//! Core business logic - framework-agnostic operations over ledgers and their data.
//!
//! Every operation takes a database handle and returns typed models or an
//! [`Error`](crate::errors::Error). Ledger-scoped financial data is reached through an
//! [`access::Caller`]; membership and ledger administration take a
//! [`session::Principal`] only.

pub mod access;
pub mod category;
pub mod entry;
pub mod ledger;
pub mod membership;
pub mod plan;
pub mod public;
pub mod session;
pub mod setting;
pub mod summary;
pub mod user;
mod validation;
