/// Database configuration, connection and schema creation
pub mod database;

/// Default categories and settings seeded into new ledgers
pub mod defaults;
