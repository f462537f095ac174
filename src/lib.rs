//! Export a MySQL/MariaDB database into a single SQLite file.
//!
//! Schema is translated column by column (storage class, NOT NULL, DEFAULT,
//! primary key / AUTOINCREMENT) and rows are streamed table by table, one
//! transaction per table. Tables matching ignore patterns keep their schema
//! but get no rows.

pub mod config;
pub mod export;
pub mod progress;
pub mod schema;
pub mod selector;
pub mod source;
pub mod sqlite;
