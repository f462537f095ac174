//! SQLite DDL/DML generation from introspected MySQL tables.

use super::{build_default, TableDefinition};

/// Quote an identifier for SQLite, doubling embedded double quotes
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Build the `CREATE TABLE IF NOT EXISTS` statement for a table.
///
/// Returns `None` for a table without columns; the caller skips its schema.
///
/// An AUTO_INCREMENT column becomes the table's `INTEGER PRIMARY KEY
/// AUTOINCREMENT` and suppresses the table-level key clause. Otherwise all
/// key columns are collected into one trailing `PRIMARY KEY (...)`.
pub fn build_create_statement(table: &TableDefinition) -> Option<String> {
    if table.columns.is_empty() {
        return None;
    }

    let mut defs: Vec<String> = Vec::with_capacity(table.columns.len() + 1);
    let mut primary_keys: Vec<String> = Vec::new();
    let mut has_auto_increment = false;

    for column in &table.columns {
        let name = quote_ident(&column.name);

        if column.is_auto_increment {
            defs.push(format!("{} INTEGER PRIMARY KEY AUTOINCREMENT", name));
            has_auto_increment = true;
            continue;
        }

        let class = column.storage_class();
        let mut def = format!("{} {}", name, class);
        if !column.nullable {
            def.push_str(" NOT NULL");
        }
        let default = build_default(column.raw_default.as_deref(), class);
        if !default.is_empty() {
            def.push(' ');
            def.push_str(&default);
        }
        defs.push(def);

        if column.is_primary_key {
            primary_keys.push(name);
        }
    }

    if !has_auto_increment && !primary_keys.is_empty() {
        defs.push(format!("PRIMARY KEY ({})", primary_keys.join(", ")));
    }

    Some(format!(
        "CREATE TABLE IF NOT EXISTS {} ( {} );",
        quote_ident(&table.name),
        defs.join(", ")
    ))
}

/// Build a positional `INSERT` for the given column order
pub fn build_insert_statement<S: AsRef<str>>(table: &str, columns: &[S]) -> String {
    let names: Vec<String> = columns.iter().map(|c| quote_ident(c.as_ref())).collect();
    let placeholders = vec!["?"; columns.len()].join(", ");
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quote_ident(table),
        names.join(", "),
        placeholders
    )
}
