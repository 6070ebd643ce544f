//! SQL text generation for the table accessors.
//!
//! Table and column names are always passed through [`quote_identifier`];
//! values are never interpolated and always bound through numbered `?N`
//! placeholders.

/// Quotes `name` as a SQLite identifier.
///
/// Embedded double quotes are doubled, so the result always names exactly
/// `name` and can never be parsed as SQL syntax.
///
/// ```
/// assert_eq!(sqlentity::sql::quote_identifier("users"), "\"users\"");
/// assert_eq!(sqlentity::sql::quote_identifier("a\"b"), "\"a\"\"b\"");
/// ```
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn quoted_list<'a>(names: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    names.into_iter().map(quote_identifier).collect()
}

/// `SELECT * FROM "table"`
pub fn select_all(table: &str) -> String {
    format!("SELECT * FROM {}", quote_identifier(table))
}

/// `INSERT INTO "table" ("c1", "c2") VALUES (?1, ?2)`
pub fn insert<'a>(table: &str, columns: impl IntoIterator<Item = &'a str>) -> String {
    let columns = quoted_list(columns);
    let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{}", i)).collect();
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quote_identifier(table),
        columns.join(", "),
        placeholders.join(", ")
    )
}

/// `UPDATE "table" SET "c1" = ?1, "c2" = ?2 WHERE "key" = ?3`
///
/// The key value binds to the last placeholder.
pub fn update<'a>(table: &str, columns: impl IntoIterator<Item = &'a str>, key: &str) -> String {
    let assignments: Vec<String> = quoted_list(columns)
        .into_iter()
        .enumerate()
        .map(|(i, column)| format!("{} = ?{}", column, i + 1))
        .collect();
    format!(
        "UPDATE {} SET {} WHERE {} = ?{}",
        quote_identifier(table),
        assignments.join(", "),
        quote_identifier(key),
        assignments.len() + 1
    )
}

/// `DELETE FROM "table" WHERE "key" = ?1`
pub fn delete(table: &str, key: &str) -> String {
    format!(
        "DELETE FROM {} WHERE {} = ?1",
        quote_identifier(table),
        quote_identifier(key)
    )
}

/// `SELECT EXISTS(SELECT 1 FROM "table" WHERE "key" = ?1)`
pub fn exists(table: &str, key: &str) -> String {
    format!(
        "SELECT EXISTS(SELECT 1 FROM {} WHERE {} = ?1)",
        quote_identifier(table),
        quote_identifier(key)
    )
}
