//! Table naming shared by the engine and the schema bootstrap.

/// Database holding the insert-select source tables.
pub const SELECT_DATABASE: &str = "db_select";

/// `<database>.table_<index>`, the destination table of one worker.
pub fn dest_table(database: &str, index: usize) -> String {
    format!("{database}.table_{index}")
}

/// `db_select.table_select_<txn_size_mb>`, shared by all insert-select workers.
pub fn select_source_table(txn_size_mb: u64) -> String {
    format!("{SELECT_DATABASE}.table_select_{txn_size_mb}")
}

/// Names are interpolated into SQL text, so only plain identifiers are allowed.
pub fn is_valid_identifier(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= 64
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}
