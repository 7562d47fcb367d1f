use redb::TableDefinition;

/// Snapshot table: `nav_data` -> `{version, data}` (JSON)
pub const SNAPSHOT: TableDefinition<&str, &[u8]> = TableDefinition::new("snapshot");

/// Login attempts table: identity -> LoginAttempt (JSON)
pub const LOGIN_ATTEMPTS: TableDefinition<&str, &[u8]> = TableDefinition::new("login_attempts");
