/// Default number of failed logins before an identity is locked out
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Default sliding window for counting failed logins (60 seconds)
pub const DEFAULT_WINDOW_MS: i64 = 60_000;

/// Default lockout duration once the limit is reached (15 minutes)
pub const DEFAULT_LOCKOUT_MS: i64 = 900_000;

/// Default number of link inserts committed per import chunk
pub const DEFAULT_IMPORT_CHUNK_SIZE: usize = 50;

/// Upper bound on statements per batch accepted by the store
/// Larger batches may be rejected or truncated by the backend
pub const MAX_BATCH_STATEMENTS: usize = 100;

/// Number of skipped import items echoed back in the report
pub const MAX_SKIPPED_EXAMPLES: usize = 10;

/// Maximum length of a category or link title (characters)
pub const MAX_TITLE_CHARS: usize = 100;

/// Maximum length of a link URL (characters)
pub const MAX_URL_CHARS: usize = 2048;

/// Maximum length of a link description or icon reference (characters)
pub const MAX_DESCRIPTION_CHARS: usize = 500;

/// Schemes a stored link may use
pub const ALLOWED_URL_SCHEMES: [&str; 2] = ["http", "https"];

// =============================================================================
// Snapshot (single-blob) limits
// =============================================================================

/// Key holding the whole dataset in the snapshot store
pub const SNAPSHOT_KEY: &str = "nav_data";

/// Version reported for a store that has never been written
pub const INITIAL_SNAPSHOT_VERSION: i64 = 1;

/// Snapshot titles are cut to this many characters
pub const SNAPSHOT_TITLE_CHARS: usize = 50;

/// Snapshot URLs are cut to this many characters
pub const SNAPSHOT_URL_CHARS: usize = 500;

/// Fallback title for snapshot groups sent without one
pub const DEFAULT_CATEGORY_TITLE: &str = "Default";

// =============================================================================
// Error Messages
// =============================================================================

/// Error message for deleting a category that still owns links
pub const ERR_CATEGORY_NOT_EMPTY: &str =
    "Category still contains links - move or delete them before deleting the category";

/// Error message for operations that need the root credential
pub const ERR_ROOT_REQUIRED: &str = "Root privilege required";

/// Error message for a missing or rejected credential
pub const ERR_UNAUTHORIZED: &str = "Unauthorized";

/// Error message returned alongside the pending payload on a version conflict
pub const ERR_SNAPSHOT_CONFLICT: &str =
    "Stored data is newer than your copy - back up the pending data below, then reload";
