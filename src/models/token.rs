use serde::{Deserialize, Serialize};

/// Stored API token metadata (the hash is never read back out)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Token {
    pub id: i64,
    pub name: String,
    pub created_at: i64,
}

/// Response for a freshly created token
///
/// `token` is the plaintext secret; this is the only time it is shown.
#[derive(Debug, Clone, Serialize)]
pub struct CreatedToken {
    pub id: i64,
    pub name: String,
    pub token: String,
}
