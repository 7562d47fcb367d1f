use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;
use url::{ParseError, Url};

use crate::constants::{ALLOWED_URL_SCHEMES, MAX_URL_CHARS};

type HmacSha256 = Hmac<Sha256>;

/// Fixed key used only to bring both sides of a secret comparison to equal length
const COMPARE_KEY: &[u8] = b"navboard-secret-compare";

/// Current wall-clock time in epoch milliseconds
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

// =============================================================================
// API Tokens
// =============================================================================

/// Generate a fresh API token: 32 random bytes, hex encoded (64 chars)
///
/// The plaintext is shown to the caller exactly once; only
/// [`hash_token`] of it is ever stored.
pub fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Derive the stored hash of an API token
///
/// # Algorithm
/// `token_hash = HMAC-SHA256(key = salt, message = token)`, hex encoded.
/// The salt is the deployment's `TOKEN_SALT`, so a leaked table is useless
/// without the server configuration.
pub fn hash_token(token: &str, salt: &str) -> String {
    let mut mac = match HmacSha256::new_from_slice(salt.as_bytes()) {
        Ok(m) => m,
        Err(_) => {
            tracing::error!("Failed to create HMAC instance");
            return String::new();
        }
    };
    mac.update(token.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

// =============================================================================
// Root Secret Comparison
// =============================================================================

/// Compare a caller-supplied secret against the configured one in constant time
///
/// Both values are run through HMAC-SHA256 first, so the comparison always
/// covers two 32-byte digests regardless of the input lengths, and
/// `verify_slice` never exits on the first differing byte.
pub fn secrets_match(supplied: &str, expected: &str) -> bool {
    if expected.is_empty() {
        return false;
    }

    let mut expected_mac = match HmacSha256::new_from_slice(COMPARE_KEY) {
        Ok(m) => m,
        Err(_) => return false,
    };
    expected_mac.update(expected.as_bytes());
    let expected_digest = expected_mac.finalize().into_bytes();

    let mut mac = match HmacSha256::new_from_slice(COMPARE_KEY) {
        Ok(m) => m,
        Err(_) => return false,
    };
    mac.update(supplied.as_bytes());
    mac.verify_slice(&expected_digest).is_ok()
}

/// Pull the credential out of an `Authorization` header value
///
/// Accepts `Bearer <token>` as well as a bare token.
pub fn extract_bearer(header: &str) -> Option<&str> {
    let token = header
        .strip_prefix("Bearer ")
        .unwrap_or(header)
        .trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

// =============================================================================
// URL Validation
// =============================================================================

/// Reasons a link URL is rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlRejection {
    Missing,
    MissingScheme,
    UnsupportedScheme,
    MissingHost,
    Malformed,
    TooLong,
}

impl UrlRejection {
    pub fn as_str(self) -> &'static str {
        match self {
            UrlRejection::Missing => "missing url",
            UrlRejection::MissingScheme => "missing scheme",
            UrlRejection::UnsupportedScheme => "unsupported scheme (only http/https allowed)",
            UrlRejection::MissingHost => "missing host",
            UrlRejection::Malformed => "malformed url",
            UrlRejection::TooLong => "url too long",
        }
    }
}

/// Validate a link URL against the scheme allow-list
pub fn validate_url(url: &str) -> Result<(), UrlRejection> {
    let url = url.trim();
    if url.is_empty() {
        return Err(UrlRejection::Missing);
    }
    if url.chars().count() > MAX_URL_CHARS {
        return Err(UrlRejection::TooLong);
    }

    let parsed = Url::parse(url).map_err(|e| match e {
        ParseError::RelativeUrlWithoutBase => UrlRejection::MissingScheme,
        ParseError::EmptyHost => UrlRejection::MissingHost,
        _ => UrlRejection::Malformed,
    })?;
    if !ALLOWED_URL_SCHEMES.contains(&parsed.scheme()) {
        return Err(UrlRejection::UnsupportedScheme);
    }
    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(UrlRejection::MissingHost);
    }

    Ok(())
}
