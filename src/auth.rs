//! Caller classification.
//!
//! A request is anonymous, a token-holding user, or root (the deployment
//! password). The attempt throttle is consulted before any comparison, and
//! its record for the identity is cleared on success.

use std::net::{IpAddr, SocketAddr};

use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::{header, request::Parts, HeaderMap},
};
use serde::Serialize;

use crate::db::TokenRepo;
use crate::error::{AppError, Result};
use crate::security::{extract_bearer, hash_token, secrets_match};
use crate::throttle::AttemptThrottle;
use crate::AppState;

/// Access level, ordered so that `Root > User > Anonymous`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Anonymous,
    User,
    Root,
}

/// Outcome of checking one credential
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verification {
    /// No credential was presented
    Anonymous,
    Granted(Role),
    /// Wrong credential; `attempts` failures counted in the current window
    Denied { attempts: u32 },
    /// Identity is locked out
    Throttled { retry_after_ms: i64 },
}

pub struct IdentityVerifier<'a> {
    throttle: AttemptThrottle<'a>,
    tokens: Option<&'a dyn TokenRepo>,
    root_secret: &'a str,
    token_salt: &'a str,
}

impl<'a> IdentityVerifier<'a> {
    pub fn new(
        throttle: AttemptThrottle<'a>,
        tokens: Option<&'a dyn TokenRepo>,
        root_secret: &'a str,
        token_salt: &'a str,
    ) -> Self {
        Self {
            throttle,
            tokens,
            root_secret,
            token_salt,
        }
    }

    pub async fn verify(&self, identity: &str, token: Option<&str>) -> Result<Verification> {
        let token = match token.map(str::trim).filter(|t| !t.is_empty()) {
            Some(token) => token,
            None => return Ok(Verification::Anonymous),
        };

        let status = self.throttle.check(identity).await?;
        if status.blocked {
            tracing::warn!(
                "Rejected credential from locked identity {} ({} ms left)",
                identity,
                status.remaining_ms
            );
            return Ok(Verification::Throttled {
                retry_after_ms: status.remaining_ms,
            });
        }

        if let Some(role) = self.classify(token).await? {
            self.throttle.clear(identity).await?;
            return Ok(Verification::Granted(role));
        }

        let outcome = self.throttle.record_failure(identity).await?;
        tracing::warn!(
            "Invalid credential from {} (attempt {})",
            identity,
            outcome.attempts
        );

        if outcome.locked {
            Ok(Verification::Throttled {
                retry_after_ms: outcome.lockout_ms,
            })
        } else {
            Ok(Verification::Denied {
                attempts: outcome.attempts,
            })
        }
    }

    async fn classify(&self, token: &str) -> Result<Option<Role>> {
        if secrets_match(token, self.root_secret) {
            return Ok(Some(Role::Root));
        }

        if let Some(tokens) = self.tokens {
            let hash = hash_token(token, self.token_salt);
            if tokens.token_hash_exists(&hash).await? {
                return Ok(Some(Role::User));
            }
        }

        Ok(None)
    }
}

/// Throttle key for a request
///
/// Forwarding headers are client-controlled unless a proxy in front rewrites
/// them, so only the configured `trusted_header` is read, and otherwise the
/// socket peer decides. For a list-valued header the last entry is the one
/// the nearest proxy appended.
pub fn client_identity(
    headers: &HeaderMap,
    peer: Option<SocketAddr>,
    trusted_header: Option<&str>,
) -> String {
    let from_header = trusted_header.and_then(|name| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.rsplit(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    });

    from_header
        .or_else(|| peer.map(|addr| addr.ip()).map(|ip: IpAddr| ip.to_string()))
        .unwrap_or_else(|| "unknown".to_string())
}

/// The authenticated caller of a request
///
/// Extracting this runs credential verification; a wrong credential is
/// rejected outright (401/429) rather than downgraded to anonymous.
#[derive(Debug, Clone)]
pub struct Caller {
    pub identity: String,
    pub role: Role,
}

impl Caller {
    pub fn is_user(&self) -> bool {
        self.role >= Role::User
    }

    pub fn require_user(&self) -> Result<()> {
        if self.is_user() {
            Ok(())
        } else {
            Err(AppError::Unauthorized { attempts: 0 })
        }
    }

    pub fn require_root(&self) -> Result<()> {
        match self.role {
            Role::Root => Ok(()),
            Role::User => Err(AppError::Forbidden),
            Role::Anonymous => Err(AppError::Unauthorized { attempts: 0 }),
        }
    }
}

#[axum::async_trait]
impl FromRequestParts<AppState> for Caller {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|info| info.0);
        let identity = client_identity(
            &parts.headers,
            peer,
            state.config.trusted_ip_header.as_deref(),
        );

        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(extract_bearer);

        let role = match state.verifier().verify(&identity, token).await? {
            Verification::Anonymous => Role::Anonymous,
            Verification::Granted(role) => role,
            Verification::Denied { attempts } => return Err(AppError::Unauthorized { attempts }),
            Verification::Throttled { retry_after_ms } => {
                return Err(AppError::Throttled { retry_after_ms })
            }
        };

        Ok(Caller { identity, role })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ThrottlePolicy;
    use crate::db::{AttemptRepo, RelationalStore};
    use crate::security::generate_token;
    use axum::http::HeaderValue;

    const ROOT: &str = "correct horse battery staple";
    const SALT: &str = "pepper";

    fn verifier<'a>(store: &'a RelationalStore, policy: &'a ThrottlePolicy) -> IdentityVerifier<'a> {
        IdentityVerifier::new(AttemptThrottle::new(store, policy), Some(store), ROOT, SALT)
    }

    #[tokio::test]
    async fn test_classifies_roles() {
        let store = RelationalStore::open_in_memory().await.unwrap();
        let policy = ThrottlePolicy::default();
        let token = generate_token();
        store
            .create_token("laptop", &hash_token(&token, SALT))
            .await
            .unwrap();
        let verifier = verifier(&store, &policy);

        assert_eq!(
            verifier.verify("ip", None).await.unwrap(),
            Verification::Anonymous
        );
        assert_eq!(
            verifier.verify("ip", Some(ROOT)).await.unwrap(),
            Verification::Granted(Role::Root)
        );
        assert_eq!(
            verifier.verify("ip", Some(&token)).await.unwrap(),
            Verification::Granted(Role::User)
        );
        assert_eq!(
            verifier.verify("ip", Some("guess")).await.unwrap(),
            Verification::Denied { attempts: 1 }
        );
    }

    #[tokio::test]
    async fn test_token_hashed_with_other_salt_is_rejected() {
        let store = RelationalStore::open_in_memory().await.unwrap();
        let policy = ThrottlePolicy::default();
        let token = generate_token();
        store
            .create_token("old", &hash_token(&token, "other-salt"))
            .await
            .unwrap();

        let result = verifier(&store, &policy).verify("ip", Some(&token)).await.unwrap();
        assert_eq!(result, Verification::Denied { attempts: 1 });
    }

    #[tokio::test]
    async fn test_success_clears_failures() {
        let store = RelationalStore::open_in_memory().await.unwrap();
        let policy = ThrottlePolicy::default();
        let verifier = verifier(&store, &policy);

        for _ in 0..4 {
            verifier.verify("ip", Some("nope")).await.unwrap();
        }
        verifier.verify("ip", Some(ROOT)).await.unwrap();

        assert_eq!(store.load_attempt("ip").await.unwrap(), None);
        assert_eq!(
            verifier.verify("ip", Some("nope")).await.unwrap(),
            Verification::Denied { attempts: 1 }
        );
    }

    #[tokio::test]
    async fn test_locked_identity_cannot_use_root() {
        let store = RelationalStore::open_in_memory().await.unwrap();
        let policy = ThrottlePolicy::default();
        let verifier = verifier(&store, &policy);

        for _ in 0..4 {
            assert!(matches!(
                verifier.verify("ip", Some("nope")).await.unwrap(),
                Verification::Denied { .. }
            ));
        }
        assert!(matches!(
            verifier.verify("ip", Some("nope")).await.unwrap(),
            Verification::Throttled { .. }
        ));

        let attempts_before = store.load_attempt("ip").await.unwrap();
        assert!(matches!(
            verifier.verify("ip", Some(ROOT)).await.unwrap(),
            Verification::Throttled { .. }
        ));
        assert_eq!(store.load_attempt("ip").await.unwrap(), attempts_before);
    }

    #[test]
    fn test_client_identity_ignores_untrusted_headers() {
        let mut headers = HeaderMap::new();
        let peer: SocketAddr = "10.1.1.1:5000".parse().unwrap();
        assert_eq!(client_identity(&headers, Some(peer), None), "10.1.1.1");
        assert_eq!(client_identity(&headers, None, None), "unknown");

        headers.insert("x-real-ip", HeaderValue::from_static("10.2.2.2"));
        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.9"));
        headers.insert("cf-connecting-ip", HeaderValue::from_static("198.51.100.4"));
        assert_eq!(client_identity(&headers, Some(peer), None), "10.1.1.1");
    }

    #[test]
    fn test_client_identity_reads_trusted_header() {
        let mut headers = HeaderMap::new();
        let peer: SocketAddr = "10.1.1.1:5000".parse().unwrap();
        headers.insert("cf-connecting-ip", HeaderValue::from_static("198.51.100.4"));
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("1.2.3.4, 203.0.113.9"),
        );

        assert_eq!(
            client_identity(&headers, Some(peer), Some("cf-connecting-ip")),
            "198.51.100.4"
        );
        // A spoofed leading entry is ignored; the proxy appends the real one
        assert_eq!(
            client_identity(&headers, Some(peer), Some("x-forwarded-for")),
            "203.0.113.9"
        );
        // Falls back to the peer when the proxy did not set the header
        assert_eq!(
            client_identity(&headers, Some(peer), Some("x-real-ip")),
            "10.1.1.1"
        );
    }

    #[test]
    fn test_role_requirements() {
        let caller = |role| Caller {
            identity: "ip".to_string(),
            role,
        };

        assert!(caller(Role::Root).require_user().is_ok());
        assert!(matches!(
            caller(Role::User).require_root(),
            Err(AppError::Forbidden)
        ));
        assert!(matches!(
            caller(Role::Anonymous).require_user(),
            Err(AppError::Unauthorized { .. })
        ));
    }
}
