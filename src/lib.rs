//! Navboard Server Library
//!
//! Bookmark dashboard backend: categories and links with stable ordering,
//! token and root-password access control with a brute-force guard,
//! bulk import/export, and a single-document variant with optimistic
//! concurrency control.

pub mod auth;
pub mod config;
pub mod constants;
pub mod db;
pub mod error;
pub mod import;
pub mod models;
pub mod ordering;
pub mod routes;
pub mod security;
pub mod throttle;

pub use config::Config;
pub use db::{open_store, Db};
pub use error::{AppError, Result};
pub use routes::build_router;

use auth::IdentityVerifier;
use throttle::AttemptThrottle;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Db,
    pub config: Config,
}

impl AppState {
    /// Create a new AppState with the given store and configuration
    pub fn new(store: Db, config: Config) -> Self {
        Self { store, config }
    }

    pub fn throttle(&self) -> AttemptThrottle<'_> {
        AttemptThrottle::new(self.store.attempts(), &self.config.throttle)
    }

    pub fn verifier(&self) -> IdentityVerifier<'_> {
        IdentityVerifier::new(
            self.throttle(),
            self.store.tokens(),
            &self.config.root_password,
            &self.config.token_salt,
        )
    }
}
