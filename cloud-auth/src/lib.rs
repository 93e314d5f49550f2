//! # Cloud Auth
//!
//! Session handling for the gallery's cloud backend.
//!
//! This crate provides:
//! - Password sign-in, token refresh and sign-out against the backend's
//!   `/auth/v1` endpoints
//! - A [`SessionProvider`] that holds the current session and broadcasts
//!   session changes to subscribers
//!
//! ## Separation of Concerns
//!
//! This crate focuses solely on authentication. It does **not**:
//! - Persist sessions (handled by the application)
//! - Talk to the photo tables or the storage bucket (handled by `photo-gallery`)
//! - Render any sign-in UI
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use cloud_auth::{AuthService, SessionProvider};
//!
//! let auth = AuthService::new("https://api.example.com".to_string(), anon_key)?;
//! let sessions = SessionProvider::default();
//! sessions.sign_in(&auth, "me@example.com", "secret").await?;
//!
//! let mut changes = sessions.subscribe();
//! while changes.changed().await.is_ok() {
//!     // rebuild online stores
//! }
//! ```

pub mod models;
pub mod service;
pub mod session;

pub use models::{Session, SessionChange, TokenResponse, User};
pub use service::{AuthError, AuthService};
pub use session::SessionProvider;
