//! Bakaláři API client.
//!
//! This module provides an authenticated HTTP client for the Bakaláři
//! school information system (v3 API).
//!
//! Key characteristics of the backend:
//! - OAuth2-style token exchanges at `/api/login` (password grant to open
//!   a session, refresh grant to renew it)
//! - Bearer-authenticated resource calls under `/api/3/`
//! - No token expiry metadata worth trusting client-side; expiry is
//!   discovered reactively through a 401 and recovered by a single
//!   refresh-and-retry
//! - Collections are returned whole (no pagination)

mod endpoints;
mod error;
mod session;
mod types;

pub use endpoints::Client;
pub use error::{ApiError, AuthError};
pub use session::{Credentials, Session};
pub use types::{Atom, Day, Group, Hour, Room, Subject, Teacher, Timetable, TokenResponse};
