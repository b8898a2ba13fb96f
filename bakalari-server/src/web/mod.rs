//! Web layer exposing the tool catalog over HTTP.
//!
//! Three endpoints: a health check, the catalog listing, and tool
//! invocation by name.

mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
