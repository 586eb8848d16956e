//! omicscope-web - the OmicScope dashboard over HTTP:
//!   - sidebar with response language and panel toggles
//!   - six analytics panels over the loaded dataset
//!   - text and voice chat backed by the query router
//!   - per-session chat history and SSE activity stream

pub mod error;
pub mod handlers;
pub mod router;
pub mod session;
pub mod sse;
pub mod state;

pub use error::WebError;
pub use router::build_router;
pub use state::{AppEvent, AppState, DashboardSettings, SessionEvent, SharedState};
