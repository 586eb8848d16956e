//! omicscope-chat - turns a user question into an answer and keeps the
//! per-session chat log.
//!
//!   router  - ordered `(predicate, handler)` rules, first match wins
//!   session - append-only chat log and the session store
//!   service - route → translate → append, one submission at a time

pub mod router;
pub mod service;
pub mod session;

pub use router::{
    default_rules, Answer, Completion, Intent, Matcher, QueryRouter, RouteContext, RouteError, Rule,
    RuleHandler, GREETING_REPLY,
};
pub use service::{ChatError, ChatService};
pub use session::{ChatSession, ChatTurn, SessionHandle, SessionStore};
