//! HTTP API for Under the Radar: routing, handlers, auth and the upload
//! pipeline. The binary in `radar-server` only wires configuration into
//! [`router::build`].

pub mod auth;
pub mod board;
pub mod effects;
pub mod error;
pub mod extract;
pub mod feed;
pub mod follows;
pub mod gamification;
pub mod media;
pub mod merch;
pub mod messages;
pub mod metrics;
pub mod middleware;
pub mod notifications;
pub mod router;
pub mod scan;
pub mod shows;
pub mod state;
pub mod storage;
pub mod users;
pub mod validate;

pub use router::build;
pub use state::{ApiConfig, AppState, build_state};
