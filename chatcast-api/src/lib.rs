//! HTTP and WebSocket gateway.
//!
//! Exposes the subscriber wire protocol over `/ws` and a liveness probe on
//! `/health`. All session state lives in the core registry; this crate only
//! translates between socket frames and registry calls.

pub mod http;

pub use http::router;
