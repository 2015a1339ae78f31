//! Request and response contexts consumed by the dispatch pipeline.
//!
//! The transport layer (socket accept, header parsing, TLS) lives outside this
//! crate. It parses the wire request into a [`Request`], pairs it with a fresh
//! [`Response`], hands both to [`crate::dispatcher::Dispatcher::dispatch`],
//! and writes the resulting status, headers and payload back to the wire.

mod request;
mod response;

pub use request::{parse_query_params, Request};
pub use response::{status_reason, Response};
