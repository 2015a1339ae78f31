//! # Dispatcher Module
//!
//! The per-request dispatch pipeline: given a parsed request and a response
//! context, it runs the matching BEFORE filters, resolves and invokes the
//! route handler, runs the matching AFTER filters, and finalizes the
//! response.
//!
//! ## Pipeline
//!
//! 1. Every matching BEFORE filter runs in registration order.
//! 2. The first-registered matching route runs; its return value becomes the
//!    body content. A HEAD request with no HEAD route but a mapped GET route
//!    gets an empty synthesized body without invoking the GET handler.
//! 3. Every matching AFTER filter runs in registration order.
//! 4. Finalize: apply any halt, decide consumed/not-consumed, default the
//!    content type, and write the body as UTF-8.
//!
//! A [`Halt`] raised at any stage skips directly to finalize. A genuine
//! failure is recovered locally: a registered [`crate::router::FaultBinding`]
//! may rewrite the response, otherwise the status is forced to 500 with the
//! fixed internal-error body.
//!
//! ## Example
//!
//! ```rust
//! use http::Method;
//! use sendero::dispatcher::{halt, DispatchOutcome, Dispatcher};
//! use sendero::router::Router;
//! use sendero::server::{Request, Response};
//! use std::sync::Arc;
//!
//! # fn main() -> anyhow::Result<()> {
//! let mut router = Router::new();
//! router.before("/protected/*", |_req, _res| Err(halt(401, "Go away")))?;
//! router.get("/hello/:name", |req, _res| {
//!     Ok(req.param("name").map(|n| format!("Hello {n}!")))
//! })?;
//!
//! let dispatcher = Dispatcher::new(Arc::new(router));
//! let mut req = Request::from_parts(Method::GET, "/hello/world");
//! let mut res = Response::new();
//! match dispatcher.dispatch(&mut req, &mut res) {
//!     DispatchOutcome::Consumed { status, body } => {
//!         assert_eq!(status, 200);
//!         assert_eq!(body, "Hello world!");
//!     }
//!     DispatchOutcome::NotConsumed => unreachable!(),
//! }
//! # Ok(())
//! # }
//! ```

mod core;

pub use core::{
    halt, not_found_body, DispatchMode, DispatchOutcome, Dispatcher, FilterHandler, Halt,
    HandlerError, HandlerResult, RouteHandler, DEFAULT_CONTENT_TYPE, INTERNAL_ERROR_BODY,
};
