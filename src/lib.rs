//! # Sendero
//!
//! **Sendero** is the route matching and filter-dispatch core of an embedded
//! HTTP server: given an incoming request (method, path, declared accept
//! type), it selects the matching route and filter handlers, executes them in
//! a fixed sequence, and produces the response status and body.
//!
//! The transport layer - socket accept, header parsing, TLS - lives outside
//! this crate. It hands a parsed [`server::Request`] and a fresh
//! [`server::Response`] to [`dispatcher::Dispatcher::dispatch`] and writes the
//! resulting bytes.
//!
//! ## Architecture
//!
//! - **[`router`]** - pattern compilation and the route/filter/fault registry:
//!   `/`-separated path patterns with `:name` parameters and `*` wildcards,
//!   compiled to regexes at registration time, matched first-registered-wins
//! - **[`dispatcher`]** - the per-request pipeline: BEFORE filters, the route
//!   handler, AFTER filters, halt short-circuiting, GET-backed HEAD
//!   synthesis, fault recovery, and the consumed/not-consumed decision
//! - **[`server`]** - the mutable request/response contexts threaded through
//!   one dispatch invocation
//! - **[`runtime_config`]** - environment-based configuration of the
//!   deployment mode
//!
//! ## Request handling flow
//!
//! 1. Every matching BEFORE filter runs in registration order; a filter may
//!    mutate the contexts, set a body, or halt.
//! 2. The first-registered route matching (verb, path, accept type) runs; a
//!    non-empty return value becomes the body content. Failures are recovered
//!    through registered fault bindings or the fixed 500 body.
//! 3. Every matching AFTER filter runs.
//! 4. Finalize: a halt's status/body apply; an unmatched request becomes a
//!    404 (standalone mode) or is deferred to the embedding chain (composed
//!    mode); the body is written once as UTF-8 with the content type
//!    defaulted to `text/html; charset=utf-8`.
//!
//! ## Quick start
//!
//! ```rust
//! use http::Method;
//! use sendero::dispatcher::{halt, Dispatcher};
//! use sendero::router::Router;
//! use sendero::server::{Request, Response};
//! use std::sync::Arc;
//!
//! # fn main() -> anyhow::Result<()> {
//! let mut router = Router::new();
//! router.before_any(|req, _res| {
//!     if req.header("x-api-key").is_none() {
//!         return Err(halt(401, "missing key"));
//!     }
//!     Ok(())
//! })?;
//! router.get("/users/:name", |req, _res| {
//!     Ok(req.param("name").map(|n| format!("hello {n}")))
//! })?;
//!
//! let dispatcher = Dispatcher::new(Arc::new(router));
//! let mut req = Request::from_parts(Method::GET, "/users/alice")
//!     .with_header("X-Api-Key", "secret");
//! let mut res = Response::new();
//! dispatcher.dispatch(&mut req, &mut res);
//! assert_eq!(res.payload(), b"hello alice");
//! # Ok(())
//! # }
//! ```
//!
//! ## Concurrency model
//!
//! One dispatch invocation serves one request-response cycle on a single
//! logical thread of control. All mutable per-request state is local to the
//! invocation; the [`router::Router`] is registered before traffic starts and
//! read-only afterwards, so a `Dispatcher` can be shared across threads
//! behind an `Arc`.

pub mod dispatcher;
pub mod router;
pub mod runtime_config;
pub mod server;

pub use dispatcher::{
    halt, DispatchMode, DispatchOutcome, Dispatcher, Halt, HandlerError, HandlerResult,
};
pub use router::{FaultBinding, RouteMatch, RoutePattern, Router, Verb};
pub use runtime_config::RuntimeConfig;
pub use server::{Request, Response};
