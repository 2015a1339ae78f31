//! # Router Module
//!
//! Path matching and route resolution. Registered patterns are compiled to
//! regexes at registration time so malformed paths surface before the server
//! starts serving traffic, and requests are matched with a linear
//! first-registered-wins scan.
//!
//! ## Pattern syntax
//!
//! Patterns are `/`-separated segments:
//!
//! - a literal segment matches itself exactly;
//! - `:name` matches any single non-empty segment and records it as a named
//!   capture (percent-decoded);
//! - an interior `*` matches any single segment as a positional wildcard
//!   capture;
//! - a trailing `*` matches one or more remaining segments, captured joined
//!   as a single wildcard value (`/protected/*` covers every nested path);
//! - the bare pattern `*` matches every path, which is how match-all filters
//!   are registered.
//!
//! ## Example
//!
//! ```rust
//! use sendero::router::{Router, Verb};
//!
//! # fn main() -> anyhow::Result<()> {
//! let mut router = Router::new();
//! router.get("/users/:name", |req, _res| {
//!     Ok(req.param("name").map(|n| format!("hello {n}")))
//! })?;
//!
//! let m = router.find_target(Verb::Get, "/users/alice", None);
//! assert!(m.is_some());
//! # Ok(())
//! # }
//! ```

mod core;
#[cfg(test)]
mod tests;

pub use core::{
    FaultBinding, FaultHandler, ParamVec, RouteMatch, RoutePattern, Router, SplatVec, Target,
    Verb, MAX_INLINE_PARAMS,
};
