//! Router core module - pattern compilation and the route/filter registry.

use crate::dispatcher::{FilterHandler, RouteHandler};
use crate::server::{Request, Response};
use anyhow::bail;
use http::Method;
use once_cell::sync::Lazy;
use regex::Regex;
use smallvec::SmallVec;
use std::any::TypeId;
use std::collections::HashMap;
use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Maximum number of named path parameters before heap allocation.
/// Most route patterns have a handful of `:name` tokens at most.
pub const MAX_INLINE_PARAMS: usize = 8;

/// Stack-allocated named-capture storage for the hot path.
///
/// Capture names use `Arc<str>` instead of `String` because they come from the
/// static pattern registry (known at registration time), so `Arc::clone()` is
/// an O(1) atomic increment instead of an O(n) string copy. Values remain
/// `String` as they are per-request data extracted from the URL.
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

/// Stack-allocated wildcard-capture storage, in left-to-right pattern order.
pub type SplatVec = SmallVec<[String; 2]>;

static PARAM_IDENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("Failed to compile ident regex"));

/// HTTP verb a pattern is registered for.
///
/// `Before` and `After` are pseudo-verbs used only for filter registration;
/// they are never produced from a transport-level method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    Get,
    Post,
    Put,
    Delete,
    Head,
    Options,
    Patch,
    Trace,
    Before,
    After,
}

impl Verb {
    /// Map a transport-level method onto a route verb, case-insensitively.
    ///
    /// Returns `None` for extension methods and never yields the filter
    /// pseudo-verbs.
    #[must_use]
    pub fn from_method(method: &Method) -> Option<Self> {
        match method.as_str().to_ascii_uppercase().as_str() {
            "GET" => Some(Self::Get),
            "POST" => Some(Self::Post),
            "PUT" => Some(Self::Put),
            "DELETE" => Some(Self::Delete),
            "HEAD" => Some(Self::Head),
            "OPTIONS" => Some(Self::Options),
            "PATCH" => Some(Self::Patch),
            "TRACE" => Some(Self::Trace),
            _ => None,
        }
    }

    /// True for the BEFORE/AFTER filter pseudo-verbs.
    #[must_use]
    pub fn is_filter(self) -> bool {
        matches!(self, Self::Before | Self::After)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
            Self::Patch => "PATCH",
            Self::Trace => "TRACE",
            Self::Before => "BEFORE",
            Self::After => "AFTER",
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The handler a pattern is bound to.
///
/// Routes produce an optional body; filters inspect and mutate the
/// request/response contexts without returning one.
#[derive(Clone)]
pub enum Target {
    Route(Arc<RouteHandler>),
    Filter(Arc<FilterHandler>),
}

impl fmt::Debug for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Route(_) => f.write_str("Target::Route"),
            Self::Filter(_) => f.write_str("Target::Filter"),
        }
    }
}

/// Capture tokens of a compiled pattern, in capture-group order.
#[derive(Debug, Clone)]
enum Token {
    Param(Arc<str>),
    Splat,
}

/// One registered path pattern for one verb, compiled at registration time.
///
/// Path patterns are `/`-separated segments: literals, `:name` named
/// parameters, and `*` wildcards. An interior `*` matches exactly one segment;
/// a trailing `*` matches one or more remaining segments, captured joined as a
/// single wildcard value. The bare pattern `*` matches every path (the
/// match-all filter path).
#[derive(Debug, Clone)]
pub struct RoutePattern {
    verb: Verb,
    path: String,
    /// Accept media type this pattern is bound to; `None` matches any request
    /// (a registered `*/*` is normalized to `None`).
    accept: Option<String>,
    regex: Regex,
    tokens: Vec<Token>,
    target: Target,
}

/// Strip a single leading and trailing slash so patterns and request paths
/// compare segment-by-segment.
fn trim_path(path: &str) -> &str {
    let path = path.strip_prefix('/').unwrap_or(path);
    path.strip_suffix('/').unwrap_or(path)
}

/// Percent-decode a captured value, keeping the raw text if decoding fails.
fn decode_component(value: &str) -> String {
    urlencoding::decode(value)
        .map(|cow| cow.into_owned())
        .unwrap_or_else(|_| value.to_string())
}

impl RoutePattern {
    /// Compile a pattern, rejecting malformed paths before the server starts
    /// serving traffic.
    pub fn new(
        verb: Verb,
        path: &str,
        accept: Option<&str>,
        target: Target,
    ) -> anyhow::Result<Self> {
        let (regex, tokens) = Self::compile(path)?;
        let accept = accept.filter(|ct| *ct != "*/*").map(str::to_string);
        Ok(Self {
            verb,
            path: path.to_string(),
            accept,
            regex,
            tokens,
            target,
        })
    }

    /// Convert a path pattern into a regex over normalized paths plus the
    /// ordered capture tokens.
    fn compile(path: &str) -> anyhow::Result<(Regex, Vec<Token>)> {
        if path.is_empty() {
            bail!("empty route pattern");
        }
        if path == "*" {
            // Match-all filter path: one wildcard capture holding the whole path.
            let regex = Regex::new("^(.*)$").expect("Failed to compile path regex");
            return Ok((regex, vec![Token::Splat]));
        }
        if !path.starts_with('/') {
            bail!("route pattern must start with '/': {path:?}");
        }

        let trimmed = trim_path(path);
        let mut pattern = String::with_capacity(path.len() + 8);
        pattern.push('^');
        let mut tokens = Vec::new();

        if !trimmed.is_empty() {
            let segments: Vec<&str> = trimmed.split('/').collect();
            let last = segments.len() - 1;
            for (i, segment) in segments.iter().enumerate() {
                if i > 0 {
                    pattern.push('/');
                }
                if let Some(name) = segment.strip_prefix(':') {
                    if !PARAM_IDENT.is_match(name) {
                        bail!("invalid parameter name {segment:?} in route pattern {path:?}");
                    }
                    tokens.push(Token::Param(Arc::from(name)));
                    pattern.push_str("([^/]+)");
                } else if *segment == "*" {
                    tokens.push(Token::Splat);
                    // A trailing wildcard swallows the remaining segments.
                    pattern.push_str(if i == last { "(.+)" } else { "([^/]+)" });
                } else if segment.is_empty() {
                    bail!("empty segment in route pattern {path:?}");
                } else if segment.contains(':') || segment.contains('*') {
                    bail!("embedded ':' or '*' in literal segment {segment:?} of route pattern {path:?}");
                } else {
                    pattern.push_str(&regex::escape(segment));
                }
            }
        }

        pattern.push('$');
        let regex = Regex::new(&pattern).expect("Failed to compile path regex");
        Ok((regex, tokens))
    }

    #[must_use]
    pub fn verb(&self) -> Verb {
        self.verb
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub fn accept(&self) -> Option<&str> {
        self.accept.as_deref()
    }

    #[must_use]
    pub fn target(&self) -> &Target {
        &self.target
    }

    /// Test a concrete request against this pattern.
    ///
    /// Deterministic and total: exactly one of `Some(RouteMatch)` or `None`
    /// for every (pattern, request) pair. Named and wildcard captures are
    /// percent-decoded.
    #[must_use]
    pub fn matches(&self, verb: Verb, path: &str, accept: Option<&str>) -> Option<RouteMatch> {
        if verb != self.verb {
            return None;
        }
        if let Some(ct) = &self.accept {
            // The request's Accept header must contain the bound media type.
            if !accept.is_some_and(|a| a.contains(ct.as_str())) {
                return None;
            }
        }
        let caps = self.regex.captures(trim_path(path))?;

        let mut params = ParamVec::new();
        let mut splat = SplatVec::new();
        for (i, token) in self.tokens.iter().enumerate() {
            let value = caps.get(i + 1).map_or("", |m| m.as_str());
            match token {
                Token::Param(name) => params.push((Arc::clone(name), decode_component(value))),
                Token::Splat => splat.push(decode_component(value)),
            }
        }

        Some(RouteMatch {
            target: self.target.clone(),
            params,
            splat,
            verb,
            path: path.to_string(),
            accept: accept.map(str::to_string),
        })
    }
}

/// Result of successfully matching a request against a registered pattern.
///
/// Created per request and discarded after dispatch; never shared across
/// requests.
#[derive(Debug, Clone)]
pub struct RouteMatch {
    /// Handler of the matched pattern
    pub target: Target,
    /// Named parameters extracted from the path (keys without the colon,
    /// values percent-decoded)
    pub params: ParamVec,
    /// Wildcard captures in left-to-right occurrence order
    pub splat: SplatVec,
    /// Verb that produced the match
    pub verb: Verb,
    /// Request path that produced the match
    pub path: String,
    /// Accept header value that produced the match
    pub accept: Option<String>,
}

impl RouteMatch {
    /// Get a named parameter by name.
    ///
    /// Uses "last write wins" semantics when the same name occurs at several
    /// path depths (e.g. `/org/:id/user/:id` resolves to the user id).
    #[inline]
    #[must_use]
    pub fn get_param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// Convert params to a HashMap.
    /// Note: this allocates - use `get_param()` in hot paths instead.
    #[must_use]
    pub fn params_map(&self) -> HashMap<String, String> {
        self.params
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }
}

type FaultProbe = dyn Fn(&(dyn StdError + 'static)) -> bool + Send + Sync;

/// Handler invoked with the failure and the dispatch contexts when a
/// registered failure type is caught.
pub type FaultHandler =
    dyn Fn(&(dyn StdError + 'static), &mut Request, &mut Response) + Send + Sync;

/// Maps one concrete failure type to a handler that may rewrite the response
/// before the generic 500 fallback applies.
#[derive(Clone)]
pub struct FaultBinding {
    type_id: TypeId,
    type_name: &'static str,
    probe: Arc<FaultProbe>,
    handler: Arc<FaultHandler>,
}

impl FaultBinding {
    /// Bind a typed handler to failures of type `E`.
    pub fn new<E, H>(handler: H) -> Self
    where
        E: StdError + Send + Sync + 'static,
        H: Fn(&E, &mut Request, &mut Response) + Send + Sync + 'static,
    {
        Self {
            type_id: TypeId::of::<E>(),
            type_name: std::any::type_name::<E>(),
            probe: Arc::new(|err: &(dyn StdError + 'static)| err.downcast_ref::<E>().is_some()),
            handler: Arc::new(move |err: &(dyn StdError + 'static), req, res| {
                if let Some(typed) = err.downcast_ref::<E>() {
                    handler(typed, req, res);
                }
            }),
        }
    }

    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub(crate) fn invoke(
        &self,
        err: &(dyn StdError + 'static),
        req: &mut Request,
        res: &mut Response,
    ) {
        (self.handler)(err, req, res);
    }
}

impl fmt::Debug for FaultBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FaultBinding")
            .field("type_name", &self.type_name)
            .finish()
    }
}

/// Registry and matcher for route patterns, filter patterns and fault
/// bindings.
///
/// Append-only and insertion-ordered: route lookup is first-registered-wins,
/// filter lookup returns every match in registration order. Registration is
/// expected to complete before traffic starts; the registry is read-only
/// during dispatch.
#[derive(Debug, Default)]
pub struct Router {
    routes: Vec<Arc<RoutePattern>>,
    faults: Vec<FaultBinding>,
}

impl Router {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a compiled pattern to the registry.
    pub fn process_route(&mut self, pattern: RoutePattern) {
        info!(
            verb = %pattern.verb(),
            path = %pattern.path(),
            accept = pattern.accept(),
            total_routes = self.routes.len() + 1,
            "route registered"
        );
        self.routes.push(Arc::new(pattern));
    }

    /// Compile and register a route handler for `verb` at `path`, optionally
    /// bound to an accept media type. Fails fast on a malformed pattern.
    pub fn add_route<H>(
        &mut self,
        verb: Verb,
        path: &str,
        accept: Option<&str>,
        handler: H,
    ) -> anyhow::Result<()>
    where
        H: Fn(&mut Request, &mut Response) -> crate::dispatcher::HandlerResult
            + Send
            + Sync
            + 'static,
    {
        anyhow::ensure!(
            !verb.is_filter(),
            "{verb} is a filter pseudo-verb, use add_filter/before/after"
        );
        let pattern = RoutePattern::new(verb, path, accept, Target::Route(Arc::new(handler)))?;
        self.process_route(pattern);
        Ok(())
    }

    /// Compile and register a BEFORE/AFTER filter at `path`.
    pub fn add_filter<F>(
        &mut self,
        verb: Verb,
        path: &str,
        accept: Option<&str>,
        filter: F,
    ) -> anyhow::Result<()>
    where
        F: Fn(&mut Request, &mut Response) -> Result<(), crate::dispatcher::HandlerError>
            + Send
            + Sync
            + 'static,
    {
        anyhow::ensure!(
            verb.is_filter(),
            "{verb} is a route verb, use add_route or the per-verb helpers"
        );
        let pattern = RoutePattern::new(verb, path, accept, Target::Filter(Arc::new(filter)))?;
        self.process_route(pattern);
        Ok(())
    }

    /// Find the single best route match for a transport request: the
    /// first-registered pattern that fully matches. Filter pseudo-verbs never
    /// participate.
    #[must_use]
    pub fn find_target(&self, verb: Verb, path: &str, accept: Option<&str>) -> Option<RouteMatch> {
        if verb.is_filter() {
            return None;
        }
        debug!(verb = %verb, path = %path, "route match attempt");
        let match_start = Instant::now();

        for pattern in &self.routes {
            if let Some(m) = pattern.matches(verb, path, accept) {
                info!(
                    verb = %verb,
                    path = %path,
                    route_pattern = %pattern.path(),
                    duration_us = match_start.elapsed().as_micros() as u64,
                    "route matched"
                );
                return Some(m);
            }
        }

        warn!(
            verb = %verb,
            path = %path,
            duration_us = match_start.elapsed().as_micros() as u64,
            "no route matched"
        );
        None
    }

    /// Find every matching filter pattern for a BEFORE/AFTER pseudo-verb, in
    /// registration order.
    #[must_use]
    pub fn find_filters(&self, verb: Verb, path: &str, accept: Option<&str>) -> Vec<RouteMatch> {
        let matches: Vec<RouteMatch> = self
            .routes
            .iter()
            .filter_map(|pattern| pattern.matches(verb, path, accept))
            .collect();
        debug!(verb = %verb, path = %path, filter_count = matches.len(), "filters matched");
        matches
    }

    /// Append a fault binding. A later registration for the same failure type
    /// replaces the earlier one in place.
    pub fn process_fault(&mut self, binding: FaultBinding) {
        if let Some(existing) = self
            .faults
            .iter_mut()
            .find(|b| b.type_id == binding.type_id)
        {
            debug!(fault_type = binding.type_name, "fault binding replaced");
            *existing = binding;
        } else {
            info!(fault_type = binding.type_name, "fault binding registered");
            self.faults.push(binding);
        }
    }

    /// Register a typed fault handler for failures of type `E`.
    pub fn on_fault<E, H>(&mut self, handler: H)
    where
        E: StdError + Send + Sync + 'static,
        H: Fn(&E, &mut Request, &mut Response) + Send + Sync + 'static,
    {
        self.process_fault(FaultBinding::new(handler));
    }

    /// Find a binding for a raised failure.
    ///
    /// The outermost error is tried against every binding first, then each
    /// wrapped source in chain order - the closest analogue of walking a type
    /// hierarchy from most specific to least specific. Returns the binding and
    /// the chain frame it matched.
    #[must_use]
    pub fn find_fault<'a>(
        &'a self,
        err: &'a anyhow::Error,
    ) -> Option<(&'a FaultBinding, &'a (dyn StdError + 'static))> {
        for frame in err.chain() {
            for binding in &self.faults {
                if (binding.probe)(frame) {
                    return Some((binding, frame));
                }
            }
        }
        None
    }

    /// Number of registered route and filter patterns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Print all registered patterns to stdout. Useful for verifying the
    /// routing table at startup.
    pub fn dump_routes(&self) {
        println!("[routes] count={}", self.routes.len());
        for pattern in &self.routes {
            println!(
                "[route] {} {} accept={}",
                pattern.verb(),
                pattern.path(),
                pattern.accept().unwrap_or("*/*")
            );
        }
    }

    // Per-verb registration sugar.

    pub fn get<H>(&mut self, path: &str, handler: H) -> anyhow::Result<()>
    where
        H: Fn(&mut Request, &mut Response) -> crate::dispatcher::HandlerResult
            + Send
            + Sync
            + 'static,
    {
        self.add_route(Verb::Get, path, None, handler)
    }

    pub fn post<H>(&mut self, path: &str, handler: H) -> anyhow::Result<()>
    where
        H: Fn(&mut Request, &mut Response) -> crate::dispatcher::HandlerResult
            + Send
            + Sync
            + 'static,
    {
        self.add_route(Verb::Post, path, None, handler)
    }

    pub fn put<H>(&mut self, path: &str, handler: H) -> anyhow::Result<()>
    where
        H: Fn(&mut Request, &mut Response) -> crate::dispatcher::HandlerResult
            + Send
            + Sync
            + 'static,
    {
        self.add_route(Verb::Put, path, None, handler)
    }

    pub fn delete<H>(&mut self, path: &str, handler: H) -> anyhow::Result<()>
    where
        H: Fn(&mut Request, &mut Response) -> crate::dispatcher::HandlerResult
            + Send
            + Sync
            + 'static,
    {
        self.add_route(Verb::Delete, path, None, handler)
    }

    pub fn head<H>(&mut self, path: &str, handler: H) -> anyhow::Result<()>
    where
        H: Fn(&mut Request, &mut Response) -> crate::dispatcher::HandlerResult
            + Send
            + Sync
            + 'static,
    {
        self.add_route(Verb::Head, path, None, handler)
    }

    pub fn options<H>(&mut self, path: &str, handler: H) -> anyhow::Result<()>
    where
        H: Fn(&mut Request, &mut Response) -> crate::dispatcher::HandlerResult
            + Send
            + Sync
            + 'static,
    {
        self.add_route(Verb::Options, path, None, handler)
    }

    pub fn patch<H>(&mut self, path: &str, handler: H) -> anyhow::Result<()>
    where
        H: Fn(&mut Request, &mut Response) -> crate::dispatcher::HandlerResult
            + Send
            + Sync
            + 'static,
    {
        self.add_route(Verb::Patch, path, None, handler)
    }

    pub fn trace<H>(&mut self, path: &str, handler: H) -> anyhow::Result<()>
    where
        H: Fn(&mut Request, &mut Response) -> crate::dispatcher::HandlerResult
            + Send
            + Sync
            + 'static,
    {
        self.add_route(Verb::Trace, path, None, handler)
    }

    /// Register a BEFORE filter for paths matching `path`.
    pub fn before<F>(&mut self, path: &str, filter: F) -> anyhow::Result<()>
    where
        F: Fn(&mut Request, &mut Response) -> Result<(), crate::dispatcher::HandlerError>
            + Send
            + Sync
            + 'static,
    {
        self.add_filter(Verb::Before, path, None, filter)
    }

    /// Register an AFTER filter for paths matching `path`.
    pub fn after<F>(&mut self, path: &str, filter: F) -> anyhow::Result<()>
    where
        F: Fn(&mut Request, &mut Response) -> Result<(), crate::dispatcher::HandlerError>
            + Send
            + Sync
            + 'static,
    {
        self.add_filter(Verb::After, path, None, filter)
    }

    /// Register a BEFORE filter matching every path.
    pub fn before_any<F>(&mut self, filter: F) -> anyhow::Result<()>
    where
        F: Fn(&mut Request, &mut Response) -> Result<(), crate::dispatcher::HandlerError>
            + Send
            + Sync
            + 'static,
    {
        self.add_filter(Verb::Before, "*", None, filter)
    }

    /// Register an AFTER filter matching every path.
    pub fn after_any<F>(&mut self, filter: F) -> anyhow::Result<()>
    where
        F: Fn(&mut Request, &mut Response) -> Result<(), crate::dispatcher::HandlerError>
            + Send
            + Sync
            + 'static,
    {
        self.add_filter(Verb::After, "*", None, filter)
    }
}
