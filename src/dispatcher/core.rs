//! Dispatcher core module - the per-request filter/route pipeline.

use crate::router::{RouteMatch, Router, Target, Verb};
use crate::server::{Request, Response};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

/// Fixed body written for unhandled failures. Byte-for-byte compatible with
/// the template the transport contract specifies.
pub const INTERNAL_ERROR_BODY: &str = "<html><body><h2>500 Internal Error</h2></body></html>";

/// Content type applied when no handler set one.
pub const DEFAULT_CONTENT_TYPE: &str = "text/html; charset=utf-8";

/// Fixed body for unmatched requests in standalone mode, with the raw request
/// URI substituted in.
#[must_use]
pub fn not_found_body(uri: &str) -> String {
    format!(
        "<html><body><h2>404 Not found</h2>The requested route [{uri}] has not been mapped in Sendero</body></html>"
    )
}

/// Deliberate short-circuit of the pipeline.
///
/// Not a failure: raising a halt from a filter or route handler stops the
/// remaining filter/handler sequence immediately and finalizes the response
/// with the carried status and body.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Halt {
    /// Status to apply; `None` leaves the current response status unchanged
    pub status: Option<u16>,
    /// Body to apply; `None` finalizes with an empty body
    pub body: Option<String>,
}

impl Halt {
    /// Halt with both a status and a body.
    #[must_use]
    pub fn with(status: u16, body: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            body: Some(body.into()),
        }
    }

    /// Halt with a status and an empty body.
    #[must_use]
    pub fn status(status: u16) -> Self {
        Self {
            status: Some(status),
            body: None,
        }
    }

    /// Halt keeping the current status, with an empty body.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Error type raised by filter and route handlers.
///
/// `Halt` is expected control flow and is always handled locally by the
/// pipeline; `Failure` is a genuine fault, recovered into a fault-binding
/// response or the fixed 500 body. `?` works on any `anyhow`-convertible
/// error inside a handler.
#[derive(Debug)]
pub enum HandlerError {
    Halt(Halt),
    Failure(anyhow::Error),
}

impl From<Halt> for HandlerError {
    fn from(halt: Halt) -> Self {
        Self::Halt(halt)
    }
}

impl<E> From<E> for HandlerError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self::Failure(err.into())
    }
}

/// Shorthand for raising a halt with status and body from a handler:
/// `return Err(halt(401, "Go away"));`
#[must_use]
pub fn halt(status: u16, body: impl Into<String>) -> HandlerError {
    HandlerError::Halt(Halt::with(status, body))
}

/// Result of a route handler: a body value to install, or nothing.
pub type HandlerResult = Result<Option<String>, HandlerError>;

/// A route handler produces an optional response body.
pub type RouteHandler = dyn Fn(&mut Request, &mut Response) -> HandlerResult + Send + Sync;

/// A filter inspects/mutates the contexts without returning a body; a body it
/// sets on the response overwrites the pipeline's current body content.
pub type FilterHandler =
    dyn Fn(&mut Request, &mut Response) -> Result<(), HandlerError> + Send + Sync;

/// How the pipeline finalizes unmatched requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchMode {
    /// Sole handler: unmatched requests become a 404 with the fixed template.
    Standalone,
    /// Embedded in an outer handler chain: unmatched requests are reported as
    /// not consumed and control returns to the caller without a body write.
    Composed,
}

/// Result of one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Some filter or route handler produced output (including the empty
    /// string) or the response was redirected; the body has been written
    /// unless the response was already committed.
    Consumed { status: u16, body: String },
    /// No handler produced output; the caller decides the next action.
    NotConsumed,
}

/// Orchestrates one request: BEFORE filters, route resolution, the route
/// handler, AFTER filters, and finalization.
///
/// All per-request state lives in the `Request`/`Response` pair and pipeline
/// locals, so one `Dispatcher` may serve concurrent dispatches over its
/// read-only `Router`.
#[derive(Clone)]
pub struct Dispatcher {
    router: Arc<Router>,
    mode: DispatchMode,
}

impl Dispatcher {
    /// Create a standalone-mode dispatcher over a registered router.
    #[must_use]
    pub fn new(router: Arc<Router>) -> Self {
        Self {
            router,
            mode: DispatchMode::Standalone,
        }
    }

    #[must_use]
    pub fn with_mode(router: Arc<Router>, mode: DispatchMode) -> Self {
        Self { router, mode }
    }

    /// Create a dispatcher with the mode taken from the environment
    /// (`SENDERO_DISPATCH_MODE`).
    #[must_use]
    pub fn from_env(router: Arc<Router>) -> Self {
        let config = crate::runtime_config::RuntimeConfig::from_env();
        Self::with_mode(router, config.dispatch_mode)
    }

    #[must_use]
    pub fn mode(&self) -> DispatchMode {
        self.mode
    }

    #[must_use]
    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Run the full pipeline for one request.
    ///
    /// Guarantees exactly one of: normal body, halted body, 404 body, 500
    /// body, or `NotConsumed` deferral - every invocation leaves the response
    /// in a well-formed state.
    pub fn dispatch(&self, req: &mut Request, res: &mut Response) -> DispatchOutcome {
        let start = Instant::now();
        let verb = Verb::from_method(req.method());
        let path = req.path().to_string();
        let uri = req.uri().to_string();
        let accept = req.accept().map(str::to_string);

        debug!(method = %req.method(), path = %path, "dispatch start");

        let mut body_content = match self.run(req, res, verb, &path, accept.as_deref()) {
            Ok(body) => body,
            Err(hlt) => {
                debug!(status = hlt.status, "halt performed");
                if let Some(status) = hlt.status {
                    res.set_status(status);
                }
                Some(hlt.body.unwrap_or_default())
            }
        };

        // A redirect counts as consumed even without a body.
        if body_content.is_none() && res.is_redirected() {
            body_content = Some(String::new());
        }

        let consumed = body_content.is_some();

        if !consumed && self.mode == DispatchMode::Composed {
            info!(
                method = %req.method(),
                path = %path,
                latency_ms = start.elapsed().as_millis() as u64,
                "request not consumed, deferring to outer chain"
            );
            return DispatchOutcome::NotConsumed;
        }

        let body = match body_content {
            Some(body) => body,
            None => {
                res.set_status(404);
                not_found_body(&uri)
            }
        };

        if res.is_committed() {
            debug!(path = %path, "response already committed, skipping body write");
        } else {
            if res.content_type().is_none() {
                res.set_content_type(DEFAULT_CONTENT_TYPE);
            }
            res.write(&body);
        }

        info!(
            method = %req.method(),
            path = %path,
            status = res.status(),
            latency_ms = start.elapsed().as_millis() as u64,
            "dispatch complete"
        );

        DispatchOutcome::Consumed {
            status: res.status(),
            body,
        }
    }

    /// The halt-interruptible stage sequence: BEFORE filters, route
    /// resolution and execution, AFTER filters. Returns the accumulated body
    /// content, or the halt that cut the sequence short.
    fn run(
        &self,
        req: &mut Request,
        res: &mut Response,
        verb: Option<Verb>,
        path: &str,
        accept: Option<&str>,
    ) -> Result<Option<String>, Halt> {
        let mut body = self.run_filters(Verb::Before, req, res, path, accept, None)?;

        if let Some(verb) = verb {
            match self.router.find_target(verb, path, accept) {
                Some(route_match) => {
                    body = self.run_route(req, res, &route_match, body)?;
                }
                None if verb == Verb::Head && body.is_none() => {
                    // Synthesize an empty HEAD response from a mapped GET
                    // route without invoking its handler.
                    if self.router.find_target(Verb::Get, path, accept).is_some() {
                        debug!(path = %path, "HEAD response synthesized from GET route");
                        body = Some(String::new());
                    }
                }
                None => {}
            }
        }

        self.run_filters(Verb::After, req, res, path, accept, body)
    }

    /// Invoke every matching filter for a pseudo-verb in registration order.
    /// A body the filter sets on the response overwrites the current body
    /// content; a halt aborts the remaining sequence.
    fn run_filters(
        &self,
        verb: Verb,
        req: &mut Request,
        res: &mut Response,
        path: &str,
        accept: Option<&str>,
        mut body: Option<String>,
    ) -> Result<Option<String>, Halt> {
        for filter_match in self.router.find_filters(verb, path, accept) {
            let Target::Filter(handler) = &filter_match.target else {
                continue;
            };
            req.apply_match(&filter_match);
            // The body slot carries over from earlier pipeline stages; only a
            // write made by this filter counts as its output.
            res.clear_body_dirty();
            match handler(req, res) {
                Ok(()) => {
                    if res.body_dirty() {
                        if let Some(set) = res.body() {
                            body = Some(set.to_string());
                        }
                    }
                }
                Err(HandlerError::Halt(hlt)) => return Err(hlt),
                Err(HandlerError::Failure(err)) => {
                    body = Some(self.handle_failure(&err, req, res));
                }
            }
        }
        Ok(body)
    }

    /// Invoke the matched route handler. A returned value becomes the body
    /// content; a failure is recovered into a fault-binding response or the
    /// fixed 500 body.
    fn run_route(
        &self,
        req: &mut Request,
        res: &mut Response,
        route_match: &RouteMatch,
        mut body: Option<String>,
    ) -> Result<Option<String>, Halt> {
        let Target::Route(handler) = &route_match.target else {
            return Ok(body);
        };
        req.apply_match(route_match);
        match handler(req, res) {
            Ok(Some(value)) => body = Some(value),
            Ok(None) => {}
            Err(HandlerError::Halt(hlt)) => return Err(hlt),
            Err(HandlerError::Failure(err)) => {
                body = Some(self.handle_failure(&err, req, res));
            }
        }
        Ok(body)
    }

    /// Map an uncaught handler failure to body content: a matching fault
    /// binding may rewrite the response; if it sets no body the generic 500
    /// fallback applies.
    fn handle_failure(&self, err: &anyhow::Error, req: &mut Request, res: &mut Response) -> String {
        if let Some((binding, frame)) = self.router.find_fault(err) {
            info!(fault_type = binding.type_name(), "fault binding invoked");
            res.clear_body_dirty();
            binding.invoke(frame, req, res);
            if res.body_dirty() {
                if let Some(set) = res.body() {
                    return set.to_string();
                }
            }
        }
        error!(error = %err, "handler failed");
        res.set_status(500);
        INTERNAL_ERROR_BODY.to_string()
    }
}
