use std::collections::HashMap;

/// Mutable response state threaded through one dispatch invocation.
///
/// Filters and route handlers mutate status, content type, headers and body;
/// the pipeline's finalize step performs the single UTF-8 write. A transport
/// layer reads `status()`, `content_type()`, `headers()` and `payload()` after
/// dispatch to emit the wire response.
#[derive(Debug)]
pub struct Response {
    status: u16,
    content_type: Option<String>,
    headers: HashMap<String, String>,
    body: Option<String>,
    /// True when `set_body` ran since the pipeline last cleared the flag.
    /// The body slot is shared across the whole dispatch, so the flag is what
    /// attributes a write to the handler that was just invoked.
    body_dirty: bool,
    redirected: bool,
    committed: bool,
    payload: Vec<u8>,
}

impl Default for Response {
    fn default() -> Self {
        Self::new()
    }
}

/// Reason phrase for the status line written by the transport.
#[must_use]
pub fn status_reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        204 => "No Content",
        302 => "Found",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        500 => "Internal Server Error",
        _ => "OK",
    }
}

impl Response {
    #[must_use]
    pub fn new() -> Self {
        Self {
            status: 200,
            content_type: None,
            headers: HashMap::new(),
            body: None,
            body_dirty: false,
            redirected: false,
            committed: false,
            payload: Vec::new(),
        }
    }

    #[must_use]
    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn set_status(&mut self, status: u16) {
        self.status = status;
    }

    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    pub fn set_content_type(&mut self, content_type: impl Into<String>) {
        self.content_type = Some(content_type.into());
    }

    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
    }

    #[must_use]
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Body set by a filter or handler, if any. The pipeline reads this after
    /// each filter to pick up body overwrites.
    #[must_use]
    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    pub fn set_body(&mut self, body: impl Into<String>) {
        self.body = Some(body.into());
        self.body_dirty = true;
    }

    /// True when `set_body` ran since the last `clear_body_dirty`.
    pub(crate) fn body_dirty(&self) -> bool {
        self.body_dirty
    }

    /// Reset the dirty flag. The pipeline clears it before invoking each
    /// handler so a stale body set earlier in the dispatch is not re-read as
    /// that handler's output.
    pub(crate) fn clear_body_dirty(&mut self) {
        self.body_dirty = false;
    }

    /// Redirect to `location` with status 302 and mark the response as
    /// redirected. A redirected response counts as consumed even when no body
    /// was produced.
    pub fn redirect(&mut self, location: &str) {
        self.set_header("location", location);
        self.status = 302;
        self.redirected = true;
    }

    #[must_use]
    pub fn is_redirected(&self) -> bool {
        self.redirected
    }

    /// True once the response bytes have been written. Further writes are
    /// skipped so an outer handler chain that already produced output is not
    /// clobbered.
    #[must_use]
    pub fn is_committed(&self) -> bool {
        self.committed
    }

    /// Write the final body as UTF-8 bytes and commit the response.
    /// No-op if already committed.
    pub fn write(&mut self, body: &str) {
        if self.committed {
            return;
        }
        self.payload = body.as_bytes().to_vec();
        self.committed = true;
    }

    /// The committed response bytes, empty until `write` runs.
    #[must_use]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_reason() {
        assert_eq!(status_reason(200), "OK");
        assert_eq!(status_reason(404), "Not Found");
        assert_eq!(status_reason(599), "OK");
    }

    #[test]
    fn test_write_commits_once() {
        let mut res = Response::new();
        res.write("first");
        res.write("second");
        assert!(res.is_committed());
        assert_eq!(res.payload(), b"first");
    }

    #[test]
    fn test_set_body_marks_dirty_until_cleared() {
        let mut res = Response::new();
        assert!(!res.body_dirty());
        res.set_body("x");
        assert!(res.body_dirty());
        res.clear_body_dirty();
        assert!(!res.body_dirty());
        assert_eq!(res.body(), Some("x"));
    }

    #[test]
    fn test_redirect_sets_location_and_flag() {
        let mut res = Response::new();
        res.redirect("/login");
        assert_eq!(res.status(), 302);
        assert_eq!(res.header("Location"), Some("/login"));
        assert!(res.is_redirected());
    }
}
