use super::{RoutePattern, Target, Verb};
use crate::dispatcher::HandlerResult;
use crate::server::{Request, Response};
use std::sync::Arc;

fn noop(_req: &mut Request, _res: &mut Response) -> HandlerResult {
    Ok(None)
}

fn pattern(verb: Verb, path: &str) -> anyhow::Result<RoutePattern> {
    RoutePattern::new(verb, path, None, Target::Route(Arc::new(noop)))
}

#[test]
fn test_root_path() {
    let p = pattern(Verb::Get, "/").expect("compile");
    assert!(p.matches(Verb::Get, "/", None).is_some());
    assert!(p.matches(Verb::Get, "/a", None).is_none());
}

#[test]
fn test_literal_path() {
    let p = pattern(Verb::Get, "/zoo/animals").expect("compile");
    assert!(p.matches(Verb::Get, "/zoo/animals", None).is_some());
    assert!(p.matches(Verb::Get, "/zoo/animals/", None).is_some());
    assert!(p.matches(Verb::Get, "/zoo/plants", None).is_none());
}

#[test]
fn test_named_parameter_capture() {
    let p = pattern(Verb::Get, "/items/:id").expect("compile");
    let m = p.matches(Verb::Get, "/items/123", None).expect("match");
    assert_eq!(m.get_param("id"), Some("123"));
}

#[test]
fn test_param_is_percent_decoded() {
    let p = pattern(Verb::Get, "/users/:name").expect("compile");
    let m = p.matches(Verb::Get, "/users/foo%20bar", None).expect("match");
    assert_eq!(m.get_param("name"), Some("foo bar"));
}

#[test]
fn test_verb_mismatch_never_matches() {
    let p = pattern(Verb::Get, "/items/:id").expect("compile");
    assert!(p.matches(Verb::Post, "/items/123", None).is_none());
}

#[test]
fn test_segment_count_mismatch() {
    let p = pattern(Verb::Get, "/a/:b").expect("compile");
    assert!(p.matches(Verb::Get, "/a", None).is_none());
    assert!(p.matches(Verb::Get, "/a/b/c", None).is_none());
}

#[test]
fn test_interior_wildcard_is_single_segment() {
    let p = pattern(Verb::Get, "/a/*/c").expect("compile");
    let m = p.matches(Verb::Get, "/a/b/c", None).expect("match");
    assert_eq!(m.splat.as_slice(), ["b"]);
    assert!(p.matches(Verb::Get, "/a/b/x/c", None).is_none());
}

#[test]
fn test_trailing_wildcard_matches_tail() {
    let p = pattern(Verb::Before, "/protected/*").expect("compile");
    assert!(p.matches(Verb::Before, "/protected/secret", None).is_some());
    let m = p
        .matches(Verb::Before, "/protected/a/b/c", None)
        .expect("match");
    assert_eq!(m.splat.as_slice(), ["a/b/c"]);
    assert!(p.matches(Verb::Before, "/protected", None).is_none());
    assert!(p.matches(Verb::Before, "/public/a", None).is_none());
}

#[test]
fn test_match_all_pattern() {
    let p = pattern(Verb::Before, "*").expect("compile");
    assert!(p.matches(Verb::Before, "/", None).is_some());
    assert!(p.matches(Verb::Before, "/a/b/c", None).is_some());
}

#[test]
fn test_accept_type_substring_match() {
    let p = RoutePattern::new(
        Verb::Get,
        "/feed",
        Some("application/json"),
        Target::Route(Arc::new(noop)),
    )
    .expect("compile");
    assert!(p
        .matches(Verb::Get, "/feed", Some("application/json, text/html"))
        .is_some());
    assert!(p.matches(Verb::Get, "/feed", Some("text/html")).is_none());
    assert!(p.matches(Verb::Get, "/feed", None).is_none());
}

#[test]
fn test_wildcard_accept_matches_anything() {
    let p = RoutePattern::new(Verb::Get, "/feed", Some("*/*"), Target::Route(Arc::new(noop)))
        .expect("compile");
    assert!(p.matches(Verb::Get, "/feed", None).is_some());
    assert!(p.matches(Verb::Get, "/feed", Some("text/html")).is_some());
}

#[test]
fn test_malformed_patterns_rejected_at_registration() {
    assert!(pattern(Verb::Get, "").is_err());
    assert!(pattern(Verb::Get, "relative/path").is_err());
    assert!(pattern(Verb::Get, "/a//b").is_err());
    assert!(pattern(Verb::Get, "/a/:").is_err());
    assert!(pattern(Verb::Get, "/a/:9bad").is_err());
    assert!(pattern(Verb::Get, "/a/x*y").is_err());
    assert!(pattern(Verb::Get, "/a/pre:fix").is_err());
}

#[test]
fn test_literal_regex_metacharacters_are_escaped() {
    let p = pattern(Verb::Get, "/v1.0/ping").expect("compile");
    assert!(p.matches(Verb::Get, "/v1.0/ping", None).is_some());
    assert!(p.matches(Verb::Get, "/v1x0/ping", None).is_none());
}

#[test]
fn test_verb_from_method_is_case_insensitive() {
    use http::Method;
    assert_eq!(Verb::from_method(&Method::GET), Some(Verb::Get));
    let lower = Method::from_bytes(b"get").expect("method");
    assert_eq!(Verb::from_method(&lower), Some(Verb::Get));
    let ext = Method::from_bytes(b"PURGE").expect("method");
    assert_eq!(Verb::from_method(&ext), None);
}
