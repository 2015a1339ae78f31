//! Tests for the route registry: registration, first-match lookup and
//! ordered filter lookup.

use sendero::router::{Router, Verb};

mod tracing_util;
use tracing_util::TestTracing;

fn zoo_router() -> Router {
    let mut router = Router::new();
    router
        .get("/zoo/animals", |_req, _res| Ok(Some("all animals".into())))
        .expect("register");
    router
        .post("/zoo/animals", |_req, _res| Ok(Some("created".into())))
        .expect("register");
    router
        .get("/zoo/animals/:id", |req, _res| {
            Ok(req.param("id").map(|id| format!("animal {id}")))
        })
        .expect("register");
    router
}

#[test]
fn test_find_target_matches_verb_and_path() {
    let _tracing = TestTracing::init();
    let router = zoo_router();
    assert!(router.find_target(Verb::Get, "/zoo/animals", None).is_some());
    assert!(router.find_target(Verb::Post, "/zoo/animals", None).is_some());
    assert!(router.find_target(Verb::Put, "/zoo/animals", None).is_none());
    assert!(router.find_target(Verb::Get, "/zoo/plants", None).is_none());
}

#[test]
fn test_named_parameter_extraction() {
    let router = zoo_router();
    let m = router
        .find_target(Verb::Get, "/zoo/animals/123", None)
        .expect("match");
    assert_eq!(m.get_param("id"), Some("123"));
    assert_eq!(m.params_map().get("id"), Some(&"123".to_string()));
}

#[test]
fn test_first_registered_pattern_wins() {
    let mut router = Router::new();
    router
        .get("/users/:name", |req, _res| {
            Ok(req.param("name").map(|n| format!("param {n}")))
        })
        .expect("register");
    router
        .get("/users/alice", |_req, _res| Ok(Some("literal".into())))
        .expect("register");

    // Both patterns match /users/alice; the earlier registration is used.
    let m = router
        .find_target(Verb::Get, "/users/alice", None)
        .expect("match");
    assert_eq!(m.get_param("name"), Some("alice"));
}

#[test]
fn test_filter_pseudo_verbs_never_resolve_as_routes() {
    let mut router = Router::new();
    router
        .before_any(|_req, _res| Ok(()))
        .expect("register filter");
    router
        .get("/ping", |_req, _res| Ok(Some("pong".into())))
        .expect("register route");

    assert!(router.find_target(Verb::Before, "/ping", None).is_none());
    assert!(router.find_target(Verb::Get, "/ping", None).is_some());
}

#[test]
fn test_find_filters_returns_all_matches_in_order() {
    let mut router = Router::new();
    router.before_any(|_req, _res| Ok(())).expect("register");
    router
        .before("/protected/*", |_req, _res| Ok(()))
        .expect("register");
    router
        .before("/other", |_req, _res| Ok(()))
        .expect("register");

    let matches = router.find_filters(Verb::Before, "/protected/area51", None);
    assert_eq!(matches.len(), 2);
    // The match-all filter captures the whole path, the prefix filter the tail.
    assert_eq!(matches[0].splat.as_slice(), ["protected/area51"]);
    assert_eq!(matches[1].splat.as_slice(), ["area51"]);

    assert!(router.find_filters(Verb::After, "/protected/area51", None).is_empty());
    assert_eq!(router.find_filters(Verb::Before, "/other", None).len(), 2);
}

#[test]
fn test_prefix_wildcard_filter_scope() {
    let mut router = Router::new();
    router
        .before("/protected/*", |_req, _res| Ok(()))
        .expect("register");

    assert_eq!(router.find_filters(Verb::Before, "/protected/a", None).len(), 1);
    assert_eq!(
        router.find_filters(Verb::Before, "/protected/a/b/c", None).len(),
        1
    );
    assert!(router.find_filters(Verb::Before, "/public/a", None).is_empty());
    assert!(router.find_filters(Verb::Before, "/protected", None).is_empty());
}

#[test]
fn test_accept_type_bound_route() {
    let mut router = Router::new();
    router
        .add_route(Verb::Get, "/feed", Some("application/json"), |_req, _res| {
            Ok(Some("{}".into()))
        })
        .expect("register");

    assert!(router
        .find_target(Verb::Get, "/feed", Some("application/json"))
        .is_some());
    assert!(router
        .find_target(Verb::Get, "/feed", Some("text/html, application/json;q=0.9"))
        .is_some());
    assert!(router.find_target(Verb::Get, "/feed", Some("text/html")).is_none());
    assert!(router.find_target(Verb::Get, "/feed", None).is_none());
}

#[test]
fn test_verb_mismatch_on_registration_helpers() {
    let mut router = Router::new();
    assert!(router
        .add_route(Verb::Before, "/x", None, |_req, _res| Ok(None))
        .is_err());
    assert!(router
        .add_filter(Verb::Get, "/x", None, |_req, _res| Ok(()))
        .is_err());
}

#[test]
fn test_malformed_pattern_rejected_before_serving() {
    let mut router = Router::new();
    assert!(router.get("", |_req, _res| Ok(None)).is_err());
    assert!(router.get("/a//b", |_req, _res| Ok(None)).is_err());
    assert!(router.get("no-slash", |_req, _res| Ok(None)).is_err());
    assert!(router.is_empty());
}
