use super::*;
use crate::dispatcher::Request;
use crate::error::RouteError;

fn req() -> Request {
    Request::get("/")
}

#[test]
fn test_exact_route_applies_verbatim() {
    let mut routes = RouteTable::new();
    routes.literal("/foo", "/bar").literal("/x%d", "/y%s");
    assert_eq!(routes.apply("/foo", &req()).unwrap(), "/bar");
    // literal targets are not templates
    assert_eq!(routes.apply("/x%d", &req()).unwrap(), "/y%s");
    assert_eq!(routes.apply("/other", &req()).unwrap(), "/other");
}

#[test]
fn test_pattern_substitutes_captures_in_order() {
    let mut routes = RouteTable::new();
    routes.pattern(r"^/(\d+)\.te?xt$", "/text/%d").unwrap();
    routes
        .pattern(r"^/swap/(\w+)/(\w+)$", "/swapped/%s/%s")
        .unwrap();

    assert_eq!(routes.apply("/123.txt", &req()).unwrap(), "/text/123");
    assert_eq!(routes.apply("/789.text", &req()).unwrap(), "/text/789");
    assert_eq!(
        routes.apply("/swap/left/right", &req()).unwrap(),
        "/swapped/left/right"
    );
    assert_eq!(routes.apply("/abc.txt", &req()).unwrap(), "/abc.txt");
}

#[test]
fn test_rules_compose_in_single_pass() {
    let mut routes = RouteTable::new();
    routes.literal("/a", "/b").literal("/b", "/c");
    assert_eq!(routes.apply("/a", &req()).unwrap(), "/c");

    // Registered in the other order, /a only reaches /b.
    let mut reversed = RouteTable::new();
    reversed.literal("/b", "/c").literal("/a", "/b");
    assert_eq!(reversed.apply("/a", &req()).unwrap(), "/b");
}

#[test]
fn test_rewrite_fn_sees_request_params() {
    let mut routes = RouteTable::new();
    routes.rewrite("bar flag", |path, req| {
        (path == "/foo" && req.param("bar") == Some("1")).then(|| "/bar".to_string())
    });

    let flagged = Request::get("/foo").with_query("bar", "1");
    assert_eq!(routes.apply("/foo", &flagged).unwrap(), "/bar");
    assert_eq!(routes.apply("/foo", &req()).unwrap(), "/foo");
}

#[test]
fn test_rewrite_fn_empty_result_keeps_path() {
    let mut routes = RouteTable::new();
    routes.rewrite("blank", |_, _| Some(String::new()));
    assert_eq!(routes.apply("/keep", &req()).unwrap(), "/keep");
}

#[test]
fn test_pattern_keyed_rewrite_decides_for_itself() {
    let mut routes = RouteTable::new();
    routes
        .set(
            RouteKey::pattern(r"^/legacy/").unwrap(),
            RouteTarget::Rewrite(std::sync::Arc::new(|path: &str, _: &Request| {
                path.strip_prefix("/legacy").map(str::to_string)
            })),
        )
        .unwrap();
    assert_eq!(routes.apply("/legacy/page", &req()).unwrap(), "/page");
    assert_eq!(routes.apply("/modern/page", &req()).unwrap(), "/modern/page");
}

#[test]
fn test_reregistering_keeps_position() {
    let mut routes = RouteTable::new();
    routes.literal("/a", "/b").literal("/b", "/c").literal("/a", "/z");
    assert_eq!(routes.len(), 2);
    let keys: Vec<_> = routes.keys().cloned().collect();
    assert_eq!(keys, vec![RouteKey::literal("/a"), RouteKey::literal("/b")]);
    assert!(matches!(
        routes.get(&RouteKey::literal("/a")),
        Some(RouteTarget::Template(t)) if t == "/z"
    ));
}

#[test]
fn test_directive_mismatch_rejected_at_registration() {
    let mut routes = RouteTable::new();
    let err = routes.pattern(r"^/(\d+)/(\d+)$", "/only/%d").unwrap_err();
    assert!(matches!(
        err,
        RouteError::DirectiveMismatch {
            captures: 2,
            directives: 1,
            ..
        }
    ));
    assert!(routes.is_empty());
}

#[test]
fn test_invalid_pattern_rejected() {
    let mut routes = RouteTable::new();
    assert!(matches!(
        routes.pattern(r"^/(unclosed$", "/x/%s"),
        Err(RouteError::InvalidPattern { .. })
    ));
}

#[test]
fn test_non_integer_capture_fails_on_apply() {
    let mut routes = RouteTable::new();
    routes.pattern(r"^/n/(\w+)$", "/num/%d").unwrap();
    assert_eq!(routes.apply("/n/42", &req()).unwrap(), "/num/42");
    assert!(matches!(
        routes.apply("/n/abc", &req()),
        Err(RouteError::NotAnInteger { .. })
    ));
}
