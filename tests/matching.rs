//! Route resolution through a router built from a TOML configuration.

use nav_router::config::loader::parse_config;
use nav_router::navigation::{ComponentDef, ComponentRegistry, ViewComponent};
use nav_router::routing::error::TableWarning;
use nav_router::routing::is_included_route;
use nav_router::{Location, RouteConfig, Router};

mod common;

const ROUTES: &str = r#"
mode = "history"
base = "/app"

[[routes]]
path = "/"
name = "home"
component = "Home"

[[routes]]
path = "*"
name = "not-found"

[[routes]]
path = "/users/:id"
name = "user"
component = "User"
alias = "/u/:id"
props = true
meta = { section = "users" }

[[routes.children]]
path = "posts"
name = "user-posts"
component = "Posts"

[[routes]]
path = "/old"
redirect = "/users/1"

[[routes]]
path = "/search"
name = "search"
"#;

#[derive(Debug)]
struct Placeholder;

impl ViewComponent for Placeholder {}

fn app_router() -> Router {
    let config = parse_config(ROUTES).unwrap();
    let registry = ComponentRegistry::new()
        .with("Home", ComponentDef::ready(Placeholder))
        .with("User", ComponentDef::ready(Placeholder))
        .with("Posts", ComponentDef::ready(Placeholder));
    Router::builder(config).registry(registry).build().unwrap()
}

#[test]
fn test_named_child_route() {
    let router = app_router();
    let resolved = router.resolve(Location::named("user-posts").with_param("id", "5"), None, false);

    assert_eq!(resolved.route.path, "/users/5/posts");
    assert_eq!(resolved.href, "/app/users/5/posts");
    let chain: Vec<_> = resolved.route.matched.iter().map(|r| r.path.as_str()).collect();
    assert_eq!(chain, vec!["/users/:id", "/users/:id/posts"]);
}

#[test]
fn test_redirect_href_points_at_origin() {
    let router = app_router();
    let resolved = router.resolve("/old", None, false);

    assert_eq!(resolved.route.path, "/users/1");
    assert_eq!(resolved.route.redirected_from.as_deref(), Some("/old"));
    assert_eq!(resolved.href, "/app/old");
}

#[test]
fn test_alias_route_keeps_canonical_meta_and_props() {
    let router = app_router();
    let route = router.match_location("/u/3");

    let record = route.matched.last().unwrap();
    assert_eq!(record.path, "/u/:id");
    assert!(record.is_alias());
    assert_eq!(route.meta.get("section"), Some(&"users".into()));

    let props = record.resolve_props("default", &route);
    assert_eq!(props.get("id"), Some(&"3".into()));
}

#[test]
fn test_wildcard_declared_first_still_matches_last() {
    let router = app_router();
    assert_eq!(router.match_location("/search").name.as_deref(), Some("search"));

    let fallback = router.match_location("/nowhere/at/all");
    assert_eq!(fallback.name.as_deref(), Some("not-found"));
    assert_eq!(fallback.params["pathMatch"], "/nowhere/at/all");
}

#[test]
fn test_query_from_path_and_descriptor_merge() {
    let router = app_router();
    let route = router.match_location(Location::path("/search?q=rust").with_query("page", "2"));
    assert_eq!(route.full_path, "/search?q=rust&page=2");
}

#[tokio::test]
async fn test_navigation_context_drives_resolution() {
    let router = app_router();
    router.push("/users/9/posts").await.unwrap();

    // Required params carry over on named navigation.
    let settings = router.match_location(Location::named("user"));
    assert_eq!(settings.path, "/users/9");

    // Relative paths resolve against the current path.
    let sibling = router.match_location("../8");
    assert_eq!(sibling.path, "/users/8");

    let current = router.current_route();
    assert!(is_included_route(&current, &settings));
    assert!(!is_included_route(&current, &sibling));
}

#[test]
fn test_case_sensitive_routes() {
    let (router, _) = common::router(vec![
        RouteConfig::new("/Docs").case_sensitive(true).name("docs"),
        RouteConfig::new("/About").name("about"),
    ]);
    assert!(!router.match_location("/docs").is_matched());
    assert!(router.match_location("/Docs").is_matched());
    assert_eq!(router.match_location("/about").name.as_deref(), Some("about"));
}

#[test]
fn test_duplicate_definitions_are_warnings() {
    let (router, _) = common::router(vec![
        RouteConfig::new("/first").name("same"),
        RouteConfig::new("/second").name("same"),
        RouteConfig::new("/first").name("other"),
    ]);

    let warnings = router.warnings();
    assert!(warnings.contains(&TableWarning::DuplicateName {
        name: "same".into(),
        path: "/second".into(),
    }));
    assert!(warnings.contains(&TableWarning::DuplicatePath { path: "/first".into() }));
    assert_eq!(router.match_location(Location::named("same")).path, "/first");
}

#[tokio::test]
async fn test_add_routes_extends_matching() {
    let (router, _) = common::router(vec![RouteConfig::new("/"), RouteConfig::new("*").name("nf")]);
    assert_eq!(router.match_location("/late").name.as_deref(), Some("nf"));

    router
        .add_routes(vec![RouteConfig::new("/late").name("late")])
        .await
        .unwrap();
    assert_eq!(router.match_location("/late").name.as_deref(), Some("late"));
}
