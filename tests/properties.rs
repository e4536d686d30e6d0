//! Universally quantified matcher and table properties.

use std::sync::Arc;

use proptest::prelude::*;

use nav_router::navigation::{resolve_queue, ComponentRegistry};
use nav_router::routing::pattern::{PathPattern, PatternOptions};
use nav_router::routing::{is_same_route, DefaultQueryCodec, Matcher, Params, RecordId, RouteRecord, RouteTable, START};
use nav_router::RouteConfig;

fn matcher(routes: &[RouteConfig]) -> Matcher {
    Matcher::new(routes, ComponentRegistry::default(), Arc::new(DefaultQueryCodec))
        .unwrap()
        .0
}

fn ids(records: &[Arc<RouteRecord>]) -> Vec<RecordId> {
    records.iter().map(|r| r.id).collect()
}

fn segment() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_-]{0,8}"
}

proptest! {
    #[test]
    fn wildcards_sort_last(
        names in prop::collection::hash_set(segment(), 1..8),
        wildcard_at in prop::collection::vec(any::<prop::sample::Index>(), 1..3),
    ) {
        let mut routes: Vec<RouteConfig> = names.iter().map(|n| RouteConfig::new(format!("/{}", n))).collect();
        for (i, at) in wildcard_at.iter().enumerate() {
            let path = if i == 0 { "*".to_string() } else { format!("/{}/*", i) };
            routes.insert(at.index(routes.len() + 1), RouteConfig::new(path));
        }

        let (table, _) = RouteTable::build(&routes, &ComponentRegistry::default()).unwrap();
        let list = table.path_list();
        let first_wildcard = list.iter().position(|p| p == "*").unwrap();
        prop_assert!(list[first_wildcard..].iter().all(|p| p == "*"));
        prop_assert_eq!(list.len(), names.len() + wildcard_at.len());
    }

    #[test]
    fn matching_is_deterministic(a in segment(), b in segment(), query in "[a-z]{1,4}") {
        let m = matcher(&[
            RouteConfig::new("/:first/:second").name("pair"),
            RouteConfig::new("*"),
        ]);
        let target = format!("/{}/{}?{}=1", a, b, query);
        let one = m.match_location(target.as_str(), None, None);
        let two = m.match_location(target.as_str(), None, None);
        prop_assert!(is_same_route(&one, &two));
        prop_assert_eq!(&one.full_path, &two.full_path);
    }

    #[test]
    fn fill_reverses_match(a in segment(), b in segment(), tail in prop::collection::vec(segment(), 1..4)) {
        let pattern = PathPattern::compile("/x/:a/:b/*", PatternOptions::default()).unwrap();
        let mut path = format!("/x/{}/{}", a, b);
        for part in &tail {
            path.push('/');
            path.push_str(part);
        }

        let mut params = Params::new();
        prop_assert!(pattern.match_into(&path, &mut params));
        prop_assert_eq!(pattern.fill(&params).unwrap(), path);
    }

    #[test]
    fn only_start_equals_start(path in segment()) {
        let m = matcher(&[RouteConfig::new("/:any")]);
        let route = m.match_location(format!("/{}", path), None, None);
        prop_assert!(is_same_route(&START, &START));
        prop_assert!(!is_same_route(&route, &START));
        prop_assert!(!is_same_route(&START, &route));
    }

    #[test]
    fn redirect_chains_keep_first_origin(hops in 1usize..6, query in "[a-z]{1,4}") {
        let mut routes: Vec<RouteConfig> = (0..hops)
            .map(|i| RouteConfig::new(format!("/hop{}", i)).redirect(format!("/hop{}", i + 1)))
            .collect();
        routes.push(RouteConfig::new(format!("/hop{}", hops)).name("end"));

        let m = matcher(&routes);
        let origin = format!("/hop0?{}=v", query);
        let route = m.match_location(origin.as_str(), None, None);
        prop_assert_eq!(route.name.as_deref(), Some("end"));
        prop_assert_eq!(route.redirected_from.as_deref(), Some(origin.as_str()));
    }

    #[test]
    fn diff_partitions_both_chains(depth_current in 1usize..5, depth_next in 1usize..5, shared in 0usize..5) {
        // Two branches below a shared trunk.
        let branch = |name: &str, depth: usize| {
            let mut node = RouteConfig::new(format!("{}{}", name, depth));
            for level in (0..depth).rev() {
                node = RouteConfig::new(format!("{}{}", name, level)).child(node);
            }
            node
        };
        let trunk_depth = shared.min(4);
        let mut trunk = RouteConfig::new("t").child(branch("l", depth_current)).child(branch("r", depth_next));
        for level in (0..trunk_depth).rev() {
            trunk = RouteConfig::new(format!("t{}", level)).child(trunk);
        }
        let root = RouteConfig::new("/root").child(trunk);

        let m = matcher(&[root]);
        let table = m.table();
        let leaf = |prefix: &str| {
            table
                .records()
                .iter()
                .filter(|r| r.path.split('/').next_back().is_some_and(|s| s.starts_with(prefix)))
                .max_by_key(|r| r.path.len())
                .cloned()
                .unwrap()
        };
        let current = table.ancestors(&leaf("l"));
        let next = table.ancestors(&leaf("r"));

        let diff = resolve_queue(&current, &next);
        prop_assert_eq!([ids(&diff.updated), ids(&diff.activated)].concat(), ids(&next));
        prop_assert_eq!([ids(&diff.updated), ids(&diff.deactivated)].concat(), ids(&current));
        prop_assert_eq!(diff.updated.len(), trunk_depth + 2);
    }
}
