//! Record-chain diff and guard queue assembly.

use std::sync::Arc;

use crate::navigation::components::{
    extract_enter_guards, extract_leave_guards, extract_update_guards, resolution_gate, ComponentResolver,
    DeferredEnters,
};
use crate::navigation::guard::Guard;
use crate::routing::record::RouteRecord;

/// Three-way split of two matched chains.
#[derive(Debug, Clone, Default)]
pub struct RecordDiff {
    /// Common prefix, kept.
    pub updated: Vec<Arc<RouteRecord>>,
    /// New records from the divergence point on.
    pub activated: Vec<Arc<RouteRecord>>,
    /// Old records from the divergence point on.
    pub deactivated: Vec<Arc<RouteRecord>>,
}

/// Split `current` and `next` at their first differing record.
pub fn resolve_queue(current: &[Arc<RouteRecord>], next: &[Arc<RouteRecord>]) -> RecordDiff {
    let split = current
        .iter()
        .zip(next.iter())
        .take_while(|(a, b)| Arc::ptr_eq(a, b))
        .count();
    RecordDiff {
        updated: next[..split].to_vec(),
        activated: next[split..].to_vec(),
        deactivated: current[split..].to_vec(),
    }
}

/// A guard with the stage it belongs to, for logging.
#[derive(Debug, Clone)]
pub(crate) struct Stage {
    pub label: &'static str,
    pub guard: Guard,
}

fn staged(label: &'static str, guards: impl IntoIterator<Item = Guard>) -> impl Iterator<Item = Stage> {
    guards.into_iter().map(move |guard| Stage { label, guard })
}

/// First queue: leave, global before, update, route enter, resolution gate.
pub(crate) fn confirm_queue(
    diff: &RecordDiff,
    before_hooks: Vec<Guard>,
    resolver: Arc<dyn ComponentResolver>,
) -> Vec<Stage> {
    staged("leave", extract_leave_guards(&diff.deactivated))
        .chain(staged("before_each", before_hooks))
        .chain(staged("update", extract_update_guards(&diff.updated)))
        .chain(staged(
            "before_enter",
            diff.activated.iter().filter_map(|r| r.before_enter.clone()),
        ))
        .chain(staged(
            "resolve_components",
            [resolution_gate(resolver, diff.activated.clone())],
        ))
        .collect()
}

/// Second queue: component enter guards, then global resolve hooks.
pub(crate) fn resolve_hooks_queue(
    activated: &[Arc<RouteRecord>],
    resolve_hooks: Vec<Guard>,
    deferred: &DeferredEnters,
) -> Vec<Stage> {
    staged("enter", extract_enter_guards(activated, deferred))
        .chain(staged("before_resolve", resolve_hooks))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::RouteConfig;
    use crate::navigation::components::ComponentRegistry;
    use crate::routing::table::RouteTable;

    #[test]
    fn test_diff_splits_at_divergence() {
        let routes = vec![RouteConfig::new("/a").child(
            RouteConfig::new("b")
                .child(RouteConfig::new("c"))
                .child(RouteConfig::new("d").child(RouteConfig::new("e"))),
        )];
        let (table, _) = RouteTable::build(&routes, &ComponentRegistry::default()).unwrap();
        let chain = |path: &str| table.ancestors(table.by_path(path).unwrap());

        let current = chain("/a/b/c");
        let next = chain("/a/b/d/e");
        let diff = resolve_queue(&current, &next);

        let paths = |records: &[Arc<RouteRecord>]| records.iter().map(|r| r.path.clone()).collect::<Vec<_>>();
        assert_eq!(paths(&diff.updated), vec!["/a", "/a/b"]);
        assert_eq!(paths(&diff.activated), vec!["/a/b/d", "/a/b/d/e"]);
        assert_eq!(paths(&diff.deactivated), vec!["/a/b/c"]);
    }

    #[test]
    fn test_diff_from_empty_chain() {
        let (table, _) = RouteTable::build(&[RouteConfig::new("/x")], &ComponentRegistry::default()).unwrap();
        let next = table.ancestors(table.by_path("/x").unwrap());
        let diff = resolve_queue(&[], &next);
        assert!(diff.updated.is_empty());
        assert_eq!(diff.activated.len(), 1);
        assert!(diff.deactivated.is_empty());
    }
}
