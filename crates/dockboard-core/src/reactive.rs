// ── Change detection ──
//
// A row re-renders only when one of its tracked entities got a new
// state object. Comparison is by `Arc` identity and visits the tracked
// keys only, never the whole snapshot. This relies on the state store
// allocating a fresh `Arc` for every changed entity.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use arc_swap::ArcSwapOption;
use indexmap::IndexSet;

use crate::model::{EntityId, StateSnapshot};

/// Ordered set of entity ids a row observes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackedKeySet(IndexSet<EntityId>);

impl TrackedKeySet {
    pub fn iter(&self) -> impl Iterator<Item = &EntityId> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, entity_id: &str) -> bool {
        self.0.contains(entity_id)
    }
}

impl FromIterator<EntityId> for TrackedKeySet {
    fn from_iter<I: IntoIterator<Item = EntityId>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a TrackedKeySet {
    type Item = &'a EntityId;
    type IntoIter = indexmap::set::Iter<'a, EntityId>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Whether a row tracking `tracked` must re-render.
///
/// True when the config changed, on first render (`old` absent), or
/// when any tracked key maps to a different state object. A key
/// present in only one snapshot counts as changed; absent from both
/// counts as unchanged.
pub fn should_rerender(
    tracked: &TrackedKeySet,
    old: Option<&StateSnapshot>,
    new: &StateSnapshot,
    config_changed: bool,
) -> bool {
    if config_changed {
        return true;
    }
    let Some(old) = old else {
        return true;
    };
    tracked.iter().any(|key| match (old.get(key), new.get(key)) {
        (Some(before), Some(after)) => !Arc::ptr_eq(before, after),
        (None, None) => false,
        _ => true,
    })
}

/// Anything that can declare the entities it observes.
pub trait TrackedRow {
    fn tracked_keys(&self) -> TrackedKeySet;
}

/// A row plus its change-detection state.
///
/// Tracked keys are derived once from the row and only recomputed by
/// [`reconfigure`](Self::reconfigure). The previous snapshot is replaced
/// by a single atomic swap per update.
#[derive(Debug)]
pub struct ReactiveRow<R> {
    row: R,
    tracked: TrackedKeySet,
    previous: ArcSwapOption<StateSnapshot>,
    config_dirty: AtomicBool,
}

impl<R: TrackedRow> ReactiveRow<R> {
    pub fn new(row: R) -> Self {
        let tracked = row.tracked_keys();
        Self {
            row,
            tracked,
            previous: ArcSwapOption::empty(),
            config_dirty: AtomicBool::new(false),
        }
    }

    pub fn row(&self) -> &R {
        &self.row
    }

    pub fn tracked(&self) -> &TrackedKeySet {
        &self.tracked
    }

    /// Record `snapshot` as current and report whether to re-render.
    pub fn update(&self, snapshot: Arc<StateSnapshot>) -> bool {
        let config_changed = self.config_dirty.swap(false, Ordering::AcqRel);
        let old = self.previous.swap(Some(Arc::clone(&snapshot)));
        should_rerender(&self.tracked, old.as_deref(), &snapshot, config_changed)
    }

    /// Swap in a new configuration; the next update always re-renders.
    pub fn reconfigure(&mut self, row: R) {
        self.tracked = row.tracked_keys();
        self.row = row;
        self.config_dirty.store(true, Ordering::Release);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::StateObject;

    fn id(raw: &str) -> EntityId {
        raw.parse().unwrap()
    }

    fn keys(raw: &[&str]) -> TrackedKeySet {
        raw.iter().map(|k| id(k)).collect()
    }

    #[test]
    fn same_instances_do_not_rerender() {
        let old: StateSnapshot = [(id("a.a"), StateObject::new("on")), (id("b.b"), StateObject::new("off"))]
            .into_iter()
            .collect();
        let new = old.clone();

        assert!(!should_rerender(&keys(&["a.a", "b.b"]), Some(&old), &new, false));
    }

    #[test]
    fn equal_content_new_instance_rerenders() {
        let old: StateSnapshot = [(id("a.a"), StateObject::new("on")), (id("b.b"), StateObject::new("off"))]
            .into_iter()
            .collect();
        let new = old.with_state(id("b.b"), Some(StateObject::new("off")));

        assert!(should_rerender(&keys(&["a.a", "b.b"]), Some(&old), &new, false));
    }

    #[test]
    fn untracked_changes_are_ignored() {
        let old: StateSnapshot = [(id("a.a"), StateObject::new("on"))].into_iter().collect();
        let new = old.with_state(id("z.z"), Some(StateObject::new("on")));

        assert!(!should_rerender(&keys(&["a.a"]), Some(&old), &new, false));
    }

    #[test]
    fn first_render_always_rerenders() {
        let new = StateSnapshot::new();
        assert!(should_rerender(&TrackedKeySet::default(), None, &new, false));
        assert!(should_rerender(&keys(&["a.a"]), None, &new, false));
    }

    #[test]
    fn config_change_forces_rerender() {
        let snapshot = StateSnapshot::new();
        assert!(should_rerender(&keys(&["a.a"]), Some(&snapshot), &snapshot, true));
    }

    #[test]
    fn key_appearing_counts_as_changed() {
        let s1 = StateObject::new("on");
        let old: StateSnapshot = [(id("switch.c1"), s1)].into_iter().collect();
        let new = old.with_state(id("sensor.c1"), Some(StateObject::new("running")));

        assert!(should_rerender(&keys(&["switch.c1", "sensor.c1"]), Some(&old), &new, false));
    }

    #[test]
    fn key_disappearing_counts_as_changed() {
        let old: StateSnapshot = [(id("a.a"), StateObject::new("on"))].into_iter().collect();
        let new = old.with_state(id("a.a"), None);
        assert!(should_rerender(&keys(&["a.a"]), Some(&old), &new, false));
    }

    #[test]
    fn key_absent_from_both_is_unchanged() {
        let snapshot: StateSnapshot = [(id("a.a"), StateObject::new("on"))].into_iter().collect();
        let next = snapshot.clone();
        assert!(!should_rerender(&keys(&["a.a", "gone.gone"]), Some(&snapshot), &next, false));
    }

    #[test]
    fn tracked_keys_keep_order_and_dedupe() {
        let set = keys(&["b.b", "a.a", "b.b"]);
        let order: Vec<_> = set.iter().map(EntityId::as_str).collect();
        assert_eq!(order, ["b.b", "a.a"]);
        assert!(set.contains("a.a"));
    }

    // ── ReactiveRow ──────────────────────────────────────────────────

    struct Fixed(Vec<&'static str>);

    impl TrackedRow for Fixed {
        fn tracked_keys(&self) -> TrackedKeySet {
            keys(&self.0)
        }
    }

    #[test]
    fn reactive_row_tracks_previous_snapshot() {
        let row = ReactiveRow::new(Fixed(vec!["a.a"]));
        let first = Arc::new(
            [(id("a.a"), StateObject::new("on"))]
                .into_iter()
                .collect::<StateSnapshot>(),
        );

        assert!(row.update(Arc::clone(&first)));
        assert!(!row.update(Arc::new((*first).clone())));

        let changed = Arc::new(first.with_state(id("a.a"), Some(StateObject::new("off"))));
        assert!(row.update(Arc::clone(&changed)));
        assert!(!row.update(changed));
    }

    #[test]
    fn reconfigure_forces_one_rerender() {
        let mut row = ReactiveRow::new(Fixed(vec!["a.a"]));
        let snapshot = Arc::new(StateSnapshot::new());
        row.update(Arc::clone(&snapshot));

        row.reconfigure(Fixed(vec!["b.b"]));
        assert_eq!(row.tracked().len(), 1);
        assert!(row.update(Arc::clone(&snapshot)));
        assert!(!row.update(snapshot));
    }
}
