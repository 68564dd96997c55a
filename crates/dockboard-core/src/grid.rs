// ── Grouped grids ──
//
// A grid owns its "show inactive" flag and passes it explicitly to the
// filter step; the resource kind only supplies items, a group key and
// an activity test.

use crate::grouping::{RenderEntry, group};
use crate::model::{DashboardItem, StateSnapshot};
use crate::services::EntityNaming;

/// What a concrete resource grid supplies.
pub trait GridSource {
    type Item;

    fn items(&self) -> &[Self::Item];

    /// Presentation group of `item`; `None` leaves it ungrouped.
    fn group_key(&self, item: &Self::Item, states: &StateSnapshot) -> Option<String>;

    fn is_active(&self, item: &Self::Item, states: &StateSnapshot) -> bool;
}

/// Items of `source` that pass the activity filter, in order.
pub fn filter_visible<'a, S: GridSource>(
    source: &'a S,
    states: &StateSnapshot,
    show_inactive: bool,
) -> Vec<&'a S::Item> {
    source
        .items()
        .iter()
        .filter(|item| show_inactive || source.is_active(item, states))
        .collect()
}

#[derive(Debug, Clone)]
pub struct GroupedGrid<S> {
    source: S,
    show_inactive: bool,
}

impl<S: GridSource> GroupedGrid<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            show_inactive: false,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn show_inactive(&self) -> bool {
        self.show_inactive
    }

    pub fn set_show_inactive(&mut self, show: bool) {
        self.show_inactive = show;
    }

    pub fn toggle_show_inactive(&mut self) -> bool {
        self.show_inactive = !self.show_inactive;
        self.show_inactive
    }

    /// Visible items, grouped.
    pub fn entries(&self, states: &StateSnapshot) -> Vec<RenderEntry<&S::Item, String>> {
        let visible = filter_visible(&self.source, states, self.show_inactive);
        group(visible, |item| self.source.group_key(item, states))
    }

    /// Number of items the activity filter currently hides.
    pub fn hidden_count(&self, states: &StateSnapshot) -> usize {
        if self.show_inactive {
            return 0;
        }
        self.source
            .items()
            .iter()
            .filter(|item| !self.source.is_active(item, states))
            .count()
    }
}

// ── Containers ───────────────────────────────────────────────────────

/// Containers, grouped by compose project.
#[derive(Debug, Clone)]
pub struct ContainerGrid {
    items: Vec<DashboardItem>,
    naming: EntityNaming,
}

impl ContainerGrid {
    pub fn new(items: Vec<DashboardItem>, naming: EntityNaming) -> Self {
        Self { items, naming }
    }
}

impl GridSource for ContainerGrid {
    type Item = DashboardItem;

    fn items(&self) -> &[DashboardItem] {
        &self.items
    }

    fn group_key(&self, item: &DashboardItem, states: &StateSnapshot) -> Option<String> {
        states
            .get(&item.entity_id)
            .and_then(|sensor| sensor.attr_str("project"))
            .map(String::from)
    }

    fn is_active(&self, item: &DashboardItem, states: &StateSnapshot) -> bool {
        let switch_on = self
            .naming
            .container_switch(&item.id)
            .ok()
            .and_then(|switch| states.get(&switch).map(|s| s.is_on()));
        switch_on.unwrap_or_else(|| {
            states
                .get(&item.entity_id)
                .is_some_and(|sensor| sensor.state == "running")
        })
    }
}

// ── Images and volumes ───────────────────────────────────────────────

/// Images or volumes: never grouped, active while in use.
#[derive(Debug, Clone)]
pub struct ResourceGrid {
    items: Vec<DashboardItem>,
}

impl ResourceGrid {
    pub fn new(items: Vec<DashboardItem>) -> Self {
        Self { items }
    }
}

impl GridSource for ResourceGrid {
    type Item = DashboardItem;

    fn items(&self) -> &[DashboardItem] {
        &self.items
    }

    fn group_key(&self, _item: &DashboardItem, _states: &StateSnapshot) -> Option<String> {
        None
    }

    fn is_active(&self, item: &DashboardItem, states: &StateSnapshot) -> bool {
        states.get(&item.entity_id).is_some_and(|s| s.is_on())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{EntityId, StateObject};

    fn container(id: &str) -> DashboardItem {
        let naming = EntityNaming::default();
        DashboardItem {
            id: id.into(),
            name: id.into(),
            entity_id: naming.container_sensor(id).unwrap(),
        }
    }

    fn container_states(rows: &[(&str, &str, Option<&str>)]) -> StateSnapshot {
        let naming = EntityNaming::default();
        rows.iter()
            .flat_map(|(id, switch, project)| {
                let mut sensor = StateObject::new(if *switch == "on" { "running" } else { "exited" });
                if let Some(project) = project {
                    sensor = sensor.with_attribute("project", *project);
                }
                [
                    (naming.container_switch(id).unwrap(), StateObject::new(*switch)),
                    (naming.container_sensor(id).unwrap(), sensor),
                ]
            })
            .collect()
    }

    fn ids<'a>(entries: &[RenderEntry<&'a DashboardItem, String>]) -> Vec<(Option<String>, Vec<&'a str>)> {
        entries
            .iter()
            .map(|entry| match entry {
                RenderEntry::Item { value } => (None, vec![value.id.as_str()]),
                RenderEntry::Group { key, items } => {
                    (Some(key.clone()), items.iter().map(|i| i.id.as_str()).collect())
                }
            })
            .collect()
    }

    #[test]
    fn containers_group_by_project_and_hide_stopped() {
        let grid = GroupedGrid::new(ContainerGrid::new(
            vec![container("a"), container("b"), container("c"), container("d")],
            EntityNaming::default(),
        ));
        let states = container_states(&[
            ("a", "on", None),
            ("b", "on", Some("blog")),
            ("c", "off", Some("blog")),
            ("d", "on", Some("blog")),
        ]);

        assert_eq!(
            ids(&grid.entries(&states)),
            vec![(None, vec!["a"]), (Some("blog".into()), vec!["b", "d"])]
        );
        assert_eq!(grid.hidden_count(&states), 1);
    }

    #[test]
    fn show_inactive_is_grid_local() {
        let items = vec![container("a"), container("b")];
        let states = container_states(&[("a", "off", None), ("b", "on", None)]);

        let mut shown = GroupedGrid::new(ContainerGrid::new(items.clone(), EntityNaming::default()));
        let hidden = GroupedGrid::new(ContainerGrid::new(items, EntityNaming::default()));
        assert!(shown.toggle_show_inactive());

        assert_eq!(shown.entries(&states).len(), 2);
        assert_eq!(shown.hidden_count(&states), 0);
        assert_eq!(hidden.entries(&states).len(), 1);
    }

    #[test]
    fn container_without_switch_falls_back_to_sensor() {
        let item = container("a");
        let states: StateSnapshot = [(item.entity_id.clone(), StateObject::new("running"))]
            .into_iter()
            .collect();
        let grid = ContainerGrid::new(vec![item.clone()], EntityNaming::default());
        assert!(grid.is_active(&item, &states));
        assert!(!grid.is_active(&item, &StateSnapshot::new()));
    }

    #[test]
    fn resources_are_never_grouped() {
        let volume = |id: &str| {
            let entity_id: EntityId = id.parse().unwrap();
            DashboardItem {
                id: id.into(),
                name: id.into(),
                entity_id,
            }
        };
        let states: StateSnapshot = [
            (
                "binary_sensor.a".parse::<EntityId>().unwrap(),
                StateObject::new("on").with_attribute("project", "x"),
            ),
            ("binary_sensor.b".parse::<EntityId>().unwrap(), StateObject::new("off")),
        ]
        .into_iter()
        .collect();
        let mut grid = GroupedGrid::new(ResourceGrid::new(vec![volume("binary_sensor.a"), volume("binary_sensor.b")]));

        assert_eq!(ids(&grid.entries(&states)), vec![(None, vec!["binary_sensor.a"])]);

        grid.set_show_inactive(true);
        let entries = grid.entries(&states);
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| !e.is_group()));
    }
}
