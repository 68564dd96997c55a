// ── State snapshots ──
//
// A snapshot maps entity ids to shared state objects. A changed entity
// always gets a fresh `Arc`; untouched entities keep theirs, so pointer
// identity is a sound and cheap change signal.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use super::entity_id::EntityId;

/// Live state of one entity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateObject {
    pub state: String,
    pub attributes: Map<String, Value>,
    pub last_changed: Option<DateTime<Utc>>,
}

impl StateObject {
    pub fn new(state: impl Into<String>) -> Self {
        Self {
            state: state.into(),
            attributes: Map::new(),
            last_changed: None,
        }
    }

    pub fn with_attribute(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.to_owned(), value.into());
        self
    }

    pub fn is_on(&self) -> bool {
        self.state == "on"
    }

    /// String attribute, ignoring empty strings.
    pub fn attr_str(&self, key: &str) -> Option<&str> {
        self.attributes
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    /// Scalar attribute rendered as text (strings, numbers, booleans).
    pub fn attr_text(&self, key: &str) -> Option<String> {
        match self.attributes.get(key)? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// List attribute rendered as text; a scalar becomes a one-element list.
    pub fn attr_list(&self, key: &str) -> Vec<String> {
        match self.attributes.get(key) {
            Some(Value::Array(values)) => values
                .iter()
                .filter_map(|v| match v {
                    Value::String(s) => Some(s.clone()),
                    Value::Null => None,
                    other => Some(other.to_string()),
                })
                .collect(),
            Some(_) => self.attr_text(key).into_iter().collect(),
            None => Vec::new(),
        }
    }
}

/// Immutable mapping of entity id to shared state.
#[derive(Debug, Clone, Default)]
pub struct StateSnapshot {
    entries: HashMap<EntityId, Arc<StateObject>>,
}

impl StateSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get<Q>(&self, entity_id: &Q) -> Option<&Arc<StateObject>>
    where
        EntityId: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.get(entity_id)
    }

    pub fn contains<Q>(&self, entity_id: &Q) -> bool
    where
        EntityId: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.contains_key(entity_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&EntityId, &Arc<StateObject>)> {
        self.entries.iter()
    }

    /// Copy-on-write update: a new snapshot that shares every untouched
    /// entry and holds a fresh allocation for `entity_id`.
    ///
    /// `None` removes the entity.
    pub fn with_state(&self, entity_id: EntityId, state: Option<StateObject>) -> Self {
        let mut entries = self.entries.clone();
        match state {
            Some(state) => {
                entries.insert(entity_id, Arc::new(state));
            }
            None => {
                entries.remove(&entity_id);
            }
        }
        Self { entries }
    }
}

impl FromIterator<(EntityId, StateObject)> for StateSnapshot {
    fn from_iter<I: IntoIterator<Item = (EntityId, StateObject)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(id, state)| (id, Arc::new(state)))
                .collect(),
        }
    }
}

impl FromIterator<(EntityId, Arc<StateObject>)> for StateSnapshot {
    fn from_iter<I: IntoIterator<Item = (EntityId, Arc<StateObject>)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
