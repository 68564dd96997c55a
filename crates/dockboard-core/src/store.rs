// ── State store ──
//
// Holds the current global state snapshot and broadcasts each new one
// over a `watch` channel. Updates are copy-on-write: a change allocates
// one new state object and shares every other entry, so unchanged
// entities keep their `Arc` identity across snapshots.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dockboard_api::StateChanged;
use tokio::sync::watch;
use tracing::{debug, trace};

use crate::convert::{state_entry, states_from_raw};
use crate::error::CoreError;
use crate::model::{EntityId, StateObject, StateSnapshot};
use crate::stream::StateStream;

pub struct StateStore {
    states: watch::Sender<Arc<StateSnapshot>>,
    last_event: watch::Sender<Option<DateTime<Utc>>>,
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StateStore {
    pub fn new() -> Self {
        let (states, _) = watch::channel(Arc::new(StateSnapshot::new()));
        let (last_event, _) = watch::channel(None);
        Self { states, last_event }
    }

    pub fn snapshot(&self) -> Arc<StateSnapshot> {
        self.states.borrow().clone()
    }

    pub fn subscribe(&self) -> StateStream {
        StateStream::new(self.states.subscribe())
    }

    /// Time of the last applied change event.
    pub fn last_event(&self) -> Option<DateTime<Utc>> {
        *self.last_event.borrow()
    }

    /// Install a full snapshot. Every entry gets a fresh allocation.
    pub fn replace(&self, states: StateSnapshot) {
        debug!(entities = states.len(), "state snapshot replaced");
        self.states.send_replace(Arc::new(states));
    }

    /// Install a full snapshot from host rows, skipping malformed ids.
    pub fn replace_raw(&self, raw: Vec<dockboard_api::RawState>) {
        self.replace(states_from_raw(raw).into_iter().collect());
    }

    /// Set or remove one entity's state.
    pub fn set(&self, entity_id: EntityId, state: Option<StateObject>) {
        trace!(entity_id = %entity_id, removed = state.is_none(), "state updated");
        self.states.send_modify(|current| {
            *current = Arc::new(current.with_state(entity_id, state));
        });
    }

    /// Apply a `state_changed` event. A missing `new_state` removes the entity.
    pub fn apply_change(&self, change: StateChanged) -> Result<EntityId, CoreError> {
        let entity_id = match change.new_state {
            Some(raw) => {
                let (entity_id, state) = state_entry(raw)?;
                self.set(entity_id.clone(), Some(state));
                entity_id
            }
            None => {
                let entity_id = EntityId::try_from(change.entity_id)?;
                self.set(entity_id.clone(), None);
                entity_id
            }
        };
        self.last_event.send_replace(Some(Utc::now()));
        Ok(entity_id)
    }
}
