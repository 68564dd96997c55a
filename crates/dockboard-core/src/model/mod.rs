// ── Domain model ──
//
// Canonical types shared by synthesis, change detection and the row
// behaviours. Registry rows are immutable snapshots; state objects are
// shared through `Arc` so identity doubles as the change signal.

pub mod entity_id;
pub mod item;
pub mod registry;
pub mod state;

pub use entity_id::EntityId;
pub use item::{DashboardItem, DashboardItems};
pub use registry::{RegistryDevice, RegistryEntity, RegistrySnapshot, ResourceKind};
pub use state::{StateObject, StateSnapshot};
