// dockboard-core: Dashboard synthesis and reactive row logic between dockboard-api and hosts.

pub mod action;
pub mod config;
pub mod controller;
mod convert;
pub mod error;
pub mod grid;
pub mod grouping;
mod host;
pub mod model;
pub mod reactive;
pub mod registry;
pub mod rows;
pub mod services;
pub mod store;
pub mod strategy;
pub mod stream;
pub mod view;

// ── Primary re-exports ──────────────────────────────────────────────
pub use action::{
    ActionDescriptor, ConfirmOutcome, ConfirmPrompt, ConfirmResponder, DialogHost, DispatchHandle, Dispatcher,
    ServiceCaller, ServiceTarget,
};
pub use config::{HostConfig, TlsVerification};
pub use controller::{ConnectionState, DashboardController, GeneratedView};
pub use error::CoreError;
pub use grid::{ContainerGrid, GridSource, GroupedGrid, ResourceGrid};
pub use grouping::{RenderEntry, group};
pub use reactive::{ReactiveRow, TrackedKeySet, TrackedRow, should_rerender};
pub use registry::{RegistryQuery, RegistryRequest, fetch_snapshot};
pub use rows::{CardConfig, ContainerRow, ContainerView, ImageRow, ImageView, Row, VolumeRow, VolumeView};
pub use services::{CreateContainerRequest, DockerService, EntityNaming};
pub use store::StateStore;
pub use strategy::{MissingModelPolicy, StrategyOptions, synthesize};
pub use stream::StateStream;
pub use view::{Card, DashboardView, HeadingAction, Section};

// Re-export model types at the crate root for ergonomics.
pub use model::{
    DashboardItem, DashboardItems, EntityId, RegistryDevice, RegistryEntity, RegistrySnapshot, ResourceKind,
    StateObject, StateSnapshot,
};
