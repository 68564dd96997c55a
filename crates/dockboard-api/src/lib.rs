// dockboard-api: Async Rust client for the Home Assistant REST and WebSocket APIs

pub mod error;
pub mod models;
pub mod rest;
pub mod transport;
pub mod websocket;

pub use error::Error;
pub use models::{ApiStatus, HostEvent, RawDevice, RawEntity, RawState, StateChanged};
pub use rest::RestClient;
pub use transport::{TlsMode, TransportConfig};
pub use websocket::{WsClient, websocket_url};
