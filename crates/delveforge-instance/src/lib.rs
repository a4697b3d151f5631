//! Instance zone lifecycle management for Delveforge.
//!
//! An instance is a temporary zone carved out of the shared world: a
//! group of players is bound to it, teleported in, and evicted when it
//! closes or expires. Everything runs on the game task; the manager
//! never suspends and never holds a player reference past a call.
//!
//! # Key types
//!
//! - [`InstanceManager`]: the registry plus every lifecycle operation
//! - [`InstanceConfig`]: the blueprint an instance is created from
//! - [`ActiveInstance`]: one live instance (read-only outside this crate)
//! - [`MapTemplateCache`]: makes sure an instance's map is loaded once
//! - [`InstanceError`]: why an operation declined to proceed
//!
//! # Lifecycle
//!
//! ```text
//! create() ──→ bind_player() / bind_party() ──→ teleport_into()
//!    │                    │                            │
//!    │                    ▼                            ▼
//!    │              player_leave()          (unwinds the bind on failure)
//!    ▼
//! sweep_expired() / close() ──→ members evicted ──→ registry slot freed
//! ```

mod binding;
mod closure;
mod config;
mod error;
mod expiry;
mod instance;
mod manager;
mod maps;
mod teleport;

pub use closure::CloseReport;
pub use config::{InstanceConfig, ManagerConfig, Scaling};
pub use error::{ErrorKind, InstanceError};
pub use expiry::EXPIRED_REASON;
pub use instance::{ActiveInstance, InstanceSummary};
pub use manager::InstanceManager;
pub use maps::{MapTemplateCache, TemplateStatus};
