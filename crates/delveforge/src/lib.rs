//! # Delveforge
//!
//! Instance zone lifecycle for game servers.
//!
//! The sub-crates do the work; this crate ties them into a running
//! service. [`InstanceService`] spawns the single game task that owns the
//! [`InstanceManager`] and the world, and hands back an [`InstanceHandle`]
//! the rest of the server talks to.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use delveforge::prelude::*;
//! use delveforge::world::memory::MemoryWorld;
//!
//! # async fn run() -> Result<(), DelveforgeError> {
//! let config = ServiceConfig::load("delveforge.toml")?;
//! delveforge::logging::init_tracing(&config.log_filter);
//!
//! let handle = InstanceService::spawn(&config, MemoryWorld::new(), SystemClock);
//! let id = handle.create(InstanceConfig::default()).await?;
//! handle.teleport_into(id, PlayerId(1)).await?;
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
pub mod logging;
mod service;

pub use config::{ConfigError, ServiceConfig};
pub use error::{DelveforgeError, ServiceError};
pub use service::{InstanceHandle, InstanceService, SHUTDOWN_REASON};

pub use delveforge_instance as instance;
pub use delveforge_tick as tick;
pub use delveforge_types as types;
pub use delveforge_world as world;

pub use delveforge_instance::InstanceManager;

/// Everything a server needs to drive instances.
pub mod prelude {
    pub use crate::{
        ConfigError, DelveforgeError, InstanceHandle, InstanceService, ServiceConfig,
        ServiceError,
    };
    pub use delveforge_instance::{
        CloseReport, InstanceConfig, InstanceError, InstanceManager, InstanceSummary,
        ManagerConfig, Scaling,
    };
    pub use delveforge_tick::{MissedTickPolicy, TaskMetrics};
    pub use delveforge_types::{InstanceId, PlayerId, Position};
    pub use delveforge_world::{Clock, ManualClock, SystemClock, World};
}
