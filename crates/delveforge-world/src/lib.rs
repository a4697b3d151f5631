//! Contracts between the instance manager and the rest of the game server.
//!
//! The instance manager does not own the map, the player entities or the
//! relocation engine. It reaches them through the narrow traits in this
//! crate:
//!
//! - [`MapLoader`]: probes for and merges instance map templates
//! - [`Relocator`]: moves a player to a position, reporting an outcome
//! - [`PlayerDirectory`]: resolves GUIDs to live players and edits the
//!   few player fields the manager cares about
//! - [`Clock`]: wall-clock time for instance timestamps and expiry
//!
//! [`World`] bundles the first three so call sites take a single
//! `&mut impl World`.
//!
//! # How it fits in the stack
//!
//! ```text
//! Service layer (delveforge)       ← owns one World on the game task
//!     ↕
//! Instance layer                   ← borrows the World per call
//!     ↕
//! World contracts (this crate)     ← implemented by the game server
//! ```
//!
//! [`memory::MemoryWorld`] and [`ManualClock`] are in-memory
//! implementations for tests and demos.

mod clock;
mod error;
pub mod memory;
mod player;
mod traits;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::WorldError;
pub use player::{PlayerInfo, RelocateOutcome};
pub use traits::{MapLoader, PlayerDirectory, Relocator, World};
