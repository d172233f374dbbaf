//! # level_component
//!
//! Placement modules: the per-actor record of which cell a level actor
//! occupies, and the storage that owns them.
//!
//! This crate provides:
//!
//! - [`MapComponent`]: the cached cell and actor kind of one level actor.
//! - [`MapHandle`]: a generational, non-owning reference to a module.
//! - [`MapComponentArena`]: the slot arena that owns a level's modules.
//! - [`ProxyModules`]: observer-side copies of remote modules.
//! - [`ModuleSink`]: the "push cell into module" seam used by replication.
//! - [`ActorType`] / [`ActorTypeMask`]: actor kinds and filters over them.

pub mod actor;
pub mod arena;
pub mod handle;
pub mod map_component;
pub mod proxy;

pub use actor::{ActorType, ActorTypeMask};
pub use arena::MapComponentArena;
pub use handle::{HandleAllocator, MapHandle};
pub use map_component::{MapComponent, ModuleSink};
pub use proxy::ProxyModules;
