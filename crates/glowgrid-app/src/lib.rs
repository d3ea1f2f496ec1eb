//! Shared driver plumbing for GlowGrid control surfaces.
//!
//! The core engine is single-writer by design; everything outside it (the
//! tick thread, sensor injection from input handling, snapshot readers)
//! shares the world behind one mutex.

use std::sync::{Arc, Mutex};

use glowgrid_core::World;

/// Handle shared between the tick thread and any control surface.
pub type SharedWorld = Arc<Mutex<World>>;

/// Wrap a world for sharing with the ticker and readers.
#[must_use]
pub fn shared_world(world: World) -> SharedWorld {
    Arc::new(Mutex::new(world))
}

pub mod ticker;

pub use ticker::Ticker;
