//! Classification overlay state management.
//!
//! This module owns the overlay lifecycle: which run is selected, the overlay
//! opacity, and the single overlay layer mounted on the map surface.

pub mod controller;
pub mod spec;

pub use controller::{LoadTicket, MapController};
pub use spec::{OverlaySpec, OverlaySurface};
