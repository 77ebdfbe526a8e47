//! Map rendering and tile sources.
//!
//! This module provides the walkers-based map surface: the OpenStreetMap base
//! layer, the classification overlay tile source, and the fixed property
//! boundary with its popup.

pub mod classification;
pub mod osm;
pub mod property;
pub mod view;

pub use view::MapView;
