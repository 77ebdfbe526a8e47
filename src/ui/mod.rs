//! UI components for Grazing Mapper.
//!
//! Widgets here only render state and report user actions; they never
//! mutate the controller directly.

pub mod controls;
pub mod legend;
pub mod status_pane;

pub use controls::{show_controls, ControlAction, ControlState};
pub use legend::{show_legend, show_summary};
pub use status_pane::StatusPane;
