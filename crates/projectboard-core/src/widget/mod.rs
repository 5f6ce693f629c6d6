//! Interaction state layered over the surface's objects.
//!
//! Shapes remain pure data. The widget layer tracks which objects are
//! selected and which text object, if any, has keyboard focus.

mod manager;
mod state;

pub use manager::WidgetManager;
pub use state::WidgetState;
