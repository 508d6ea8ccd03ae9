//! Turns user input into room edits: the [`InteractionController`] state machine and the Bevy
//! systems that feed it.

pub mod controller;
pub mod input;

pub use controller::{DragSession, InteractionContext, InteractionController, InteractionState};
pub use input::{PointerSample, ViewSnapshot, WallCommand};
