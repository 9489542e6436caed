//! # Menu Module
//!
//! Lets the user choose which modules appear in the sidebar and in what
//! order.
//!
//! - [`move_item`] is the pure reorder primitive. Any sequence of moves
//!   yields a permutation of the input.
//! - [`MenuCustomizer`] is the editor state: working order, selected set,
//!   grouping flag and a keyboard "drag" cursor. [`MenuCustomizer::save`]
//!   consumes it and returns the [`MenuSelection`] to the caller.

mod customizer;
mod reorder;

pub use customizer::{MenuCustomizer, MenuSelection};
pub use reorder::{move_item, move_item_in_place};
