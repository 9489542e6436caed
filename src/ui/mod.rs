//! # UI Module
//!
//! The terminal shell around the catalog: sidebar navigation, the active
//! simulation panel, and the modal menu editor.
//!
//! ## Components
//!
//! - [`App`] - Shell state (selection, focus, search, active panel, menu)
//! - [`mod@render`] - Rendering functions for drawing the TUI
//! - [`keys`] - Keyboard dispatch
//! - [`Theme`] - Built-in color themes
//! - [`Config`] - Persisted theme, speed and menu
//!
//! ## Layout
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                    Header                        │
//! ├───────────────┬─────────────────────────────────┤
//! │               │  Title and description          │
//! │   Sidebar     │  ▓▓▓▓▓▓░░░░ running 4/9          │
//! │   (modules,   ├─────────────────────────────────┤
//! │    grouped    │  Event log                      │
//! │    or flat)   │  (committed steps + pending)    │
//! │               ├─────────────────────────────────┤
//! │               │  Metrics                        │
//! ├───────────────┴─────────────────────────────────┤
//! │                    Footer                        │
//! └─────────────────────────────────────────────────┘
//! ```
//!
//! Only one panel is active at a time. Opening another module drops the
//! previous panel and with it the cadence task that was driving it.

pub mod app;
pub mod config;
pub mod keys;
pub mod render;
pub mod theme;

pub use app::App;
pub use config::Config;
pub use keys::{handle_key, KeyOutcome};
pub use render::render;
pub use theme::Theme;
