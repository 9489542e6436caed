//! llmviz - an interactive terminal catalog of animated LLM systems explainers
//!
//! Each catalog module plays a short scripted simulation (KV caching,
//! speculative decoding, RAG, ...) step by step. The library holds the
//! pieces that do not depend on a terminal: the [`playback`] engine and
//! its cadence driver, the module [`catalog`], and the sidebar [`menu`]
//! editor. The [`ui`] module wires them into a ratatui shell.

pub mod catalog;
pub mod menu;
pub mod playback;
pub mod ui;
