//! # Catalog Module
//!
//! The module registry: an immutable list of [`ModuleDescriptor`]s, each
//! carrying the [`PanelContent`] its panel plays back.
//!
//! The registry is an explicit value built at startup (from the built-in
//! catalog or a JSON file) and passed into the shell.
//!
//! ## Catalog File Format
//!
//! ```json
//! {
//!   "modules": [
//!     {
//!       "id": "kv-cache",
//!       "title": "KV Cache",
//!       "category": "Memory & Caching",
//!       "icon": "🗄️",
//!       "description": "...",
//!       "content": {
//!         "script": [{ "actor": "decode", "kind": "hit", "payload": "..." }],
//!         "cadence": { "type": "fixed", "interval_ms": 800 },
//!         "mode": { "type": "two_phase", "settle_ms": 300 },
//!         "metric": "hit_rate"
//!       }
//!     }
//!   ]
//! }
//! ```

pub mod builtin;
pub mod metrics;
pub mod registry;

pub use metrics::{derive_metrics, Metric, MetricKind};
pub use registry::{EventKind, ModuleDescriptor, PanelContent, Registry, ScriptEvent};
