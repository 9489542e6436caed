use super::metrics::MetricKind;
use crate::playback::cadence::check_interval;
use crate::playback::{Cadence, StepMode};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Visual role of a script event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    #[default]
    Info,
    Request,
    Response,
    Compute,
    Output,
    Hit,
    Miss,
    Accept,
    Reject,
}

impl EventKind {
    pub fn label(self) -> &'static str {
        match self {
            EventKind::Info => "info",
            EventKind::Request => "request",
            EventKind::Response => "response",
            EventKind::Compute => "compute",
            EventKind::Output => "output",
            EventKind::Hit => "hit",
            EventKind::Miss => "miss",
            EventKind::Accept => "accept",
            EventKind::Reject => "reject",
        }
    }
}

/// One entry of a panel's script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScriptEvent {
    /// Who produces the event (e.g. "client", "draft model", "cache")
    pub actor: String,
    /// Text shown in the event log
    pub payload: String,
    #[serde(default)]
    pub kind: EventKind,
}

impl ScriptEvent {
    pub fn new(actor: &str, kind: EventKind, payload: &str) -> Self {
        Self {
            actor: actor.to_string(),
            payload: payload.to_string(),
            kind,
        }
    }
}

/// What a panel plays back and how.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PanelContent {
    pub script: Vec<ScriptEvent>,
    #[serde(default)]
    pub cadence: Cadence,
    #[serde(default)]
    pub mode: StepMode,
    #[serde(default)]
    pub metric: MetricKind,
}

/// Static metadata and content of one catalog module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModuleDescriptor {
    pub id: String,
    pub title: String,
    pub category: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub description: String,
    pub content: PanelContent,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CatalogFile {
    modules: Vec<ModuleDescriptor>,
}

/// Immutable, validated list of modules handed to the shell at startup.
#[derive(Debug, Clone)]
pub struct Registry {
    modules: Vec<ModuleDescriptor>,
}

impl Registry {
    /// Validate and wrap a module list.
    ///
    /// Ids must be non-empty and unique, and every module needs a category.
    /// Cadence and settle delays must lie within `1..=MAX_INTERVAL_MS`.
    pub fn new(modules: Vec<ModuleDescriptor>) -> Result<Self> {
        let mut seen = HashSet::new();
        for module in &modules {
            if module.id.trim().is_empty() {
                bail!("Module '{}' has an empty id", module.title);
            }
            if module.category.trim().is_empty() {
                bail!("Module '{}' has an empty category", module.id);
            }
            if !seen.insert(module.id.as_str()) {
                bail!("Duplicate module id: {}", module.id);
            }
            module
                .content
                .cadence
                .validate()
                .with_context(|| format!("Module '{}' has an invalid cadence", module.id))?;
            if let StepMode::TwoPhase { settle_ms } = module.content.mode {
                check_interval("settle_ms", settle_ms)
                    .with_context(|| format!("Module '{}' has an invalid mode", module.id))?;
            }
        }
        debug!(modules = modules.len(), "registry built");
        Ok(Self { modules })
    }

    /// Load a catalog from a JSON file of the form `{ "modules": [...] }`.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read catalog file: {}", path.display()))?;
        let registry = Self::from_json_str(&contents)
            .with_context(|| format!("Failed to load catalog file: {}", path.display()))?;
        info!(path = %path.display(), modules = registry.len(), "catalog loaded");
        Ok(registry)
    }

    pub fn from_json_str(contents: &str) -> Result<Self> {
        let file: CatalogFile =
            serde_json::from_str(contents).context("Failed to parse catalog JSON")?;
        Self::new(file.modules)
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ModuleDescriptor> {
        self.modules.iter()
    }

    pub fn get(&self, id: &str) -> Option<&ModuleDescriptor> {
        self.modules.iter().find(|m| m.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// All ids in registry order (the default menu order).
    pub fn ids(&self) -> Vec<String> {
        self.modules.iter().map(|m| m.id.clone()).collect()
    }

    /// Categories in order of first appearance.
    pub fn categories(&self) -> Vec<String> {
        let mut categories: Vec<String> = Vec::new();
        for module in &self.modules {
            if !categories.contains(&module.category) {
                categories.push(module.category.clone());
            }
        }
        categories
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn module(id: &str, category: &str) -> ModuleDescriptor {
        ModuleDescriptor {
            id: id.to_string(),
            title: id.to_uppercase(),
            category: category.to_string(),
            icon: String::new(),
            description: String::new(),
            content: PanelContent {
                script: vec![ScriptEvent::new("a", EventKind::Info, "hello")],
                cadence: Cadence::default(),
                mode: StepMode::Single,
                metric: MetricKind::None,
            },
        }
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let result = Registry::new(vec![module("x", "A"), module("x", "B")]);
        let err = result.expect_err("duplicates must fail");
        assert!(err.to_string().contains("Duplicate module id: x"));
    }

    #[test]
    fn test_empty_id_rejected() {
        assert!(Registry::new(vec![module("  ", "A")]).is_err());
    }

    #[test]
    fn test_empty_category_rejected() {
        assert!(Registry::new(vec![module("x", "")]).is_err());
    }

    #[test]
    fn test_zero_interval_rejected() {
        let mut stalled = module("x", "A");
        stalled.content.cadence = Cadence::Fixed { interval_ms: 0 };
        let err = Registry::new(vec![stalled]).expect_err("zero interval must fail");
        let chain = format!("{err:#}");
        assert!(chain.contains("Module 'x' has an invalid cadence"), "{chain}");
        assert!(chain.contains("interval_ms"), "{chain}");
    }

    #[test]
    fn test_huge_jittered_base_rejected() {
        let mut slow = module("x", "A");
        slow.content.cadence = Cadence::Jittered {
            base_ms: u64::MAX,
            jitter_ms: 5,
        };
        assert!(Registry::new(vec![slow]).is_err());
    }

    #[test]
    fn test_settle_delay_validated() {
        let mut drafted = module("x", "A");
        drafted.content.mode = StepMode::TwoPhase { settle_ms: 0 };
        let err = Registry::new(vec![drafted.clone()]).expect_err("zero settle must fail");
        assert!(format!("{err:#}").contains("settle_ms"));

        drafted.content.mode = StepMode::TwoPhase { settle_ms: 250 };
        assert!(Registry::new(vec![drafted]).is_ok());
    }

    #[test]
    fn test_categories_in_first_appearance_order() {
        let registry = Registry::new(vec![
            module("a", "Memory"),
            module("b", "Inference"),
            module("c", "Memory"),
        ])
        .expect("valid");
        assert_eq!(registry.categories(), vec!["Memory", "Inference"]);
        assert_eq!(registry.ids(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_lookup() {
        let registry = Registry::new(vec![module("a", "Memory")]).expect("valid");
        assert!(registry.contains("a"));
        assert_eq!(registry.get("a").map(|m| m.title.as_str()), Some("A"));
        assert!(registry.get("missing").is_none());
    }

    #[test]
    fn test_from_json_defaults() {
        let json = r#"{
            "modules": [{
                "id": "demo",
                "title": "Demo",
                "category": "Misc",
                "content": {
                    "script": [{"actor": "user", "payload": "hi"}]
                }
            }]
        }"#;
        let registry = Registry::from_json_str(json).expect("parse");
        let demo = registry.get("demo").expect("module");
        assert_eq!(demo.content.mode, StepMode::Single);
        assert_eq!(demo.content.cadence, Cadence::default());
        assert_eq!(demo.content.script[0].kind, EventKind::Info);
    }

    #[test]
    fn test_from_json_unknown_field_rejected() {
        let json = r#"{"modules": [], "extra": 1}"#;
        assert!(Registry::from_json_str(json).is_err());
    }
}
