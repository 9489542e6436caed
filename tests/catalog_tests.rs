//! Catalog loading and validation tests

use llmviz::catalog::{builtin, derive_metrics, EventKind, MetricKind, Registry};
use llmviz::playback::{Cadence, StepMode};
use std::fs;
use tempfile::TempDir;

const CATALOG: &str = r#"{
  "modules": [
    {
      "id": "toy-cache",
      "title": "Toy Cache",
      "category": "Memory",
      "icon": "🗄️",
      "description": "Two lookups, one hit.",
      "content": {
        "script": [
          { "actor": "client", "kind": "request", "payload": "GET a" },
          { "actor": "cache", "kind": "miss", "payload": "a not cached" },
          { "actor": "cache", "kind": "hit", "payload": "a cached" }
        ],
        "cadence": { "type": "jittered", "base_ms": 300, "jitter_ms": 100 },
        "metric": "hit_rate"
      }
    },
    {
      "id": "toy-draft",
      "title": "Toy Draft",
      "category": "Inference",
      "content": {
        "script": [{ "actor": "draft", "payload": "hello" }],
        "mode": { "type": "two_phase", "settle_ms": 250 }
      }
    }
  ]
}"#;

fn write_catalog(contents: &str) -> (TempDir, std::path::PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("catalog.json");
    fs::write(&path, contents).unwrap();
    (temp_dir, path)
}

#[test]
fn test_load_catalog_file() {
    let (_dir, path) = write_catalog(CATALOG);
    let registry = Registry::from_json_file(&path).unwrap();

    assert_eq!(registry.len(), 2);
    assert_eq!(registry.ids(), vec!["toy-cache", "toy-draft"]);
    assert_eq!(registry.categories(), vec!["Memory", "Inference"]);

    let cache = registry.get("toy-cache").unwrap();
    assert_eq!(
        cache.content.cadence,
        Cadence::Jittered {
            base_ms: 300,
            jitter_ms: 100
        }
    );
    assert_eq!(cache.content.mode, StepMode::Single);
    assert_eq!(cache.content.script[1].kind, EventKind::Miss);
}

#[test]
fn test_catalog_defaults() {
    let registry = Registry::from_json_str(CATALOG).unwrap();
    let draft = registry.get("toy-draft").unwrap();

    assert!(draft.icon.is_empty());
    assert!(draft.description.is_empty());
    assert_eq!(draft.content.cadence, Cadence::default());
    assert_eq!(draft.content.metric, MetricKind::None);
    assert_eq!(draft.content.mode, StepMode::TwoPhase { settle_ms: 250 });
    assert_eq!(draft.content.script[0].kind, EventKind::Info);
}

#[test]
fn test_missing_catalog_file() {
    let err = Registry::from_json_file(std::path::Path::new("/nonexistent/catalog.json"))
        .unwrap_err();
    assert!(err.to_string().contains("Failed to read catalog file"));
}

#[test]
fn test_duplicate_ids_rejected() {
    let duplicated = CATALOG.replace("toy-draft", "toy-cache");
    let (_dir, path) = write_catalog(&duplicated);

    let err = Registry::from_json_file(&path).unwrap_err();
    let chain = format!("{err:#}");
    assert!(chain.contains("Duplicate module id: toy-cache"), "{chain}");
}

#[test]
fn test_unknown_fields_rejected() {
    let extra = CATALOG.replace("\"icon\"", "\"colour\": \"red\", \"icon\"");
    let err = Registry::from_json_str(&extra).unwrap_err();
    assert!(format!("{err:#}").contains("Failed to parse catalog JSON"));
}

#[test]
fn test_empty_category_rejected() {
    let blank = CATALOG.replace("\"Inference\"", "\"  \"");
    let err = Registry::from_json_str(&blank).unwrap_err();
    assert!(err.to_string().contains("empty category"));
}

#[test]
fn test_empty_catalog_is_valid() {
    let registry = Registry::from_json_str(r#"{ "modules": [] }"#).unwrap();
    assert!(registry.is_empty());
    assert!(registry.categories().is_empty());
}

#[test]
fn test_builtin_catalog_roundtrips_through_json() {
    let registry = builtin::registry().unwrap();
    let modules: Vec<_> = registry.iter().cloned().collect();
    let json = serde_json::json!({ "modules": modules }).to_string();

    let reloaded = Registry::from_json_str(&json).unwrap();
    assert_eq!(reloaded.ids(), registry.ids());
    for module in registry.iter() {
        assert_eq!(reloaded.get(&module.id), Some(module));
    }
}

#[test]
fn test_builtin_metrics_on_full_script() {
    let registry = builtin::registry().unwrap();
    for module in registry.iter() {
        let script = &module.content.script;
        let metrics = derive_metrics(module.content.metric, script, script.len());
        if module.content.metric != MetricKind::None {
            assert!(!metrics.is_empty(), "{} has no metrics", module.id);
        }
    }
}

#[test]
fn test_out_of_range_cadence_rejected_from_file() {
    let huge = CATALOG.replace("\"base_ms\": 300", "\"base_ms\": 18446744073709551615");
    let (_dir, path) = write_catalog(&huge);

    let err = Registry::from_json_file(&path).unwrap_err();
    let chain = format!("{err:#}");
    assert!(chain.contains("invalid cadence"), "{chain}");
}

