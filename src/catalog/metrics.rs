//! Display metrics for panels.
//!
//! These numbers are pedagogical placeholders: simple arithmetic over the
//! events revealed so far. They are not measurements and nothing downstream
//! depends on them.

use super::registry::{EventKind, ScriptEvent};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    #[default]
    None,
    /// Cache hits over hits + misses
    HitRate,
    /// Output tokens per revealed step
    Throughput,
    /// Accepted drafts and the implied speedup per verify pass
    AcceptanceRate,
    /// Plain "step x of n"
    Progress,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Metric {
    pub label: &'static str,
    pub value: String,
}

impl Metric {
    fn new(label: &'static str, value: String) -> Self {
        Self { label, value }
    }
}

fn count(events: &[ScriptEvent], kind: EventKind) -> usize {
    events.iter().filter(|e| e.kind == kind).count()
}

fn percent(part: usize, whole: usize) -> String {
    if whole == 0 {
        "n/a".to_string()
    } else {
        format!("{:.0}%", part as f64 * 100.0 / whole as f64)
    }
}

pub fn derive_metrics(kind: MetricKind, emitted: &[ScriptEvent], total: usize) -> Vec<Metric> {
    match kind {
        MetricKind::None => Vec::new(),
        MetricKind::Progress => vec![Metric::new(
            "Step",
            format!("{} of {}", emitted.len(), total),
        )],
        MetricKind::HitRate => {
            let hits = count(emitted, EventKind::Hit);
            let misses = count(emitted, EventKind::Miss);
            vec![
                Metric::new("Hits", hits.to_string()),
                Metric::new("Misses", misses.to_string()),
                Metric::new("Hit rate", percent(hits, hits + misses)),
            ]
        }
        MetricKind::Throughput => {
            let tokens = count(emitted, EventKind::Output);
            let steps = emitted.len();
            let rate = if steps == 0 {
                "n/a".to_string()
            } else {
                format!("{:.2}", tokens as f64 / steps as f64)
            };
            vec![
                Metric::new("Tokens", tokens.to_string()),
                Metric::new("Tokens/step", rate),
            ]
        }
        MetricKind::AcceptanceRate => {
            let accepted = count(emitted, EventKind::Accept);
            let rejected = count(emitted, EventKind::Reject);
            // Every verify pass yields its accepted drafts plus one token of its own
            let passes = count(emitted, EventKind::Compute);
            let speedup = if passes == 0 {
                "n/a".to_string()
            } else {
                format!("{:.2}x", (accepted + passes) as f64 / passes as f64)
            };
            vec![
                Metric::new("Accepted", percent(accepted, accepted + rejected)),
                Metric::new("Speedup", speedup),
            ]
        }
    }
}
