//! The built-in catalog of LLM systems panels.
//!
//! Scripts are short illustrative sequences, not traces of real systems.

use super::metrics::MetricKind;
use super::registry::{EventKind, ModuleDescriptor, PanelContent, Registry, ScriptEvent};
use crate::playback::{Cadence, StepMode};
use anyhow::Result;

use super::registry::EventKind::{
    Accept, Compute, Hit, Info, Miss, Output, Reject, Request, Response,
};

pub const CATEGORY_INFERENCE: &str = "Inference";
pub const CATEGORY_MEMORY: &str = "Memory & Caching";
pub const CATEGORY_MODEL: &str = "Model Internals";
pub const CATEGORY_PROTOCOLS: &str = "Protocols";
pub const CATEGORY_APPLICATIONS: &str = "Retrieval & Agents";

struct Builder {
    id: &'static str,
    title: &'static str,
    category: &'static str,
    icon: &'static str,
    description: &'static str,
    cadence: Cadence,
    mode: StepMode,
    metric: MetricKind,
}

impl Builder {
    fn new(id: &'static str, title: &'static str, category: &'static str) -> Self {
        Self {
            id,
            title,
            category,
            icon: "",
            description: "",
            cadence: Cadence::default(),
            mode: StepMode::Single,
            metric: MetricKind::Progress,
        }
    }

    fn icon(mut self, icon: &'static str) -> Self {
        self.icon = icon;
        self
    }

    fn describe(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    fn cadence(mut self, cadence: Cadence) -> Self {
        self.cadence = cadence;
        self
    }

    fn two_phase(mut self, settle_ms: u64) -> Self {
        self.mode = StepMode::TwoPhase { settle_ms };
        self
    }

    fn metric(mut self, metric: MetricKind) -> Self {
        self.metric = metric;
        self
    }

    fn script(self, events: &[(&str, EventKind, &str)]) -> ModuleDescriptor {
        ModuleDescriptor {
            id: self.id.to_string(),
            title: self.title.to_string(),
            category: self.category.to_string(),
            icon: self.icon.to_string(),
            description: self.description.to_string(),
            content: PanelContent {
                script: events
                    .iter()
                    .map(|(actor, kind, payload)| ScriptEvent::new(actor, *kind, payload))
                    .collect(),
                cadence: self.cadence,
                mode: self.mode,
                metric: self.metric,
            },
        }
    }
}

/// All built-in modules in their default menu order.
pub fn modules() -> Vec<ModuleDescriptor> {
    vec![
        Builder::new("kv-cache", "KV Cache", CATEGORY_MEMORY)
            .icon("🗄️")
            .describe("Keys and values of past tokens are stored so each decode step only computes attention inputs for the newest token.")
            .metric(MetricKind::HitRate)
            .script(&[
                ("prefill", Compute, "Compute K/V for 6 prompt tokens, store in cache"),
                ("decode", Miss, "Token 7: no cached K/V for position 7, compute it"),
                ("decode", Hit, "Token 7: reuse K/V for positions 1-6"),
                ("decode", Miss, "Token 8: compute K/V for position 8"),
                ("decode", Hit, "Token 8: reuse K/V for positions 1-7"),
                ("decode", Hit, "Token 9: reuse K/V for positions 1-8"),
                ("cache", Info, "Cache holds 9 x layers x heads x head_dim entries"),
            ]),
        Builder::new("prefix-caching", "Prefix Caching", CATEGORY_MEMORY)
            .icon("🌳")
            .describe("Requests sharing a prompt prefix reuse the cached blocks of that prefix, tracked in a radix tree.")
            .metric(MetricKind::HitRate)
            .script(&[
                ("request A", Miss, "\"You are a helpful assistant. Summarise...\" - new prefix"),
                ("radix tree", Info, "Insert path [system-prompt] -> [summarise]"),
                ("request B", Hit, "\"You are a helpful assistant. Translate...\" shares system prompt"),
                ("radix tree", Info, "Split node: [system-prompt] -> {[summarise], [translate]}"),
                ("request C", Hit, "\"You are a helpful assistant. Summarise...\" full prefix match"),
                ("request D", Miss, "\"Write a poem\" - no shared prefix"),
                ("evictor", Info, "LRU leaf [translate] evicted under memory pressure"),
            ]),
        Builder::new("paged-attention", "Paged Attention", CATEGORY_MEMORY)
            .icon("📄")
            .describe("The KV cache is split into fixed-size blocks mapped through a block table, like virtual memory pages.")
            .script(&[
                ("allocator", Info, "Free list: 8 blocks of 16 tokens"),
                ("seq 1", Request, "Needs 40 tokens -> allocate blocks 0, 1, 2"),
                ("seq 2", Request, "Needs 20 tokens -> allocate blocks 3, 4"),
                ("block table", Info, "seq 1: [0, 1, 2]  seq 2: [3, 4]"),
                ("seq 1", Output, "Grows past 48 tokens -> append block 5"),
                ("seq 2", Response, "Finished -> blocks 3, 4 return to free list"),
                ("allocator", Info, "No fragmentation: any free block serves any sequence"),
            ]),
        Builder::new("attention-complexity", "Attention Complexity", CATEGORY_MODEL)
            .icon("🔢")
            .describe("Self-attention compares every token with every other token, so cost grows quadratically with sequence length.")
            .cadence(Cadence::Fixed { interval_ms: 700 })
            .script(&[
                ("n = 1k", Compute, "1k x 1k = 1M attention scores"),
                ("n = 2k", Compute, "2k x 2k = 4M scores (4x)"),
                ("n = 4k", Compute, "4k x 4k = 16M scores (16x)"),
                ("n = 8k", Compute, "8k x 8k = 64M scores (64x)"),
                ("n = 32k", Compute, "32k x 32k = 1B scores (1024x)"),
                ("summary", Info, "Doubling context quadruples attention compute and memory"),
            ]),
        Builder::new("flash-attention", "Flash Attention", CATEGORY_MODEL)
            .icon("⚡")
            .describe("Attention is computed tile by tile in on-chip SRAM with an online softmax, never materialising the full score matrix.")
            .script(&[
                ("HBM", Request, "Load Q tile 1 into SRAM"),
                ("SRAM", Compute, "Stream K/V tile 1: partial scores, running max, running sum"),
                ("SRAM", Compute, "Stream K/V tile 2: rescale accumulator with new max"),
                ("SRAM", Compute, "Stream K/V tile 3: accumulate"),
                ("HBM", Response, "Write normalised output tile 1"),
                ("summary", Info, "Memory O(n) instead of O(n^2); fewer HBM round trips"),
            ]),
        Builder::new("tokenization", "Tokenization", CATEGORY_MODEL)
            .icon("✂️")
            .describe("Byte-pair encoding repeatedly merges the most frequent adjacent pair until the vocabulary budget is reached.")
            .cadence(Cadence::Fixed { interval_ms: 600 })
            .script(&[
                ("input", Info, "\"lower lowest\""),
                ("bytes", Compute, "l o w e r _ l o w e s t"),
                ("merge 1", Compute, "(l, o) -> lo: lo w e r _ lo w e s t"),
                ("merge 2", Compute, "(lo, w) -> low: low e r _ low e s t"),
                ("merge 3", Compute, "(e, r) -> er: low er _ low e s t"),
                ("merge 4", Compute, "(e, s) -> es: low er _ low es t"),
                ("merge 5", Compute, "(es, t) -> est: low er _ low est"),
                ("tokens", Output, "[low] [er] [_] [low] [est] = 5 tokens"),
            ]),
        Builder::new("quantization", "Quantization", CATEGORY_MODEL)
            .icon("📉")
            .describe("Weights are stored in fewer bits with a per-group scale, trading a little accuracy for memory and bandwidth.")
            .script(&[
                ("fp16", Info, "[0.82, -1.37, 0.05, 2.11] = 8 bytes"),
                ("scale", Compute, "absmax 2.11 / 127 = 0.0166"),
                ("int8", Output, "[49, -82, 3, 127] = 4 bytes + scale"),
                ("int4", Output, "[3, -5, 0, 7] = 2 bytes + scale"),
                ("dequant", Compute, "int4 -> [0.90, -1.51, 0.00, 2.11]"),
                ("summary", Info, "70B model: 140 GB fp16 -> 35 GB int4"),
            ]),
        Builder::new("mixture-of-experts", "Mixture of Experts", CATEGORY_MODEL)
            .icon("🧩")
            .describe("A router sends each token to its top-k experts, so only a fraction of parameters is active per token.")
            .cadence(Cadence::Jittered {
                base_ms: 500,
                jitter_ms: 400,
            })
            .script(&[
                ("router", Compute, "\"The\" -> experts 2, 7"),
                ("router", Compute, "\"cat\" -> experts 1, 7"),
                ("router", Compute, "\"sat\" -> experts 4, 5"),
                ("balancer", Info, "Expert 7 load 2/3 tokens, auxiliary loss nudges router"),
                ("router", Compute, "\"down\" -> experts 3, 6"),
                ("summary", Info, "8 experts, top-2: 25% of FFN parameters active per token"),
            ]),
        Builder::new("lora", "LoRA Adapters", CATEGORY_MODEL)
            .icon("🎛️")
            .describe("Fine-tuning trains a low-rank update B·A next to a frozen weight matrix.")
            .script(&[
                ("W", Info, "Frozen 4096 x 4096 = 16.7M parameters"),
                ("A", Compute, "Trainable 8 x 4096"),
                ("B", Compute, "Trainable 4096 x 8 (initialised to zero)"),
                ("forward", Compute, "h = Wx + B(Ax) * alpha / r"),
                ("summary", Output, "65k trainable parameters (0.4%) per adapted matrix"),
            ]),
        Builder::new("prefill-decode", "Prefill vs Decode", CATEGORY_INFERENCE)
            .icon("🔁")
            .describe("Prefill processes the whole prompt in one parallel pass; decode then produces one token per step.")
            .two_phase(350)
            .metric(MetricKind::Throughput)
            .script(&[
                ("prefill", Compute, "Prompt of 512 tokens in one compute-bound pass"),
                ("decode", Output, "Token 1: \"Paris\""),
                ("decode", Output, "Token 2: \"is\""),
                ("decode", Output, "Token 3: \"the\""),
                ("decode", Output, "Token 4: \"capital\""),
                ("decode", Output, "Token 5: \".\""),
            ]),
        Builder::new("speculative-decoding", "Speculative Decoding", CATEGORY_INFERENCE)
            .icon("🔮")
            .describe("A small draft model proposes several tokens; the target model verifies them in one pass and keeps the accepted prefix.")
            .two_phase(400)
            .metric(MetricKind::AcceptanceRate)
            .script(&[
                ("draft", Accept, "\"The\" accepted"),
                ("draft", Accept, "\"quick\" accepted"),
                ("draft", Reject, "\"red\" rejected, target prefers \"brown\""),
                ("target", Compute, "Verify pass 1: 2 accepted + 1 corrected token"),
                ("draft", Accept, "\"fox\" accepted"),
                ("draft", Accept, "\"jumps\" accepted"),
                ("draft", Accept, "\"over\" accepted"),
                ("target", Compute, "Verify pass 2: 3 accepted + 1 bonus token"),
            ]),
        Builder::new("continuous-batching", "Continuous Batching", CATEGORY_INFERENCE)
            .icon("🚂")
            .describe("Sequences join and leave the running batch at every iteration instead of waiting for the whole batch to finish.")
            .cadence(Cadence::Jittered {
                base_ms: 400,
                jitter_ms: 500,
            })
            .metric(MetricKind::Throughput)
            .script(&[
                ("scheduler", Request, "Batch = [A, B, C]"),
                ("step 1", Output, "A, B, C each emit a token"),
                ("B", Response, "B hits EOS, slot freed"),
                ("scheduler", Request, "D joins mid-flight: batch = [A, C, D]"),
                ("step 2", Output, "A, C, D each emit a token"),
                ("scheduler", Request, "E waits: KV budget full"),
                ("A", Response, "A finishes, E admitted"),
                ("step 3", Output, "C, D, E each emit a token"),
            ]),
        Builder::new("sampling", "Sampling", CATEGORY_INFERENCE)
            .icon("🎲")
            .describe("Temperature, top-k and top-p reshape the next-token distribution before a token is drawn.")
            .cadence(Cadence::Jittered {
                base_ms: 600,
                jitter_ms: 300,
            })
            .script(&[
                ("logits", Info, "sky 4.1, sea 3.2, moon 2.5, cat 0.3"),
                ("temperature 0.7", Compute, "Sharpen: sky 0.71, sea 0.20, moon 0.07, cat 0.00"),
                ("top-k 3", Compute, "Drop \"cat\""),
                ("top-p 0.9", Compute, "Keep {sky, sea}: cumulative 0.91"),
                ("sample", Output, "Drew \"sky\""),
            ]),
        Builder::new("mcp-protocol", "MCP Protocol", CATEGORY_PROTOCOLS)
            .icon("🔌")
            .describe("The Model Context Protocol lets a host discover and call tools on a server over JSON-RPC.")
            .cadence(Cadence::Fixed { interval_ms: 900 })
            .script(&[
                ("client", Request, r#"{"jsonrpc":"2.0","id":1,"method":"initialize"}"#),
                ("server", Response, r#"{"id":1,"result":{"capabilities":{"tools":{}}}}"#),
                ("client", Request, r#"{"id":2,"method":"tools/list"}"#),
                ("server", Response, r#"{"id":2,"result":{"tools":[{"name":"get_weather"}]}}"#),
                ("client", Request, r#"{"id":3,"method":"tools/call","params":{"name":"get_weather","arguments":{"city":"Oslo"}}}"#),
                ("server", Response, r#"{"id":3,"result":{"content":[{"type":"text","text":"4°C, light snow"}]}}"#),
            ]),
        Builder::new("openapi-tools", "Function Calling", CATEGORY_PROTOCOLS)
            .icon("🛠️")
            .describe("The model emits a structured call against a tool schema; the host executes it and feeds the result back.")
            .script(&[
                ("user", Request, "\"What's 17% of 2,340?\""),
                ("model", Output, r#"{"tool":"calculator","args":{"expr":"0.17*2340"}}"#),
                ("host", Compute, "POST /calculator -> 397.8"),
                ("host", Response, r#"{"tool_result":397.8}"#),
                ("model", Output, "\"17% of 2,340 is 397.8.\""),
            ]),
        Builder::new("rag-pipeline", "RAG Pipeline", CATEGORY_APPLICATIONS)
            .icon("📚")
            .describe("Retrieval-augmented generation embeds the question, fetches similar chunks and grounds the answer in them.")
            .script(&[
                ("user", Request, "\"How do I rotate API keys?\""),
                ("embedder", Compute, "Query -> 768-dim vector"),
                ("vector store", Hit, "docs/security.md#rotation (0.89)"),
                ("vector store", Hit, "docs/api/keys.md (0.84)"),
                ("vector store", Miss, "blog/2021-launch.md (0.41) below threshold"),
                ("prompt", Compute, "Stuff 2 chunks + question into context"),
                ("model", Output, "Answer citing [security.md] and [keys.md]"),
            ]),
        Builder::new("agent-loop", "Agent Loop", CATEGORY_APPLICATIONS)
            .icon("🤖")
            .describe("An agent alternates between reasoning, calling tools and observing results until the task is done.")
            .cadence(Cadence::Jittered {
                base_ms: 700,
                jitter_ms: 600,
            })
            .script(&[
                ("thought", Info, "Need the failing test name first"),
                ("action", Request, "run(\"cargo test\")"),
                ("observation", Response, "1 failed: parser::tests::test_empty_input"),
                ("thought", Info, "Empty input should return an empty list"),
                ("action", Request, "edit(src/parser.rs)"),
                ("observation", Response, "All tests pass"),
                ("answer", Output, "Fixed empty-input handling in the parser"),
            ]),
    ]
}

/// The built-in registry.
pub fn registry() -> Result<Registry> {
    Registry::new(modules())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_registry_is_valid() {
        let registry = registry().expect("built-in catalog must validate");
        assert!(registry.len() >= 16);
    }

    #[test]
    fn test_every_module_has_content() {
        for module in modules() {
            assert!(!module.content.script.is_empty(), "{} has no script", module.id);
            assert!(!module.description.is_empty(), "{} has no description", module.id);
            assert!(!module.icon.is_empty(), "{} has no icon", module.id);
        }
    }

    #[test]
    fn test_two_phase_panels() {
        let registry = registry().expect("valid");
        for id in ["speculative-decoding", "prefill-decode"] {
            let module = registry.get(id).expect("module exists");
            assert!(matches!(module.content.mode, StepMode::TwoPhase { .. }));
        }
    }
}
